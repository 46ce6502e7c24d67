//! # pmap-messenger
//!
//! Delivery of outcome events to durable destinations.
//!
//! The event handler owns two messengers: one for records that passed every
//! processor and one for records a processor rejected. A messenger sends
//! synchronously and never retries; a failed send is reported to the caller,
//! which relies on redelivery of the notification.
//!
//! | Backend | Output |
//! |---------|--------|
//! | `console` | One JSON line per event on stdout |
//! | `file` | JSON Lines appended to a file |
//! | `memory` | Events kept in memory |

pub mod error;
pub mod messenger;

pub use error::MessengerError;
pub use messenger::{ConsoleMessenger, FileMessenger, MemoryMessenger, Messenger, create_messenger};
