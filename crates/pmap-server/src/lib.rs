//! # pmap-server
//!
//! HTTP push endpoint for the ingestion pipeline.
//!
//! A storage notification arrives as a push envelope on `POST /`. The
//! envelope's `bucketId` and `objectId` attributes name the object that
//! changed; the shared [`EventHandler`](pmap_runtime::EventHandler) does the
//! rest.
//!
//! | Outcome | Status |
//! |---------|--------|
//! | Record routed to the success messenger | `201 OK` |
//! | Malformed envelope, bad base64, missing attribute | `400` |
//! | Fetch, decode, processing or send failure | `500` |
//! | Body over 256,000 bytes | `413` |

pub mod app;
pub mod error;
pub mod http;
pub mod shutdown;

pub use app::build_handler;
pub use error::PushError;
pub use http::{MAX_BODY_BYTES, PushEnvelope, PushMessage, create_router};
pub use shutdown::shutdown_signal;
