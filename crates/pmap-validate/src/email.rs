//! RFC 5322 mailbox parsing.
//!
//! Accepts a bare `addr-spec` (`local@domain`) or a `name-addr`
//! (`Display Name <local@domain>`). Obsolete syntax and comments are rejected.

use regex::Regex;
use std::sync::LazyLock;

const ATEXT: &str = r"[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]";

static ADDR_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    let dot_atom = format!(r"{ATEXT}+(?:\.{ATEXT}+)*");
    let quoted = r#""(?:[^"\\\r\n]|\\.)*""#;
    let literal = r"\[[^\[\]\\\s]*\]";
    Regex::new(&format!(r"^(?:{dot_atom}|{quoted})@(?:{dot_atom}|{literal})$"))
        .expect("addr-spec pattern is valid")
});

static DISPLAY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    let word = format!(r#"(?:{ATEXT}+|"(?:[^"\\\r\n]|\\.)*")"#);
    Regex::new(&format!(r"^{word}(?:[ \t.]+{word})*\.?$")).expect("display-name pattern is valid")
});

/// Parse a mailbox, returning the bare address on success.
pub fn parse_mailbox(input: &str) -> Result<&str, &'static str> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty address");
    }

    let addr = match input.strip_suffix('>') {
        Some(rest) => {
            let open = rest.rfind('<').ok_or("missing '<' in angle address")?;
            let name = rest[..open].trim();
            if !name.is_empty() && !DISPLAY_NAME.is_match(name) {
                return Err("invalid display name");
            }
            &rest[open + 1..]
        }
        None => input,
    };

    if !addr.contains('@') {
        return Err("missing '@' in address");
    }
    if ADDR_SPEC.is_match(addr) {
        Ok(addr)
    } else {
        Err("address is not RFC 5322 compliant")
    }
}
