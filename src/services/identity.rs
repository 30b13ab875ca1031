//! Device identifier derivation
//!
//! Turns a human device name ("Jürgen's iPhone") into an identifier that is
//! safe to use in MQTT topics and Home Assistant entity ids
//! ("findmy_jurgens_iphone").

/// Namespace prefix of every derived identifier
pub const DEVICE_ID_PREFIX: &str = "findmy_";

/// Derive a stable identifier from a device name
///
/// Distinct names can collide (e.g. "A-B" and "A B"); that is accepted.
pub fn device_id(name: &str) -> String {
    let separated: String =
        name.chars().map(|c| if c.is_whitespace() || c == '-' { '_' } else { c }).collect();
    let ascii = deunicode::deunicode(&separated).to_lowercase();
    let sub: String = ascii.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_').collect();
    format!("{}{}", DEVICE_ID_PREFIX, sub)
}
