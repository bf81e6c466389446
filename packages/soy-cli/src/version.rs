//! Version information for the `soyc` binary.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version_string() -> String {
    format!("soyc {VERSION}")
}
