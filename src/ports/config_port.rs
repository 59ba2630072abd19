//! Configuration access port trait.

/// Raw key lookup. Typed parsing and validation live in
/// `domain::config_validation`, so malformed values surface as errors rather
/// than defaults.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
