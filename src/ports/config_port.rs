//! Configuration access port.

/// Key/value access to a sectioned configuration source.
///
/// Section and key lookups are case-insensitive.
pub trait ConfigPort {
    /// The raw value, `Some("")` for a key with a blank value. Typed reading
    /// and validation happen in the domain.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
