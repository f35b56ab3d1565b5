//! Core domain types for PAR2 operations.
//!
//! Kept as a separate module so it stays trivially reusable without pulling
//! in `checksum.rs`'s hashing dependencies.

/// Type-safe wrapper for CRC32 checksum values.
/// Prevents mixing CRC values with other u32 values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crc32Value(u32);

impl Crc32Value {
    pub fn new(value: u32) -> Self {
        Crc32Value(value)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for Crc32Value {
    fn from(value: u32) -> Self {
        Crc32Value::new(value)
    }
}

impl PartialEq<u32> for Crc32Value {
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

impl PartialEq<Crc32Value> for u32 {
    fn eq(&self, other: &Crc32Value) -> bool {
        *self == other.0
    }
}

impl std::fmt::Display for Crc32Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_against_raw_u32_either_direction() {
        let crc = Crc32Value::new(42);
        assert_eq!(crc, 42u32);
        assert_eq!(42u32, crc);
    }

    #[test]
    fn displays_as_lowercase_hex() {
        assert_eq!(Crc32Value::new(0xcbf4_3926).to_string(), "cbf43926");
    }
}
