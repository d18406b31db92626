//! Byte-size configuration values

use crate::error::ConversionError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

const TYPE_NAME: &str = "memory size";

/// Memory units from largest to smallest, with their accepted spellings.
/// The second spelling is the one used when formatting.
const UNITS: &[(u64, &[&str])] = &[
    (1 << 40, &["t", "tb", "tebibytes"]),
    (1 << 30, &["g", "gb", "gibibytes"]),
    (1 << 20, &["m", "mb", "mebibytes"]),
    (1 << 10, &["k", "kb", "kibibytes"]),
    (1, &["b", "bytes"]),
];

/// A number of bytes, parsed from literals such as `64 mb` or `512k`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MemorySize(u64);

impl MemorySize {
    pub const ZERO: MemorySize = MemorySize(0);

    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn from_kibibytes(kibibytes: u64) -> Self {
        Self(kibibytes << 10)
    }

    pub const fn from_mebibytes(mebibytes: u64) -> Self {
        Self(mebibytes << 20)
    }

    pub const fn as_bytes(&self) -> u64 {
        self.0
    }

    pub const fn as_kibibytes(&self) -> u64 {
        self.0 >> 10
    }

    pub const fn as_mebibytes(&self) -> u64 {
        self.0 >> 20
    }

    /// Parse a byte-size literal: a number followed by an optional unit
    pub fn parse(text: &str) -> Result<Self, ConversionError> {
        let trimmed = text.trim();
        let digits_end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(digits_end);

        if number.is_empty() {
            return Err(ConversionError::parse(
                text,
                TYPE_NAME,
                "text does not start with a number",
            ));
        }

        let value: u64 = number.parse().map_err(|_| {
            ConversionError::parse(text, TYPE_NAME, "number does not fit into 64 bits")
        })?;

        let unit = unit.trim().to_lowercase();
        let multiplier = if unit.is_empty() {
            1
        } else {
            UNITS
                .iter()
                .find(|(_, names)| names.contains(&unit.as_str()))
                .map(|(multiplier, _)| *multiplier)
                .ok_or_else(|| {
                    ConversionError::parse(
                        text,
                        TYPE_NAME,
                        format!(
                            "unknown unit '{}', expected one of: b, k, m, g, t (optionally followed by b)",
                            unit
                        ),
                    )
                })?
        };

        value
            .checked_mul(multiplier)
            .map(Self)
            .ok_or_else(|| ConversionError::overflow(text.trim(), TYPE_NAME))
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("0 bytes");
        }

        let (multiplier, names) = UNITS
            .iter()
            .find(|(multiplier, _)| self.0 % multiplier == 0)
            .unwrap_or(&UNITS[UNITS.len() - 1]);
        write!(f, "{} {}", self.0 / multiplier, names[1])
    }
}

impl FromStr for MemorySize {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for MemorySize {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

impl Serialize for MemorySize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MemorySize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MemorySizeVisitor;

        impl de::Visitor<'_> for MemorySizeVisitor {
            type Value = MemorySize;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a byte count or a memory size literal such as \"64 mb\"")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<MemorySize, E> {
                Ok(MemorySize(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<MemorySize, E> {
                u64::try_from(value)
                    .map(MemorySize)
                    .map_err(|_| E::custom("memory size cannot be negative"))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<MemorySize, E> {
                MemorySize::parse(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(MemorySizeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(MemorySize::parse("512").unwrap().as_bytes(), 512);
        assert_eq!(MemorySize::parse("1b").unwrap().as_bytes(), 1);
        assert_eq!(MemorySize::parse("64 kb").unwrap().as_bytes(), 64 * 1024);
        assert_eq!(MemorySize::parse("64k").unwrap().as_kibibytes(), 64);
        assert_eq!(MemorySize::parse("  128 MB ").unwrap().as_mebibytes(), 128);
        assert_eq!(MemorySize::parse("2 gibibytes").unwrap().as_bytes(), 2 << 30);
        assert_eq!(MemorySize::parse("1t").unwrap().as_bytes(), 1 << 40);
    }

    #[test]
    fn test_parse_errors() {
        assert!(MemorySize::parse("").unwrap_err().is_parse());
        assert!(MemorySize::parse("mb").unwrap_err().is_parse());
        assert!(MemorySize::parse("-1 mb").unwrap_err().is_parse());
        assert!(MemorySize::parse("12 parsecs").unwrap_err().is_parse());
        assert!(MemorySize::parse("99999999999999999999").unwrap_err().is_parse());
        assert!(MemorySize::parse("16777216 tb").unwrap_err().is_overflow());
    }

    #[test]
    fn test_display_uses_highest_exact_unit() {
        assert_eq!(MemorySize::ZERO.to_string(), "0 bytes");
        assert_eq!(MemorySize::from_bytes(1000).to_string(), "1000 bytes");
        assert_eq!(MemorySize::from_kibibytes(1536).to_string(), "1536 kb");
        assert_eq!(MemorySize::from_mebibytes(2048).to_string(), "2 gb");
    }

    #[test]
    fn test_display_parses_back() {
        for bytes in [0, 1, 1023, 1024, 3 << 20, (5 << 40) + 1024] {
            let size = MemorySize::from_bytes(bytes);
            assert_eq!(MemorySize::parse(&size.to_string()).unwrap(), size);
        }
    }

    #[test]
    fn test_serde() {
        let size: MemorySize = serde_json::from_str("\"4 mb\"").unwrap();
        assert_eq!(size, MemorySize::from_mebibytes(4));
        let size: MemorySize = serde_json::from_str("2048").unwrap();
        assert_eq!(size, MemorySize::from_kibibytes(2));
        assert_eq!(serde_json::to_string(&size).unwrap(), "\"2 kb\"");
    }
}
