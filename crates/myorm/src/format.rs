//! Typed parsing of string column values.

use std::str::FromStr;

/// Parses a raw string value into typed values, falling back to a caller-supplied
/// default when the string is empty or does not parse.
///
/// ```
/// use myorm::Format;
///
/// assert_eq!(Format::new("42").int(0), 42);
/// assert_eq!(Format::new("abc").int(-1), -1);
/// assert!(Format::new("TRUE").bool(false));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Format<'a> {
    value: &'a str,
}

impl<'a> Format<'a> {
    pub fn new(value: &'a str) -> Self {
        Self { value }
    }

    /// The raw string.
    pub fn as_str(&self) -> &'a str {
        self.value
    }

    fn parse_or<T: FromStr>(&self, default: T) -> T {
        if self.value.is_empty() {
            return default;
        }
        self.value.parse().unwrap_or(default)
    }

    /// Single byte; the value must be exactly one byte long.
    pub fn byte(&self, default: u8) -> u8 {
        match self.value.as_bytes() {
            [b] => *b,
            _ => default,
        }
    }

    pub fn int(&self, default: i64) -> i64 {
        self.parse_or(default)
    }

    pub fn i8(&self, default: i8) -> i8 {
        self.parse_or(default)
    }

    pub fn i16(&self, default: i16) -> i16 {
        self.parse_or(default)
    }

    pub fn i32(&self, default: i32) -> i32 {
        self.parse_or(default)
    }

    pub fn i64(&self, default: i64) -> i64 {
        self.parse_or(default)
    }

    pub fn uint(&self, default: u64) -> u64 {
        self.parse_or(default)
    }

    pub fn u8(&self, default: u8) -> u8 {
        self.parse_or(default)
    }

    pub fn u16(&self, default: u16) -> u16 {
        self.parse_or(default)
    }

    pub fn u32(&self, default: u32) -> u32 {
        self.parse_or(default)
    }

    pub fn u64(&self, default: u64) -> u64 {
        self.parse_or(default)
    }

    pub fn f32(&self, default: f32) -> f32 {
        self.parse_or(default)
    }

    pub fn f64(&self, default: f64) -> f64 {
        self.parse_or(default)
    }

    /// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
    pub fn bool(&self, default: bool) -> bool {
        match self.value {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => true,
            "0" | "f" | "F" | "FALSE" | "false" | "False" => false,
            _ => default,
        }
    }

    /// The raw string, or `default` when empty.
    pub fn string(&self, default: &str) -> String {
        if self.value.is_empty() {
            default.to_string()
        } else {
            self.value.to_string()
        }
    }
}
