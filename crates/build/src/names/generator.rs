//! Short identifier generation.

const UPPER_CASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const UPPER_CASE_CONTINUATION: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ_";
const LOWER_AND_UPPER: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const GENERAL_CONTINUATION: &str = "_0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Enumerates names in a mixed-radix counter: the first character comes from one alphabet and
/// every following character from another.
///
/// The most significant position is never zero, so every index maps to a distinct name.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    first: &'static [u8],
    continuation: &'static [u8],
    index: u64,
}

impl NameGenerator {
    pub const fn new(first: &'static str, continuation: &'static str) -> Self {
        Self {
            first: first.as_bytes(),
            continuation: continuation.as_bytes(),
            index: 0,
        }
    }

    /// Generator for ordinary identifiers
    ///
    /// Names never begin with `_`, so hand-written code may use `_`-prefixed names freely.
    pub const fn general() -> Self {
        Self::new(LOWER_AND_UPPER, GENERAL_CONTINUATION)
    }

    /// Generator for stable-export identifiers
    ///
    /// HLSL semantics are case-insensitive and may give digits a meaning, so these names use
    /// upper-case letters and `_` only.
    pub const fn upper_case() -> Self {
        Self::new(UPPER_CASE, UPPER_CASE_CONTINUATION)
    }

    /// Returns the name at position `index` without advancing
    pub fn name_at(&self, index: u64) -> String {
        let first_radix = self.first.len() as u64;
        let continuation_radix = self.continuation.len() as u64;

        let mut name = String::new();
        name.push(char::from(self.first[(index % first_radix) as usize]));
        let mut rest = index / first_radix;
        while rest > 0 {
            name.push(char::from(self.continuation[(rest % continuation_radix) as usize]));
            rest /= continuation_radix;
        }
        name
    }
}

impl Iterator for NameGenerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let name = self.name_at(self.index);
        self.index += 1;
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_general_sequence() {
        let names: Vec<_> = NameGenerator::general().take(54).collect();
        assert_eq!(names[0], "a");
        assert_eq!(names[25], "z");
        assert_eq!(names[26], "A");
        assert_eq!(names[51], "Z");
        // Second position starts at '0' because '_' is its zero digit.
        assert_eq!(names[52], "a0");
        assert_eq!(names[53], "b0");
    }

    #[test]
    fn test_upper_case_sequence_has_no_digits() {
        let names: Vec<_> = NameGenerator::upper_case().take(2000).collect();
        assert_eq!(names[0], "A");
        // 'A' is the zero digit of the continuation alphabet.
        assert_eq!(names[26], "AB");
        assert!(names.iter().all(|name| name.chars().all(|c| c.is_ascii_uppercase() || c == '_')));
        assert!(names.iter().all(|name| !name.starts_with('_')));
    }

    #[test]
    fn test_names_are_unique() {
        let names: Vec<_> = NameGenerator::general().take(10_000).collect();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert!(names.iter().all(|name| !name.starts_with('_')));
    }
}
