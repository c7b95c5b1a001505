//! Line validity rules
//!
//! A [`RuleSet`] holds the enabled predicates (length bounds, character-class
//! minimums, an optional regex) and classifies single lines against them.
//! Character classes and the pattern are prepared once at construction, so
//! classification is a table lookup per byte.

use crate::error::{FilterError, Result};
use regex::bytes::Regex;

/// Kinds of rule a line can be rejected by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    MinLength,
    MaxLength,
    MinLowercase,
    MinUppercase,
    MinDigits,
    MinSpecialChars,
    Pattern,
}

impl RuleKind {
    /// All kinds, in evaluation order
    pub const ALL: [RuleKind; 7] = [
        RuleKind::MinLength,
        RuleKind::MaxLength,
        RuleKind::MinLowercase,
        RuleKind::MinUppercase,
        RuleKind::MinDigits,
        RuleKind::MinSpecialChars,
        RuleKind::Pattern,
    ];

    /// Position in [`RuleKind::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::MinLength => "min length",
            Self::MaxLength => "max length",
            Self::MinLowercase => "min lowercase",
            Self::MinUppercase => "min uppercase",
            Self::MinDigits => "min digits",
            Self::MinSpecialChars => "min special chars",
            Self::Pattern => "pattern",
        }
    }
}

/// Outcome of classifying one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Every active rule passed
    Accepted,
    /// The first rule that failed; later rules were not evaluated
    Rejected(RuleKind),
    /// Zero-length line, never evaluated
    Skipped,
}

impl Classification {
    #[inline]
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Raw rule thresholds. A value of 0 disables the rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleConfig {
    pub min_length: usize,
    pub max_length: usize,
    pub min_lowercase: usize,
    pub min_uppercase: usize,
    pub min_digits: usize,
    pub min_special: usize,
    /// Regex every accepted line must match
    pub pattern: Option<String>,
}

/// A prepared character class.
///
/// ASCII membership is a lookup table. A non-ASCII character, or a single byte
/// that is not part of valid UTF-8, is a member only if the class was built as
/// a complement.
#[derive(Debug, Clone)]
pub struct CharClass {
    ascii: [bool; 128],
    non_ascii: bool,
}

impl CharClass {
    fn from_ranges(ranges: &[(u8, u8)]) -> Self {
        let mut ascii = [false; 128];
        for &(start, end) in ranges {
            for b in start..=end {
                ascii[b as usize] = true;
            }
        }
        Self { ascii, non_ascii: false }
    }

    fn complement(mut self) -> Self {
        for member in self.ascii.iter_mut() {
            *member = !*member;
        }
        self.non_ascii = !self.non_ascii;
        self
    }

    /// `[a-z]`
    pub fn lowercase() -> Self {
        Self::from_ranges(&[(b'a', b'z')])
    }

    /// `[A-Z]`
    pub fn uppercase() -> Self {
        Self::from_ranges(&[(b'A', b'Z')])
    }

    /// `[0-9]`
    pub fn digits() -> Self {
        Self::from_ranges(&[(b'0', b'9')])
    }

    /// `[^A-Za-z0-9]`
    pub fn special() -> Self {
        Self::from_ranges(&[(b'a', b'z'), (b'A', b'Z'), (b'0', b'9')]).complement()
    }

    #[inline]
    fn contains(&self, c: char) -> bool {
        if c.is_ascii() {
            self.ascii[c as usize]
        } else {
            self.non_ascii
        }
    }

    /// Count members of this class in `line`.
    ///
    /// Invalid UTF-8 is counted one byte at a time.
    #[inline]
    pub fn count(&self, line: &[u8]) -> usize {
        if line.is_ascii() {
            return line.iter().filter(|&&b| self.ascii[b as usize]).count();
        }

        let mut count = 0;
        let mut rest = line;
        while !rest.is_empty() {
            let (decoded, size) = bstr::decode_utf8(rest);
            match decoded {
                Some(c) => {
                    count += self.contains(c) as usize;
                    rest = &rest[size..];
                }
                None => {
                    count += self.non_ascii as usize;
                    rest = &rest[1..];
                }
            }
        }
        count
    }
}

#[derive(Debug, Clone)]
enum Check {
    MinLength(usize),
    MaxLength(usize),
    Class {
        kind: RuleKind,
        class: CharClass,
        min: usize,
    },
}

/// Immutable set of enabled rules.
///
/// Shared by reference across every worker; it is never mutated after
/// [`RuleSet::new`] returns.
#[derive(Debug, Clone)]
pub struct RuleSet {
    checks: Vec<Check>,
    pattern: Option<Regex>,
}

impl RuleSet {
    /// Validate `config` and prepare its rules.
    pub fn new(config: &RuleConfig) -> Result<Self> {
        if config.max_length > 0 && config.min_length > config.max_length {
            return Err(FilterError::InvalidLengthRange {
                min: config.min_length,
                max: config.max_length,
            });
        }

        let mut checks = Vec::new();

        if config.min_length > 0 {
            checks.push(Check::MinLength(config.min_length));
        }
        if config.max_length > 0 {
            checks.push(Check::MaxLength(config.max_length));
        }

        let classes = [
            (RuleKind::MinLowercase, config.min_lowercase, CharClass::lowercase()),
            (RuleKind::MinUppercase, config.min_uppercase, CharClass::uppercase()),
            (RuleKind::MinDigits, config.min_digits, CharClass::digits()),
            (RuleKind::MinSpecialChars, config.min_special, CharClass::special()),
        ];
        for (kind, min, class) in classes {
            if min > 0 {
                checks.push(Check::Class { kind, class, min });
            }
        }

        let pattern = match config.pattern.as_deref() {
            Some(p) if !p.is_empty() => {
                let regex = Regex::new(p).map_err(|source| FilterError::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })?;
                Some(regex)
            }
            _ => None,
        };

        Ok(Self { checks, pattern })
    }

    /// Classify one line. Length is measured in bytes.
    #[inline]
    pub fn classify(&self, line: &[u8]) -> Classification {
        if line.is_empty() {
            return Classification::Skipped;
        }

        for check in &self.checks {
            let passed = match check {
                Check::MinLength(min) => line.len() >= *min,
                Check::MaxLength(max) => line.len() <= *max,
                Check::Class { class, min, .. } => class.count(line) >= *min,
            };
            if !passed {
                return Classification::Rejected(check.kind());
            }
        }

        if let Some(ref pattern) = self.pattern {
            if !pattern.is_match(line) {
                return Classification::Rejected(RuleKind::Pattern);
            }
        }

        Classification::Accepted
    }

    /// Active rule kinds, in evaluation order
    pub fn kinds(&self) -> Vec<RuleKind> {
        let mut kinds: Vec<_> = self.checks.iter().map(Check::kind).collect();
        if self.pattern.is_some() {
            kinds.push(RuleKind::Pattern);
        }
        kinds
    }
}

impl Check {
    fn kind(&self) -> RuleKind {
        match self {
            Check::MinLength(_) => RuleKind::MinLength,
            Check::MaxLength(_) => RuleKind::MaxLength,
            Check::Class { kind, .. } => *kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(config: RuleConfig) -> RuleSet {
        RuleSet::new(&config).unwrap()
    }

    fn accepts(set: &RuleSet, line: &[u8]) -> bool {
        set.classify(line).is_accepted()
    }

    #[test]
    fn test_no_rules_accepts_non_empty() {
        let set = rules(RuleConfig::default());

        assert!(set.kinds().is_empty());
        assert!(accepts(&set, b"x"));
        assert!(accepts(&set, b"  "));
        assert_eq!(set.classify(b""), Classification::Skipped);
    }

    #[test]
    fn test_min_length_boundary() {
        let set = rules(RuleConfig { min_length: 8, ..Default::default() });

        assert!(!accepts(&set, b"passwor"));  // 7
        assert!(accepts(&set, b"password"));  // 8
        assert!(accepts(&set, b"password1")); // 9
        assert_eq!(set.classify(b"pass"), Classification::Rejected(RuleKind::MinLength));
    }

    #[test]
    fn test_max_length() {
        let set = rules(RuleConfig { max_length: 4, ..Default::default() });

        assert!(accepts(&set, b"pass"));
        assert_eq!(set.classify(b"passw"), Classification::Rejected(RuleKind::MaxLength));
    }

    #[test]
    fn test_min_greater_than_max_is_error() {
        let err = RuleSet::new(&RuleConfig {
            min_length: 5,
            max_length: 3,
            ..Default::default()
        })
        .unwrap_err();

        assert!(matches!(err, FilterError::InvalidLengthRange { min: 5, max: 3 }));
        assert!(err.is_config());
    }

    #[test]
    fn test_min_without_max_is_valid() {
        assert!(RuleSet::new(&RuleConfig { min_length: 50, ..Default::default() }).is_ok());
        assert!(RuleSet::new(&RuleConfig { min_length: 3, max_length: 3, ..Default::default() }).is_ok());
    }

    #[test]
    fn test_special_chars() {
        let set = rules(RuleConfig { min_special: 2, ..Default::default() });

        assert!(accepts(&set, b"a1!@"));
        assert!(!accepts(&set, b"abc123"));
        assert!(!accepts(&set, b"ABCDEF"));
        assert_eq!(set.classify(b""), Classification::Skipped);
    }

    #[test]
    fn test_character_class_counts() {
        let set = rules(RuleConfig {
            min_lowercase: 2,
            min_uppercase: 1,
            min_digits: 3,
            ..Default::default()
        });

        assert!(accepts(&set, b"abC123"));
        assert_eq!(set.classify(b"aBC123"), Classification::Rejected(RuleKind::MinLowercase));
        assert_eq!(set.classify(b"abc123"), Classification::Rejected(RuleKind::MinUppercase));
        assert_eq!(set.classify(b"abC12"), Classification::Rejected(RuleKind::MinDigits));
    }

    #[test]
    fn test_short_circuits_in_order() {
        let set = rules(RuleConfig {
            min_length: 10,
            min_digits: 1,
            ..Default::default()
        });

        // Fails both; length is reported because it runs first
        assert_eq!(set.classify(b"abc"), Classification::Rejected(RuleKind::MinLength));
    }

    #[test]
    fn test_non_ascii_counts_as_special() {
        let set = rules(RuleConfig { min_special: 2, ..Default::default() });

        // two characters, four bytes
        assert!(accepts(&set, "ëé".as_bytes()));
        // invalid UTF-8 bytes count one each
        assert!(accepts(&set, &[b'a', 0xff, 0xfe]));
        assert!(!accepts(&set, "aë".as_bytes()));
    }

    #[test]
    fn test_truncated_sequence_counts_each_byte() {
        let two = rules(RuleConfig { min_special: 2, ..Default::default() });
        let three = rules(RuleConfig { min_special: 3, ..Default::default() });

        // E2 82 is the start of a three-byte character with its last byte cut off
        assert!(accepts(&two, &[b'a', 0xE2, 0x82]));
        assert!(!accepts(&three, &[b'a', 0xE2, 0x82]));

        // 'é' (one character) followed by a cut-off E9 A9
        let line = [b'x', 0xC3, 0xA9, 0xE9, 0xA9];
        assert!(accepts(&three, &line));
        assert_eq!(CharClass::special().count(&line), 3);
        assert_eq!(CharClass::lowercase().count(&line), 1);
    }

    #[test]
    fn test_length_is_bytes() {
        let set = rules(RuleConfig { max_length: 4, ..Default::default() });

        assert!(accepts(&set, "hëy".as_bytes()));   // 4 bytes
        assert!(!accepts(&set, "hëllo".as_bytes())); // 6 bytes
    }

    #[test]
    fn test_pattern_rule() {
        let set = rules(RuleConfig {
            min_length: 4,
            pattern: Some(r"^[a-z]+[0-9]+$".to_string()),
            ..Default::default()
        });

        assert!(accepts(&set, b"pass1234"));
        assert_eq!(set.classify(b"Pass1234"), Classification::Rejected(RuleKind::Pattern));
        assert_eq!(set.kinds(), vec![RuleKind::MinLength, RuleKind::Pattern]);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RuleSet::new(&RuleConfig {
            pattern: Some("[a-".to_string()),
            ..Default::default()
        })
        .unwrap_err();

        assert!(matches!(err, FilterError::InvalidPattern { .. }));
    }

    #[test]
    fn test_classify_is_repeatable() {
        let set = rules(RuleConfig { min_uppercase: 1, min_special: 1, ..Default::default() });

        for _ in 0..3 {
            assert!(accepts(&set, b"Hello!"));
            assert!(!accepts(&set, b"hello!"));
        }
    }

    #[test]
    fn test_char_class_count() {
        assert_eq!(CharClass::lowercase().count(b"aBcD"), 2);
        assert_eq!(CharClass::uppercase().count(b"aBcD"), 2);
        assert_eq!(CharClass::digits().count(b"a1b22"), 3);
        assert_eq!(CharClass::special().count(b"a b!c\t"), 3);
    }
}
