use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static PREFIXED_13: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^04B[0-9]{13}$").unwrap());
static DIGIT_ZRI_10: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]ZRI[0-9]{10}$").unwrap());

/// Number of trailing digits that make up a search key.
pub const SEARCH_KEY_LEN: usize = 7;

/// Identifier format a registry is checked against.
///
/// Unknown names deserialize to `PassThrough`, which accepts everything, so a
/// new format name in a config never breaks a run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModuleFormat {
    /// `04B` followed by 13 digits, e.g. `04B6481958134315`.
    #[default]
    Prefixed13,
    /// One digit, `ZRI`, then 10 digits, e.g. `6ZRI8911468998`.
    DigitZri10,
    PassThrough(String),
}

impl ModuleFormat {
    pub fn name(&self) -> &str {
        match self {
            Self::Prefixed13 => "prefixed_13",
            Self::DigitZri10 => "digit_zri_10",
            Self::PassThrough(name) => name,
        }
    }

    fn pattern(&self) -> Option<(&'static Regex, &'static str)> {
        match self {
            Self::Prefixed13 => Some((&*PREFIXED_13, "invalid format (expected 04B + 13 digits)")),
            Self::DigitZri10 => Some((
                &*DIGIT_ZRI_10,
                "invalid format (expected [digit]ZRI + 10 digits)",
            )),
            Self::PassThrough(_) => None,
        }
    }
}

impl From<String> for ModuleFormat {
    fn from(value: String) -> Self {
        let key = value.trim().to_ascii_lowercase().replace('-', "_");
        match key.as_str() {
            "prefixed_13" | "04b6481958134315" => Self::Prefixed13,
            "digit_zri_10" | "6zri8911468998" | "8zri9960014284" => Self::DigitZri10,
            _ => Self::PassThrough(value),
        }
    }
}

impl From<ModuleFormat> for String {
    fn from(value: ModuleFormat) -> Self {
        value.name().to_string()
    }
}

impl FromStr for ModuleFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of checking one raw identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid { canonical: String, search_key: String },
    Invalid { reason: String },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

fn is_cyrillic(c: char) -> bool {
    ('\u{0400}'..='\u{04FF}').contains(&c)
}

/// Normalize and check a raw module string against `format`.
pub fn validate(raw: &str, format: &ModuleFormat) -> ValidationOutcome {
    // Cyrillic "В" is the usual typo for Latin "B" in these identifiers.
    let replaced = raw.trim().replace('\u{0412}', "B");
    if replaced.chars().any(is_cyrillic) {
        return ValidationOutcome::Invalid {
            reason: "cyrillic forbidden".to_string(),
        };
    }

    let canonical = replaced.to_ascii_uppercase();
    if let Some((pattern, reason)) = format.pattern() {
        if !pattern.is_match(&canonical) {
            return ValidationOutcome::Invalid {
                reason: reason.to_string(),
            };
        }
    }

    let search_key = last_seven_digits(&canonical);
    ValidationOutcome::Valid {
        canonical,
        search_key,
    }
}

/// Matching key: the last seven ASCII digits, left-padded with '0'.
///
/// Strings without any digit are their own key (trimmed, not padded).
/// Distinct identifiers sharing a suffix collapse to one key.
pub fn last_seven_digits(s: &str) -> String {
    let digits: Vec<char> = s.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return s.trim().to_string();
    }
    let tail: String = digits[digits.len().saturating_sub(SEARCH_KEY_LEN)..].iter().collect();
    format!("{tail:0>width$}", width = SEARCH_KEY_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(raw: &str, format: &ModuleFormat) -> (String, String) {
        match validate(raw, format) {
            ValidationOutcome::Valid {
                canonical,
                search_key,
            } => (canonical, search_key),
            ValidationOutcome::Invalid { reason } => panic!("{raw:?} rejected: {reason}"),
        }
    }

    fn reason(raw: &str, format: &ModuleFormat) -> String {
        match validate(raw, format) {
            ValidationOutcome::Invalid { reason } => reason,
            other => panic!("{raw:?} accepted: {other:?}"),
        }
    }

    #[test]
    fn prefixed_13_valid() {
        let (canonical, key) = valid("04B6481958134315", &ModuleFormat::Prefixed13);
        assert_eq!(canonical, "04B6481958134315");
        assert_eq!(key, "8134315");
    }

    #[test]
    fn surrounding_whitespace_trimmed() {
        let (canonical, _) = valid("  04B6481958134315\t", &ModuleFormat::Prefixed13);
        assert_eq!(canonical, "04B6481958134315");
    }

    #[test]
    fn cyrillic_ve_substituted() {
        // Only upper-case Cyrillic VE is substituted.
        let (latin, latin_key) = valid("04B6481958134315", &ModuleFormat::Prefixed13);
        let (fixed, fixed_key) = valid("04\u{0412}6481958134315", &ModuleFormat::Prefixed13);
        assert_eq!(latin, fixed);
        assert_eq!(latin_key, fixed_key);
    }

    #[test]
    fn lower_case_latin_normalized() {
        let (canonical, _) = valid("04b6481958134315", &ModuleFormat::Prefixed13);
        assert_eq!(canonical, "04B6481958134315");
    }

    #[test]
    fn other_cyrillic_rejected() {
        assert_eq!(
            reason("04\u{0432}6481958134315", &ModuleFormat::Prefixed13),
            "cyrillic forbidden"
        );
        assert_eq!(
            reason("\u{0421}ZRI8911468998", &ModuleFormat::PassThrough("any".into())),
            "cyrillic forbidden"
        );
    }

    #[test]
    fn prefixed_13_wrong_shape() {
        for raw in ["04B648195813431", "04B64819581343155", "05B6481958134315", "04B648195813431X"] {
            assert!(reason(raw, &ModuleFormat::Prefixed13).contains("04B + 13 digits"), "{raw}");
        }
    }

    #[test]
    fn digit_zri_10() {
        let (canonical, key) = valid("6ZRI8911468998", &ModuleFormat::DigitZri10);
        assert_eq!(canonical, "6ZRI8911468998");
        assert_eq!(key, "1468998");
        let (canonical, _) = valid("8zri9960014284", &ModuleFormat::DigitZri10);
        assert_eq!(canonical, "8ZRI9960014284");
        assert!(reason("ZRI8911468998", &ModuleFormat::DigitZri10).contains("ZRI"));
        assert!(!validate("04B6481958134315", &ModuleFormat::DigitZri10).is_valid());
    }

    #[test]
    fn unicode_digits_do_not_satisfy_pattern() {
        // Arabic-Indic digits are \d in Unicode regexes but not module digits.
        let raw = "04B\u{0661}\u{0662}\u{0663}4567890123";
        assert!(!validate(raw, &ModuleFormat::Prefixed13).is_valid());
    }

    #[test]
    fn pass_through_accepts_anything() {
        let format = ModuleFormat::from("future_format".to_string());
        assert_eq!(format, ModuleFormat::PassThrough("future_format".into()));
        let (canonical, key) = valid("abc-12", &format);
        assert_eq!(canonical, "ABC-12");
        assert_eq!(key, "0000012");
    }

    #[test]
    fn format_names_and_aliases() {
        assert_eq!("prefixed_13".parse::<ModuleFormat>().unwrap(), ModuleFormat::Prefixed13);
        assert_eq!("Prefixed-13".parse::<ModuleFormat>().unwrap(), ModuleFormat::Prefixed13);
        assert_eq!("04B6481958134315".parse::<ModuleFormat>().unwrap(), ModuleFormat::Prefixed13);
        assert_eq!("8ZRI9960014284".parse::<ModuleFormat>().unwrap(), ModuleFormat::DigitZri10);
        assert_eq!(ModuleFormat::DigitZri10.to_string(), "digit_zri_10");
    }

    #[test]
    fn last_seven_of_long_identifier() {
        assert_eq!(last_seven_digits("04B6481958134315000"), "4315000");
        assert_eq!(last_seven_digits("...134315000"), "4315000");
        assert_eq!(last_seven_digits("SN-8134315-X"), "8134315");
    }

    #[test]
    fn last_seven_pads_short_runs() {
        assert_eq!(last_seven_digits("A12"), "0000012");
        assert_eq!(last_seven_digits("1-2-3"), "0000123");
    }

    #[test]
    fn last_seven_without_digits_is_identity() {
        assert_eq!(last_seven_digits("  Kitchen "), "Kitchen");
        assert_eq!(last_seven_digits(""), "");
    }

    #[test]
    fn shared_suffix_collides() {
        assert_eq!(
            last_seven_digits("04B1111118134315"),
            last_seven_digits("04B2222228134315")
        );
    }
}
