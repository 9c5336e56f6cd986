use regex::Regex;
use std::sync::OnceLock;

/// The canonical `billnumber_version` regex: congress, stage, number, and an
/// optional version. When absent, callers should treat the version as `ih`.
pub const BILL_NUMBER_PART_REGEX: &str =
    r"(?P<congress>[1-9][0-9]*)(?P<stage>[a-z]+)(?P<number>[0-9]+)(?P<version>[a-z]+)?";

fn compiled_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(BILL_NUMBER_PART_REGEX).expect("static regex is valid"))
}

/// The parts of a `billnumber_version` string, e.g. `"117hr200ih"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillnumberVersionParts {
    /// `<congress><stage><number>`, e.g. `"117hr200"`.
    pub billnumber: String,
    pub congress: String,
    pub stage: String,
    pub number: String,
    /// Defaults to `"ih"` when the source string has no trailing version.
    pub version: String,
}

/// Splits a `billnumber_version` string into its parts.
///
/// Returns `None` when the string does not match [`BILL_NUMBER_PART_REGEX`].
/// A missing version segment defaults to `"ih"`.
#[must_use]
pub fn parse_billnumber_version(billnumber_version: &str) -> Option<BillnumberVersionParts> {
    let captures = compiled_regex().captures(billnumber_version)?;
    let congress = captures.name("congress")?.as_str().to_string();
    let stage = captures.name("stage")?.as_str().to_string();
    let number = captures.name("number")?.as_str().to_string();
    let version = captures
        .name("version")
        .map(|m| m.as_str().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "ih".to_string());

    Some(BillnumberVersionParts {
        billnumber: format!("{congress}{stage}{number}"),
        congress,
        stage,
        number,
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_identifier() {
        let parts = parse_billnumber_version("117hr200ih").unwrap();
        assert_eq!(parts.billnumber, "117hr200");
        assert_eq!(parts.congress, "117");
        assert_eq!(parts.stage, "hr");
        assert_eq!(parts.number, "200");
        assert_eq!(parts.version, "ih");
    }

    #[test]
    fn missing_version_defaults_to_ih() {
        let parts = parse_billnumber_version("117hr200").unwrap();
        assert_eq!(parts.version, "ih");
    }

    #[test]
    fn malformed_identifier_returns_none() {
        assert!(parse_billnumber_version("not-a-bill").is_none());
    }
}
