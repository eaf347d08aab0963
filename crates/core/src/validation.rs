//! Parsing of raw form input into typed values.
//!
//! Every parser returns a `Result`; callers decide the fallback (the item
//! form treats bad points as `0`, the army screen keeps the previous model
//! count).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{error::ValidationError, models::Enhancement};

/// Parse a non-negative point value.
pub fn parse_points(input: &str) -> Result<u32, ValidationError> {
    input
        .trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidPoints(input.trim().to_string()))
}

/// Parse a positive model count.
pub fn parse_model_count(input: &str) -> Result<u32, ValidationError> {
    match input.trim().parse::<u32>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ValidationError::InvalidModelCount(input.trim().to_string())),
    }
}

/// Parse the enhancement field, e.g. `Power Sword=10; Storm Shield: 15`.
pub fn parse_enhancements(input: &str) -> Result<Vec<Enhancement>, ValidationError> {
    static ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(?P<name>.*?)\s*[=:]\s*(?P<points>\S+)$").expect("invalid enhancement regex")
    });

    input
        .split(|ch| ch == ';' || ch == '\n')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let caps = ENTRY_RE
                .captures(part)
                .ok_or_else(|| ValidationError::MalformedEnhancement(part.to_string()))?;
            let name = caps["name"].trim();
            if name.is_empty() {
                return Err(ValidationError::EmptyEnhancementName);
            }
            let points = parse_points(&caps["points"])?;
            Ok(Enhancement::new(name, points))
        })
        .collect()
}

/// Inverse of [`parse_enhancements`], used to pre-fill edit forms.
pub fn format_enhancements(enhancements: &[Enhancement]) -> String {
    enhancements
        .iter()
        .map(|enhancement| format!("{}={}", enhancement.name, enhancement.points))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_reject_garbage() {
        assert_eq!(parse_points(" 120 "), Ok(120));
        assert_eq!(parse_points("0"), Ok(0));
        assert!(parse_points("abc").is_err());
        assert!(parse_points("-5").is_err());
        assert!(parse_points("").is_err());
        assert_eq!(parse_points("abc").unwrap_or(0), 0);
    }

    #[test]
    fn model_count_must_be_positive() {
        assert_eq!(parse_model_count("2"), Ok(2));
        assert_eq!(
            parse_model_count("0"),
            Err(ValidationError::InvalidModelCount("0".to_string()))
        );
        assert!(parse_model_count("two").is_err());
        assert!(parse_model_count("-1").is_err());
    }

    #[test]
    fn enhancement_field_round_trips() {
        let parsed = parse_enhancements("Power Sword=10; Storm Shield: 15\n\n").unwrap();
        assert_eq!(
            parsed,
            vec![
                Enhancement::new("Power Sword", 10),
                Enhancement::new("Storm Shield", 15)
            ]
        );
        assert_eq!(
            format_enhancements(&parsed),
            "Power Sword=10; Storm Shield=15"
        );
        assert_eq!(parse_enhancements("  ").unwrap(), Vec::new());
    }

    #[test]
    fn enhancement_field_errors() {
        assert_eq!(
            parse_enhancements("Power Sword"),
            Err(ValidationError::MalformedEnhancement("Power Sword".to_string()))
        );
        assert_eq!(
            parse_enhancements("=10"),
            Err(ValidationError::EmptyEnhancementName)
        );
        assert!(matches!(
            parse_enhancements("Sword=ten"),
            Err(ValidationError::InvalidPoints(_))
        ));
    }
}
