//! Canonical forms for extracted values.
//!
//! Every function here is pure: `(field, raw value) -> canonical text`. A
//! value that cannot be brought into canonical form is dropped rather than
//! stored half-parsed.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use super::base::{collapse_whitespace, ExtractionResult, RawEntry, RawValue};
use crate::storage::types::{FieldValues, PlayerField};

static RE_BIRTHDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").unwrap());
static RE_AGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\s*(\d+)\s*\)").unwrap());
static RE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());
static RE_YEAR_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{4})(?:\s*-\s*(?:\d{4}|current))?").unwrap());
static RE_FEET_INCHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\d+)\s*'\s*(\d+)?\s*"?"#).unwrap());
static RE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());
static RE_WEIGHT_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d\s*(?:kg|lbs?)\b").unwrap());

pub fn normalize(field: PlayerField, raw: &RawValue) -> Option<String> {
    let value = match (field, raw) {
        (PlayerField::Highlights, RawValue::Entries(entries)) => highlights(entries),
        (PlayerField::History, RawValue::Entries(entries)) => history(entries),
        (_, RawValue::Entries(_)) => None,
        (field, RawValue::Text(text)) => normalize_text(field, text),
    };
    value.filter(|v| !v.trim().is_empty())
}

fn normalize_text(field: PlayerField, text: &str) -> Option<String> {
    let text = collapse_whitespace(text);
    match field {
        PlayerField::Team => Some(team(&text)),
        PlayerField::Headshot => headshot(&text),
        PlayerField::Number => Some(text.trim_start_matches('#').trim().to_string()),
        PlayerField::Height => height(&text),
        PlayerField::Weight => weight(&text),
        PlayerField::Birthdate => birthdate(&text),
        PlayerField::Age => age(&text),
        PlayerField::Highlights | PlayerField::History => None,
        PlayerField::Position
        | PlayerField::Status
        | PlayerField::College
        | PlayerField::Birthplace
        | PlayerField::DraftInfo => Some(text),
    }
}

pub fn normalize_all(extracted: &ExtractionResult) -> FieldValues {
    extracted
        .iter()
        .filter_map(|(field, raw)| normalize(*field, raw).map(|value| (*field, value)))
        .collect()
}

/// `milwaukee-bucks` → `Milwaukee Bucks`. Existing capitals are kept, so
/// visible names such as `LA Clippers` pass through unchanged.
pub fn team(raw: &str) -> String {
    raw.split(|c: char| c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn headshot(raw: &str) -> Option<String> {
    let url = raw.trim();
    (!url.contains("default")).then(|| url.to_string())
}

/// Height in whole centimetres from the first segment of an `HT/WT` string.
pub fn height(raw: &str) -> Option<String> {
    let segment = raw.split(',').next()?.trim();
    let lower = segment.to_lowercase();

    if let Some(caps) = RE_FEET_INCHES.captures(segment) {
        let feet: f64 = caps[1].parse().ok()?;
        let inches: f64 = caps.get(2).map_or(Ok(0.0), |m| m.as_str().parse()).ok()?;
        return Some(format!("{}", ((feet * 12.0 + inches) * 2.54).round() as i64));
    }

    let value: f64 = RE_NUMBER.find(segment)?.as_str().parse().ok()?;
    let cm = if lower.contains("cm") {
        value
    } else if lower.contains('m') || value < 3.0 {
        value * 100.0
    } else {
        return None;
    };
    Some(format!("{}", cm.round() as i64))
}

/// Leading integer of the weight segment of an `HT/WT` string. Without a
/// comma the value must carry a `kg` or `lb` unit, so a bare height is
/// never read as a weight.
pub fn weight(raw: &str) -> Option<String> {
    let segment = match raw.split_once(',') {
        Some((_, weight)) => weight,
        None if RE_WEIGHT_UNIT.is_match(raw) => raw,
        None => return None,
    };
    let token = segment.split_whitespace().next()?;
    let digits: String = token.chars().take_while(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

/// `D/M/YYYY` → `YYYY-MM-DD`, rejecting impossible dates.
pub fn birthdate(raw: &str) -> Option<String> {
    let caps = RE_BIRTHDATE.captures(raw)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).map(|date| date.format("%Y-%m-%d").to_string())
}

/// Age from the parenthetical of a birthdate string, or a bare number.
pub fn age(raw: &str) -> Option<String> {
    if let Some(caps) = RE_AGE.captures(raw) {
        return Some(caps[1].to_string());
    }
    let trimmed = raw.trim();
    (!trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())).then(|| trimmed.to_string())
}

/// One `YEAR | Title` line per year an award was won, in source order.
pub fn highlights(entries: &[RawEntry]) -> Option<String> {
    let lines: Vec<String> = entries
        .iter()
        .flat_map(|entry| {
            RE_YEAR
                .find_iter(&entry.detail)
                .map(move |year| format!("{} | {}", year.as_str(), entry.label))
        })
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

/// One `StartYear | Team` line per stint.
pub fn history(entries: &[RawEntry]) -> Option<String> {
    let lines: Vec<String> = entries
        .iter()
        .filter_map(|entry| {
            let caps = RE_YEAR_RANGE.captures(&entry.detail)?;
            Some(format!("{} | {}", &caps[1], entry.label))
        })
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(field: PlayerField, raw: &str) -> Option<String> {
        normalize(field, &RawValue::Text(raw.to_string()))
    }

    #[test]
    fn test_height_and_weight_from_combined_string() {
        assert_eq!(text(PlayerField::Height, "2.11 m, 110 kg").as_deref(), Some("211"));
        assert_eq!(text(PlayerField::Weight, "2.11 m, 110 kg").as_deref(), Some("110"));
        assert_eq!(text(PlayerField::Height, "1.98 m, 95 kg").as_deref(), Some("198"));
    }

    #[test]
    fn test_height_other_units() {
        assert_eq!(height("6' 11\", 243 lbs").as_deref(), Some("211"));
        assert_eq!(height("211 cm").as_deref(), Some("211"));
        assert_eq!(height("tall"), None);
    }

    #[test]
    fn test_weight_without_comma() {
        assert_eq!(weight("243 lbs").as_deref(), Some("243"));
        assert_eq!(weight("110 kg").as_deref(), Some("110"));
        assert_eq!(weight("110kg").as_deref(), Some("110"));
        assert_eq!(weight("heavy"), None);
    }

    #[test]
    fn test_height_alone_is_not_a_weight() {
        assert_eq!(weight("2.11 m"), None);
        assert_eq!(weight("211 cm"), None);

        let mut extracted = ExtractionResult::default();
        extracted.insert(PlayerField::Height, RawValue::Text("2.11 m".to_string()));
        extracted.insert(PlayerField::Weight, RawValue::Text("2.11 m".to_string()));
        let values = normalize_all(&extracted);

        assert_eq!(values.get(&PlayerField::Height).map(String::as_str), Some("211"));
        assert!(!values.contains_key(&PlayerField::Weight));
    }

    #[test]
    fn test_birthdate_and_age() {
        assert_eq!(
            text(PlayerField::Birthdate, "6/12/1994 (31)").as_deref(),
            Some("1994-12-06")
        );
        assert_eq!(text(PlayerField::Age, "6/12/1994 (31)").as_deref(), Some("31"));
        assert_eq!(text(PlayerField::Age, "6/12/1994 ( 31 )").as_deref(), Some("31"));
        assert_eq!(text(PlayerField::Age, "29").as_deref(), Some("29"));
        assert_eq!(text(PlayerField::Birthdate, "31/2/1994 (31)"), None);
    }

    #[test]
    fn test_team_title_case() {
        assert_eq!(team("milwaukee-bucks"), "Milwaukee Bucks");
        assert_eq!(team("LA Clippers"), "LA Clippers");
        assert_eq!(team("philadelphia-76ers"), "Philadelphia 76ers");
    }

    #[test]
    fn test_number_strips_prefix() {
        assert_eq!(text(PlayerField::Number, "#34").as_deref(), Some("34"));
        assert_eq!(text(PlayerField::Number, "#"), None);
    }

    #[test]
    fn test_default_headshot_rejected() {
        assert_eq!(
            text(PlayerField::Headshot, "https://a.espncdn.com/i/headshots/nophoto/default.png"),
            None
        );
    }

    #[test]
    fn test_highlights_one_line_per_year() {
        let raw = RawValue::Entries(vec![RawEntry::new("All-Star", "2023, 2022")]);
        assert_eq!(
            normalize(PlayerField::Highlights, &raw).unwrap().lines().collect::<Vec<_>>(),
            vec!["2023 | All-Star", "2022 | All-Star"]
        );
    }

    #[test]
    fn test_highlights_preserve_repeats_across_entries() {
        let raw = RawValue::Entries(vec![
            RawEntry::new("NBA Champion", "2021"),
            RawEntry::new("All-NBA 1st Team", "2020, 2019"),
            RawEntry::new("No years", ""),
        ]);
        assert_eq!(
            normalize(PlayerField::Highlights, &raw).unwrap(),
            "2021 | NBA Champion\n2020 | All-NBA 1st Team\n2019 | All-NBA 1st Team"
        );
    }

    #[test]
    fn test_history_uses_start_year() {
        let raw = RawValue::Entries(vec![
            RawEntry::new("Bucks", "2019-CURRENT"),
            RawEntry::new("Thunder", "2008-2016"),
            RawEntry::new("Sonics", "2007"),
            RawEntry::new("Unknown", "n/a"),
        ]);
        assert_eq!(
            normalize(PlayerField::History, &raw).unwrap(),
            "2019 | Bucks\n2008 | Thunder\n2007 | Sonics"
        );
    }

    #[test]
    fn test_shape_mismatch_is_dropped() {
        let raw = RawValue::Entries(vec![RawEntry::new("x", "2020")]);
        assert_eq!(normalize(PlayerField::Team, &raw), None);
        assert_eq!(text(PlayerField::History, "2019 | Bucks"), None);
    }
}
