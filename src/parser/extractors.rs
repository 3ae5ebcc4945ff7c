use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use super::base::{Document, ExtractionResult, PageKind, RawValue};
use super::normalize::normalize;
use super::strategy::Strategy;
use crate::core::config::ConfigError;
use crate::http::PlayerPages;
use crate::storage::types::PlayerField;

const BIO_ITEMS: &str = ".PlayerHeader__Bio_List li, .player-bio li";
const TEAM_INFO_ITEMS: &str = ".PlayerHeader__Team_Info li";

/// Ordered extraction strategies per field; the first non-empty result wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyTable {
    fields: BTreeMap<PlayerField, Vec<Strategy>>,
}

impl Default for StrategyTable {
    fn default() -> Self {
        use PlayerField::*;

        let mut fields = BTreeMap::new();
        fields.insert(
            Team,
            vec![
                Strategy::link_slug("a[data-clubhouse-uid]", r"/name/[^/]+/([^/?#]+)"),
                Strategy::text("a[data-clubhouse-uid]"),
                Strategy::text(".PlayerHeader__Team a"),
            ],
        );
        fields.insert(
            Headshot,
            vec![
                Strategy::attr_containing("img", "src", "/i/headshots/"),
                Strategy::attr(".PlayerHeader__Headshot img, .Image__Wrapper img", "src"),
                Strategy::attr(r#"img[data-mptype="image"]"#, "src"),
            ],
        );
        fields.insert(
            Number,
            vec![
                Strategy::text(".PlayerHeader__Number"),
                Strategy::pattern(&format!("{TEAM_INFO_ITEMS}, {BIO_ITEMS}"), r"^#\s*\d+$"),
            ],
        );
        fields.insert(
            Position,
            vec![
                Strategy::text(".PlayerHeader__Position"),
                Strategy::labeled(BIO_ITEMS, "Position"),
                Strategy::pattern(
                    &format!("{TEAM_INFO_ITEMS}, {BIO_ITEMS}"),
                    r"^(?:[A-Z]{1,2}|Guard|Forward|Center|Point Guard|Shooting Guard|Small Forward|Power Forward)$",
                ),
            ],
        );
        fields.insert(
            Status,
            vec![
                Strategy::text(".TextStatus"),
                Strategy::text(".PlayerHeader__Status, .status-text"),
            ],
        );
        fields.insert(
            Height,
            vec![
                Strategy::labeled(BIO_ITEMS, "HT/WT"),
                Strategy::text(r#"[data-id="height"], .height-value"#),
                Strategy::pattern(BIO_ITEMS, r"\d+(?:\.\d+)?\s*m\s*,\s*\d+\s*kg"),
            ],
        );
        fields.insert(
            Weight,
            vec![
                Strategy::labeled(BIO_ITEMS, "HT/WT"),
                Strategy::text(r#"[data-id="weight"], .weight-value"#),
                Strategy::pattern(BIO_ITEMS, r"\d+(?:\.\d+)?\s*m\s*,\s*\d+\s*kg"),
            ],
        );
        fields.insert(
            Age,
            vec![
                Strategy::labeled(BIO_ITEMS, "Birthdate"),
                Strategy::labeled(BIO_ITEMS, "Age"),
            ],
        );
        fields.insert(
            Birthdate,
            vec![
                Strategy::labeled(BIO_ITEMS, "Birthdate"),
                Strategy::labeled(BIO_ITEMS, "Born"),
                Strategy::pattern(BIO_ITEMS, r"\d{1,2}/\d{1,2}/\d{4}(?:\s*\(\s*\d+\s*\))?"),
            ],
        );
        fields.insert(Birthplace, vec![Strategy::labeled(BIO_ITEMS, "Birthplace")]);
        fields.insert(DraftInfo, vec![Strategy::labeled(BIO_ITEMS, "Draft Info")]);
        fields.insert(
            College,
            vec![
                Strategy::labeled(BIO_ITEMS, "College"),
                Strategy::labeled(BIO_ITEMS, "School"),
                Strategy::text(r#"[data-id="college"], .college-value"#),
            ],
        );
        fields.insert(
            Highlights,
            vec![
                Strategy::entries(".Career__Highlights__Item", ".clr-black", ".clr-gray-05"),
                Strategy::entry_pattern(
                    ".player-awards li, .accolades li",
                    r"^(.+?)\s*\(([^)]*\d{4}[^)]*)\)$",
                ),
            ],
        );
        fields.insert(
            History,
            vec![
                Strategy::entries(".Career__History__Item", ".clr-black", ".clr-gray-05"),
                Strategy::entry_pattern(
                    ".career-history li, .team-history li",
                    r"^(.+?):?\s+(\d{4}.*)$",
                ),
            ],
        );

        Self { fields }
    }
}

impl StrategyTable {
    pub fn strategies(&self, field: PlayerField) -> &[Strategy] {
        self.fields.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn with_strategies(mut self, field: PlayerField, strategies: Vec<Strategy>) -> Self {
        self.fields.insert(field, strategies);
        self
    }

    /// Replaces the lists of the fields named in `json`; the others keep
    /// their current strategies.
    pub fn with_overrides_json(mut self, json: &str) -> Result<Self, ConfigError> {
        let overrides: BTreeMap<PlayerField, Vec<Strategy>> = serde_json::from_str(json)?;
        debug!("Overriding strategies for {} fields", overrides.len());
        self.fields.extend(overrides);
        Ok(self)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::StrategyFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::default().with_overrides_json(&json)
    }
}

/// Runs one field's strategies in order. Strategy errors are skipped, and so
/// is any value that does not normalize for the field, so a later strategy
/// still gets its turn.
pub fn extract_field(field: PlayerField, strategies: &[Strategy], doc: &Document) -> Option<RawValue> {
    for (index, strategy) in strategies.iter().enumerate() {
        match strategy.apply(doc) {
            Ok(Some(value)) if normalize(field, &value).is_some() => {
                trace!("{} matched by strategy #{}: {:?}", field, index, strategy);
                return Some(value);
            }
            Ok(Some(value)) => {
                trace!("{} strategy #{} found unusable value {:?}", field, index, value);
            }
            Ok(None) => {}
            Err(e) => debug!("Strategy #{} for {} failed: {}", index, field, e),
        }
    }
    None
}

pub fn extract_all(table: &StrategyTable, pages: &PlayerPages) -> ExtractionResult {
    extract_all_with(table, pages, extract_field)
}

/// Runs `extractor` for every field against the page that field lives on. A
/// panic inside the extractor only costs that field.
pub fn extract_all_with<F>(table: &StrategyTable, pages: &PlayerPages, extractor: F) -> ExtractionResult
where
    F: Fn(PlayerField, &[Strategy], &Document) -> Option<RawValue>,
{
    let profile = pages.profile.as_ref().map(Document::parse);
    let bio = pages.bio.as_ref().map(Document::parse);

    let mut result = ExtractionResult::default();
    for field in PlayerField::ALL {
        let doc = match field.page() {
            PageKind::Profile => profile.as_ref(),
            PageKind::Bio => bio.as_ref(),
        };
        let Some(doc) = doc else {
            continue;
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            extractor(field, table.strategies(field), doc)
        }));
        match outcome {
            Ok(Some(value)) => result.insert(field, value),
            Ok(None) => {}
            Err(_) => warn!("Extractor for {} failed, field skipped", field),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::PageSnapshot;
    use crate::parser::base::RawEntry;
    use crate::parser::normalize_all;
    use url::Url;

    const PROFILE: &str = r#"
        <div class="PlayerHeader">
          <div class="PlayerHeader__Image"><img src="https://a.espncdn.com/i/headshots/nba/players/full/3032977.png"></div>
          <ul class="PlayerHeader__Team_Info">
            <li><a data-clubhouse-uid="s:40~l:46~t:15" href="/nba/team/_/name/mil/milwaukee-bucks">Milwaukee</a></li>
            <li>#34</li>
            <li>F</li>
          </ul>
          <span class="TextStatus">Active</span>
          <div class="PlayerHeader__Bio">
            <ul class="PlayerHeader__Bio_List">
              <li><div class="ttu">HT/WT</div><div>2.11 m, 110 kg</div></li>
              <li><div class="ttu">Birthdate</div><div>6/12/1994 (31)</div></li>
              <li><div class="ttu">Draft Info</div><div>2013: Rd 1, Pk 15 (MIL)</div></li>
              <li><div class="ttu">Birthplace</div><div>Athens, Greece</div></li>
            </ul>
          </div>
        </div>"#;

    const BIO: &str = r#"
        <section class="Career__Highlights">
          <div class="Career__Highlights__Item">
            <div class="Career__Highlights__Item__Content">
              <span class="clr-black">NBA All-Star</span>
              <span class="clr-gray-05">2023, 2022</span>
            </div>
          </div>
        </section>
        <section class="Career__History">
          <div class="Career__History__Item"><span class="clr-black">Milwaukee Bucks</span><span class="clr-gray-05">2013-CURRENT</span></div>
        </section>"#;

    fn pages(profile: Option<&str>, bio: Option<&str>) -> PlayerPages {
        let url = Url::parse("https://www.espn.com.au/nba/player/_/id/3032977/giannis").unwrap();
        PlayerPages {
            profile: profile.map(|body| PageSnapshot::new(url.clone(), 200, body)),
            bio: bio.map(|body| PageSnapshot::new(url.clone(), 200, body)),
        }
    }

    fn text(result: &ExtractionResult, field: PlayerField) -> Option<&str> {
        result.get(field).and_then(RawValue::as_text)
    }

    #[test]
    fn test_extract_profile_and_bio() {
        let result = extract_all(&StrategyTable::default(), &pages(Some(PROFILE), Some(BIO)));

        assert_eq!(text(&result, PlayerField::Team), Some("milwaukee-bucks"));
        assert_eq!(text(&result, PlayerField::Number), Some("#34"));
        assert_eq!(text(&result, PlayerField::Position), Some("F"));
        assert_eq!(text(&result, PlayerField::Status), Some("Active"));
        assert_eq!(text(&result, PlayerField::Height), Some("2.11 m, 110 kg"));
        assert_eq!(text(&result, PlayerField::Birthdate), Some("6/12/1994 (31)"));
        assert_eq!(text(&result, PlayerField::Birthplace), Some("Athens, Greece"));
        assert_eq!(
            text(&result, PlayerField::Headshot),
            Some("https://a.espncdn.com/i/headshots/nba/players/full/3032977.png")
        );
        assert_eq!(
            result.get(PlayerField::Highlights),
            Some(&RawValue::Entries(vec![RawEntry::new("NBA All-Star", "2023, 2022")]))
        );
        assert_eq!(text(&result, PlayerField::College), None);
    }

    #[test]
    fn test_missing_bio_only_drops_bio_fields() {
        let result = extract_all(&StrategyTable::default(), &pages(Some(PROFILE), None));

        assert!(result.get(PlayerField::Highlights).is_none());
        assert!(result.get(PlayerField::History).is_none());
        assert!(result.get(PlayerField::Team).is_some());
    }

    #[test]
    fn test_broken_strategy_falls_through() {
        let table = StrategyTable::default().with_strategies(
            PlayerField::Status,
            vec![
                Strategy::text("[[broken"),
                Strategy::pattern("span", "(unclosed"),
                Strategy::text(".TextStatus"),
            ],
        );
        let result = extract_all(&table, &pages(Some(PROFILE), None));

        assert_eq!(text(&result, PlayerField::Status), Some("Active"));
        assert_eq!(text(&result, PlayerField::Number), Some("#34"));
    }

    #[test]
    fn test_alternate_locator_used_when_primary_misses() {
        let markup = r#"<div class="PlayerHeader__Team"><a href="/team">Boston Celtics</a></div>"#;
        let result = extract_all(&StrategyTable::default(), &pages(Some(markup), None));
        assert_eq!(text(&result, PlayerField::Team), Some("Boston Celtics"));
    }

    #[test]
    fn test_overrides_replace_named_fields_only() {
        let table = StrategyTable::default()
            .with_overrides_json(r#"{"college": [{"kind": "text", "selector": ".School"}]}"#)
            .unwrap();

        assert_eq!(
            table.strategies(PlayerField::College),
            &[Strategy::text(".School")]
        );
        assert_eq!(
            table.strategies(PlayerField::Team),
            StrategyTable::default().strategies(PlayerField::Team)
        );
    }

    #[test]
    fn test_unusable_value_falls_through_to_next_strategy() {
        let markup = r#"
            <ul class="PlayerHeader__Bio_List">
              <li><div>Birthdate</div><div>6/12/1994</div></li>
              <li><div>Age</div><div>31</div></li>
            </ul>"#;
        let values = normalize_all(&extract_all(&StrategyTable::default(), &pages(Some(markup), None)));

        assert_eq!(values.get(&PlayerField::Age).map(String::as_str), Some("31"));
        assert_eq!(
            values.get(&PlayerField::Birthdate).map(String::as_str),
            Some("1994-12-06")
        );
    }

    #[test]
    fn test_weight_found_when_ht_wt_has_height_only() {
        let markup = r#"
            <ul class="PlayerHeader__Bio_List">
              <li><div>HT/WT</div><div>2.11 m</div></li>
            </ul>
            <span data-id="weight">110 kg</span>"#;
        let values = normalize_all(&extract_all(&StrategyTable::default(), &pages(Some(markup), None)));

        assert_eq!(values.get(&PlayerField::Height).map(String::as_str), Some("211"));
        assert_eq!(values.get(&PlayerField::Weight).map(String::as_str), Some("110"));
    }

    #[test]
    fn test_panicking_extractor_only_loses_its_field() {
        let result = extract_all_with(
            &StrategyTable::default(),
            &pages(Some(PROFILE), Some(BIO)),
            |field, strategies, doc| {
                if field == PlayerField::Team {
                    panic!("extractor blew up");
                }
                extract_field(field, strategies, doc)
            },
        );

        assert!(!result.is_empty());
        assert!(result.get(PlayerField::Team).is_none());
        assert_eq!(text(&result, PlayerField::Status), Some("Active"));
        assert_eq!(text(&result, PlayerField::Height), Some("2.11 m, 110 kg"));
        assert!(result.get(PlayerField::History).is_some());
    }

    #[test]
    fn test_invalid_overrides_are_config_errors() {
        let result = StrategyTable::default().with_overrides_json(r#"{"college": [{"kind": "xpath"}]}"#);
        assert!(matches!(result, Err(ConfigError::StrategyTable(_))));
    }
}
