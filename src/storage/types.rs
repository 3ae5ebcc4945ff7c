use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::reconcile::Reconciliation;
use crate::parser::PageKind;

pub const DATA_STATUS_COLUMN: &str = "ESPN Data Status";
pub const LAST_CHECK_COLUMN: &str = "ESPN Last Check";
pub const UPDATES_COLUMN: &str = "ESPN Updates";
pub const NAME_COLUMN: &str = "Name";

/// Enrichable fields, in the order they are reported and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerField {
    Team,
    Headshot,
    Number,
    Position,
    Status,
    Age,
    Height,
    Weight,
    College,
    Birthplace,
    Birthdate,
    DraftInfo,
    Highlights,
    History,
}

impl PlayerField {
    pub const ALL: [PlayerField; 14] = [
        PlayerField::Team,
        PlayerField::Headshot,
        PlayerField::Number,
        PlayerField::Position,
        PlayerField::Status,
        PlayerField::Age,
        PlayerField::Height,
        PlayerField::Weight,
        PlayerField::College,
        PlayerField::Birthplace,
        PlayerField::Birthdate,
        PlayerField::DraftInfo,
        PlayerField::Highlights,
        PlayerField::History,
    ];

    /// Column name in the players table.
    pub fn column(&self) -> &'static str {
        match self {
            PlayerField::Team => "ESPN Team",
            PlayerField::Headshot => "ESPN Headshot",
            PlayerField::Number => "ESPN Number",
            PlayerField::Position => "ESPN Position",
            PlayerField::Status => "ESPN Player Status",
            PlayerField::Age => "ESPN Age",
            PlayerField::Height => "ESPN Height",
            PlayerField::Weight => "ESPN Weight",
            PlayerField::College => "ESPN College",
            PlayerField::Birthplace => "ESPN Birthplace",
            PlayerField::Birthdate => "ESPN Birthdate",
            PlayerField::DraftInfo => "ESPN Draft Info",
            PlayerField::Highlights => "ESPN Career Highlights",
            PlayerField::History => "ESPN Career History",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column() == column)
    }

    /// Which page carries the data for this field.
    pub fn page(&self) -> PageKind {
        match self {
            PlayerField::Highlights | PlayerField::History => PageKind::Bio,
            _ => PageKind::Profile,
        }
    }
}

impl fmt::Display for PlayerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

pub type FieldValues = BTreeMap<PlayerField, String>;

/// Picks the enrichable columns out of a raw store field map. Unknown columns
/// are ignored; numbers and booleans are compared in their textual form.
pub fn field_values_from_store(fields: &Map<String, Value>) -> FieldValues {
    fields
        .iter()
        .filter_map(|(column, value)| {
            let field = PlayerField::from_column(column)?;
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((field, text))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataStatus {
    Complete,
    Updated,
    NotFound,
    Error,
}

impl DataStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataStatus::Complete => "Complete",
            DataStatus::Updated => "Updated",
            DataStatus::NotFound => "Not Found",
            DataStatus::Error => "Error",
        }
    }
}

impl fmt::Display for DataStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerRecord {
    pub id: String,
    pub name: Option<String>,
    pub profile_link: Option<String>,
    pub existing: FieldValues,
}

impl PlayerRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.profile_link = Some(link.into());
        self
    }

    pub fn with_existing(mut self, existing: FieldValues) -> Self {
        self.existing = existing;
        self
    }

    pub fn from_store_fields(id: &str, fields: &Map<String, Value>, link_field: &str) -> Self {
        Self {
            id: id.to_string(),
            name: fields
                .get(NAME_COLUMN)
                .and_then(Value::as_str)
                .map(str::to_string),
            profile_link: fields
                .get(link_field)
                .and_then(Value::as_str)
                .map(str::to_string),
            existing: field_values_from_store(fields),
        }
    }

    /// The profile link, if it is set to something other than whitespace.
    pub fn profile_link(&self) -> Option<&str> {
        self.profile_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown Player")
    }
}

/// One run's result for one record. Failure results carry only the meta fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedFields {
    pub values: FieldValues,
    pub data_status: DataStatus,
    pub last_checked: NaiveDate,
    pub updates_summary: String,
}

impl EnrichedFields {
    pub fn enriched(values: FieldValues, reconciliation: Reconciliation, today: NaiveDate) -> Self {
        Self {
            values,
            data_status: reconciliation.status,
            last_checked: today,
            updates_summary: reconciliation.summary,
        }
    }

    pub fn failed(status: DataStatus, message: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            values: FieldValues::new(),
            data_status: status,
            last_checked: today,
            updates_summary: message.into(),
        }
    }

    pub fn get(&self, field: PlayerField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn to_store_fields(&self) -> Map<String, Value> {
        let mut fields: Map<String, Value> = self
            .values
            .iter()
            .map(|(field, value)| (field.column().to_string(), Value::String(value.clone())))
            .collect();
        fields.insert(
            DATA_STATUS_COLUMN.to_string(),
            Value::String(self.data_status.as_str().to_string()),
        );
        fields.insert(
            LAST_CHECK_COLUMN.to_string(),
            Value::String(self.last_checked.format("%Y-%m-%d").to_string()),
        );
        fields.insert(
            UPDATES_COLUMN.to_string(),
            Value::String(self.updates_summary.clone()),
        );
        fields
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchUnit {
    pub record_id: String,
    pub fields: EnrichedFields,
}

impl BatchUnit {
    pub fn new(record_id: impl Into<String>, fields: EnrichedFields) -> Self {
        Self {
            record_id: record_id.into(),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_from_store_fields() {
        let fields = json!({
            "Name": "Giannis Antetokounmpo",
            "URL ESPN Link": "https://www.espn.com.au/nba/player/_/id/3032977/giannis-antetokounmpo",
            "ESPN Team": "Milwaukee Bucks",
            "ESPN Height": 211,
            "Notes": "ignored",
        });
        let record =
            PlayerRecord::from_store_fields("rec1", fields.as_object().unwrap(), "URL ESPN Link");

        assert_eq!(record.display_name(), "Giannis Antetokounmpo");
        assert!(record.profile_link().is_some());
        assert_eq!(record.existing.len(), 2);
        assert_eq!(record.existing[&PlayerField::Height], "211");
    }

    #[test]
    fn test_blank_link_is_not_a_link() {
        let record = PlayerRecord::new("rec1").with_link("   ");
        assert_eq!(record.profile_link(), None);
        assert_eq!(PlayerRecord::new("rec2").profile_link(), None);
    }

    #[test]
    fn test_failed_fields_carry_only_meta_columns() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let fields = EnrichedFields::failed(DataStatus::NotFound, "404 - Page not found", today);
        let store = fields.to_store_fields();

        assert_eq!(store.len(), 3);
        assert_eq!(store[DATA_STATUS_COLUMN], "Not Found");
        assert_eq!(store[LAST_CHECK_COLUMN], "2025-03-01");
        assert_eq!(store[UPDATES_COLUMN], "404 - Page not found");
    }

    #[test]
    fn test_column_round_trip() {
        for field in PlayerField::ALL {
            assert_eq!(PlayerField::from_column(field.column()), Some(field));
        }
    }
}
