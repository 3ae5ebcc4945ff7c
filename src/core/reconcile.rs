use crate::storage::types::{DataStatus, FieldValues, PlayerField};

pub const NO_CHANGES: &str = "No changes detected";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Changed fields in schema order.
    pub changes: Vec<PlayerField>,
    pub status: DataStatus,
    pub summary: String,
}

impl Reconciliation {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Diffs freshly normalized values against what the store already holds.
/// A field counts as changed when the new value is non-empty and differs
/// from the stored text. A field absent from `new` never clears a stored one.
pub fn reconcile(new: &FieldValues, stored: &FieldValues) -> Reconciliation {
    let changes: Vec<PlayerField> = PlayerField::ALL
        .iter()
        .copied()
        .filter(|field| match new.get(field) {
            Some(value) if !value.is_empty() => stored.get(field) != Some(value),
            _ => false,
        })
        .collect();

    if changes.is_empty() {
        Reconciliation {
            changes,
            status: DataStatus::Complete,
            summary: NO_CHANGES.to_string(),
        }
    } else {
        let summary = changes
            .iter()
            .map(PlayerField::column)
            .collect::<Vec<_>>()
            .join(", ");
        Reconciliation {
            changes,
            status: DataStatus::Updated,
            summary,
        }
    }
}
