//! Combining an imported meal map with the current one.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::error::ImportError;
use crate::meals::repo_types::MealStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Throw the current meals away and keep only the imported ones.
    Replace,
    /// Keep current meals; imported records win per (date, slot).
    Merge,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImportMode::Replace => "replace",
            ImportMode::Merge => "merge",
        })
    }
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(ImportMode::Replace),
            "merge" => Ok(ImportMode::Merge),
            other => Err(format!("unknown import mode `{other}` (expected merge or replace)")),
        }
    }
}

pub fn reconcile(current: &MealStore, incoming: MealStore, mode: ImportMode) -> MealStore {
    match mode {
        ImportMode::Replace => incoming,
        ImportMode::Merge => {
            let mut merged = current.clone();
            for (date, entry) in incoming.days() {
                for (slot, record) in entry.iter() {
                    merged.upsert(date, slot, record.clone());
                }
            }
            merged
        }
    }
}

/// Validates an import document and extracts its meal map.
///
/// Any object with a `meals` object is accepted; `version` and
/// `exportDate` are not looked at.
pub fn parse_import(text: &str) -> Result<MealStore, ImportError> {
    let document: Value =
        serde_json::from_str(text).map_err(|e| ImportError::Parse(e.to_string()))?;
    let meals = match document {
        Value::Object(mut fields) => fields.remove("meals"),
        _ => None,
    };
    let meals = match meals {
        Some(meals @ Value::Object(_)) => meals,
        Some(_) => {
            return Err(ImportError::Validation(
                "`meals` must be an object keyed by date".into(),
            ))
        }
        None => return Err(ImportError::Validation("missing `meals` object".into())),
    };
    let store: MealStore =
        serde_json::from_value(meals).map_err(|e| ImportError::Validation(e.to_string()))?;
    debug!(days = store.len(), meals = store.total_meals(), "import parsed");
    Ok(store)
}

pub fn read_import_file(path: &Path) -> Result<MealStore, ImportError> {
    let text = std::fs::read_to_string(path)?;
    parse_import(&text)
}

#[cfg(test)]
mod reconcile_tests {
    use super::*;
    use crate::meals::repo_types::{Healthiness, Location, MealRecord, MealSlot};
    use serde_json::json;
    use time::macros::{date, datetime};
    use time::Date;

    fn record(location: Location, healthiness: Healthiness, notes: &str) -> MealRecord {
        MealRecord::logged(location, healthiness, notes, datetime!(2024-01-05 12:00 UTC))
    }

    fn store(entries: Vec<(Date, MealSlot, MealRecord)>) -> MealStore {
        let mut store = MealStore::new();
        for (date, slot, record) in entries {
            store.upsert(date, slot, record);
        }
        store
    }

    #[test]
    fn merge_keeps_slots_from_both_sides() {
        let day = date!(2024-01-05);
        let l1 = record(Location::Home, Healthiness::Healthy, "l1");
        let d1 = record(Location::Outside, Healthiness::Unhealthy, "d1");
        let current = store(vec![(day, MealSlot::Lunch, l1.clone())]);
        let incoming = store(vec![(day, MealSlot::Dinner, d1.clone())]);

        let merged = reconcile(&current, incoming, ImportMode::Merge);
        assert_eq!(merged.record(day, MealSlot::Lunch), Some(&l1));
        assert_eq!(merged.record(day, MealSlot::Dinner), Some(&d1));
        assert_eq!(merged.total_meals(), 2);
    }

    #[test]
    fn merge_prefers_incoming_per_slot() {
        let day = date!(2024-01-05);
        let other_day = date!(2024-01-06);
        let mine = record(Location::Home, Healthiness::Healthy, "mine");
        let theirs = record(Location::Outside, Healthiness::Healthy, "theirs");
        let current = store(vec![
            (day, MealSlot::Lunch, mine.clone()),
            (other_day, MealSlot::Breakfast, mine.clone()),
        ]);
        let incoming = store(vec![(day, MealSlot::Lunch, theirs.clone())]);

        let merged = reconcile(&current, incoming, ImportMode::Merge);
        assert_eq!(merged.record(day, MealSlot::Lunch), Some(&theirs));
        assert_eq!(merged.record(other_day, MealSlot::Breakfast), Some(&mine));
    }

    #[test]
    fn merge_with_itself_is_a_no_op() {
        let s = store(vec![
            (
                date!(2024-01-05),
                MealSlot::Lunch,
                record(Location::Home, Healthiness::Healthy, ""),
            ),
            (
                date!(2024-01-07),
                MealSlot::Skipped,
                MealRecord::skipped("", datetime!(2024-01-07 09:00 UTC)),
            ),
        ]);
        assert_eq!(reconcile(&s, s.clone(), ImportMode::Merge), s);
    }

    #[test]
    fn replace_returns_incoming() {
        let current = store(vec![(
            date!(2024-01-05),
            MealSlot::Lunch,
            record(Location::Home, Healthiness::Healthy, ""),
        )]);
        let incoming = store(vec![(
            date!(2024-02-01),
            MealSlot::Dinner,
            record(Location::Outside, Healthiness::Unhealthy, ""),
        )]);
        assert_eq!(
            reconcile(&current, incoming.clone(), ImportMode::Replace),
            incoming
        );
        assert!(reconcile(&current, MealStore::new(), ImportMode::Replace).is_empty());
    }

    #[test]
    fn parse_accepts_export_documents() {
        let text = json!({
            "version": "2.0",
            "exportDate": "2024-01-06T10:00:00.000Z",
            "meals": {
                "2024-01-05": {
                    "lunch": { "location": "home", "healthiness": "healthy", "notes": "", "timestamp": "2024-01-05T12:00:00.000Z" },
                    "skipped": { "skipped": true, "notes": "", "timestamp": "2024-01-05T20:00:00.000Z" }
                }
            }
        })
        .to_string();
        let parsed = parse_import(&text).expect("valid export parses");
        assert_eq!(parsed.total_meals(), 2);
    }

    #[test]
    fn parse_ignores_missing_version() {
        let parsed = parse_import(r#"{"meals": {}}"#).expect("bare meals object parses");
        assert!(parsed.is_empty());
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let err = parse_import("{ not json").unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
    }

    #[test]
    fn parse_rejects_missing_or_non_object_meals() {
        for text in [r#"{"version": "2.0"}"#, r#"{"meals": []}"#, r#"{"meals": "x"}"#, "[]"] {
            let err = parse_import(text).unwrap_err();
            assert!(
                matches!(err, ImportError::Validation(_)),
                "expected validation error for {text}"
            );
        }
    }

    #[test]
    fn parse_rejects_records_missing_fields() {
        let text = json!({
            "meals": {
                "2024-01-05": { "dinner": { "location": "home", "timestamp": "2024-01-05T19:00:00Z" } }
            }
        })
        .to_string();
        let err = parse_import(&text).unwrap_err();
        assert!(matches!(err, ImportError::Validation(_)));
    }

    #[test]
    fn read_import_file_reports_io_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_import_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ImportError::Io(_)));
    }

    #[test]
    fn import_mode_parses() {
        assert_eq!("merge".parse::<ImportMode>(), Ok(ImportMode::Merge));
        assert_eq!("replace".parse::<ImportMode>(), Ok(ImportMode::Replace));
        assert!("append".parse::<ImportMode>().is_err());
    }
}
