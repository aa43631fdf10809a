use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::error::StoreError;
use crate::meals::repo_types::{DayEntry, MealDate, MealRecord, MealSlot, MealStore};
use crate::storage::KeyValueStore;

/// Key holding the current date -> slot -> record map.
pub const CURRENT_KEY: &str = "mealsV2";
/// Key of the first format: one record per date, no slots.
pub const LEGACY_KEY: &str = "meals";

/// Which format the persistent store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredFormat {
    Current,
    Legacy,
    Empty,
}

pub fn detect_format(kv: &impl KeyValueStore) -> Result<StoredFormat, StoreError> {
    if kv.get(CURRENT_KEY)?.is_some_and(|raw| !raw.is_empty()) {
        return Ok(StoredFormat::Current);
    }
    if kv.get(LEGACY_KEY)?.is_some_and(|raw| !raw.is_empty()) {
        return Ok(StoredFormat::Legacy);
    }
    Ok(StoredFormat::Empty)
}

pub fn serialize(store: &MealStore) -> Result<String, serde_json::Error> {
    serde_json::to_string(store)
}

pub fn deserialize(text: &str) -> Result<MealStore, serde_json::Error> {
    serde_json::from_str(text)
}

fn corrupt(key: &str, e: serde_json::Error) -> StoreError {
    StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    }
}

/// Loads the meal store, migrating legacy data once if that is all there is.
pub fn load(kv: &mut impl KeyValueStore) -> Result<MealStore, StoreError> {
    match detect_format(kv)? {
        StoredFormat::Current => {
            let raw = kv.get(CURRENT_KEY)?.unwrap_or_default();
            deserialize(&raw).map_err(|e| corrupt(CURRENT_KEY, e))
        }
        StoredFormat::Legacy => {
            let raw = kv.get(LEGACY_KEY)?.unwrap_or_default();
            let store = migrate_legacy(&raw)?;
            save(kv, &store)?;
            info!(days = store.len(), "migrated legacy meals as lunch");
            Ok(store)
        }
        StoredFormat::Empty => Ok(MealStore::new()),
    }
}

pub fn save(kv: &mut impl KeyValueStore, store: &MealStore) -> Result<(), StoreError> {
    let raw = serialize(store)?;
    kv.set(CURRENT_KEY, &raw)
}

/// Legacy data held a single record per date; each becomes that date's lunch.
pub fn migrate_legacy(raw: &str) -> Result<MealStore, StoreError> {
    let legacy: BTreeMap<MealDate, MealRecord> =
        serde_json::from_str(raw).map_err(|e| corrupt(LEGACY_KEY, e))?;
    if legacy.is_empty() {
        warn!("legacy meal data was present but empty");
    }
    Ok(legacy
        .into_iter()
        .map(|(date, record)| (date, DayEntry::from_iter([(MealSlot::Lunch, record)])))
        .collect())
}

#[cfg(test)]
mod repo_tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn empty_store_loads_empty() {
        let mut kv = MemoryStore::new();
        let store = load(&mut kv).expect("load");
        assert!(store.is_empty());
        assert_eq!(detect_format(&kv).expect("detect"), StoredFormat::Empty);
    }

    #[test]
    fn legacy_records_become_lunch_and_are_saved() {
        let legacy = json!({
            "2023-11-02": { "location": "outside", "healthiness": "unhealthy", "notes": "", "timestamp": "2023-11-02T13:00:00.000Z" },
            "2023-11-03": { "location": "home", "healthiness": "healthy", "notes": "salad", "timestamp": "2023-11-03T13:00:00.000Z" }
        })
        .to_string();
        let mut kv = MemoryStore::new().with_entry(LEGACY_KEY, &legacy);
        assert_eq!(detect_format(&kv).expect("detect"), StoredFormat::Legacy);

        let store = load(&mut kv).expect("migrate");
        assert_eq!(store.len(), 2);
        let day = store.day(date!(2023-11-03)).expect("day migrated");
        assert_eq!(day.len(), 1);
        assert_eq!(
            day.get(MealSlot::Lunch).map(MealRecord::notes),
            Some("salad")
        );

        assert_eq!(detect_format(&kv).expect("detect"), StoredFormat::Current);
        assert!(kv.get(LEGACY_KEY).expect("legacy kept").is_some());
        assert_eq!(load(&mut kv).expect("reload"), store);
    }

    #[test]
    fn current_data_wins_over_legacy() {
        let current = json!({
            "2024-01-05": { "dinner": { "skipped": true, "notes": "", "timestamp": "2024-01-05T20:00:00Z" } }
        })
        .to_string();
        let mut kv = MemoryStore::new()
            .with_entry(LEGACY_KEY, r#"{"2023-01-01": {"location": "home", "healthiness": "healthy", "timestamp": "2023-01-01T12:00:00Z"}}"#)
            .with_entry(CURRENT_KEY, &current);
        let store = load(&mut kv).expect("load");
        assert_eq!(store.len(), 1);
        assert!(store.record(date!(2024-01-05), MealSlot::Dinner).is_some());
    }

    #[test]
    fn corrupt_current_data_is_reported() {
        let mut kv = MemoryStore::new().with_entry(CURRENT_KEY, "{ nope");
        let err = load(&mut kv).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == CURRENT_KEY));
    }

    #[test]
    fn serialize_roundtrip() {
        let text = json!({
            "2024-01-05": {
                "breakfast": { "location": "outside", "healthiness": "unhealthy", "notes": "bagel", "timestamp": "2024-01-05T08:10:00Z" },
                "skipped": { "skipped": true, "notes": "no time", "timestamp": "2024-01-05T13:00:00Z" }
            },
            "2024-01-06": {
                "dinner": { "location": "office", "healthiness": "healthy", "notes": "", "timestamp": "2024-01-06T19:30:00.250Z" }
            }
        })
        .to_string();
        let store = deserialize(&text).expect("parse");
        let again = deserialize(&serialize(&store).expect("serialize")).expect("reparse");
        assert_eq!(again, store);
    }
}
