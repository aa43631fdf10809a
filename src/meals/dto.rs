use serde::Serialize;
use time::OffsetDateTime;

use crate::calendar::Category;
use crate::meals::repo_types::{MealDate, MealSlot, MealStore};

pub const EXPORT_VERSION: &str = "2.0";

/// Backup file written by export and accepted (via its `meals`) by import.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    #[serde(with = "time::serde::rfc3339")]
    pub export_date: OffsetDateTime,
    pub meals: MealStore,
}

impl ExportDocument {
    pub fn new(meals: MealStore, export_date: OffsetDateTime) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            export_date,
            meals,
        }
    }

    /// `meal-tracker-backup-YYYY-MM-DD.json`
    pub fn file_name(&self) -> String {
        format!(
            "meal-tracker-backup-{}.json",
            MealDate::from(self.export_date.date())
        )
    }
}

/// One row of the meal history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryItem {
    pub date: MealDate,
    pub slot: MealSlot,
    pub category: Category,
    /// Capitalized slot name.
    pub label: String,
    /// `Skipped`, or e.g. `Home • Healthy`.
    pub details: String,
    pub notes: Option<String>,
}

/// History rows of one date under its long header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryGroup {
    pub date: MealDate,
    pub header: String,
    pub items: Vec<HistoryItem>,
}

pub const EMPTY_HISTORY_TEXT: &str =
    "No meals logged yet. Start by logging your first meal above!";
