use std::path::Path;

use time::{Date, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::calendar::{
    self, classify, classify_day, period_ending, Category, DetailedDay, GridCell, GridView, Week,
};
use crate::calendar::tooltip::{day_tooltip, long_date, slot_tooltip};
use crate::error::{ImportError, SessionError, StoreError};
use crate::meals::dto::{ExportDocument, HistoryGroup, HistoryItem};
use crate::meals::repo;
use crate::meals::repo_types::{MealRecord, MealSlot, MealStore};
use crate::reconcile::{self, ImportMode};
use crate::storage::KeyValueStore;

/// The one live copy of the user's meals.
///
/// Every mutation is written back to the key-value store before it returns;
/// if that write fails the in-memory change is undone.
pub struct MealSession<S: KeyValueStore> {
    kv: S,
    meals: MealStore,
    pending_import: Option<MealStore>,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl<S: KeyValueStore> MealSession<S> {
    pub fn open(mut kv: S) -> Result<Self, StoreError> {
        let meals = repo::load(&mut kv)?;
        info!(days = meals.len(), meals = meals.total_meals(), "meal store loaded");
        Ok(Self {
            kv,
            meals,
            pending_import: None,
        })
    }

    pub fn meals(&self) -> &MealStore {
        &self.meals
    }

    pub fn store(&self) -> &S {
        &self.kv
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        repo::save(&mut self.kv, &self.meals)
    }

    /// Logs `record` for (date, slot), replacing any existing entry.
    pub fn add_or_replace(
        &mut self,
        date: Date,
        slot: MealSlot,
        record: MealRecord,
    ) -> Result<Option<MealRecord>, SessionError> {
        let previous = self.meals.upsert(date, slot, record);
        if let Err(e) = self.persist() {
            match previous {
                Some(old) => {
                    self.meals.upsert(date, slot, old);
                }
                None => {
                    self.meals.remove(date, slot);
                }
            }
            return Err(e.into());
        }
        debug!(%date, %slot, replaced = previous.is_some(), "meal saved");
        Ok(previous)
    }

    /// Removes the (date, slot) entry; the date disappears with its last entry.
    pub fn delete(&mut self, date: Date, slot: MealSlot) -> Result<MealRecord, SessionError> {
        let removed = self
            .meals
            .remove(date, slot)
            .ok_or_else(|| SessionError::NotFound {
                date: date.to_string(),
                slot: slot.to_string(),
            })?;
        if let Err(e) = self.persist() {
            self.meals.upsert(date, slot, removed);
            return Err(e.into());
        }
        debug!(%date, %slot, "meal deleted");
        Ok(removed)
    }

    /// Takes an entry out so it can be submitted again, possibly under a
    /// different date or slot.
    pub fn edit(&mut self, date: Date, slot: MealSlot) -> Result<MealRecord, SessionError> {
        self.delete(date, slot)
    }

    /// Replaces the (date, slot) entry with `record` stored under
    /// (new_date, new_slot), in a single save. Whatever sat at the target is
    /// overwritten. On failure both positions are restored.
    pub fn move_entry(
        &mut self,
        date: Date,
        slot: MealSlot,
        new_date: Date,
        new_slot: MealSlot,
        record: MealRecord,
    ) -> Result<MealRecord, SessionError> {
        let original = self
            .meals
            .remove(date, slot)
            .ok_or_else(|| SessionError::NotFound {
                date: date.to_string(),
                slot: slot.to_string(),
            })?;
        let displaced = self.meals.upsert(new_date, new_slot, record);
        if let Err(e) = self.persist() {
            match displaced {
                Some(old) => {
                    self.meals.upsert(new_date, new_slot, old);
                }
                None => {
                    self.meals.remove(new_date, new_slot);
                }
            }
            self.meals.upsert(date, slot, original);
            return Err(e.into());
        }
        debug!(from = %date, %slot, to = %new_date, %new_slot, "meal moved");
        Ok(original)
    }

    pub fn classification(&self, date: Date) -> Category {
        classify_day(self.meals.day(date))
    }

    pub fn slot_classification(&self, date: Date, slot: MealSlot) -> Category {
        classify(self.meals.record(date, slot))
    }

    pub fn tooltip(&self, date: Date) -> String {
        day_tooltip(date, self.meals.day(date))
    }

    pub fn slot_tooltip(&self, date: Date, slot: MealSlot) -> String {
        slot_tooltip(date, slot, self.meals.record(date, slot))
    }

    pub fn tile(&self, start: Date, end: Date) -> Vec<Week> {
        calendar::tile(start, end)
    }

    /// Coarse grid over the last `days` days ending at `today`.
    pub fn coarse_view(&self, today: Date, days: u32) -> GridView<GridCell> {
        let (start, end) = period_ending(today, days);
        calendar::coarse_view(&self.meals, start, end)
    }

    /// Detailed grid over the last `days` days ending at `today`.
    pub fn detailed_view(&self, today: Date, days: u32) -> GridView<DetailedDay> {
        let (start, end) = period_ending(today, days);
        calendar::detailed_view(&self.meals, start, end)
    }

    pub fn total_meals(&self) -> usize {
        self.meals.total_meals()
    }

    /// All entries, newest date first, breakfast to skipped within a date.
    pub fn history(&self, filter: Option<Date>) -> Vec<HistoryItem> {
        self.meals
            .days()
            .rev()
            .filter(|(date, _)| filter.map_or(true, |f| f == *date))
            .flat_map(|(date, entry)| {
                entry.iter().map(move |(slot, record)| HistoryItem {
                    date: date.into(),
                    slot,
                    category: classify(Some(record)),
                    label: slot.label().to_string(),
                    details: match record {
                        MealRecord::Skipped { .. } => "Skipped".to_string(),
                        MealRecord::Logged {
                            location,
                            healthiness,
                            ..
                        } => format!(
                            "{} • {}",
                            capitalize(location.as_str()),
                            capitalize(healthiness.as_str())
                        ),
                    },
                    notes: Some(record.notes())
                        .filter(|n| !n.is_empty())
                        .map(str::to_string),
                })
            })
            .collect()
    }

    pub fn history_groups(&self, filter: Option<Date>) -> Vec<HistoryGroup> {
        let mut groups: Vec<HistoryGroup> = Vec::new();
        for item in self.history(filter) {
            if let Some(group) = groups.last_mut().filter(|g| g.date == item.date) {
                group.items.push(item);
                continue;
            }
            groups.push(HistoryGroup {
                date: item.date,
                header: long_date(item.date.date()),
                items: vec![item],
            });
        }
        groups
    }

    pub fn serialize(&self) -> Result<String, StoreError> {
        Ok(repo::serialize(&self.meals)?)
    }

    /// Replaces the current meals with the ones in `text` (the format
    /// [`serialize`](Self::serialize) produces) and saves them.
    pub fn deserialize(&mut self, text: &str) -> Result<(), SessionError> {
        let parsed = repo::deserialize(text).map_err(|e| StoreError::Corrupt {
            key: repo::CURRENT_KEY.to_string(),
            reason: e.to_string(),
        })?;
        let previous = std::mem::replace(&mut self.meals, parsed);
        if let Err(e) = self.persist() {
            self.meals = previous;
            return Err(e.into());
        }
        debug!(days = self.meals.len(), "meals restored from text");
        Ok(())
    }

    pub fn export(&self, now: OffsetDateTime) -> ExportDocument {
        ExportDocument::new(self.meals.clone(), now)
    }

    /// First import phase: validate `text` and hold the result until the
    /// user confirms or cancels. The current meals are not touched.
    pub fn stage_import(&mut self, text: &str) -> Result<&MealStore, ImportError> {
        let incoming = reconcile::parse_import(text)?;
        Ok(self.stage(incoming))
    }

    pub fn stage_import_file(&mut self, path: &Path) -> Result<&MealStore, ImportError> {
        let incoming = reconcile::read_import_file(path)?;
        Ok(self.stage(incoming))
    }

    fn stage(&mut self, incoming: MealStore) -> &MealStore {
        info!(
            days = incoming.len(),
            meals = incoming.total_meals(),
            "import staged"
        );
        self.pending_import.insert(incoming)
    }

    pub fn pending_import(&self) -> Option<&MealStore> {
        self.pending_import.as_ref()
    }

    /// Second import phase: apply the staged data.
    pub fn confirm_import(&mut self, mode: ImportMode) -> Result<(), SessionError> {
        let incoming = self
            .pending_import
            .take()
            .ok_or(SessionError::NothingToImport)?;
        if let Err(e) = self.reconcile(incoming.clone(), mode) {
            self.pending_import = Some(incoming);
            return Err(e);
        }
        Ok(())
    }

    pub fn cancel_import(&mut self) -> bool {
        let had_pending = self.pending_import.take().is_some();
        if had_pending {
            debug!("import cancelled");
        }
        had_pending
    }

    /// Combines `incoming` with the current meals and saves the result.
    pub fn reconcile(&mut self, incoming: MealStore, mode: ImportMode) -> Result<(), SessionError> {
        let reconciled = reconcile::reconcile(&self.meals, incoming, mode);
        let previous = std::mem::replace(&mut self.meals, reconciled);
        if let Err(e) = self.persist() {
            warn!(error = %e, %mode, "import could not be saved, keeping previous meals");
            self.meals = previous;
            return Err(e.into());
        }
        info!(
            %mode,
            days = self.meals.len(),
            meals = self.meals.total_meals(),
            "import applied"
        );
        Ok(())
    }
}
