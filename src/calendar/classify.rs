use std::fmt;

use serde::Serialize;

use crate::meals::repo_types::{DayEntry, Healthiness, Location, MealRecord};

/// Visual/semantic class of a record or a whole day. The string forms are
/// the class names the presentation layer styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    NoData,
    MealSkipped,
    HomeHealthy,
    HomeUnhealthy,
    OutsideHealthy,
    OutsideUnhealthy,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::NoData => "no-data",
            Category::MealSkipped => "meal-skipped",
            Category::HomeHealthy => "home-healthy",
            Category::HomeUnhealthy => "home-unhealthy",
            Category::OutsideHealthy => "outside-healthy",
            Category::OutsideUnhealthy => "outside-unhealthy",
        }
    }

    /// Rank used to pick the best meal of a day.
    pub fn priority(&self) -> u8 {
        match self {
            Category::HomeHealthy => 4,
            Category::OutsideHealthy => 3,
            Category::HomeUnhealthy => 2,
            Category::OutsideUnhealthy => 1,
            Category::MealSkipped | Category::NoData => 0,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a single slot.
pub fn classify(record: Option<&MealRecord>) -> Category {
    match record {
        None => Category::NoData,
        Some(MealRecord::Skipped { .. }) => Category::MealSkipped,
        Some(MealRecord::Logged {
            location,
            healthiness,
            ..
        }) => match (location, healthiness) {
            (Location::Home, Healthiness::Healthy) => Category::HomeHealthy,
            (Location::Home, Healthiness::Unhealthy) => Category::HomeUnhealthy,
            (Location::Outside, Healthiness::Healthy) => Category::OutsideHealthy,
            (Location::Outside, Healthiness::Unhealthy) => Category::OutsideUnhealthy,
            _ => Category::NoData,
        },
    }
}

/// Category of a whole day: the best non-skipped meal, `meal-skipped` when
/// every record is a skip, `no-data` when nothing is logged.
///
/// Skips never compete with real meals, so a skipped breakfast next to an
/// unhealthy lunch out reports `outside-unhealthy`.
pub fn classify_day(entry: Option<&DayEntry>) -> Category {
    let Some(entry) = entry.filter(|e| !e.is_empty()) else {
        return Category::NoData;
    };
    if entry.records().all(MealRecord::is_skipped) {
        return Category::MealSkipped;
    }
    entry
        .records()
        .filter(|record| !record.is_skipped())
        .map(|record| classify(Some(record)))
        .fold(None, |best: Option<Category>, category| match best {
            Some(b) if b.priority() >= category.priority() => Some(b),
            _ => Some(category),
        })
        .unwrap_or(Category::NoData)
}

#[cfg(test)]
mod classify_tests {
    use super::*;
    use crate::meals::repo_types::MealSlot;
    use time::macros::datetime;
    use time::OffsetDateTime;

    const TS: OffsetDateTime = datetime!(2024-01-05 12:00 UTC);

    fn logged(location: &str, healthiness: &str) -> MealRecord {
        MealRecord::logged(
            location.to_string().into(),
            healthiness.to_string().into(),
            "",
            TS,
        )
    }

    fn day(records: Vec<(MealSlot, MealRecord)>) -> DayEntry {
        records.into_iter().collect()
    }

    #[test]
    fn slot_categories() {
        assert_eq!(classify(None), Category::NoData);
        assert_eq!(
            classify(Some(&MealRecord::skipped("", TS))),
            Category::MealSkipped
        );
        assert_eq!(classify(Some(&logged("home", "healthy"))), Category::HomeHealthy);
        assert_eq!(
            classify(Some(&logged("home", "unhealthy"))),
            Category::HomeUnhealthy
        );
        assert_eq!(
            classify(Some(&logged("outside", "healthy"))),
            Category::OutsideHealthy
        );
        assert_eq!(
            classify(Some(&logged("outside", "unhealthy"))),
            Category::OutsideUnhealthy
        );
    }

    #[test]
    fn unknown_values_fall_back_to_no_data() {
        assert_eq!(classify(Some(&logged("office", "healthy"))), Category::NoData);
        assert_eq!(classify(Some(&logged("home", "meh"))), Category::NoData);
    }

    #[test]
    fn empty_day_has_no_data() {
        assert_eq!(classify_day(None), Category::NoData);
        assert_eq!(classify_day(Some(&DayEntry::default())), Category::NoData);
    }

    #[test]
    fn all_skipped_day() {
        let entry = day(vec![
            (MealSlot::Breakfast, MealRecord::skipped("", TS)),
            (MealSlot::Skipped, MealRecord::skipped("fasting", TS)),
        ]);
        assert_eq!(classify_day(Some(&entry)), Category::MealSkipped);
    }

    #[test]
    fn single_home_healthy_lunch() {
        let entry = day(vec![(MealSlot::Lunch, logged("home", "healthy"))]);
        assert_eq!(classify_day(Some(&entry)), Category::HomeHealthy);
    }

    #[test]
    fn best_meal_wins() {
        let entry = day(vec![
            (MealSlot::Breakfast, logged("outside", "unhealthy")),
            (MealSlot::Dinner, logged("home", "healthy")),
        ]);
        assert_eq!(classify_day(Some(&entry)), Category::HomeHealthy);

        let entry = day(vec![
            (MealSlot::Breakfast, logged("home", "unhealthy")),
            (MealSlot::Lunch, logged("outside", "healthy")),
            (MealSlot::Dinner, logged("outside", "unhealthy")),
        ]);
        assert_eq!(classify_day(Some(&entry)), Category::OutsideHealthy);
    }

    #[test]
    fn skip_does_not_outrank_a_real_meal() {
        let entry = day(vec![
            (MealSlot::Breakfast, MealRecord::skipped("", TS)),
            (MealSlot::Lunch, logged("outside", "unhealthy")),
        ]);
        assert_eq!(classify_day(Some(&entry)), Category::OutsideUnhealthy);
    }

    #[test]
    fn unknown_meal_loses_to_any_known_meal() {
        let entry = day(vec![
            (MealSlot::Breakfast, logged("office", "healthy")),
            (MealSlot::Lunch, logged("outside", "unhealthy")),
        ]);
        assert_eq!(classify_day(Some(&entry)), Category::OutsideUnhealthy);

        let only_unknown = day(vec![(MealSlot::Dinner, logged("office", "healthy"))]);
        assert_eq!(classify_day(Some(&only_unknown)), Category::NoData);
    }

    #[test]
    fn priorities_are_strictly_ordered() {
        let ordered = [
            Category::HomeHealthy,
            Category::OutsideHealthy,
            Category::HomeUnhealthy,
            Category::OutsideUnhealthy,
        ];
        assert!(ordered.windows(2).all(|w| w[0].priority() > w[1].priority()));
        assert_eq!(Category::MealSkipped.priority(), 0);
    }
}
