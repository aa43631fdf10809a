//! Hover text for grid cells and date headers for the history list.

use std::fmt::Display;

use time::Date;

use crate::meals::repo_types::{DayEntry, MealRecord, MealSlot};

fn abbrev(name: impl Display) -> String {
    name.to_string().chars().take(3).collect()
}

pub fn short_month(date: Date) -> String {
    abbrev(date.month())
}

/// `Fri, Jan 5`
pub fn short_date(date: Date) -> String {
    format!(
        "{}, {} {}",
        abbrev(date.weekday()),
        short_month(date),
        date.day()
    )
}

/// `Fri, Jan 5, 2024`
pub fn short_date_with_year(date: Date) -> String {
    format!("{}, {}", short_date(date), date.year())
}

/// `Friday, January 5, 2024`
pub fn long_date(date: Date) -> String {
    format!(
        "{}, {} {}, {}",
        date.weekday(),
        date.month(),
        date.day(),
        date.year()
    )
}

/// Tooltip for one meal square of the detailed grid:
///
/// ```text
/// Fri, Jan 5 - Dinner
/// home - healthy
/// leftover curry
/// ```
pub fn slot_tooltip(date: Date, slot: MealSlot, record: Option<&MealRecord>) -> String {
    let mut text = format!("{} - {}\n", short_date(date), slot.label());
    match record {
        None => text.push_str("Not logged"),
        Some(MealRecord::Skipped { .. }) => text.push_str("Skipped"),
        Some(MealRecord::Logged {
            location,
            healthiness,
            notes,
            ..
        }) => {
            text.push_str(&format!("{location} - {healthiness}"));
            if !notes.is_empty() {
                text.push('\n');
                text.push_str(notes);
            }
        }
    }
    text
}

/// Tooltip for one day square of the coarse grid: the dated header, then a
/// line per logged meal and a trailing `Meal Skipped` for the skip marker.
pub fn day_tooltip(date: Date, entry: Option<&DayEntry>) -> String {
    let mut lines: Vec<String> = Vec::new();
    if let Some(entry) = entry {
        for slot in MealSlot::MEALS {
            match entry.get(slot) {
                Some(MealRecord::Skipped { .. }) => lines.push(format!("{slot}: Skipped")),
                Some(MealRecord::Logged {
                    location,
                    healthiness,
                    ..
                }) => lines.push(format!("{slot}: {location} - {healthiness}")),
                None => {}
            }
        }
        if entry.get(MealSlot::Skipped).is_some() {
            lines.push("Meal Skipped".to_string());
        }
    }

    let body = if lines.is_empty() {
        "No meals logged".to_string()
    } else {
        lines.join("\n")
    };
    format!("{}\n{}", short_date_with_year(date), body)
}

#[cfg(test)]
mod tooltip_tests {
    use super::*;
    use crate::meals::repo_types::{Healthiness, Location};
    use time::macros::{date, datetime};

    fn home_healthy(notes: &str) -> MealRecord {
        MealRecord::logged(
            Location::Home,
            Healthiness::Healthy,
            notes,
            datetime!(2024-01-05 12:00 UTC),
        )
    }

    #[test]
    fn date_headers() {
        let d = date!(2024-01-05);
        assert_eq!(short_date(d), "Fri, Jan 5");
        assert_eq!(short_date_with_year(d), "Fri, Jan 5, 2024");
        assert_eq!(long_date(d), "Friday, January 5, 2024");
        assert_eq!(short_month(date!(2024-09-30)), "Sep");
    }

    #[test]
    fn slot_tooltip_variants() {
        let d = date!(2024-01-05);
        assert_eq!(
            slot_tooltip(d, MealSlot::Breakfast, None),
            "Fri, Jan 5 - Breakfast\nNot logged"
        );
        assert_eq!(
            slot_tooltip(
                d,
                MealSlot::Lunch,
                Some(&MealRecord::skipped("busy", datetime!(2024-01-05 12:00 UTC)))
            ),
            "Fri, Jan 5 - Lunch\nSkipped"
        );
        assert_eq!(
            slot_tooltip(d, MealSlot::Dinner, Some(&home_healthy(""))),
            "Fri, Jan 5 - Dinner\nhome - healthy"
        );
        assert_eq!(
            slot_tooltip(d, MealSlot::Dinner, Some(&home_healthy("leftover curry"))),
            "Fri, Jan 5 - Dinner\nhome - healthy\nleftover curry"
        );
    }

    #[test]
    fn day_tooltip_lists_logged_meals() {
        let d = date!(2024-01-05);
        let entry: DayEntry = vec![(MealSlot::Lunch, home_healthy(""))].into_iter().collect();
        assert_eq!(
            day_tooltip(d, Some(&entry)),
            "Fri, Jan 5, 2024\nlunch: home - healthy"
        );
    }

    #[test]
    fn day_tooltip_with_skips() {
        let d = date!(2024-01-05);
        let ts = datetime!(2024-01-05 12:00 UTC);
        let entry: DayEntry = vec![
            (MealSlot::Skipped, MealRecord::skipped("", ts)),
            (MealSlot::Breakfast, MealRecord::skipped("", ts)),
            (MealSlot::Dinner, home_healthy("")),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            day_tooltip(d, Some(&entry)),
            "Fri, Jan 5, 2024\nbreakfast: Skipped\ndinner: home - healthy\nMeal Skipped"
        );
    }

    #[test]
    fn day_tooltip_without_meals() {
        assert_eq!(
            day_tooltip(date!(2024-01-05), None),
            "Fri, Jan 5, 2024\nNo meals logged"
        );
    }
}
