use serde::Serialize;
use time::{Date, Duration};

use super::tooltip::short_month;

/// Seven slots, Sunday first. `None` pads days outside the tiled range.
pub type Week = [Option<Date>; 7];

/// Splits the inclusive range `start..=end` into Sunday-aligned weeks.
///
/// Weeks come out oldest first; callers that draw the most recent week
/// first reverse the result. An inverted range yields no weeks.
pub fn tile(start: Date, end: Date) -> Vec<Week> {
    let mut weeks = Vec::new();
    if start > end {
        return weeks;
    }

    let mut week: Week = [None; 7];
    let mut current = Some(start);
    while let Some(date) = current.filter(|d| *d <= end) {
        let offset = date.weekday().number_days_from_sunday() as usize;
        week[offset] = Some(date);
        if offset == 6 {
            weeks.push(week);
            week = [None; 7];
        }
        current = date.next_day();
    }
    if week.iter().any(Option::is_some) {
        weeks.push(week);
    }
    weeks
}

/// The last `days` days ending at `today`, inclusive. `days == 0` gives an
/// inverted (empty) range.
pub fn period_ending(today: Date, days: u32) -> (Date, Date) {
    let back = Duration::days(i64::from(days) - 1);
    let start = today.checked_sub(back).unwrap_or(Date::MIN);
    (start, today)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthLabel {
    /// Column index in the most-recent-first week order.
    pub column: usize,
    pub text: String,
}

/// Month labels for weeks already in display (most recent first) order.
///
/// A column gets a label when the month of its first real date differs
/// from the last label emitted. Column 0 never gets one.
pub fn month_labels(weeks: &[Week]) -> Vec<MonthLabel> {
    let mut labels = Vec::new();
    let mut last_month = None;
    for (column, week) in weeks.iter().enumerate() {
        let Some(first) = week.iter().flatten().next() else {
            continue;
        };
        if column > 0 && last_month != Some(first.month()) {
            labels.push(MonthLabel {
                column,
                text: short_month(*first),
            });
            last_month = Some(first.month());
        }
    }
    labels
}
