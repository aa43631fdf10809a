use serde::{Serialize, Serializer};
use time::Date;

use super::classify::{classify, classify_day, Category};
use super::tiling::{month_labels, tile, MonthLabel, Week};
use super::tooltip::{day_tooltip, slot_tooltip};
use crate::meals::repo_types::{MealDate, MealSlot, MealStore};

fn serialize_date<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => serializer.collect_str(&MealDate::from(*d)),
        None => serializer.serialize_none(),
    }
}

/// One square of a heat-grid. Padding squares have no date and no tooltip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    #[serde(serialize_with = "serialize_date")]
    pub date: Option<Date>,
    pub category: Category,
    pub tooltip: Option<String>,
}

impl GridCell {
    pub fn padding() -> Self {
        Self {
            date: None,
            category: Category::NoData,
            tooltip: None,
        }
    }

    pub fn is_padding(&self) -> bool {
        self.date.is_none()
    }

    /// Style class: the category, or `empty` for padding.
    pub fn class_name(&self) -> &'static str {
        if self.is_padding() {
            "empty"
        } else {
            self.category.as_str()
        }
    }
}

/// Lays out one cell per week slot, week by week, Sunday to Saturday.
///
/// Knows nothing about meals: `classify` and `tooltip` are asked about each
/// real date and padding slots become [`GridCell::padding`].
pub fn render_cells<C, T>(weeks: &[Week], classify: C, tooltip: T) -> Vec<GridCell>
where
    C: Fn(Date) -> Category,
    T: Fn(Date) -> String,
{
    weeks
        .iter()
        .flat_map(|week| week.iter())
        .map(|slot| match slot {
            Some(date) => GridCell {
                date: Some(*date),
                category: classify(*date),
                tooltip: Some(tooltip(*date)),
            },
            None => GridCell::padding(),
        })
        .collect()
}

/// A day of the detailed grid: breakfast, lunch and dinner squares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailedDay {
    #[serde(serialize_with = "serialize_date")]
    pub date: Option<Date>,
    pub meals: [GridCell; 3],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridView<C> {
    /// Number of week columns, most recent first.
    pub weeks: usize,
    pub month_labels: Vec<MonthLabel>,
    pub cells: Vec<C>,
}

fn display_weeks(start: Date, end: Date) -> Vec<Week> {
    let mut weeks = tile(start, end);
    weeks.reverse();
    weeks
}

/// One square per day, coloured by the best meal of the day.
pub fn coarse_view(store: &MealStore, start: Date, end: Date) -> GridView<GridCell> {
    let weeks = display_weeks(start, end);
    let cells = render_cells(
        &weeks,
        |date| classify_day(store.day(date)),
        |date| day_tooltip(date, store.day(date)),
    );
    GridView {
        weeks: weeks.len(),
        month_labels: month_labels(&weeks),
        cells,
    }
}

/// Three squares per day, one per meal slot.
pub fn detailed_view(store: &MealStore, start: Date, end: Date) -> GridView<DetailedDay> {
    let weeks = display_weeks(start, end);
    let [breakfast, lunch, dinner] = MealSlot::MEALS.map(|slot| {
        render_cells(
            &weeks,
            |date| classify(store.record(date, slot)),
            |date| slot_tooltip(date, slot, store.record(date, slot)),
        )
    });
    let cells = breakfast
        .into_iter()
        .zip(lunch)
        .zip(dinner)
        .map(|((b, l), d)| DetailedDay {
            date: b.date,
            meals: [b, l, d],
        })
        .collect();
    GridView {
        weeks: weeks.len(),
        month_labels: month_labels(&weeks),
        cells,
    }
}
