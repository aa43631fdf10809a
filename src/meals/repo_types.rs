use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use time::{macros::format_description, Date, OffsetDateTime};

/// One meal occasion of a day, or the marker for a skipped meal.
///
/// Ordering follows the order the day is eaten in, which is also the order
/// used by the history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Skipped,
}

impl MealSlot {
    pub const ALL: [MealSlot; 4] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Dinner,
        MealSlot::Skipped,
    ];

    /// The three real meals, in the order the detailed grid draws them.
    pub const MEALS: [MealSlot; 3] = [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
            MealSlot::Skipped => "skipped",
        }
    }

    /// Capitalized name, e.g. `Breakfast`.
    pub fn label(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
            MealSlot::Skipped => "Skipped",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealSlot::ALL
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| format!("unknown meal slot `{s}`"))
    }
}

impl Serialize for MealSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MealSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Where a meal was eaten. Values other than `home`/`outside` found in
/// stored or imported data are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Home,
    Outside,
    Other(String),
}

impl Location {
    pub fn as_str(&self) -> &str {
        match self {
            Location::Home => "home",
            Location::Outside => "outside",
            Location::Other(s) => s,
        }
    }
}

impl From<String> for Location {
    fn from(s: String) -> Self {
        match s.as_str() {
            "home" => Location::Home,
            "outside" => Location::Outside,
            _ => Location::Other(s),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Healthiness {
    Healthy,
    Unhealthy,
    Other(String),
}

impl Healthiness {
    pub fn as_str(&self) -> &str {
        match self {
            Healthiness::Healthy => "healthy",
            Healthiness::Unhealthy => "unhealthy",
            Healthiness::Other(s) => s,
        }
    }
}

impl From<String> for Healthiness {
    fn from(s: String) -> Self {
        match s.as_str() {
            "healthy" => Healthiness::Healthy,
            "unhealthy" => Healthiness::Unhealthy,
            _ => Healthiness::Other(s),
        }
    }
}

impl fmt::Display for Healthiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single logged entry for one (date, slot).
///
/// On the wire a skipped entry carries `"skipped": true` and no
/// location/healthiness; a logged entry carries both and no flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMealRecord", into = "RawMealRecord")]
pub enum MealRecord {
    Skipped {
        notes: String,
        timestamp: OffsetDateTime,
    },
    Logged {
        location: Location,
        healthiness: Healthiness,
        notes: String,
        timestamp: OffsetDateTime,
    },
}

impl MealRecord {
    pub fn skipped(notes: impl Into<String>, timestamp: OffsetDateTime) -> Self {
        MealRecord::Skipped {
            notes: notes.into(),
            timestamp,
        }
    }

    pub fn logged(
        location: Location,
        healthiness: Healthiness,
        notes: impl Into<String>,
        timestamp: OffsetDateTime,
    ) -> Self {
        MealRecord::Logged {
            location,
            healthiness,
            notes: notes.into(),
            timestamp,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, MealRecord::Skipped { .. })
    }

    pub fn notes(&self) -> &str {
        match self {
            MealRecord::Skipped { notes, .. } | MealRecord::Logged { notes, .. } => notes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RawMealRecord {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    healthiness: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

impl TryFrom<RawMealRecord> for MealRecord {
    type Error = String;

    fn try_from(raw: RawMealRecord) -> Result<Self, Self::Error> {
        let notes = raw.notes.unwrap_or_default();
        if raw.skipped {
            return Ok(MealRecord::Skipped {
                notes,
                timestamp: raw.timestamp,
            });
        }
        let location = raw
            .location
            .filter(|s| !s.is_empty())
            .ok_or("meal record is missing `location`")?;
        let healthiness = raw
            .healthiness
            .filter(|s| !s.is_empty())
            .ok_or("meal record is missing `healthiness`")?;
        Ok(MealRecord::Logged {
            location: location.into(),
            healthiness: healthiness.into(),
            notes,
            timestamp: raw.timestamp,
        })
    }
}

impl From<MealRecord> for RawMealRecord {
    fn from(record: MealRecord) -> Self {
        match record {
            MealRecord::Skipped { notes, timestamp } => RawMealRecord {
                skipped: true,
                location: None,
                healthiness: None,
                notes: Some(notes),
                timestamp,
            },
            MealRecord::Logged {
                location,
                healthiness,
                notes,
                timestamp,
            } => RawMealRecord {
                skipped: false,
                location: Some(location.as_str().to_string()),
                healthiness: Some(healthiness.as_str().to_string()),
                notes: Some(notes),
                timestamp,
            },
        }
    }
}

/// Everything logged for one calendar date, at most one record per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayEntry {
    records: BTreeMap<MealSlot, MealRecord>,
}

impl DayEntry {
    pub fn get(&self, slot: MealSlot) -> Option<&MealRecord> {
        self.records.get(&slot)
    }

    pub fn insert(&mut self, slot: MealSlot, record: MealRecord) -> Option<MealRecord> {
        self.records.insert(slot, record)
    }

    pub fn remove(&mut self, slot: MealSlot) -> Option<MealRecord> {
        self.records.remove(&slot)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MealSlot, &MealRecord)> {
        self.records.iter().map(|(slot, record)| (*slot, record))
    }

    pub fn records(&self) -> impl Iterator<Item = &MealRecord> {
        self.records.values()
    }
}

impl FromIterator<(MealSlot, MealRecord)> for DayEntry {
    fn from_iter<I: IntoIterator<Item = (MealSlot, MealRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// A calendar-local date, keyed as `YYYY-MM-DD` in stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MealDate(Date);

impl MealDate {
    pub fn date(self) -> Date {
        self.0
    }
}

impl From<Date> for MealDate {
    fn from(date: Date) -> Self {
        Self(date)
    }
}

impl From<MealDate> for Date {
    fn from(date: MealDate) -> Self {
        date.0
    }
}

pub(crate) fn is_date_key(s: &str) -> bool {
    lazy_static! {
        static ref DATE_KEY_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    }
    DATE_KEY_RE.is_match(s)
}

impl FromStr for MealDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_date_key(s) {
            return Err(format!("`{s}` is not a YYYY-MM-DD date"));
        }
        Date::parse(s, format_description!("[year]-[month]-[day]"))
            .map(MealDate)
            .map_err(|e| format!("`{s}` is not a valid date: {e}"))
    }
}

impl fmt::Display for MealDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl Serialize for MealDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MealDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// All logged meals, keyed by date. Never holds an empty [`DayEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MealStore {
    days: BTreeMap<MealDate, DayEntry>,
}

impl<'de> Deserialize<'de> for MealStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let days = BTreeMap::<MealDate, DayEntry>::deserialize(deserializer)?;
        Ok(days.into_iter().collect())
    }
}

impl FromIterator<(MealDate, DayEntry)> for MealStore {
    fn from_iter<I: IntoIterator<Item = (MealDate, DayEntry)>>(iter: I) -> Self {
        Self {
            days: iter
                .into_iter()
                .filter(|(_, entry)| !entry.is_empty())
                .collect(),
        }
    }
}

impl MealStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn day(&self, date: Date) -> Option<&DayEntry> {
        self.days.get(&MealDate(date))
    }

    pub fn record(&self, date: Date, slot: MealSlot) -> Option<&MealRecord> {
        self.day(date).and_then(|entry| entry.get(slot))
    }

    /// Stores `record` under (date, slot), returning whatever it replaced.
    pub fn upsert(&mut self, date: Date, slot: MealSlot, record: MealRecord) -> Option<MealRecord> {
        self.days
            .entry(MealDate(date))
            .or_default()
            .insert(slot, record)
    }

    /// Removes the (date, slot) record; a date left with no records is
    /// dropped entirely.
    pub fn remove(&mut self, date: Date, slot: MealSlot) -> Option<MealRecord> {
        let key = MealDate(date);
        let entry = self.days.get_mut(&key)?;
        let removed = entry.remove(slot);
        if entry.is_empty() {
            self.days.remove(&key);
        }
        removed
    }

    /// Days in ascending date order.
    pub fn days(&self) -> impl DoubleEndedIterator<Item = (Date, &DayEntry)> {
        self.days.iter().map(|(date, entry)| (date.date(), entry))
    }

    pub fn contains_date(&self, date: Date) -> bool {
        self.days.contains_key(&MealDate(date))
    }

    /// Number of dates with at least one record.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Number of records across all dates.
    pub fn total_meals(&self) -> usize {
        self.days.values().map(DayEntry::len).sum()
    }
}
