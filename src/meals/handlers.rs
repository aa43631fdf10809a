use std::path::{Path, PathBuf};

use anyhow::Context;
use time::{Date, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::calendar::{Category, DetailedDay, GridCell, GridView, MonthLabel};
use crate::meals::dto::EMPTY_HISTORY_TEXT;
use crate::meals::repo_types::{Healthiness, Location, MealRecord, MealSlot};
use crate::reconcile::ImportMode;
use crate::state::AppState;

/// User confirmation, asked before destructive actions.
pub trait Prompt {
    fn confirm(&mut self, question: &str) -> bool;
    /// Merge, replace, or `None` to cancel a staged import.
    fn choose_import_mode(&mut self) -> Option<ImportMode>;
}

/// What the user filled in when logging a meal.
#[derive(Debug, Clone, Default)]
pub struct MealInput {
    pub skipped: bool,
    pub location: Option<String>,
    pub healthiness: Option<String>,
    pub notes: String,
}

fn build_record(slot: MealSlot, input: MealInput, now: OffsetDateTime) -> anyhow::Result<MealRecord> {
    if input.skipped || slot == MealSlot::Skipped {
        return Ok(MealRecord::skipped(input.notes, now));
    }
    let location = input
        .location
        .filter(|s| !s.is_empty())
        .context("location is required unless the meal was skipped")?;
    let healthiness = input
        .healthiness
        .filter(|s| !s.is_empty())
        .context("healthiness is required unless the meal was skipped")?;
    Ok(MealRecord::logged(
        Location::from(location),
        Healthiness::from(healthiness),
        input.notes,
        now,
    ))
}

#[instrument(skip(state, input))]
pub fn log_meal(
    state: &mut AppState,
    date: Date,
    slot: MealSlot,
    input: MealInput,
    now: OffsetDateTime,
) -> anyhow::Result<String> {
    let record = build_record(slot, input, now)?;
    let replaced = state.session.add_or_replace(date, slot, record)?;
    info!(%date, %slot, replaced = replaced.is_some(), "meal logged");
    Ok("Meal logged successfully!".to_string())
}

#[instrument(skip(state, prompt))]
pub fn delete_meal(
    state: &mut AppState,
    date: Date,
    slot: MealSlot,
    prompt: &mut dyn Prompt,
) -> anyhow::Result<String> {
    if state.session.meals().record(date, slot).is_none() {
        anyhow::bail!("no {slot} entry logged for {date}");
    }
    if !prompt.confirm(&format!("Are you sure you want to delete this {slot} entry?")) {
        return Ok("Deletion cancelled.".to_string());
    }
    state.session.delete(date, slot)?;
    info!(%date, %slot, "meal deleted");
    Ok("Meal deleted successfully!".to_string())
}

/// Changes to apply to an existing entry; unset fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct MealEdit {
    pub date: Option<Date>,
    pub slot: Option<MealSlot>,
    pub skipped: Option<bool>,
    pub location: Option<String>,
    pub healthiness: Option<String>,
    pub notes: Option<String>,
}

#[instrument(skip(state, edit))]
pub fn edit_meal(
    state: &mut AppState,
    date: Date,
    slot: MealSlot,
    edit: MealEdit,
    now: OffsetDateTime,
) -> anyhow::Result<String> {
    let original = state
        .session
        .meals()
        .record(date, slot)
        .cloned()
        .with_context(|| format!("no {slot} entry logged for {date}"))?;
    let (was_skipped, location, healthiness) = match &original {
        MealRecord::Skipped { .. } => (true, None, None),
        MealRecord::Logged {
            location,
            healthiness,
            ..
        } => (
            false,
            Some(location.as_str().to_string()),
            Some(healthiness.as_str().to_string()),
        ),
    };
    let new_date = edit.date.unwrap_or(date);
    let new_slot = edit.slot.unwrap_or(slot);
    let input = MealInput {
        skipped: edit.skipped.unwrap_or(was_skipped),
        location: edit.location.or(location),
        healthiness: edit.healthiness.or(healthiness),
        notes: edit.notes.unwrap_or_else(|| original.notes().to_string()),
    };

    let record = build_record(new_slot, input, now).map_err(|e| {
        warn!(error = %e, "edit rejected, entry left unchanged");
        e
    })?;
    state
        .session
        .move_entry(date, slot, new_date, new_slot, record)?;
    info!(from = %date, to = %new_date, %new_slot, "meal edited");
    Ok("Meal logged successfully!".to_string())
}

pub fn history(state: &AppState, filter: Option<Date>) -> String {
    let mut out = format!("Total meals logged: {}\n", state.session.total_meals());
    let groups = state.session.history_groups(filter);
    if groups.is_empty() {
        out.push_str(EMPTY_HISTORY_TEXT);
        out.push('\n');
        return out;
    }
    for group in groups {
        out.push_str(&format!("\n{}\n", group.header));
        for item in group.items {
            out.push_str(&format!(
                "  {:<9} {:<20} [{}]\n",
                item.label, item.details, item.category
            ));
            if let Some(notes) = item.notes {
                out.push_str(&format!("            {notes}\n"));
            }
        }
    }
    out
}

pub fn show(state: &AppState, date: Date, slot: Option<MealSlot>) -> String {
    match slot {
        Some(slot) => format!(
            "{}\n{}",
            state.session.slot_classification(date, slot),
            state.session.slot_tooltip(date, slot)
        ),
        None => format!(
            "{}\n{}",
            state.session.classification(date),
            state.session.tooltip(date)
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridKind {
    Coarse,
    Detailed,
}

fn glyph(cell: &GridCell) -> char {
    if cell.is_padding() {
        return ' ';
    }
    match cell.category {
        Category::HomeHealthy => '#',
        Category::OutsideHealthy => '+',
        Category::HomeUnhealthy => 'o',
        Category::OutsideUnhealthy => '-',
        Category::MealSkipped => 'x',
        Category::NoData => '.',
    }
}

const LEGEND: &str =
    "# home-healthy  + outside-healthy  o home-unhealthy  - outside-unhealthy  x skipped  . no data";

fn month_header(labels: &[MonthLabel], column_width: usize, indent: usize) -> String {
    let mut line = " ".repeat(indent);
    for label in labels {
        let at = indent + label.column * column_width;
        if line.len() < at {
            line.push_str(&" ".repeat(at - line.len()));
        } else if line.len() > indent {
            line.push(' ');
        }
        line.push_str(&label.text);
    }
    line.trim_end().to_string()
}

const WEEKDAY_LABELS: [&str; 7] = ["", "Mon", "", "Wed", "", "Fri", ""];

fn render_coarse(view: &GridView<GridCell>) -> String {
    let mut out = month_header(&view.month_labels, 2, 4);
    out.push('\n');
    for (weekday, label) in WEEKDAY_LABELS.iter().enumerate() {
        let row: String = (0..view.weeks)
            .map(|week| glyph(&view.cells[week * 7 + weekday]))
            .flat_map(|g| [g, ' '])
            .collect();
        out.push_str(&format!("{label:<4}{}\n", row.trim_end()));
    }
    out
}

fn render_detailed(view: &GridView<DetailedDay>) -> String {
    let mut out = month_header(&view.month_labels, 4, 4);
    out.push('\n');
    for (weekday, label) in WEEKDAY_LABELS.iter().enumerate() {
        let row: String = (0..view.weeks)
            .map(|week| {
                let day = &view.cells[week * 7 + weekday];
                let mut squares: String = day.meals.iter().map(glyph).collect();
                squares.push(' ');
                squares
            })
            .collect();
        out.push_str(&format!("{label:<4}{}\n", row.trim_end()));
    }
    out.push_str("    (each day: breakfast lunch dinner)\n");
    out
}

#[instrument(skip(state))]
pub fn grid(
    state: &AppState,
    kind: GridKind,
    today: Date,
    days: Option<u32>,
    json: bool,
) -> anyhow::Result<String> {
    let out = match kind {
        GridKind::Coarse => {
            let view = state
                .session
                .coarse_view(today, days.unwrap_or(state.config.period_days));
            if json {
                serde_json::to_string_pretty(&view)?
            } else {
                format!("{}{LEGEND}\n", render_coarse(&view))
            }
        }
        GridKind::Detailed => {
            let view = state
                .session
                .detailed_view(today, days.unwrap_or(state.config.detailed_days));
            if json {
                serde_json::to_string_pretty(&view)?
            } else {
                format!("{}{LEGEND}\n", render_detailed(&view))
            }
        }
    };
    Ok(out)
}

#[instrument(skip(state))]
pub fn export(
    state: &AppState,
    now: OffsetDateTime,
    output: Option<PathBuf>,
) -> anyhow::Result<PathBuf> {
    let document = state.session.export(now);
    let path = output.unwrap_or_else(|| PathBuf::from(document.file_name()));
    let text = serde_json::to_string_pretty(&document).context("serialize export")?;
    std::fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), meals = document.meals.total_meals(), "data exported");
    Ok(path)
}

/// Two-phase import: validate the file, then merge/replace/cancel on the
/// user's say-so. A replace additionally needs explicit confirmation.
#[instrument(skip(state, prompt))]
pub fn import(
    state: &mut AppState,
    path: &Path,
    mode: Option<ImportMode>,
    prompt: &mut dyn Prompt,
) -> anyhow::Result<String> {
    let staged = match state.session.stage_import_file(path) {
        Ok(staged) => staged,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "import rejected");
            return Err(e.into());
        }
    };
    info!(days = staged.len(), meals = staged.total_meals(), "import file validated");

    let Some(mode) = mode.or_else(|| prompt.choose_import_mode()) else {
        state.session.cancel_import();
        return Ok("Import cancelled.".to_string());
    };
    if mode == ImportMode::Replace
        && !prompt.confirm("This will REPLACE all your existing data. Are you sure?")
    {
        state.session.cancel_import();
        return Ok("Import cancelled.".to_string());
    }
    state.session.confirm_import(mode)?;
    Ok(format!("Data imported successfully using {mode} mode!"))
}
