//! Calendar heat-grids: tiling a date range into weeks, classifying days
//! and meal slots, and laying the result out as cells.

pub mod classify;
pub mod grid;
pub mod tiling;
pub mod tooltip;

pub use classify::{classify, classify_day, Category};
pub use grid::{coarse_view, detailed_view, render_cells, DetailedDay, GridCell, GridView};
pub use tiling::{month_labels, period_ending, tile, MonthLabel, Week};
