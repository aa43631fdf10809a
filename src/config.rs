use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory the key-value store files live in.
    pub data_dir: PathBuf,
    /// Days covered by the coarse (one square per day) grid. 0 shows nothing.
    pub period_days: u32,
    /// Days covered by the detailed (three squares per day) grid.
    pub detailed_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".mealgrid"),
            period_days: 30,
            detailed_days: 90,
        }
    }
}

fn parse_days(name: &str, value: Option<String>, default: u32) -> anyhow::Result<u32> {
    match value {
        Some(v) => v
            .trim()
            .parse::<u32>()
            .with_context(|| format!("{name} must be a whole number of days, got `{v}`")),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let data_dir = lookup("MEALGRID_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let period_days = parse_days(
            "MEALGRID_PERIOD_DAYS",
            lookup("MEALGRID_PERIOD_DAYS"),
            defaults.period_days,
        )?;
        let detailed_days = parse_days(
            "MEALGRID_DETAILED_DAYS",
            lookup("MEALGRID_DETAILED_DAYS"),
            defaults.detailed_days,
        )?;
        Ok(Self {
            data_dir,
            period_days,
            detailed_days,
        })
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup_in(&[])).expect("defaults");
        assert_eq!(config.data_dir, PathBuf::from(".mealgrid"));
        assert_eq!(config.period_days, 30);
        assert_eq!(config.detailed_days, 90);
    }

    #[test]
    fn zero_days_is_an_empty_period() {
        let config = AppConfig::from_lookup(lookup_in(&[
            ("MEALGRID_DATA_DIR", "/tmp/meals"),
            ("MEALGRID_PERIOD_DAYS", "0"),
            ("MEALGRID_DETAILED_DAYS", "14"),
        ]))
        .expect("zero allowed");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/meals"));
        assert_eq!(config.period_days, 0);
        assert_eq!(config.detailed_days, 14);

        let state = crate::state::AppState::fake();
        let view = state.session.coarse_view(time::macros::date!(2024-01-05), config.period_days);
        assert_eq!(view.weeks, 0);
        assert!(view.cells.is_empty());
    }

    #[test]
    fn unparseable_days_are_rejected() {
        let err = AppConfig::from_lookup(lookup_in(&[("MEALGRID_PERIOD_DAYS", "thirty")]))
            .unwrap_err();
        assert!(err.to_string().contains("MEALGRID_PERIOD_DAYS"));
    }
}
