use anyhow::Context;

use crate::config::AppConfig;
use crate::meals::services::MealSession;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

pub struct AppState {
    pub config: AppConfig,
    pub session: MealSession<Box<dyn KeyValueStore>>,
}

impl AppState {
    pub fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store = Box::new(FileStore::new(&config.data_dir)) as Box<dyn KeyValueStore>;
        let session = MealSession::open(store)
            .with_context(|| format!("load meals from {}", config.data_dir.display()))?;
        Ok(Self { config, session })
    }

    pub fn from_parts(config: AppConfig, store: Box<dyn KeyValueStore>) -> anyhow::Result<Self> {
        let session = MealSession::open(store).context("load meals")?;
        Ok(Self { config, session })
    }

    /// In-memory state with default settings.
    pub fn fake() -> Self {
        Self::from_parts(AppConfig::default(), Box::new(MemoryStore::new()))
            .expect("empty in-memory store always loads")
    }
}
