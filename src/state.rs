use std::sync::Arc;

use crate::audit::{sink, Auditor};
use crate::config::AppConfig;
use crate::database::{DatabaseManager, Repositories, Store};
use crate::services::PeopleService;

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub people: PeopleService,
    pub auditor: Auditor,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(repositories: Repositories, auditor: Auditor) -> Self {
        Self {
            people: PeopleService::new(&repositories),
            auditor,
            store: repositories.store,
        }
    }

    /// Open the configured store and audit sink
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let repositories = DatabaseManager::open(&config.database).await?;
        let sink = sink::from_config(&config.audit)?;
        Ok(Self::new(
            repositories,
            Auditor::new(sink, config.audit.function_name.clone()),
        ))
    }
}
