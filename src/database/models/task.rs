use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// `None` until the task has been saved
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[sqlx(rename = "startdate")]
    pub start_date: Option<DateTime<Utc>>,
    #[sqlx(rename = "enddate")]
    pub end_date: Option<DateTime<Utc>>,
    /// Owning person; `None` for unowned (or orphaned) tasks
    #[sqlx(rename = "personid")]
    pub person_id: Option<i64>,
}

impl Task {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}
