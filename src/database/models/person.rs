use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::task::Task;

/// Owning side of the person/task association.
///
/// `tasks` is never stored on the person row; repositories derive it from
/// `task.personid` every time a person is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Person {
    /// `None` until the person has been saved
    pub id: Option<i64>,
    pub name: Option<String>,
    #[sqlx(skip)]
    pub tasks: Vec<Task>,
}

impl Person {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}
