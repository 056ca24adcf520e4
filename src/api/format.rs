//! Wire shapes for people and tasks.
//!
//! Requests deserialize into payloads and responses serialize from views, so
//! the person/task back-reference never reaches the wire: a person embeds its
//! tasks, a task never names its person. Dates travel as epoch milliseconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::{Person, Task};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(
        default,
        serialize_with = "chrono::serde::ts_milliseconds_option::serialize",
        deserialize_with = "lenient_date::deserialize"
    )]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        serialize_with = "chrono::serde::ts_milliseconds_option::serialize",
        deserialize_with = "lenient_date::deserialize"
    )]
    pub end_date: Option<DateTime<Utc>>,
}

/// Request dates: epoch millis, an RFC 3339 timestamp or a plain `YYYY-MM-DD`
mod lenient_date {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{de::Error, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DateInput {
        Millis(i64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<DateInput>::deserialize(deserializer)? {
            None => Ok(None),
            Some(DateInput::Millis(millis)) => DateTime::from_timestamp_millis(millis)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", millis))),
            Some(DateInput::Text(text)) => parse(&text)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("unrecognised date: {}", text))),
        }
    }

    fn parse(text: &str) -> Option<DateTime<Utc>> {
        let text = text.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
            return Some(parsed.with_timezone(&Utc));
        }
        // ISO-8601 offsets without a colon, e.g. +0000
        if let Ok(parsed) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|midnight| midnight.and_utc())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonView {
    pub id: i64,
    pub name: Option<String>,
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub end_date: Option<DateTime<Utc>>,
}

impl From<PersonPayload> for Person {
    fn from(payload: PersonPayload) -> Self {
        Person {
            id: payload.id,
            name: payload.name,
            tasks: payload.tasks.into_iter().map(Task::from).collect(),
        }
    }
}

impl From<TaskPayload> for Task {
    fn from(payload: TaskPayload) -> Self {
        Task {
            id: payload.id,
            name: payload.name,
            description: payload.description,
            start_date: payload.start_date,
            end_date: payload.end_date,
            person_id: None,
        }
    }
}

impl From<Person> for PersonView {
    fn from(person: Person) -> Self {
        PersonView {
            id: person.id.unwrap_or_default(),
            name: person.name,
            tasks: person.tasks.into_iter().map(TaskView::from).collect(),
        }
    }
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        TaskView {
            id: task.id.unwrap_or_default(),
            name: task.name,
            description: task.description,
            start_date: task.start_date,
            end_date: task.end_date,
        }
    }
}
