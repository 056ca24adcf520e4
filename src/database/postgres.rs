use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use crate::database::manager::DatabaseError;
use crate::database::models::{Person, Task};
use crate::database::repository::{PersonRepository, Store, TaskRepository};

const TASK_COLUMNS: &str = "id, name, description, startdate, enddate, personid";

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS person (
        id BIGSERIAL PRIMARY KEY,
        name TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS task (
        id BIGSERIAL PRIMARY KEY,
        name TEXT,
        description TEXT,
        startdate TIMESTAMPTZ,
        enddate TIMESTAMPTZ,
        personid BIGINT REFERENCES person(id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS task_personid_idx ON task (personid)",
];

/// PostgreSQL-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the person and task tables when they do not exist yet
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema ready");
        Ok(())
    }

    async fn tasks_by_owner(&self, person_ids: &[i64]) -> Result<HashMap<i64, Vec<Task>>, DatabaseError> {
        if person_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT {} FROM task WHERE personid = ANY($1) ORDER BY id",
            TASK_COLUMNS
        );
        let tasks: Vec<Task> = sqlx::query_as(&sql)
            .bind(person_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut grouped: HashMap<i64, Vec<Task>> = HashMap::new();
        for task in tasks {
            if let Some(owner) = task.person_id {
                grouped.entry(owner).or_default().push(task);
            }
        }
        Ok(grouped)
    }
}

/// Update the row when `task.id` names an existing task, insert otherwise
async fn upsert_task(conn: &mut PgConnection, mut task: Task) -> Result<Task, DatabaseError> {
    if let Some(id) = task.id {
        let updated = sqlx::query(
            "UPDATE task SET name = $2, description = $3, startdate = $4, enddate = $5, personid = $6 WHERE id = $1",
        )
        .bind(id)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.start_date)
        .bind(task.end_date)
        .bind(task.person_id)
        .execute(&mut *conn)
        .await?;

        if updated.rows_affected() == 1 {
            return Ok(task);
        }
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO task (name, description, startdate, enddate, personid) VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&task.name)
    .bind(&task.description)
    .bind(task.start_date)
    .bind(task.end_date)
    .bind(task.person_id)
    .fetch_one(&mut *conn)
    .await?;

    task.id = Some(id);
    Ok(task)
}

#[async_trait]
impl PersonRepository for PgStore {
    async fn find_all(&self) -> Result<Vec<Person>, DatabaseError> {
        let mut people: Vec<Person> = sqlx::query_as("SELECT id, name FROM person ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<i64> = people.iter().filter_map(|p| p.id).collect();
        let mut tasks = self.tasks_by_owner(&ids).await?;
        for person in &mut people {
            if let Some(owned) = person.id.and_then(|id| tasks.remove(&id)) {
                person.tasks = owned;
            }
        }
        Ok(people)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Person>, DatabaseError> {
        let person: Option<Person> = sqlx::query_as("SELECT id, name FROM person WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match person {
            Some(mut person) => {
                person.tasks = self.tasks_by_owner(&[id]).await?.remove(&id).unwrap_or_default();
                Ok(Some(person))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, mut person: Person) -> Result<Person, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let mut stored_id = None;
        if let Some(id) = person.id {
            let updated = sqlx::query("UPDATE person SET name = $2 WHERE id = $1")
                .bind(id)
                .bind(&person.name)
                .execute(&mut *tx)
                .await?;
            if updated.rows_affected() == 1 {
                stored_id = Some(id);
            }
        }
        let id: i64 = match stored_id {
            Some(id) => id,
            None => {
                sqlx::query_scalar("INSERT INTO person (name) VALUES ($1) RETURNING id")
                    .bind(&person.name)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };
        person.id = Some(id);

        let mut tasks = Vec::with_capacity(person.tasks.len());
        for mut task in std::mem::take(&mut person.tasks) {
            task.person_id = Some(id);
            tasks.push(upsert_task(&mut *tx, task).await?);
        }

        let kept: Vec<i64> = tasks.iter().filter_map(|t| t.id).collect();
        let orphaned = sqlx::query("UPDATE task SET personid = NULL WHERE personid = $1 AND NOT (id = ANY($2))")
            .bind(id)
            .bind(&kept)
            .execute(&mut *tx)
            .await?;
        if orphaned.rows_affected() > 0 {
            debug!("Orphaned {} task(s) of person {}", orphaned.rows_affected(), id);
        }

        tx.commit().await?;

        person.tasks = tasks;
        Ok(person)
    }

    async fn delete(&self, person: &Person) -> Result<(), DatabaseError> {
        let Some(id) = person.id else {
            return Ok(());
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM task WHERE personid = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM person WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn find_all(&self) -> Result<Vec<Task>, DatabaseError> {
        let sql = format!("SELECT {} FROM task ORDER BY id", TASK_COLUMNS);
        let tasks = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(tasks)
    }

    async fn save(&self, task: Task) -> Result<Task, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        upsert_task(&mut *conn, task).await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
