use std::sync::Arc;

use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{Person, Task};

/// CRUD access to people and, through them, task ownership
#[async_trait]
pub trait PersonRepository: Send + Sync {
    /// Every person with their tasks, ordered by id
    async fn find_all(&self) -> Result<Vec<Person>, DatabaseError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Person>, DatabaseError>;

    /// Insert or update a person in one atomic unit.
    ///
    /// A person without an id, or with an id that is not stored, is inserted
    /// under a freshly assigned id. Every task in `person.tasks` is saved as
    /// owned by the person; tasks previously owned but no longer listed are
    /// orphaned (owner cleared, row kept).
    async fn save(&self, person: Person) -> Result<Person, DatabaseError>;

    /// Delete the person and every task it owns
    async fn delete(&self, person: &Person) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Every task row, owned or not, ordered by id
    async fn find_all(&self) -> Result<Vec<Task>, DatabaseError>;

    /// Insert or update a task; same id rule as [`PersonRepository::save`]
    async fn save(&self, task: Task) -> Result<Task, DatabaseError>;
}

/// A storage backend serving both repositories
#[async_trait]
pub trait Store: PersonRepository + TaskRepository {
    async fn health_check(&self) -> Result<(), DatabaseError>;
}

/// The repositories handed to the request handler, all backed by one store
#[derive(Clone)]
pub struct Repositories {
    pub people: Arc<dyn PersonRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub store: Arc<dyn Store>,
}

impl Repositories {
    pub fn from_store<S: Store + 'static>(store: S) -> Self {
        let store = Arc::new(store);
        Self {
            people: store.clone(),
            tasks: store.clone(),
            store,
        }
    }
}
