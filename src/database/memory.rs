use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{Person, Task};
use crate::database::repository::{PersonRepository, Store, TaskRepository};

/// Rows as they would sit in the relational tables.
/// A person row carries no tasks; ownership lives on `Task::person_id`.
#[derive(Default)]
struct Tables {
    people: BTreeMap<i64, Option<String>>,
    tasks: BTreeMap<i64, Task>,
    next_person_id: i64,
    next_task_id: i64,
}

impl Tables {
    fn person(&self, id: i64) -> Option<Person> {
        self.people.get(&id).map(|name| Person {
            id: Some(id),
            name: name.clone(),
            tasks: self.owned_tasks(id),
        })
    }

    fn owned_tasks(&self, owner: i64) -> Vec<Task> {
        self.tasks
            .values()
            .filter(|t| t.person_id == Some(owner))
            .cloned()
            .collect()
    }

    fn save_task(&mut self, task: Task) -> Result<Task, DatabaseError> {
        if let Some(owner) = task.person_id {
            if !self.people.contains_key(&owner) {
                return Err(DatabaseError::QueryError(format!(
                    "task owner {} does not exist",
                    owner
                )));
            }
        }
        Ok(self.upsert_task(task))
    }

    /// Caller guarantees the owner exists
    fn upsert_task(&mut self, mut task: Task) -> Task {
        let id = match task.id.filter(|id| self.tasks.contains_key(id)) {
            Some(id) => id,
            None => {
                self.next_task_id += 1;
                self.next_task_id
            }
        };
        task.id = Some(id);
        self.tasks.insert(id, task.clone());
        task
    }
}

/// In-process store used when no database is configured
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersonRepository for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Person>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.people.keys().filter_map(|id| tables.person(*id)).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Person>, DatabaseError> {
        Ok(self.tables.read().await.person(id))
    }

    async fn save(&self, mut person: Person) -> Result<Person, DatabaseError> {
        let mut tables = self.tables.write().await;

        let id = match person.id.filter(|id| tables.people.contains_key(id)) {
            Some(id) => id,
            None => {
                tables.next_person_id += 1;
                tables.next_person_id
            }
        };
        person.id = Some(id);

        // The owner row exists before any task references it, so nothing below can fail
        tables.people.insert(id, person.name.clone());

        let saved: Vec<Task> = std::mem::take(&mut person.tasks)
            .into_iter()
            .map(|mut task| {
                task.person_id = Some(id);
                tables.upsert_task(task)
            })
            .collect();

        for task in tables.tasks.values_mut() {
            if task.person_id == Some(id) && !saved.iter().any(|s| s.id == task.id) {
                task.person_id = None;
            }
        }

        person.tasks = saved;
        Ok(person)
    }

    async fn delete(&self, person: &Person) -> Result<(), DatabaseError> {
        let Some(id) = person.id else {
            return Ok(());
        };

        let mut tables = self.tables.write().await;
        tables.tasks.retain(|_, task| task.person_id != Some(id));
        tables.people.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Task>, DatabaseError> {
        Ok(self.tables.read().await.tasks.values().cloned().collect())
    }

    async fn save(&self, task: Task) -> Result<Task, DatabaseError> {
        self.tables.write().await.save_task(task)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn assigns_independent_sequences() {
        let store = MemoryStore::new();
        let alice = PersonRepository::save(&store, Person::named("Alice")).await.unwrap();
        let task = TaskRepository::save(&store, Task::named("Write spec")).await.unwrap();

        assert_eq!(alice.id, Some(1));
        assert_eq!(task.id, Some(1));
        assert_eq!(task.person_id, None);
    }

    #[tokio::test]
    async fn saving_person_persists_embedded_tasks() {
        let store = MemoryStore::new();
        let mut alice = Person::named("Alice");
        alice.tasks = vec![Task::named("a"), Task::named("b")];

        let saved = PersonRepository::save(&store, alice).await.unwrap();
        assert_eq!(saved.tasks.len(), 2);
        assert!(saved.tasks.iter().all(|t| t.person_id == saved.id));

        let loaded = store.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn saving_with_existing_id_replaces_fields() {
        let store = MemoryStore::new();
        let alice = PersonRepository::save(&store, Person::named("Alice")).await.unwrap();

        let renamed = Person {
            id: alice.id,
            name: Some("Alicia".into()),
            tasks: Vec::new(),
        };
        PersonRepository::save(&store, renamed).await.unwrap();

        let people = PersonRepository::find_all(&store).await.unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].name.as_deref(), Some("Alicia"));
    }

    #[tokio::test]
    async fn saving_with_unknown_id_inserts() {
        let store = MemoryStore::new();
        let ghost = Person {
            id: Some(42),
            name: Some("Ghost".into()),
            tasks: Vec::new(),
        };
        let saved = PersonRepository::save(&store, ghost).await.unwrap();
        assert_eq!(saved.id, Some(1));
    }

    #[tokio::test]
    async fn dropping_tasks_from_person_orphans_them() {
        let store = MemoryStore::new();
        let mut alice = Person::named("Alice");
        alice.tasks = vec![Task::named("a")];
        let mut alice = PersonRepository::save(&store, alice).await.unwrap();

        alice.tasks.clear();
        PersonRepository::save(&store, alice).await.unwrap();

        assert!(store.find_by_id(1).await.unwrap().unwrap().tasks.is_empty());
        let tasks = TaskRepository::find_all(&store).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].person_id, None);
    }

    #[tokio::test]
    async fn delete_cascades_to_owned_tasks_only() {
        let store = MemoryStore::new();
        let mut alice = Person::named("Alice");
        alice.tasks = vec![Task::named("owned")];
        let alice = PersonRepository::save(&store, alice).await.unwrap();
        TaskRepository::save(&store, Task::named("loose")).await.unwrap();

        store.delete(&alice).await.unwrap();

        assert!(PersonRepository::find_all(&store).await.unwrap().is_empty());
        let tasks = TaskRepository::find_all(&store).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name.as_deref(), Some("loose"));
    }

    #[tokio::test]
    async fn rejects_task_with_missing_owner() {
        let store = MemoryStore::new();
        let mut task = Task::named("stray");
        task.person_id = Some(7);

        let err = TaskRepository::save(&store, task).await.unwrap_err();
        assert!(matches!(err, DatabaseError::QueryError(_)));
        assert!(TaskRepository::find_all(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn resaving_person_leaves_other_owners_alone() {
        let store = MemoryStore::new();
        let mut alice = Person::named("Alice");
        alice.tasks = vec![Task::named("a1")];
        let mut alice = PersonRepository::save(&store, alice).await.unwrap();
        let mut bob = Person::named("Bob");
        bob.tasks = vec![Task::named("b1"), Task::named("b2")];
        let bob = PersonRepository::save(&store, bob).await.unwrap();

        alice.tasks.push(Task::named("a2"));
        let alice = PersonRepository::save(&store, alice).await.unwrap();

        assert_eq!(alice.tasks.len(), 2);
        assert_eq!(alice.tasks[0].id, Some(1));
        assert_eq!(alice.tasks[1].id, Some(4));
        let reloaded = store.find_by_id(bob.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(reloaded.tasks, bob.tasks);
        assert_eq!(TaskRepository::find_all(&store).await.unwrap().len(), 4);
    }
}
