use std::sync::Arc;

use crate::database::models::{Person, Task};
use crate::database::{DatabaseError, PersonRepository, Repositories, TaskRepository};

/// The people/tasks request handler: one method per HTTP operation, each a
/// direct delegation to the repositories.
///
/// Unknown ids are never an error. Mutations become no-ops and reads come
/// back empty.
#[derive(Clone)]
pub struct PeopleService {
    people: Arc<dyn PersonRepository>,
    tasks: Arc<dyn TaskRepository>,
}

impl PeopleService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            people: repositories.people.clone(),
            tasks: repositories.tasks.clone(),
        }
    }

    pub async fn get_people(&self) -> Result<Vec<Person>, DatabaseError> {
        self.people.find_all().await
    }

    pub async fn add_person(&self, person: Person) -> Result<Person, DatabaseError> {
        self.people.save(person).await
    }

    pub async fn remove_person(&self, id: i64) -> Result<(), DatabaseError> {
        if let Some(person) = self.people.find_by_id(id).await? {
            self.people.delete(&person).await?;
        }
        Ok(())
    }

    /// Empties the person's task list. The tasks are orphaned, not deleted.
    pub async fn remove_person_tasks(&self, id: i64) -> Result<(), DatabaseError> {
        if let Some(mut person) = self.people.find_by_id(id).await? {
            person.tasks = Vec::new();
            self.people.save(person).await?;
        }
        Ok(())
    }

    pub async fn get_person_tasks(&self, id: i64) -> Result<Vec<Task>, DatabaseError> {
        // A transient default person stands in for a missing one; it is never saved
        let person = self.people.find_by_id(id).await?.unwrap_or_default();
        Ok(person.tasks)
    }

    /// Links the task to the person when it exists; otherwise saves it unowned
    pub async fn add_person_task(&self, id: i64, mut task: Task) -> Result<Task, DatabaseError> {
        if let Some(person) = self.people.find_by_id(id).await? {
            task.person_id = person.id;
        }
        self.tasks.save(task).await
    }

    /// Saves the task as given; the path id plays no part
    pub async fn add_task(&self, _id: i64, task: Task) -> Result<Task, DatabaseError> {
        self.tasks.save(task).await
    }
}
