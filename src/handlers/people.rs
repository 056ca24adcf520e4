use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::{PersonPayload, PersonView, TaskPayload, TaskView};
use crate::database::models::{Person, Task};
use crate::error::ApiResult;
use crate::services::PeopleService;
use crate::state::AppState;

/// Audit target name for every route in this module
fn target() -> &'static str {
    std::any::type_name::<PeopleService>()
}

/// GET /People - every person with their tasks
pub async fn people_get(State(state): State<AppState>) -> ApiResult<Json<Vec<PersonView>>> {
    let people = state
        .auditor
        .around(target(), "get_people", &(), state.people.get_people())
        .await?;

    Ok(Json(people.into_iter().map(PersonView::from).collect()))
}

/// POST /People - create (or replace, when the id exists) a person
pub async fn people_post(
    State(state): State<AppState>,
    Json(payload): Json<PersonPayload>,
) -> ApiResult<Json<PersonView>> {
    let person = Person::from(payload);
    let saved = state
        .auditor
        .around(target(), "add_person", &(&person,), state.people.add_person(person.clone()))
        .await?;

    Ok(Json(PersonView::from(saved)))
}

/// DELETE /People/:id - delete a person and their tasks
pub async fn person_delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state
        .auditor
        .around(target(), "remove_person", &(id,), state.people.remove_person(id))
        .await?;
    Ok(())
}

/// DELETE /People/:id/tasks - detach every task from a person
pub async fn person_tasks_delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state
        .auditor
        .around(target(), "remove_person_tasks", &(id,), state.people.remove_person_tasks(id))
        .await?;
    Ok(())
}

/// GET /People/:id/tasks - a person's tasks, empty for unknown ids
pub async fn person_tasks_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let tasks = state
        .auditor
        .around(target(), "get_person_tasks", &(id,), state.people.get_person_tasks(id))
        .await?;

    Ok(Json(tasks.into_iter().map(TaskView::from).collect()))
}

/// POST /People/:id/tasks - create a task owned by the person, if they exist
pub async fn person_tasks_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<TaskPayload>,
) -> ApiResult<Json<TaskView>> {
    let task = Task::from(payload);
    let saved = state
        .auditor
        .around(
            target(),
            "add_person_task",
            &(id, &task),
            state.people.add_person_task(id, task.clone()),
        )
        .await?;

    Ok(Json(TaskView::from(saved)))
}

/// POST /People/:id/task - create an unowned task; the id is ignored
pub async fn task_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<TaskPayload>,
) -> ApiResult<Json<TaskView>> {
    let task = Task::from(payload);
    let saved = state
        .auditor
        .around(target(), "add_task", &(id, &task), state.people.add_task(id, task.clone()))
        .await?;

    Ok(Json(TaskView::from(saved)))
}
