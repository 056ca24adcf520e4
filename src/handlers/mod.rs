// handlers/mod.rs - HTTP entry points
//
// Every people/tasks route runs its PeopleService call through the Auditor;
// health is infrastructure and is not audited.

pub mod health;
pub mod people;
