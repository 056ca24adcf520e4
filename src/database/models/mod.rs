pub mod person;
pub mod task;

pub use person::Person;
pub use task::Task;
