pub mod format;

pub use format::{PersonPayload, PersonView, TaskPayload, TaskView};
