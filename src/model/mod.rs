// File: ./src/model/mod.rs
// Aggregates the split model files
pub mod adapter;
pub mod item;
pub mod parser;

// Re-export types so callers can use `crate::model::Task`
pub use adapter::{AttachmentRecord, NamedRef, StoryRecord, TaskRecord};
pub use item::{
    Comment, Project, Resolution, Status, Task, Workspace, permalink, sort_by_created,
};
