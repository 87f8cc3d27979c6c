// File: ./src/model/item.rs
// Resolved records produced by the resolver and consumed by the report writers
use chrono::{DateTime, Utc};
use std::fmt;

pub const PERMALINK_BASE: &str = "https://app.asana.com/0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub gid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub gid: String,
    pub name: String,
}

/// A story of type comment, or an attachment carrying its link in `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub gid: String,
    pub name: String,
    pub notes: String,
    pub assignee_name: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub comments: Vec<Comment>,
    pub subtasks: Vec<Task>,
}

/// Progress label for a resolved task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Skip,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Ok => "OK",
            Status::Skip => "SKIP",
        })
    }
}

/// Outcome of resolving one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Included(Task),
    /// The task is linked to more than one project and stays out of the export.
    Skipped { gid: String, name: String },
}

impl Resolution {
    pub fn name(&self) -> &str {
        match self {
            Resolution::Included(task) => &task.name,
            Resolution::Skipped { name, .. } => name,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Resolution::Included(_) => Status::Ok,
            Resolution::Skipped { .. } => Status::Skip,
        }
    }

    pub fn into_task(self) -> Option<Task> {
        match self {
            Resolution::Included(task) => Some(task),
            Resolution::Skipped { .. } => None,
        }
    }
}

impl Task {
    pub fn permalink(&self, project_gid: &str) -> String {
        permalink(project_gid, &self.gid)
    }

    /// Number of tasks in this subtree, this one included.
    pub fn tree_size(&self) -> usize {
        1 + self.subtasks.iter().map(Task::tree_size).sum::<usize>()
    }
}

pub fn permalink(project_gid: &str, task_gid: &str) -> String {
    format!("{}/{}/{}", PERMALINK_BASE, project_gid, task_gid)
}

/// Stable ascending sort on creation time; equal timestamps keep their input order.
pub fn sort_by_created<T, F>(items: &mut [T], created_at: F)
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by_key(|item| created_at(item));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_status() {
        let skipped = Resolution::Skipped {
            gid: "1".to_string(),
            name: "Shared".to_string(),
        };
        assert_eq!(skipped.status(), Status::Skip);
        assert_eq!(skipped.status().to_string(), "SKIP");
        assert_eq!(skipped.name(), "Shared");
        assert!(skipped.into_task().is_none());
        assert_eq!(Status::Ok.to_string(), "OK");
    }

    #[test]
    fn test_sort_by_created_is_stable() {
        let at = |s: &str| s.parse::<DateTime<Utc>>().unwrap();
        let mut items = vec![
            ("b", at("2023-01-02T00:00:00Z")),
            ("a", at("2023-01-01T00:00:00Z")),
            ("c", at("2023-01-02T00:00:00Z")),
        ];
        sort_by_created(&mut items, |i| i.1);
        let order: Vec<&str> = items.iter().map(|i| i.0).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }
}
