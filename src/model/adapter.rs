// File: ./src/model/adapter.rs
// Handles Asana JSON records and their conversion into resolved items
use crate::model::item::{Comment, Project, Task, Workspace};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

/// `{"data": ..., "next_page": {...}}` envelope used by every Asana listing.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub next_page: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
pub struct NextPage {
    pub offset: String,
}

/// Single-resource envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Compact `{gid, name}` reference returned by listings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NamedRef {
    pub gid: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskRecord {
    pub gid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignee: Option<NamedRef>,
    #[serde(default)]
    pub projects: Vec<NamedRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoryRecord {
    pub gid: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type", default)]
    pub story_type: Option<String>,
    #[serde(default)]
    pub resource_subtype: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentRecord {
    pub gid: String,
    #[serde(default)]
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub view_url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub permanent_url: Option<String>,
}

impl NamedRef {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

impl From<NamedRef> for Workspace {
    fn from(r: NamedRef) -> Self {
        Workspace {
            name: r.name.unwrap_or_default(),
            gid: r.gid,
        }
    }
}

impl From<NamedRef> for Project {
    fn from(r: NamedRef) -> Self {
        Project {
            name: r.name.unwrap_or_default(),
            gid: r.gid,
        }
    }
}

impl TaskRecord {
    /// Tasks multi-homed in several projects are left out of the export.
    pub fn is_multi_homed(&self) -> bool {
        self.projects.len() > 1
    }

    pub fn assignee_name(&self) -> String {
        self.assignee
            .as_ref()
            .map(|a| a.display_name().to_string())
            .unwrap_or_default()
    }

    pub fn into_task(self, comments: Vec<Comment>, subtasks: Vec<Task>) -> Task {
        let assignee_name = self.assignee_name();
        Task {
            gid: self.gid,
            name: self.name,
            notes: self.notes,
            assignee_name,
            created_at: self.created_at,
            completed_at: self.completed_at,
            comments,
            subtasks,
        }
    }
}

impl StoryRecord {
    /// Only user comments are exported; system stories (assignments, moves, ...) are not.
    pub fn is_comment(&self) -> bool {
        match self.story_type.as_deref() {
            Some(t) => t == "comment",
            None => self.resource_subtype.as_deref() == Some("comment_added"),
        }
    }

    pub fn into_comment(self) -> Option<Comment> {
        if !self.is_comment() {
            return None;
        }
        let text = match self.text {
            Some(text) => text,
            None => {
                warn!(story_gid = %self.gid, "comment story has no text");
                String::new()
            }
        };
        Some(Comment {
            created_at: self.created_at,
            text,
            url: None,
        })
    }
}

impl AttachmentRecord {
    /// view_url, then download_url, then permanent_url.
    pub fn link(&self) -> Option<String> {
        self.view_url
            .clone()
            .or_else(|| self.download_url.clone())
            .or_else(|| self.permanent_url.clone())
    }

    pub fn into_comment(self) -> Comment {
        let url = self.link();
        Comment {
            created_at: self.created_at,
            text: self.name,
            url,
        }
    }
}
