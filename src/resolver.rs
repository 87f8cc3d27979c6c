// File: ./src/resolver.rs
// Builds the exported task tree from a TaskSource
use crate::error::ApiError;
use crate::model::{
    AttachmentRecord, Comment, NamedRef, Resolution, Status, StoryRecord, Task, TaskRecord,
    sort_by_created,
};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info};

/// Server-side filters for the top-level task listing, passed through as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub modified_since: Option<String>,
    pub completed_since: Option<String>,
}

/// Read access to the task data the resolver needs.
#[allow(async_fn_in_trait)]
pub trait TaskSource {
    async fn project_tasks(
        &self,
        project_gid: &str,
        filter: &TaskFilter,
    ) -> Result<Vec<NamedRef>, ApiError>;
    async fn task(&self, task_gid: &str) -> Result<TaskRecord, ApiError>;
    async fn stories(&self, task_gid: &str) -> Result<Vec<StoryRecord>, ApiError>;
    async fn attachments(&self, task_gid: &str) -> Result<Vec<AttachmentRecord>, ApiError>;
    async fn subtasks(&self, task_gid: &str) -> Result<Vec<NamedRef>, ApiError>;
}

/// Progress notification for one top-level task.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub sequence: usize,
    pub total: usize,
    pub status: Status,
    pub name: &'a str,
}

pub struct Resolver<S> {
    source: S,
}

type ResolveFuture<'a> = Pin<Box<dyn Future<Output = Result<Resolution, ApiError>> + 'a>>;

impl<S: TaskSource> Resolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolves every task of the project and returns the included ones, oldest first.
    pub async fn resolve_project<F>(
        &self,
        project_gid: &str,
        filter: &TaskFilter,
        mut on_progress: F,
    ) -> Result<Vec<Task>, ApiError>
    where
        F: FnMut(Progress<'_>),
    {
        let refs = self.source.project_tasks(project_gid, filter).await?;
        let total = refs.len();
        info!(project_gid, total, "resolving project tasks");

        let mut tasks = Vec::with_capacity(total);
        for (idx, task_ref) in refs.iter().enumerate() {
            let resolution = self.resolve(&task_ref.gid).await?;
            on_progress(Progress {
                sequence: idx + 1,
                total,
                status: resolution.status(),
                name: resolution.name(),
            });
            if let Some(task) = resolution.into_task() {
                tasks.push(task);
            }
        }

        sort_by_created(&mut tasks, |t| t.created_at);
        Ok(tasks)
    }

    /// Resolves one task and, recursively, its subtasks.
    pub fn resolve<'a>(&'a self, task_gid: &'a str) -> ResolveFuture<'a> {
        Box::pin(async move {
            let record = self.source.task(task_gid).await?;
            if record.is_multi_homed() {
                info!(
                    task_gid,
                    projects = record.projects.len(),
                    "skipping multi-homed task"
                );
                return Ok(Resolution::Skipped {
                    gid: record.gid,
                    name: record.name,
                });
            }

            let comments = self.comments(task_gid).await?;

            let mut subtasks = Vec::new();
            for sub_ref in self.source.subtasks(task_gid).await? {
                if let Some(sub) = self.resolve(&sub_ref.gid).await?.into_task() {
                    subtasks.push(sub);
                }
            }
            sort_by_created(&mut subtasks, |t| t.created_at);

            debug!(
                task_gid,
                comments = comments.len(),
                subtasks = subtasks.len(),
                "resolved task"
            );
            Ok(Resolution::Included(record.into_task(comments, subtasks)))
        })
    }

    /// Comment stories and attachments merged into one timeline.
    async fn comments(&self, task_gid: &str) -> Result<Vec<Comment>, ApiError> {
        let mut comments: Vec<Comment> = self
            .source
            .stories(task_gid)
            .await?
            .into_iter()
            .filter_map(StoryRecord::into_comment)
            .collect();

        comments.extend(
            self.source
                .attachments(task_gid)
                .await?
                .into_iter()
                .map(AttachmentRecord::into_comment),
        );

        sort_by_created(&mut comments, |c| c.created_at);
        Ok(comments)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    /// In-memory source that records which endpoints were hit.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub top_level: Vec<NamedRef>,
        pub tasks: HashMap<String, TaskRecord>,
        pub stories: HashMap<String, Vec<StoryRecord>>,
        pub attachments: HashMap<String, Vec<AttachmentRecord>>,
        pub subtasks: HashMap<String, Vec<NamedRef>>,
        pub calls: RefCell<Vec<String>>,
        pub seen_filter: RefCell<Option<TaskFilter>>,
    }

    impl FakeSource {
        pub fn add_task(&mut self, gid: &str, name: &str, created: &str, projects: usize) {
            let record = TaskRecord {
                gid: gid.to_string(),
                name: name.to_string(),
                notes: String::new(),
                created_at: ts(created),
                completed_at: None,
                assignee: None,
                projects: (0..projects)
                    .map(|i| NamedRef {
                        gid: format!("p{}", i),
                        name: None,
                    })
                    .collect(),
            };
            self.tasks.insert(gid.to_string(), record);
        }

        pub fn add_top_level(&mut self, gid: &str, name: &str, created: &str, projects: usize) {
            self.add_task(gid, name, created, projects);
            self.top_level.push(named(gid));
        }

        pub fn add_subtask(&mut self, parent: &str, gid: &str, created: &str, projects: usize) {
            self.add_task(gid, gid, created, projects);
            self.subtasks
                .entry(parent.to_string())
                .or_default()
                .push(named(gid));
        }

        pub fn add_story(&mut self, task: &str, kind: &str, created: &str, text: &str) {
            self.stories
                .entry(task.to_string())
                .or_default()
                .push(StoryRecord {
                    gid: format!("s-{}-{}", task, text),
                    created_at: ts(created),
                    story_type: Some(kind.to_string()),
                    resource_subtype: None,
                    text: Some(text.to_string()),
                });
        }

        pub fn add_attachment(&mut self, task: &str, created: &str, name: &str) {
            self.attachments
                .entry(task.to_string())
                .or_default()
                .push(AttachmentRecord {
                    gid: format!("a-{}", name),
                    name: name.to_string(),
                    created_at: ts(created),
                    view_url: Some(format!("https://files.example/{}", name)),
                    download_url: None,
                    permanent_url: None,
                });
        }

        fn record(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }

        pub fn calls_for(&self, gid: &str) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .filter(|c| c.ends_with(&format!(":{}", gid)))
                .cloned()
                .collect()
        }
    }

    fn named(gid: &str) -> NamedRef {
        NamedRef {
            gid: gid.to_string(),
            name: None,
        }
    }

    impl TaskSource for FakeSource {
        async fn project_tasks(
            &self,
            project_gid: &str,
            filter: &TaskFilter,
        ) -> Result<Vec<NamedRef>, ApiError> {
            self.record(format!("project_tasks:{}", project_gid));
            *self.seen_filter.borrow_mut() = Some(filter.clone());
            Ok(self.top_level.clone())
        }

        async fn task(&self, task_gid: &str) -> Result<TaskRecord, ApiError> {
            self.record(format!("task:{}", task_gid));
            Ok(self.tasks[task_gid].clone())
        }

        async fn stories(&self, task_gid: &str) -> Result<Vec<StoryRecord>, ApiError> {
            self.record(format!("stories:{}", task_gid));
            Ok(self.stories.get(task_gid).cloned().unwrap_or_default())
        }

        async fn attachments(&self, task_gid: &str) -> Result<Vec<AttachmentRecord>, ApiError> {
            self.record(format!("attachments:{}", task_gid));
            Ok(self.attachments.get(task_gid).cloned().unwrap_or_default())
        }

        async fn subtasks(&self, task_gid: &str) -> Result<Vec<NamedRef>, ApiError> {
            self.record(format!("subtasks:{}", task_gid));
            Ok(self.subtasks.get(task_gid).cloned().unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn test_multi_homed_task_is_skipped_without_further_fetches() {
        let mut source = FakeSource::default();
        source.add_task("1", "Shared", "2023-01-01T00:00:00Z", 2);
        source.add_story("1", "comment", "2023-01-02T00:00:00Z", "hidden");
        source.add_subtask("1", "1a", "2023-01-03T00:00:00Z", 1);

        let resolver = Resolver::new(source);
        let resolution = resolver.resolve("1").await.unwrap();

        assert_eq!(
            resolution,
            Resolution::Skipped {
                gid: "1".to_string(),
                name: "Shared".to_string()
            }
        );
        assert_eq!(resolver.source().calls_for("1"), vec!["task:1".to_string()]);
        assert!(resolver.source().calls_for("1a").is_empty());
    }

    #[tokio::test]
    async fn test_comments_and_attachments_merge_in_time_order() {
        let mut source = FakeSource::default();
        source.add_task("1", "Task", "2023-01-01T00:00:00Z", 1);
        source.add_story("1", "comment", "2023-01-05T00:00:00Z", "late");
        source.add_story("1", "system", "2023-01-02T00:00:00Z", "assigned");
        source.add_story("1", "comment", "2023-01-03T00:00:00Z", "tie-story");
        source.add_attachment("1", "2023-01-03T00:00:00Z", "tie.png");
        source.add_attachment("1", "2023-01-02T12:00:00Z", "early.pdf");

        let resolver = Resolver::new(source);
        let task = resolver.resolve("1").await.unwrap().into_task().unwrap();

        let texts: Vec<&str> = task.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["early.pdf", "tie-story", "tie.png", "late"]);
        assert_eq!(task.comments[0].url.as_deref(), Some("https://files.example/early.pdf"));
        assert!(task.comments[1].url.is_none());
    }

    #[tokio::test]
    async fn test_subtasks_resolve_independently_and_sort() {
        let mut source = FakeSource::default();
        source.add_task("1", "Parent", "2023-01-01T00:00:00Z", 1);
        source.add_subtask("1", "c", "2023-01-04T00:00:00Z", 1);
        source.add_subtask("1", "skip", "2023-01-02T00:00:00Z", 3);
        source.add_subtask("1", "a", "2023-01-02T00:00:00Z", 1);
        source.add_subtask("1", "b", "2023-01-02T00:00:00Z", 1);
        source.add_subtask("a", "a1", "2023-01-06T00:00:00Z", 1);
        source.add_subtask("a", "a0", "2023-01-05T00:00:00Z", 0);

        let resolver = Resolver::new(source);
        let task = resolver.resolve("1").await.unwrap().into_task().unwrap();

        let order: Vec<&str> = task.subtasks.iter().map(|t| t.gid.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);

        let nested: Vec<&str> = task.subtasks[0]
            .subtasks
            .iter()
            .map(|t| t.gid.as_str())
            .collect();
        assert_eq!(nested, vec!["a0", "a1"]);
        assert_eq!(task.tree_size(), 6);
    }

    #[tokio::test]
    async fn test_resolve_project_sorts_and_reports_progress() {
        let mut source = FakeSource::default();
        source.add_top_level("A", "Task A", "2023-01-02T00:00:00Z", 1);
        source.add_top_level("X", "Shared", "2022-12-01T00:00:00Z", 2);
        source.add_top_level("B", "Task B", "2023-01-01T00:00:00Z", 1);

        let filter = TaskFilter {
            modified_since: Some("2023-01-01".to_string()),
            completed_since: None,
        };

        let resolver = Resolver::new(source);
        let mut seen = Vec::new();
        let mut skipped = 0;
        let tasks = resolver
            .resolve_project("42", &filter, |p| {
                if p.status == Status::Skip {
                    skipped += 1;
                }
                seen.push(format!("{}/{} {} {}", p.sequence, p.total, p.status, p.name))
            })
            .await
            .unwrap();

        let order: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["Task B", "Task A"]);
        assert_eq!(
            seen,
            vec!["1/3 OK Task A", "2/3 SKIP Shared", "3/3 OK Task B"]
        );
        assert_eq!(skipped, 1);
        assert_eq!(*resolver.source().seen_filter.borrow(), Some(filter));
    }
}
