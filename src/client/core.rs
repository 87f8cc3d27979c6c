// File: ./src/client/core.rs
use crate::client::cert::build_connector;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::adapter::{Envelope, Page};
use crate::model::{AttachmentRecord, NamedRef, Project, StoryRecord, TaskRecord, Workspace};
use crate::resolver::{TaskFilter, TaskSource};

use http::header::ACCEPT;
use http::{HeaderValue, Method, Request, Uri};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use tower::ServiceExt;
use tower_http::auth::AddAuthorization;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://app.asana.com/api/1.0";

// Keeps the API from creating default "My Tasks" sections on our behalf.
pub const DISABLE_HEADER: &str = "asana-disable";
pub const DISABLE_VALUE: &str = "new_user_task_lists";

const PAGE_SIZE: &str = "100";
const REF_FIELDS: &str = "name";
const TASK_FIELDS: &str = "name,notes,created_at,completed_at,assignee.name,projects";
const STORY_FIELDS: &str = "type,resource_subtype,text,created_at";
const ATTACHMENT_FIELDS: &str = "name,created_at,view_url,download_url,permanent_url";

type HttpsClient = AddAuthorization<Client<HttpsConnector<HttpConnector>, String>>;

#[derive(Clone, Debug)]
pub struct AsanaClient {
    http: HttpsClient,
    base_url: String,
}

impl AsanaClient {
    pub fn new(base_url: &str, token: &str, insecure: bool) -> Result<Self, ApiError> {
        // AddAuthorization panics on a malformed value, so check it first.
        HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| ApiError::InvalidToken)?;

        let https_connector = build_connector(insecure)?;
        let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
        let auth_client = AddAuthorization::bearer(http_client, token);

        Ok(Self {
            http: auth_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.base_url, &config.token, config.allow_insecure_certs)
    }

    pub async fn get_workspaces(&self) -> Result<Vec<Workspace>, ApiError> {
        let refs: Vec<NamedRef> = self
            .get_all("/workspaces", &[("opt_fields", REF_FIELDS)])
            .await?;
        Ok(refs.into_iter().map(Workspace::from).collect())
    }

    pub async fn get_projects(&self, workspace_gid: &str) -> Result<Vec<Project>, ApiError> {
        let refs: Vec<NamedRef> = self
            .get_all(
                "/projects",
                &[("workspace", workspace_gid), ("opt_fields", REF_FIELDS)],
            )
            .await?;
        Ok(refs.into_iter().map(Project::from).collect())
    }

    fn uri(&self, path: &str, query: &[(&str, &str)]) -> Result<Uri, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.as_str().parse::<Uri>()?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let uri = self.uri(path, query)?;
        debug!(%uri, "GET");

        let req = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(ACCEPT, "application/json")
            .header(DISABLE_HEADER, DISABLE_VALUE)
            .body(String::new())?;

        let response = self.http.clone().oneshot(req).await?;
        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes();

        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Follows `next_page.offset` until the listing is exhausted.
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut params: Vec<(&str, &str)> = query.to_vec();
            params.push(("limit", PAGE_SIZE));
            if let Some(o) = &offset {
                params.push(("offset", o.as_str()));
            }

            let page: Page<T> = self.get(path, &params).await?;
            pages += 1;
            items.extend(page.data);

            match page.next_page {
                Some(next) => offset = Some(next.offset),
                None => break,
            }
        }

        debug!(path, pages, items = items.len(), "listing complete");
        Ok(items)
    }
}

impl TaskSource for AsanaClient {
    async fn project_tasks(
        &self,
        project_gid: &str,
        filter: &TaskFilter,
    ) -> Result<Vec<NamedRef>, ApiError> {
        let mut query = vec![("project", project_gid), ("opt_fields", REF_FIELDS)];
        if let Some(since) = &filter.modified_since {
            query.push(("modified_since", since.as_str()));
        }
        if let Some(since) = &filter.completed_since {
            query.push(("completed_since", since.as_str()));
        }
        self.get_all("/tasks", &query).await
    }

    async fn task(&self, task_gid: &str) -> Result<TaskRecord, ApiError> {
        let envelope: Envelope<TaskRecord> = self
            .get(
                &format!("/tasks/{}", task_gid),
                &[("opt_fields", TASK_FIELDS)],
            )
            .await?;
        Ok(envelope.data)
    }

    async fn stories(&self, task_gid: &str) -> Result<Vec<StoryRecord>, ApiError> {
        self.get_all(
            &format!("/tasks/{}/stories", task_gid),
            &[("opt_fields", STORY_FIELDS)],
        )
        .await
    }

    async fn attachments(&self, task_gid: &str) -> Result<Vec<AttachmentRecord>, ApiError> {
        self.get_all(
            "/attachments",
            &[("parent", task_gid), ("opt_fields", ATTACHMENT_FIELDS)],
        )
        .await
    }

    async fn subtasks(&self, task_gid: &str) -> Result<Vec<NamedRef>, ApiError> {
        self.get_all(
            &format!("/tasks/{}/subtasks", task_gid),
            &[("opt_fields", REF_FIELDS)],
        )
        .await
    }
}
