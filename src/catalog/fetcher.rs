use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::{ConfigError, Credentials},
    moco::{
        endpoint::MocoEndpoint,
        entities::{ProjectEntity, TaskEntity},
        MocoTransport,
    },
};

use super::model::{Catalog, Project, ProjectId, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    /// The project list request failed or returned a non 2xx status.
    Projects,
    /// The project list came back but couldn't be decoded.
    Decode,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{detail}")]
pub struct FetchError {
    pub stage: FetchStage,
    pub detail: String,
    /// Body that failed to decode.
    pub raw: Option<String>,
}

impl FetchError {
    fn projects(detail: impl Into<String>) -> Self {
        Self {
            stage: FetchStage::Projects,
            detail: detail.into(),
            raw: None,
        }
    }

    fn decode(raw: String) -> Self {
        Self {
            stage: FetchStage::Decode,
            detail: "Failed to decode project data".into(),
            raw: Some(raw),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Loads the bookable catalog. Holds no state of its own, so fetching is freely repeatable.
pub struct CatalogFetcher<T> {
    transport: Arc<T>,
}

impl<T: MocoTransport> CatalogFetcher<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Projects with their tasks, filtered down to the ones that have something to book.
    pub async fn fetch_catalog(&self, credentials: &Credentials) -> Result<Catalog, CatalogError> {
        let projects = self.fetch_unfiltered(credentials).await?;
        let catalog = Catalog::from_projects(projects);
        info!(projects = catalog.projects().len(), "Catalog ready");
        Ok(catalog)
    }

    /// Every assigned project with its tasks attached. Projects whose task request failed are
    /// kept with an empty task list. Resolves only after all task requests have settled.
    #[instrument(skip_all, fields(domain = %credentials.domain))]
    pub async fn fetch_unfiltered(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<Project>, CatalogError> {
        let endpoint = credentials.endpoint()?;
        let api_key = credentials.api_key();

        let response = self
            .transport
            .get(endpoint.assigned_projects(), api_key)
            .await
            .map_err(|e| {
                warn!("Error fetching projects: {e}");
                FetchError::projects(e.to_string())
            })?;

        if !response.is_success() {
            warn!(status = response.status, "Project list request failed");
            return Err(FetchError::projects(format!("HTTP error: {}", response.status)).into());
        }

        let entities = match serde_json::from_str::<Vec<ProjectEntity>>(&response.body) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to decode projects: {e}. Body: {}", response.body);
                return Err(FetchError::decode(response.body).into());
            }
        };
        debug!(count = entities.len(), "Fetched assigned projects");

        let with_tasks = entities.into_iter().map(|project| {
            let endpoint = &endpoint;
            async move {
                let tasks = self.fetch_tasks(endpoint, api_key, project.id).await;
                Project {
                    id: project.id,
                    name: project.name,
                    tasks,
                }
            }
        });

        Ok(join_all(with_tasks).await)
    }

    /// Any failure here is soft, the project simply ends up without tasks.
    async fn fetch_tasks(
        &self,
        endpoint: &MocoEndpoint,
        api_key: &str,
        project_id: ProjectId,
    ) -> Vec<Task> {
        let response = match self.transport.get(endpoint.tasks(project_id), api_key).await {
            Ok(v) => v,
            Err(e) => {
                warn!(%project_id, "Error fetching tasks: {e}");
                return vec![];
            }
        };

        if !response.is_success() {
            warn!(%project_id, status = response.status, "Task request failed");
            return vec![];
        }

        match serde_json::from_str::<Vec<TaskEntity>>(&response.body) {
            Ok(tasks) => tasks
                .into_iter()
                .map(|t| Task {
                    id: t.id,
                    name: t.name,
                })
                .collect(),
            Err(e) => {
                warn!(%project_id, "Failed to decode tasks: {e}. Body: {}", response.body);
                vec![]
            }
        }
    }
}
