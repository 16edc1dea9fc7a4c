//! Project list state plus the project CRUD operations.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::api::{ApiClient, OperationError};
use crate::events::{AuthEvent, AuthListener};
use crate::models::{Project, ProjectForm};

use super::sequence::{OpSequence, Ticket};
use super::RequestStatus;

const FETCH_FAILED: &str = "Failed to fetch projects";
const LOAD_FAILED: &str = "Failed to load project";
const CREATE_FAILED: &str = "Failed to create project";
const UPDATE_FAILED: &str = "Failed to update project";
const DELETE_FAILED: &str = "Failed to delete project";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ProjectsOp {
    FetchAll,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectsState {
    pub projects: Vec<Project>,
    pub filter: String,
    pub status: RequestStatus,
}

impl ProjectsState {
    /// Projects with a technology tag matching the filter
    pub fn filtered(&self) -> Vec<&Project> {
        self.projects
            .iter()
            .filter(|p| p.matches_filter(&self.filter))
            .collect()
    }
}

#[derive(Default)]
struct Inner {
    state: ProjectsState,
    sequence: OpSequence<ProjectsOp>,
}

pub struct ProjectsStore {
    api: ApiClient,
    inner: Mutex<Inner>,
}

impl ProjectsStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> ProjectsState {
        self.lock().state.clone()
    }

    pub fn projects(&self) -> Vec<Project> {
        self.lock().state.projects.clone()
    }

    pub fn status(&self) -> RequestStatus {
        self.lock().state.status.clone()
    }

    pub fn filter(&self) -> String {
        self.lock().state.filter.clone()
    }

    pub fn set_filter(&self, filter: &str) {
        self.lock().state.filter = filter.to_string();
    }

    pub fn filtered(&self) -> Vec<Project> {
        self.lock().state.filtered().into_iter().cloned().collect()
    }

    fn finish(&self, ticket: Ticket<ProjectsOp>, apply: impl FnOnce(&mut ProjectsState)) {
        let mut inner = self.lock();
        if inner.sequence.is_current(&ticket) {
            apply(&mut inner.state);
        } else {
            debug!(?ticket, "Discarding result of superseded project fetch");
        }
    }

    /// Replace the list with the server's projects
    pub async fn fetch_all(&self) -> Result<(), OperationError> {
        let ticket = {
            let mut inner = self.lock();
            inner.state.status = RequestStatus::Loading;
            inner.sequence.begin(ProjectsOp::FetchAll)
        };

        match self.api.list_projects().await {
            Ok(projects) => {
                debug!(count = projects.len(), "Projects fetched");
                self.finish(ticket, |state| {
                    state.projects = projects;
                    state.status = RequestStatus::Idle;
                });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch projects");
                let err = OperationError::from_api(&e, FETCH_FAILED);
                self.finish(ticket, |state| state.status = RequestStatus::Error(err.clone()));
                Err(err)
            }
        }
    }

    pub async fn get(&self, id: &str) -> Result<Project, OperationError> {
        self.api.get_project(id).await.map_err(|e| {
            warn!(id, error = %e, "Failed to load project");
            OperationError::from_api(&e, LOAD_FAILED)
        })
    }

    pub async fn create(&self, form: &ProjectForm) -> Result<Project, OperationError> {
        form.validate()?;
        let project = self.api.create_project(form).await.map_err(|e| {
            warn!(error = %e, "Failed to create project");
            OperationError::from_api(&e, CREATE_FAILED)
        })?;
        info!(id = %project.id, title = %project.title, "Project created");
        self.upsert(project.clone());
        Ok(project)
    }

    pub async fn update(&self, id: &str, form: &ProjectForm) -> Result<Project, OperationError> {
        form.validate()?;
        let project = self.api.update_project(id, form).await.map_err(|e| {
            warn!(id, error = %e, "Failed to update project");
            OperationError::from_api(&e, UPDATE_FAILED)
        })?;
        info!(id = %project.id, "Project updated");
        self.upsert(project.clone());
        Ok(project)
    }

    pub async fn delete(&self, id: &str) -> Result<(), OperationError> {
        self.api.delete_project(id).await.map_err(|e| {
            warn!(id, error = %e, "Failed to delete project");
            OperationError::from_api(&e, DELETE_FAILED)
        })?;
        info!(id, "Project deleted");
        self.lock().state.projects.retain(|p| p.id != id);
        Ok(())
    }

    fn upsert(&self, project: Project) {
        let mut inner = self.lock();
        let projects = &mut inner.state.projects;
        match projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project,
            None => projects.push(project),
        }
    }

    /// Clear list, filter, and status
    pub fn reset(&self) {
        self.lock().state = ProjectsState::default();
    }
}

impl AuthListener for ProjectsStore {
    fn on_auth_event(&self, event: &AuthEvent) {
        match event {
            AuthEvent::Unauthenticated { .. } => self.reset(),
        }
    }
}
