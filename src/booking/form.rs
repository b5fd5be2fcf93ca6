use chrono::NaiveDate;

use crate::catalog::{Catalog, ProjectId, Task, TaskId};

use super::{BookingRequest, Hours};

/// Input state behind the booking console. Holds raw selections that are only checked against the
/// catalog on submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingForm {
    pub selected_project: Option<ProjectId>,
    pub selected_task: Option<TaskId>,
    pub description: String,
    pub hours: Hours,
}

impl BookingForm {
    pub fn increment(&mut self) {
        self.hours = self.hours.increment();
    }

    pub fn decrement(&mut self) {
        self.hours = self.hours.decrement();
    }

    pub fn display_time(&self) -> String {
        self.hours.display_time()
    }

    pub fn select_project(&mut self, project_id: ProjectId) {
        if self.selected_project != Some(project_id) {
            self.selected_task = None;
        }
        self.selected_project = Some(project_id);
    }

    pub fn select_task(&mut self, task_id: TaskId) {
        self.selected_task = Some(task_id);
    }

    /// Tasks offered for the selected project. Empty when nothing is selected or the project
    /// disappeared from the catalog.
    pub fn tasks<'a>(&self, catalog: &'a Catalog) -> &'a [Task] {
        self.selected_project
            .and_then(|id| catalog.project(id))
            .map(|project| project.tasks.as_slice())
            .unwrap_or_default()
    }

    pub fn restore_selection(&mut self, catalog: &Catalog) {
        let kept = self
            .selected_project
            .filter(|id| catalog.project(*id).is_some());

        match kept {
            Some(project_id) => {
                if let Some(task_id) = self.selected_task {
                    if catalog.task(project_id, task_id).is_none() {
                        self.selected_task = None;
                    }
                }
            }
            None => {
                self.selected_project = catalog.projects().first().map(|p| p.id);
                self.selected_task = None;
            }
        }
    }

    /// `None` until both a project and a task are picked.
    pub fn to_request(&self, today: NaiveDate) -> Option<BookingRequest> {
        Some(BookingRequest::new(
            today,
            self.hours,
            self.selected_project?,
            self.selected_task?,
            self.description.clone(),
        ))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
