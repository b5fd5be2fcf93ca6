//! Shapes of the MOCO API payloads. Fields MOCO sends beyond these are ignored.

use serde::{Deserialize, Serialize};

use crate::{
    booking::BookingRequest,
    catalog::{ProjectId, TaskId},
    utils::time::booking_date,
};

/// Entry of `GET /projects/assigned`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectEntity {
    pub id: ProjectId,
    pub name: String,
}

/// Entry of `GET /tasks?project_id=`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskEntity {
    pub id: TaskId,
    pub name: String,
}

/// Body of `POST /activities`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntity {
    pub date: String,
    pub hours: f64,
    pub project_id: ProjectId,
    pub task_id: TaskId,
    pub description: String,
}

impl From<&BookingRequest> for ActivityEntity {
    fn from(request: &BookingRequest) -> Self {
        Self {
            date: booking_date(request.date),
            hours: request.hours.as_f64(),
            project_id: request.project_id,
            task_id: request.task_id,
            description: request.description.clone(),
        }
    }
}
