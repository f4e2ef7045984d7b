//! Assignments

use crate::client::Canvas;
use crate::pagination::ItemStream;
use crate::types::{CanvasId, QueryOptions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An assignment in a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: CanvasId,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub course_id: Option<CanvasId>,
    pub due_at: Option<DateTime<Utc>>,
    pub points_possible: Option<f64>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub submission_types: Vec<String>,
    pub html_url: Option<String>,
}

impl Canvas {
    /// Assignments of a course (`GET /courses/:id/assignments`)
    pub async fn course_assignments(
        &self,
        course_id: CanvasId,
        options: QueryOptions,
    ) -> ItemStream<Assignment> {
        self.paginate_json(format!("/courses/{course_id}/assignments"), options)
            .await
    }
}
