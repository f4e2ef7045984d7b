//! Courses

use crate::client::Canvas;
use crate::pagination::ItemStream;
use crate::types::{CanvasId, QueryOptions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A course visible to the current user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CanvasId,
    /// Missing on courses the caller may list but not read
    pub name: Option<String>,
    pub course_code: Option<String>,
    pub workflow_state: Option<String>,
    pub account_id: Option<CanvasId>,
    pub enrollment_term_id: Option<CanvasId>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub time_zone: Option<String>,
}

impl Canvas {
    /// Courses of the current user (`GET /courses`)
    pub async fn courses(&self, options: QueryOptions) -> ItemStream<Course> {
        self.paginate_json("/courses", options).await
    }
}
