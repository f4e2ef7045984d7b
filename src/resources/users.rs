//! Users

use crate::client::Canvas;
use crate::pagination::ItemStream;
use crate::types::{CanvasId, QueryOptions};
use serde::{Deserialize, Serialize};

/// A user as listed in a course roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: CanvasId,
    #[serde(default)]
    pub name: String,
    pub sortable_name: Option<String>,
    pub short_name: Option<String>,
    pub login_id: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl Canvas {
    /// Users enrolled in a course (`GET /courses/:id/users`)
    pub async fn course_users(
        &self,
        course_id: CanvasId,
        options: QueryOptions,
    ) -> ItemStream<User> {
        self.paginate_json(format!("/courses/{course_id}/users"), options)
            .await
    }
}
