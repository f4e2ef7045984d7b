//! Files and folders
//!
//! A folder listing is two collections on the wire (`/folders/:id/files`
//! and `/folders/:id/folders`). [`Canvas::folder_entries`] runs both and
//! merges them into one stream of [`FsEntry`].

use crate::client::Canvas;
use crate::decode::{JsonDecoder, RecordDecoderExt};
use crate::pagination::ItemStream;
use crate::types::{CanvasId, QueryOptions};
use chrono::{DateTime, Utc};
use futures::stream::{self, Select};
use serde::{Deserialize, Serialize};

/// A file stored in Canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: CanvasId,
    pub folder_id: Option<CanvasId>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub filename: String,
    #[serde(rename = "content-type")]
    pub content_type: Option<String>,
    /// Download URL; empty for locked files
    pub url: Option<String>,
    #[serde(default)]
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub hidden: bool,
}

/// A folder in a course, group or user file tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: CanvasId,
    #[serde(default)]
    pub name: String,
    /// Path from the context root, e.g. `course files/week 1`
    pub full_name: Option<String>,
    pub parent_folder_id: Option<CanvasId>,
    #[serde(default)]
    pub files_count: u64,
    #[serde(default)]
    pub folders_count: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub hidden: bool,
}

/// One entry of a folder listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FsEntry {
    File(File),
    Folder(Folder),
}

impl FsEntry {
    pub fn id(&self) -> CanvasId {
        match self {
            Self::File(file) => file.id,
            Self::Folder(folder) => folder.id,
        }
    }

    /// Name shown in the Canvas UI
    pub fn name(&self) -> &str {
        match self {
            Self::File(file) => &file.display_name,
            Self::Folder(folder) => &folder.name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }
}

/// Merged stream returned by [`Canvas::folder_entries`]
pub type FolderEntries = Select<ItemStream<FsEntry>, ItemStream<FsEntry>>;

impl Canvas {
    /// Files directly inside a folder (`GET /folders/:id/files`)
    pub async fn folder_files(&self, folder_id: CanvasId, options: QueryOptions) -> ItemStream<File> {
        self.paginate_json(format!("/folders/{folder_id}/files"), options)
            .await
    }

    /// Sub-folders of a folder (`GET /folders/:id/folders`)
    pub async fn folder_folders(
        &self,
        folder_id: CanvasId,
        options: QueryOptions,
    ) -> ItemStream<Folder> {
        self.paginate_json(format!("/folders/{folder_id}/folders"), options)
            .await
    }

    /// Files and sub-folders of a folder, interleaved as they arrive.
    ///
    /// Two independent runs, each under this client's policy; `options`
    /// are sent to both.
    pub async fn folder_entries(&self, folder_id: CanvasId, options: QueryOptions) -> FolderEntries {
        let files = self.paginate(
            format!("/folders/{folder_id}/files"),
            options.clone(),
            JsonDecoder::<File>::new().map_items(FsEntry::File),
        );
        let folders = self.paginate(
            format!("/folders/{folder_id}/folders"),
            options,
            JsonDecoder::<Folder>::new().map_items(FsEntry::Folder),
        );
        let (files, folders): (ItemStream<FsEntry>, ItemStream<FsEntry>) =
            futures::join!(files, folders);
        stream::select(files, folders)
    }
}
