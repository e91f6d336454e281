use serde::Serialize;

use super::file::{AppFile, File};

/// Identifies one resolved version of a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContentId {
    #[serde(rename = "Namespace")]
    name_space: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Version")]
    version: String,
}

impl ContentId {
    pub fn new(
        name_space: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name_space: name_space.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn name_space(&self) -> &str {
        &self.name_space
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// A resolved product version with its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Content {
    content_id: ContentId,
    files: Vec<File>,
}

impl Content {
    pub fn new(content_id: ContentId, files: Vec<File>) -> Self {
        Self { content_id, files }
    }

    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    pub fn files(&self) -> &[File] {
        &self.files
    }
}

/// A dependency of an app content. Prerequisites have no prerequisites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppPrerequisiteContent {
    content_id: ContentId,
    files: Vec<AppFile>,
}

impl AppPrerequisiteContent {
    pub fn new(content_id: ContentId, files: Vec<AppFile>) -> Self {
        Self { content_id, files }
    }

    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    pub fn files(&self) -> &[AppFile] {
        &self.files
    }
}

/// A resolved app version with its files and prerequisites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppContent {
    content_id: ContentId,
    update_id: String,
    prerequisites: Vec<AppPrerequisiteContent>,
    files: Vec<AppFile>,
}

impl AppContent {
    pub fn new(
        content_id: ContentId,
        update_id: impl Into<String>,
        prerequisites: Vec<AppPrerequisiteContent>,
        files: Vec<AppFile>,
    ) -> Self {
        Self {
            content_id,
            update_id: update_id.into(),
            prerequisites,
            files,
        }
    }

    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    pub fn update_id(&self) -> &str {
        &self.update_id
    }

    pub fn prerequisites(&self) -> &[AppPrerequisiteContent] {
        &self.prerequisites
    }

    pub fn files(&self) -> &[AppFile] {
        &self.files
    }
}
