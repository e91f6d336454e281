use serde_json::Value;

use super::{ContentType, require_array, require_object, require_str};
use crate::data::ContentId;
use crate::error::{Result, sfs_bail, sfs_ensure};
use crate::reporting::ReportingHandler;

/// `{"Namespace": s, "Name": s, "Version": s}` as sent by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentIdEntity {
    pub name_space: String,
    pub name: String,
    pub version: String,
}

impl From<ContentIdEntity> for ContentId {
    fn from(entity: ContentIdEntity) -> Self {
        ContentId::new(entity.name_space, entity.name, entity.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericVersionEntity {
    pub content_id: ContentIdEntity,
}

impl GenericVersionEntity {
    pub fn into_content_id(self) -> ContentId {
        self.content_id.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppVersionEntity {
    pub content_id: ContentIdEntity,
    pub update_id: String,
    /// Prerequisites have no prerequisites of their own.
    pub prerequisites: Vec<GenericVersionEntity>,
}

impl AppVersionEntity {
    /// Split into the content id, the update id and the prerequisites.
    pub fn into_parts(self) -> (ContentId, String, Vec<GenericVersionEntity>) {
        (self.content_id.into(), self.update_id, self.prerequisites)
    }
}

/// A resolved version, generic or app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionEntity {
    Generic(GenericVersionEntity),
    App(AppVersionEntity),
}

impl VersionEntity {
    /// Parse one version object of a response.
    ///
    /// Generic:
    /// `{"ContentId": {"Namespace": s, "Name": s, "Version": s}}`
    ///
    /// App adds:
    /// `"UpdateId": s, "Prerequisites": [{"Namespace": s, "Name": s, "Version": s}]`
    pub fn from_json(data: &Value, handler: &ReportingHandler) -> Result<Self> {
        let Some(data) = data.as_object() else {
            sfs_bail!(handler, ServiceInvalidResponse, "Response is not a JSON object");
        };

        let content_id = require_object(data, "ContentId", handler)?;
        let content_id = ContentIdEntity {
            name_space: require_str(content_id, "ContentId.Namespace", handler)?.to_string(),
            name: require_str(content_id, "ContentId.Name", handler)?.to_string(),
            version: require_str(content_id, "ContentId.Version", handler)?.to_string(),
        };

        if !data.contains_key("UpdateId") {
            return Ok(VersionEntity::Generic(GenericVersionEntity { content_id }));
        }

        let update_id = require_str(data, "UpdateId", handler)?.to_string();
        let prerequisites = require_array(data, "Prerequisites", handler)?
            .iter()
            .map(|prerequisite| -> Result<GenericVersionEntity> {
                let Some(prerequisite) = prerequisite.as_object() else {
                    sfs_bail!(handler, ServiceInvalidResponse, "Prerequisite element is not a JSON object");
                };
                Ok(GenericVersionEntity {
                    content_id: ContentIdEntity {
                        name_space: require_str(prerequisite, "Prerequisite.Namespace", handler)?
                            .to_string(),
                        name: require_str(prerequisite, "Prerequisite.Name", handler)?.to_string(),
                        version: require_str(prerequisite, "Prerequisite.Version", handler)?
                            .to_string(),
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(VersionEntity::App(AppVersionEntity {
            content_id,
            update_id,
            prerequisites,
        }))
    }

    /// Parse the response of a batch request: a non-empty array of versions.
    pub fn from_batch_json(data: &Value, handler: &ReportingHandler) -> Result<Vec<Self>> {
        let Some(items) = data.as_array() else {
            sfs_bail!(handler, ServiceInvalidResponse, "Response is not a JSON array");
        };
        sfs_ensure!(
            !items.is_empty(),
            handler,
            ServiceInvalidResponse,
            "Response does not have the expected size"
        );

        items.iter().map(|item| Self::from_json(item, handler)).collect()
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            VersionEntity::Generic(_) => ContentType::Generic,
            VersionEntity::App(_) => ContentType::App,
        }
    }

    pub fn content_id(&self) -> &ContentIdEntity {
        match self {
            VersionEntity::Generic(entity) => &entity.content_id,
            VersionEntity::App(entity) => &entity.content_id,
        }
    }

    /// Move the content id out, whatever the flavour.
    pub fn into_content_id(self) -> ContentId {
        match self {
            VersionEntity::Generic(entity) => entity.into_content_id(),
            VersionEntity::App(entity) => entity.content_id.into(),
        }
    }

    /// The app flavour, or `ServiceUnexpectedContentType`.
    pub fn into_app(self, handler: &ReportingHandler) -> Result<AppVersionEntity> {
        match self {
            VersionEntity::App(entity) => Ok(entity),
            VersionEntity::Generic(entity) => sfs_bail!(
                handler,
                ServiceUnexpectedContentType,
                "The service returned content \"{}\" with content type [{}] while the expected type was [{}]",
                entity.content_id.name,
                ContentType::Generic,
                ContentType::App
            ),
        }
    }
}
