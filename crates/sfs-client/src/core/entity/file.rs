use std::collections::HashMap;

use serde_json::Value;

use super::{ContentType, require, require_object, require_str, require_string_array};
use crate::data::{AppFile, ApplicabilityDetails, Architecture, File, HashType};
use crate::error::{Error, ErrorCode, Result, sfs_bail};
use crate::reporting::ReportingHandler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericFileEntity {
    pub file_id: String,
    pub url: String,
    pub size_in_bytes: u64,
    /// Hash type name to value, as sent. Names are checked at conversion.
    pub hashes: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppFileEntity {
    pub file: GenericFileEntity,
    pub file_moniker: String,
    pub architectures: Vec<String>,
    pub platform_applicability_for_package: Vec<String>,
}

/// One element of a download info response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEntity {
    Generic(GenericFileEntity),
    App(AppFileEntity),
}

impl FileEntity {
    /// Parse one file object.
    ///
    /// Generic:
    /// `{"FileId": s, "Url": s, "SizeInBytes": n, "Hashes": {"Sha1": s, "Sha256": s}}`
    ///
    /// App adds:
    /// `"FileMoniker": s, "ApplicabilityDetails": {"Architectures": [s], "PlatformApplicabilityForPackage": [s]}`
    ///
    /// `DeliveryOptimization` and any other field are ignored.
    pub fn from_json(data: &Value, handler: &ReportingHandler) -> Result<Self> {
        let Some(data) = data.as_object() else {
            sfs_bail!(handler, ServiceInvalidResponse, "File is not a JSON object");
        };

        let file_id = require_str(data, "File.FileId", handler)?.to_string();
        let url = require_str(data, "File.Url", handler)?.to_string();

        let Some(size_in_bytes) = require(data, "File.SizeInBytes", handler)?.as_u64() else {
            sfs_bail!(handler, ServiceInvalidResponse, "File.SizeInBytes is not an unsigned number");
        };

        let hashes = require_object(data, "File.Hashes", handler)?
            .iter()
            .map(|(hash_type, value)| -> Result<(String, String)> {
                match value.as_str() {
                    Some(value) => Ok((hash_type.clone(), value.to_string())),
                    None => sfs_bail!(handler, ServiceInvalidResponse, "File.Hashes object value is not a string"),
                }
            })
            .collect::<Result<HashMap<_, _>>>()?;

        let file = GenericFileEntity {
            file_id,
            url,
            size_in_bytes,
            hashes,
        };

        if !data.contains_key("FileMoniker") {
            return Ok(FileEntity::Generic(file));
        }

        let file_moniker = require_str(data, "File.FileMoniker", handler)?.to_string();
        let details = require_object(data, "File.ApplicabilityDetails", handler)?;
        let architectures =
            require_string_array(details, "File.ApplicabilityDetails.Architectures", handler)?;
        let platform_applicability_for_package = require_string_array(
            details,
            "File.ApplicabilityDetails.PlatformApplicabilityForPackage",
            handler,
        )?;

        Ok(FileEntity::App(AppFileEntity {
            file,
            file_moniker,
            architectures,
            platform_applicability_for_package,
        }))
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            FileEntity::Generic(_) => ContentType::Generic,
            FileEntity::App(_) => ContentType::App,
        }
    }

    pub fn file_id(&self) -> &str {
        match self {
            FileEntity::Generic(entity) => &entity.file_id,
            FileEntity::App(entity) => &entity.file.file_id,
        }
    }

    /// Convert a generic file. An app file fails `ServiceUnexpectedContentType`.
    pub fn into_file(self, handler: &ReportingHandler) -> Result<File> {
        match self {
            FileEntity::Generic(entity) => entity.into_file(handler),
            other => Err(unexpected_content_type(&other, ContentType::Generic, handler)),
        }
    }

    /// Convert an app file. A generic file fails `ServiceUnexpectedContentType`.
    pub fn into_app_file(self, handler: &ReportingHandler) -> Result<AppFile> {
        match self {
            FileEntity::App(entity) => entity.into_app_file(handler),
            other => Err(unexpected_content_type(&other, ContentType::App, handler)),
        }
    }

    pub fn into_files(entities: Vec<Self>, handler: &ReportingHandler) -> Result<Vec<File>> {
        entities.into_iter().map(|entity| entity.into_file(handler)).collect()
    }

    pub fn into_app_files(entities: Vec<Self>, handler: &ReportingHandler) -> Result<Vec<AppFile>> {
        entities
            .into_iter()
            .map(|entity| entity.into_app_file(handler))
            .collect()
    }
}

impl GenericFileEntity {
    fn into_file(self, handler: &ReportingHandler) -> Result<File> {
        let hashes = convert_hashes(self.hashes, handler)?;
        Ok(File::new(self.file_id, self.url, self.size_in_bytes, hashes))
    }
}

impl AppFileEntity {
    fn into_app_file(self, handler: &ReportingHandler) -> Result<AppFile> {
        let architectures = self
            .architectures
            .iter()
            .map(|arch| -> Result<Architecture> {
                match arch.parse::<Architecture>() {
                    Ok(arch) => Ok(arch),
                    Err(arch) => sfs_bail!(handler, Unexpected, "Unknown architecture: {arch}"),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let details = ApplicabilityDetails::new(architectures, self.platform_applicability_for_package);
        Ok(AppFile::new(self.file.into_file(handler)?, self.file_moniker, details))
    }
}

/// Parse a download info response: an array of file objects.
pub fn download_info_response_to_file_entities(
    data: &Value,
    handler: &ReportingHandler,
) -> Result<Vec<FileEntity>> {
    let Some(items) = data.as_array() else {
        sfs_bail!(handler, ServiceInvalidResponse, "Response is not a JSON array");
    };

    items
        .iter()
        .map(|item| -> Result<FileEntity> {
            if !item.is_object() {
                sfs_bail!(handler, ServiceInvalidResponse, "Array element is not a JSON object");
            }
            FileEntity::from_json(item, handler)
        })
        .collect()
}

fn convert_hashes(
    hashes: HashMap<String, String>,
    handler: &ReportingHandler,
) -> Result<HashMap<HashType, String>> {
    hashes
        .into_iter()
        .map(|(hash_type, value)| -> Result<(HashType, String)> {
            match hash_type.parse::<HashType>() {
                Ok(hash_type) => Ok((hash_type, value)),
                Err(hash_type) => sfs_bail!(handler, Unexpected, "Unknown hash type: {hash_type}"),
            }
        })
        .collect()
}

fn unexpected_content_type(
    entity: &FileEntity,
    expected: ContentType,
    handler: &ReportingHandler,
) -> Error {
    let err = Error::new(
        ErrorCode::ServiceUnexpectedContentType,
        format!(
            "The service returned file \"{}\" with content type [{}] while the expected type was [{}]",
            entity.file_id(),
            entity.content_type(),
            expected
        ),
    );
    handler.log_error(&err, file!(), line!());
    err
}
