//! Endpoint URLs of the content service.
//!
//! All endpoints live under
//! `<base>/api/v2/contents/{instanceId}/namespaces/{nameSpace}`.

use crate::core::url::{Scheme, UrlBuilder};
use crate::error::Result;
use crate::reporting::ReportingHandler;

const API_VERSION: &str = "v2";

/// Where the service is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseUrl {
    /// The production endpoint of an account: `https://{account}.api.cdp.microsoft.com/`.
    Account(String),
    /// Any other endpoint, for tests and diagnostics.
    Custom(String),
}

#[derive(Debug, Clone)]
pub struct ServiceUrlBuilder {
    builder: UrlBuilder,
    base_path: String,
    instance_id: String,
    name_space: String,
}

impl ServiceUrlBuilder {
    pub fn new(
        base: &BaseUrl,
        instance_id: &str,
        name_space: &str,
        handler: ReportingHandler,
    ) -> Result<Self> {
        let mut builder = UrlBuilder::new(handler);
        match base {
            BaseUrl::Account(account_id) => {
                builder
                    .set_scheme(Scheme::Https)
                    .set_host(&format!("{account_id}.api.cdp.microsoft.com"))?;
            }
            BaseUrl::Custom(url) => {
                builder.set_url(url)?;
                builder.reset_query();
            }
        }

        // The path of a custom base URL prefixes every endpoint.
        let base_path = builder.encoded_path().trim_end_matches('/').to_string();

        Ok(Self {
            builder,
            base_path,
            instance_id: instance_id.to_string(),
            name_space: name_space.to_string(),
        })
    }

    /// The base URL without any endpoint path.
    pub fn get_url(&self) -> Result<String> {
        self.builder.get_url()
    }

    /// `.../names/{product}/versions/latest?action=select`
    pub fn get_latest_version_url(&mut self, product: &str) -> Result<String> {
        self.set_names_path()?;
        self.builder
            .append_path_encoded(product)?
            .append_path("versions/latest")?
            .set_query("action", "select")?;
        self.builder.get_url()
    }

    /// `.../names?action=BatchUpdates`
    pub fn get_latest_version_batch_url(&mut self) -> Result<String> {
        self.set_names_path()?;
        self.builder.set_query("action", "BatchUpdates")?;
        self.builder.get_url()
    }

    /// `.../names/{product}/versions/{version}`
    pub fn get_specific_version_url(&mut self, product: &str, version: &str) -> Result<String> {
        self.set_names_path()?;
        self.builder
            .append_path_encoded(product)?
            .append_path("versions")?
            .append_path_encoded(version)?
            .reset_query();
        self.builder.get_url()
    }

    /// `.../names/{product}/versions/{version}/files?action=GenerateDownloadInfo`
    pub fn get_download_info_url(&mut self, product: &str, version: &str) -> Result<String> {
        self.set_names_path()?;
        self.builder
            .append_path_encoded(product)?
            .append_path("versions")?
            .append_path_encoded(version)?
            .append_path("files")?
            .set_query("action", "GenerateDownloadInfo")?;
        self.builder.get_url()
    }

    fn set_names_path(&mut self) -> Result<()> {
        self.builder
            .set_encoded_path(&self.base_path)
            .append_path(&format!("api/{API_VERSION}/contents"))?
            .append_path_encoded(&self.instance_id)?
            .append_path("namespaces")?
            .append_path_encoded(&self.name_space)?
            .append_path("names")?;
        Ok(())
    }
}
