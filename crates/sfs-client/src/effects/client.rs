use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde_json::{Value, json};

use super::connection::Connection;
use super::manager::ConnectionManager;
use crate::core::entity::download_info_response_to_file_entities;
use crate::core::{BaseUrl, FileEntity, ServiceUrlBuilder, VersionEntity};
use crate::data::{
    AppContent, AppPrerequisiteContent, ClientConfig, ConnectionConfig, Content, ProductRequest,
    RequestParams,
};
use crate::error::{Result, sfs_bail, sfs_ensure};
use crate::reporting::{ReportingHandler, log_info, log_verbose};

const DEFAULT_INSTANCE_ID: &str = "default";
const DEFAULT_NAME_SPACE: &str = "default";
const APP_INSTANCE_ID: &str = "storeapps";

/// Client of the content service.
///
/// Holds the account, instance and namespace every request targets. Calls
/// block until the service answered or the retry budget is spent.
///
/// # Examples
///
/// ```no_run
/// use sfs_client::{ClientConfig, ProductRequest, RequestParams, SfsClient};
///
/// let client = SfsClient::new(ClientConfig::new("myAccount"))?;
/// let contents = client.get_latest_download_info(&RequestParams::new(ProductRequest::new("myProduct")))?;
/// for file in contents[0].files() {
///     println!("{} {}", file.file_id(), file.url());
/// }
/// # Ok::<(), sfs_client::Error>(())
/// ```
pub struct SfsClient {
    account_id: String,
    instance_id: String,
    name_space: String,
    custom_base_url: Option<String>,
    base_retry_delay: Option<Duration>,
    manager: Box<dyn ConnectionManager>,
    handler: ReportingHandler,
}

impl fmt::Debug for SfsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SfsClient")
            .field("account_id", &self.account_id)
            .field("instance_id", &self.instance_id)
            .field("name_space", &self.name_space)
            .field("custom_base_url", &self.custom_base_url)
            .field("base_retry_delay", &self.base_retry_delay)
            .finish_non_exhaustive()
    }
}

impl SfsClient {
    /// Create a client sending requests through `reqwest`.
    #[cfg(feature = "reqwest")]
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::build(config, |handler| {
            let manager = super::manager::ReqwestConnectionManager::new(handler)?;
            Ok(Box::new(manager) as Box<dyn ConnectionManager>)
        })
    }

    /// Create a client over a caller-provided connection manager.
    pub fn with_connection_manager(
        config: ClientConfig,
        manager: impl ConnectionManager + 'static,
    ) -> Result<Self> {
        Self::build(config, |_| Ok(Box::new(manager) as Box<dyn ConnectionManager>))
    }

    fn build(
        config: ClientConfig,
        make_manager: impl FnOnce(&ReportingHandler) -> Result<Box<dyn ConnectionManager>>,
    ) -> Result<Self> {
        let ClientConfig {
            account_id,
            instance_id,
            name_space,
            log_callback,
        } = config;

        let handler = ReportingHandler::new();
        if log_callback.is_some() {
            handler.set_logging_callback(log_callback);
        }

        sfs_ensure!(!account_id.is_empty(), handler, InvalidArg, "ClientConfig::accountId must not be empty");
        if let Some(instance_id) = &instance_id {
            sfs_ensure!(!instance_id.is_empty(), handler, InvalidArg, "ClientConfig::instanceId must not be empty");
        }
        if let Some(name_space) = &name_space {
            sfs_ensure!(!name_space.is_empty(), handler, InvalidArg, "ClientConfig::nameSpace must not be empty");
        }

        let manager = make_manager(&handler)?;

        Ok(Self {
            account_id,
            instance_id: instance_id.unwrap_or_else(|| DEFAULT_INSTANCE_ID.to_string()),
            name_space: name_space.unwrap_or_else(|| DEFAULT_NAME_SPACE.to_string()),
            custom_base_url: None,
            base_retry_delay: None,
            manager,
            handler,
        })
    }

    /// Version of this library.
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn name_space(&self) -> &str {
        &self.name_space
    }

    /// Send requests to `url` instead of the account's production endpoint.
    pub fn set_custom_base_url(&mut self, url: impl Into<String>) {
        self.custom_base_url = Some(url.into());
    }

    /// Replace the base of the exponential backoff for new connections.
    pub fn set_base_retry_delay(&mut self, delay: Duration) {
        self.base_retry_delay = Some(delay);
    }

    /// Resolve the latest version of the single requested product and its files.
    ///
    /// Returns exactly one [`Content`].
    pub fn get_latest_download_info(&self, params: &RequestParams) -> Result<Vec<Content>> {
        let request = self.validate_request_params(params)?;
        let mut connection = self.make_connection(&ConnectionConfig::from(params))?;

        let content_id = self
            .get_latest_version(request, &mut connection)?
            .into_content_id();

        let entities = self.get_download_info(&request.product, content_id.version(), &mut connection)?;
        let files = FileEntity::into_files(entities, &self.handler)?;

        Ok(vec![Content::new(content_id, files)])
    }

    /// Resolve the latest version of the single requested app product, its
    /// files and the files of each of its prerequisites.
    ///
    /// Only the `storeapps` instance serves apps. Returns exactly one
    /// [`AppContent`].
    pub fn get_latest_app_download_info(&self, params: &RequestParams) -> Result<Vec<AppContent>> {
        let request = self.validate_request_params(params)?;
        sfs_ensure!(
            self.instance_id.eq_ignore_ascii_case(APP_INSTANCE_ID),
            self.handler,
            Unexpected,
            "At this moment only the \"{APP_INSTANCE_ID}\" instanceId can send app requests"
        );

        let mut connection = self.make_connection(&ConnectionConfig::from(params))?;

        let entity = self
            .get_latest_version(request, &mut connection)?
            .into_app(&self.handler)?;
        let (content_id, update_id, prerequisite_entities) = entity.into_parts();

        log_info!(self.handler, "Getting download info for main app content");
        let entities = self.get_download_info(&request.product, content_id.version(), &mut connection)?;
        let files = FileEntity::into_app_files(entities, &self.handler)?;

        let mut prerequisites = Vec::with_capacity(prerequisite_entities.len());
        for prerequisite in prerequisite_entities {
            let prerequisite_id = prerequisite.into_content_id();
            log_info!(
                self.handler,
                "Getting download info for prerequisite [{}]",
                prerequisite_id.name()
            );

            let entities = self.get_download_info(
                prerequisite_id.name(),
                prerequisite_id.version(),
                &mut connection,
            )?;
            let files = FileEntity::into_app_files(entities, &self.handler)?;
            prerequisites.push(AppPrerequisiteContent::new(prerequisite_id, files));
        }

        Ok(vec![AppContent::new(content_id, update_id, prerequisites, files)])
    }

    /// POST `{"TargetingAttributes": {...}}` to the latest version endpoint.
    ///
    /// The returned entity must name the configured namespace and `request.product`.
    pub fn get_latest_version(
        &self,
        request: &ProductRequest,
        connection: &mut Connection,
    ) -> Result<VersionEntity> {
        let url = self.url_builder()?.get_latest_version_url(&request.product)?;
        log_info!(
            self.handler,
            "Requesting latest version of [{}] from URL [{url}]",
            request.product
        );

        let body = json!({ "TargetingAttributes": request.attributes });
        log_verbose!(self.handler, "Request body [{body}]");

        let response = connection.post(&url, &body.to_string())?;
        let data = self.parse_json(&response, "GetLatestVersion")?;

        let entity = VersionEntity::from_json(&data, &self.handler)?;
        self.validate_version_entity(&entity, &request.product)?;

        log_info!(
            self.handler,
            "Received a response with version {}",
            entity.content_id().version
        );
        Ok(entity)
    }

    /// POST `[{"TargetingAttributes": {...}, "Product": s}, ...]` to the batch
    /// endpoint.
    ///
    /// Repeated products are sent once, with the attributes of their first
    /// occurrence.
    pub fn get_latest_version_batch(
        &self,
        requests: &[ProductRequest],
        connection: &mut Connection,
    ) -> Result<Vec<VersionEntity>> {
        let url = self.url_builder()?.get_latest_version_batch_url()?;
        log_info!(
            self.handler,
            "Requesting latest version of multiple products from URL [{url}]"
        );

        let mut requested = HashSet::new();
        let mut body = Vec::new();
        for request in requests {
            if !requested.insert(request.product.as_str()) {
                continue;
            }
            log_info!(self.handler, "Product #{}: [{}]", body.len() + 1, request.product);
            body.push(json!({
                "TargetingAttributes": request.attributes,
                "Product": request.product,
            }));
        }

        let body = Value::Array(body);
        log_verbose!(self.handler, "Request body [{body}]");

        let response = connection.post(&url, &body.to_string())?;
        let data = self.parse_json(&response, "GetLatestVersionBatch")?;

        let entities = VersionEntity::from_batch_json(&data, &self.handler)?;
        for entity in &entities {
            let content_id = entity.content_id();
            sfs_ensure!(
                requested.contains(content_id.name.as_str()),
                self.handler,
                ServiceInvalidResponse,
                "Received product [{}] which is not one of the requested products",
                content_id.name
            );
            sfs_ensure!(
                content_id.name_space.eq_ignore_ascii_case(&self.name_space),
                self.handler,
                ServiceInvalidResponse,
                "Received product [{}] with a namespace [{}] that does not match the requested namespace",
                content_id.name,
                content_id.name_space
            );
            log_info!(
                self.handler,
                "Received a response for product [{}] with version {}",
                content_id.name,
                content_id.version
            );
        }

        Ok(entities)
    }

    /// GET a specific version of `product`.
    pub fn get_specific_version(
        &self,
        product: &str,
        version: &str,
        connection: &mut Connection,
    ) -> Result<VersionEntity> {
        let url = self.url_builder()?.get_specific_version_url(product, version)?;
        log_info!(
            self.handler,
            "Requesting version [{version}] of [{product}] from URL [{url}]"
        );

        let response = connection.get(&url)?;
        let data = self.parse_json(&response, "GetSpecificVersion")?;

        let entity = VersionEntity::from_json(&data, &self.handler)?;
        self.validate_version_entity(&entity, product)?;

        log_info!(
            self.handler,
            "Received the expected response with version {}",
            entity.content_id().version
        );
        Ok(entity)
    }

    /// POST, without a body, to the download info endpoint of a version.
    pub fn get_download_info(
        &self,
        product: &str,
        version: &str,
        connection: &mut Connection,
    ) -> Result<Vec<FileEntity>> {
        let url = self.url_builder()?.get_download_info_url(product, version)?;
        log_info!(
            self.handler,
            "Requesting download info of version [{version}] of [{product}] from URL [{url}]"
        );

        let response = connection.post(&url, "")?;
        let data = self.parse_json(&response, "GetDownloadInfo")?;

        let entities = download_info_response_to_file_entities(&data, &self.handler)?;
        log_info!(self.handler, "Received a response with {} files", entities.len());
        Ok(entities)
    }

    /// Make a connection through the client's manager, applying the client's
    /// retry delay override if any.
    pub fn make_connection(&self, config: &ConnectionConfig) -> Result<Connection> {
        let mut config = config.clone();
        if let Some(delay) = self.base_retry_delay {
            config.base_retry_delay = delay;
        }
        self.manager.make_connection(&config, &self.handler)
    }

    fn url_builder(&self) -> Result<ServiceUrlBuilder> {
        let base = match &self.custom_base_url {
            Some(url) => BaseUrl::Custom(url.clone()),
            None => BaseUrl::Account(self.account_id.clone()),
        };
        ServiceUrlBuilder::new(&base, &self.instance_id, &self.name_space, self.handler.clone())
    }

    fn validate_request_params<'a>(&self, params: &'a RequestParams) -> Result<&'a ProductRequest> {
        let requests = &params.product_requests;
        sfs_ensure!(!requests.is_empty(), self.handler, InvalidArg, "productRequests cannot be empty");
        // TODO: accept several product requests once the download info calls are batched.
        sfs_ensure!(
            requests.len() == 1,
            self.handler,
            NotImpl,
            "There cannot be more than 1 productRequest at the moment"
        );

        let request = &requests[0];
        sfs_ensure!(!request.product.is_empty(), self.handler, InvalidArg, "product must not be empty");
        Ok(request)
    }

    fn validate_version_entity(&self, entity: &VersionEntity, product: &str) -> Result<()> {
        let content_id = entity.content_id();
        sfs_ensure!(
            content_id.name_space == self.name_space && content_id.name == product,
            self.handler,
            ServiceInvalidResponse,
            "Response does not match the requested product"
        );
        Ok(())
    }

    fn parse_json(&self, data: &str, method: &str) -> Result<Value> {
        match serde_json::from_str(data) {
            Ok(value) => Ok(value),
            Err(err) => sfs_bail!(
                self.handler,
                ServiceInvalidResponse,
                "({method}) JSON Parsing error: {err}"
            ),
        }
    }
}
