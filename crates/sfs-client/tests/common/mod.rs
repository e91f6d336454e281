//! In-memory stand-in for the content service.
//!
//! [`MockService`] is a [`Transport`] that routes requests the way the real
//! service does, from a registry of products. Tests can queue canned responses
//! that are served before routing, and inspect every request received.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Value, json};
use sfs_client::effects::{HttpHeader, HttpRequest, HttpResponse, Method, TransportError};
use sfs_client::{Connection, ConnectionConfig, ConnectionManager, ReportingHandler, Result, Transport};
use url::Url;

pub const MOCK_URL: &str = "http://mock.sfs/";

/// A request as the service saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(HttpHeader, String)>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, header: HttpHeader) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| *name == header)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
struct Version {
    version: String,
    // Prerequisites as (name, version); `Some` for app products.
    app: Option<Vec<(String, String)>>,
}

#[derive(Default)]
struct State {
    // (namespace, name) -> versions, latest last.
    products: HashMap<(String, String), Vec<Version>>,
    queued: VecDeque<std::result::Result<HttpResponse, TransportError>>,
    requests: Vec<Recorded>,
}

#[derive(Clone, Default)]
pub struct MockService {
    state: Arc<Mutex<State>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Register a generic product. The last registered version is the latest.
    pub fn register_product(&self, name_space: &str, name: &str, version: &str) {
        self.state()
            .products
            .entry((name_space.to_string(), name.to_string()))
            .or_default()
            .push(Version {
                version: version.to_string(),
                app: None,
            });
    }

    /// Register an app product with prerequisites given as (name, version).
    pub fn register_app(&self, name_space: &str, name: &str, version: &str, prerequisites: &[(&str, &str)]) {
        self.state()
            .products
            .entry((name_space.to_string(), name.to_string()))
            .or_default()
            .push(Version {
                version: version.to_string(),
                app: Some(
                    prerequisites
                        .iter()
                        .map(|(name, version)| (name.to_string(), version.to_string()))
                        .collect(),
                ),
            });
    }

    /// Serve `response` to the next request instead of routing it.
    pub fn queue(&self, response: HttpResponse) {
        self.state().queued.push_back(Ok(response));
    }

    pub fn queue_status(&self, status: u16, times: usize) {
        for _ in 0..times {
            self.queue(HttpResponse::new(status, ""));
        }
    }

    pub fn queue_failure(&self, err: TransportError) {
        self.state().queued.push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state().requests.clone()
    }

    /// Files the service returns for a generic product version.
    pub fn generic_files(name: &str, version: &str) -> Value {
        json!([
            {
                "Url": format!("http://localhost/{name}/{version}/{name}.json"),
                "FileId": format!("{name}.json"),
                "SizeInBytes": 100,
                "Hashes": {"Sha1": format!("{name}-sha1"), "Sha256": format!("{name}-sha256")},
                "DeliveryOptimization": {"CatalogId": version, "Properties": {"IntegrityCheckInfo": {}}}
            },
            {
                "Url": format!("http://localhost/{name}/{version}/{name}.bin"),
                "FileId": format!("{name}.bin"),
                "SizeInBytes": 2048,
                "Hashes": {"Sha1": format!("{name}-bin-sha1"), "Sha256": format!("{name}-bin-sha256")},
                "DeliveryOptimization": {}
            }
        ])
    }

    /// Files the service returns for an app product version.
    pub fn app_files(name: &str, version: &str) -> Value {
        json!([
            {
                "Url": format!("http://localhost/{name}/{version}/{name}.msixbundle"),
                "FileId": format!("{name}.msixbundle"),
                "SizeInBytes": 4096,
                "Hashes": {"Sha1": format!("{name}-sha1"), "Sha256": format!("{name}-sha256")},
                "DeliveryOptimization": {},
                "FileMoniker": format!("{name}_moniker"),
                "ApplicabilityDetails": {
                    "Architectures": ["amd64", "arm64"],
                    "PlatformApplicabilityForPackage": ["Windows.Desktop"]
                }
            }
        ])
    }
}

fn route(state: &State, request: &HttpRequest<'_>) -> HttpResponse {
    let Ok(url) = Url::parse(request.url) else {
        return HttpResponse::new(400, "");
    };
    let segments: Vec<String> = url
        .path_segments()
        .map(|segments| segments.map(percent_decode).collect())
        .unwrap_or_default();
    let action = url
        .query_pairs()
        .find(|(key, _)| key == "action")
        .map(|(_, value)| value.into_owned());

    // api/v2/contents/{instance}/namespaces/{ns}/names/...
    let Some(names) = segments.iter().position(|s| s == "names") else {
        return HttpResponse::new(404, "");
    };
    if names < 2 || segments[names - 2] != "namespaces" {
        return HttpResponse::new(404, "");
    }
    let name_space = segments[names - 1].clone();
    let rest = &segments[names + 1..];

    let find = |name: &str, version: Option<&str>| -> Option<Version> {
        let versions = state.products.get(&(name_space.clone(), name.to_string()))?;
        match version {
            Some(version) => versions.iter().find(|v| v.version == version).cloned(),
            None => versions.last().cloned(),
        }
    };

    match (request.method, rest, action.as_deref()) {
        (Method::Post, [], Some("BatchUpdates")) => {
            let Ok(Value::Array(items)) = serde_json::from_str::<Value>(request.body) else {
                return HttpResponse::new(400, "");
            };
            let mut found = Vec::new();
            for item in items {
                let Some(product) = item["Product"].as_str() else {
                    return HttpResponse::new(400, "");
                };
                if let Some(version) = find(product, None) {
                    found.push(version_json(&name_space, product, &version));
                }
            }
            if found.is_empty() {
                return HttpResponse::new(404, "");
            }
            HttpResponse::new(200, Value::Array(found).to_string())
        }
        (Method::Post, [product, versions, latest], Some("select"))
            if versions == "versions" && latest == "latest" =>
        {
            if serde_json::from_str::<Value>(request.body)
                .ok()
                .and_then(|body| body.get("TargetingAttributes").cloned())
                .is_none()
            {
                return HttpResponse::new(400, "");
            }
            match find(product, None) {
                Some(version) => {
                    HttpResponse::new(200, version_json(&name_space, product, &version).to_string())
                }
                None => HttpResponse::new(404, ""),
            }
        }
        (Method::Get, [product, versions, version], None) if versions == "versions" => {
            match find(product, Some(version)) {
                Some(version) => {
                    HttpResponse::new(200, version_json(&name_space, product, &version).to_string())
                }
                None => HttpResponse::new(404, ""),
            }
        }
        (Method::Post, [product, versions, version, files], Some("GenerateDownloadInfo"))
            if versions == "versions" && files == "files" =>
        {
            match find(product, Some(version)) {
                Some(found) if found.app.is_some() => {
                    HttpResponse::new(200, MockService::app_files(product, version).to_string())
                }
                Some(_) => HttpResponse::new(200, MockService::generic_files(product, version).to_string()),
                None => HttpResponse::new(404, ""),
            }
        }
        _ => HttpResponse::new(405, ""),
    }
}

fn percent_decode(segment: &str) -> String {
    percent_encoding::percent_decode_str(segment)
        .decode_utf8_lossy()
        .into_owned()
}

fn version_json(name_space: &str, name: &str, version: &Version) -> Value {
    let mut data = json!({
        "ContentId": {"Namespace": name_space, "Name": name, "Version": version.version}
    });
    if let Some(prerequisites) = &version.app {
        data["UpdateId"] = json!(format!("{name}-update"));
        data["Prerequisites"] = prerequisites
            .iter()
            .map(|(name, version)| json!({"Namespace": name_space, "Name": name, "Version": version}))
            .collect();
    }
    data
}

impl Transport for MockService {
    fn execute(&mut self, request: &HttpRequest<'_>) -> std::result::Result<HttpResponse, TransportError> {
        let mut state = self.state();
        state.requests.push(Recorded {
            method: request.method,
            url: request.url.to_string(),
            headers: request.headers.to_vec(),
            body: request.body.to_string(),
        });

        let response = match state.queued.pop_front() {
            Some(queued) => queued?,
            None => route(&state, request),
        };

        if response.body.len() > request.max_response_len {
            return Err(TransportError::ResponseTooLarge {
                limit: request.max_response_len,
            });
        }
        Ok(response)
    }
}

/// Hands out connections to a shared [`MockService`].
pub struct MockConnectionManager {
    service: MockService,
}

impl MockConnectionManager {
    pub fn new(service: &MockService) -> Self {
        Self {
            service: service.clone(),
        }
    }
}

impl ConnectionManager for MockConnectionManager {
    fn make_connection(&self, config: &ConnectionConfig, handler: &ReportingHandler) -> Result<Connection> {
        Connection::new(Box::new(self.service.clone()), config, handler.clone())
    }
}
