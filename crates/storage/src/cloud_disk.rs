use crate::backend::{bounded, StorageBackend};
use crate::StorageError;
use arstore_config::{BackendKind, CloudDiskSettings};
use arstore_models::ProvisionedPath;
use arstore_utils::join_remote;
use bytes::Bytes;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

type Result<T> = std::result::Result<T, StorageError>;

/// Error code the disk API returns with 409 when the parent folder is missing
const PARENT_MISSING: &str = "DiskPathDoesntExistsError";

/// OAuth-authenticated cloud disk (Yandex Disk REST API)
pub struct CloudDiskBackend {
    client: reqwest::Client,
    api_url: String,
    token: String,
    base_path: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct Link {
    href: String,
    #[serde(default)]
    method: Option<String>,
}

#[derive(Deserialize)]
struct Resource {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize, Default)]
struct ApiErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    message: String,
}

impl ApiErrorBody {
    fn reason(&self, status: StatusCode) -> String {
        let detail = [&self.description, &self.message, &self.error]
            .into_iter()
            .find(|s| !s.is_empty());
        match detail {
            Some(detail) => format!("HTTP {}: {}", status.as_u16(), detail),
            None => format!("HTTP {}", status.as_u16()),
        }
    }
}

impl CloudDiskBackend {
    /// Builds the client. With `verify_on_connect` the token is checked
    /// against the disk before the adapter is handed out.
    pub async fn connect(settings: &CloudDiskSettings, timeout: Duration) -> Result<Self> {
        if !settings.enabled {
            return Err(StorageError::ConfigError(
                "cloud_disk is not enabled for this route".to_string(),
            ));
        }
        if settings.oauth_token.trim().is_empty() {
            return Err(StorageError::ConfigError(
                "cloud_disk.oauth_token is missing".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        let backend = Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            token: settings.oauth_token.clone(),
            base_path: settings.base_path.trim_matches('/').to_string(),
            timeout,
        };

        if settings.verify_on_connect {
            backend.verify().await?;
        }

        Ok(backend)
    }

    /// Disk-info handshake
    pub async fn verify(&self) -> Result<()> {
        bounded(self.timeout, "disk:/", async {
            let response = self
                .request(Method::GET, "/")
                .send()
                .await
                .map_err(|e| transport_error("disk:/", e))?;
            check("disk:/", response).await?;
            tracing::debug!("Cloud disk token accepted by {}", self.api_url);
            Ok(())
        })
        .await
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, endpoint))
            .header(reqwest::header::AUTHORIZATION, format!("OAuth {}", self.token))
    }

    fn disk_path(&self, relative: &str) -> String {
        format!("disk:/{}", join_remote(&self.base_path, relative))
    }

    async fn stat(&self, path: &ProvisionedPath) -> Result<Option<Resource>> {
        let disk_path = self.disk_path(path.as_str());
        let response = self
            .request(Method::GET, "/resources")
            .query(&[("path", disk_path.as_str()), ("fields", "type")])
            .send()
            .await
            .map_err(|e| transport_error(path.as_str(), e))?;

        match check(path.as_str(), response).await {
            Ok(response) => {
                let resource = response
                    .json::<Resource>()
                    .await
                    .map_err(|e| transport_error(path.as_str(), e))?;
                Ok(Some(resource))
            }
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn mkdir(&self, disk_path: &str, label: &str) -> Result<()> {
        let response = self
            .request(Method::PUT, "/resources")
            .query(&[("path", disk_path)])
            .send()
            .await
            .map_err(|e| transport_error(label, e))?;
        check(label, response).await?;
        Ok(())
    }

    /// Creates the configured base folder chain, tolerating existing levels
    async fn ensure_base(&self) -> Result<()> {
        let mut current = String::new();
        for segment in self.base_path.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            match self.mkdir(&format!("disk:/{}", current), &current).await {
                Ok(()) | Err(StorageError::AlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn create_level(&self, path: &ProvisionedPath) -> Result<()> {
        let disk_path = self.disk_path(path.as_str());
        match self.mkdir(&disk_path, path.as_str()).await {
            // Top-level folder failed because the base folder is missing
            Err(StorageError::NotFound(_)) if path.depth() == 1 && !self.base_path.is_empty() => {
                self.ensure_base().await?;
                self.mkdir(&disk_path, path.as_str()).await
            }
            other => other,
        }
    }

    async fn create_parent_chain(&self, path: &ProvisionedPath) -> Result<()> {
        let Some(parent) = path.parent() else {
            return self.ensure_base().await;
        };
        for level in parent.chain() {
            match self.create_level(&level).await {
                Ok(()) | Err(StorageError::AlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn upload(&self, path: &ProvisionedPath, data: Bytes) -> Result<()> {
        let disk_path = self.disk_path(path.as_str());
        let response = self
            .request(Method::GET, "/resources/upload")
            .query(&[("path", disk_path.as_str()), ("overwrite", "true")])
            .send()
            .await
            .map_err(|e| transport_error(path.as_str(), e))?;
        let link = check(path.as_str(), response)
            .await?
            .json::<Link>()
            .await
            .map_err(|e| transport_error(path.as_str(), e))?;

        let method = link
            .method
            .as_deref()
            .and_then(|m| Method::from_bytes(m.as_bytes()).ok())
            .unwrap_or(Method::PUT);

        // Upload hrefs are pre-signed; no OAuth header
        let response = self
            .client
            .request(method, &link.href)
            .body(data)
            .send()
            .await
            .map_err(|e| transport_error(path.as_str(), e))?;
        check(path.as_str(), response).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl StorageBackend for CloudDiskBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::CloudDisk
    }

    async fn save(&self, path: &ProvisionedPath, data: Bytes) -> Result<ProvisionedPath> {
        bounded(self.timeout, path.as_str(), async {
            match self.upload(path, data.clone()).await {
                Ok(()) => {}
                Err(StorageError::NotFound(_)) => {
                    tracing::debug!("Parent of {} missing on cloud disk, creating it", path);
                    self.create_parent_chain(path).await?;
                    self.upload(path, data).await?;
                }
                Err(e) => return Err(e),
            }
            Ok(path.clone())
        })
        .await
    }

    async fn read(&self, path: &ProvisionedPath) -> Result<Bytes> {
        let disk_path = self.disk_path(path.as_str());
        bounded(self.timeout, path.as_str(), async {
            let response = self
                .request(Method::GET, "/resources/download")
                .query(&[("path", disk_path.as_str())])
                .send()
                .await
                .map_err(|e| transport_error(path.as_str(), e))?;
            let link = check(path.as_str(), response)
                .await?
                .json::<Link>()
                .await
                .map_err(|e| transport_error(path.as_str(), e))?;

            let response = self
                .client
                .get(&link.href)
                .send()
                .await
                .map_err(|e| transport_error(path.as_str(), e))?;
            check(path.as_str(), response)
                .await?
                .bytes()
                .await
                .map_err(|e| transport_error(path.as_str(), e))
        })
        .await
    }

    async fn delete(&self, path: &ProvisionedPath) -> Result<()> {
        let disk_path = self.disk_path(path.as_str());
        bounded(self.timeout, path.as_str(), async {
            let response = self
                .request(Method::DELETE, "/resources")
                .query(&[("path", disk_path.as_str()), ("permanently", "true")])
                .send()
                .await
                .map_err(|e| transport_error(path.as_str(), e))?;
            check(path.as_str(), response).await?;
            Ok(())
        })
        .await
    }

    async fn exists(&self, path: &ProvisionedPath) -> Result<bool> {
        bounded(self.timeout, path.as_str(), async {
            Ok(self.stat(path).await?.is_some_and(|r| r.kind == "file"))
        })
        .await
    }

    fn public_url(&self, _path: &ProvisionedPath) -> Option<String> {
        None
    }

    async fn directory_exists(&self, path: &ProvisionedPath) -> Result<bool> {
        bounded(self.timeout, path.as_str(), async {
            Ok(self.stat(path).await?.is_some_and(|r| r.kind == "dir"))
        })
        .await
    }

    async fn create_directory(&self, path: &ProvisionedPath) -> Result<()> {
        bounded(self.timeout, path.as_str(), self.create_level(path)).await
    }
}

fn transport_error(path: &str, err: reqwest::Error) -> StorageError {
    StorageError::transport(path, err)
}

/// Passes successful responses through and classifies the rest
async fn check(path: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.json::<ApiErrorBody>().await.unwrap_or_default();
    Err(error_for_status(path, status, &body))
}

fn error_for_status(path: &str, status: StatusCode, body: &ApiErrorBody) -> StorageError {
    let reason = body.reason(status);
    match status.as_u16() {
        401 | 403 => StorageError::auth(path, reason),
        404 => StorageError::NotFound(path.to_string()),
        409 if body.error == PARENT_MISSING => StorageError::NotFound(path.to_string()),
        409 => StorageError::AlreadyExists(path.to_string()),
        413 | 507 => StorageError::QuotaExceeded(path.to_string()),
        429 | 500..=599 => StorageError::transport(path, reason),
        _ => StorageError::IoError {
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, reason),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageErrorKind;
    use serde_json::json;
    use wiremock::matchers::{body_bytes, header, method, path as url_path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> CloudDiskSettings {
        CloudDiskSettings {
            enabled: true,
            oauth_token: "good-token".to_string(),
            base_path: "ar".to_string(),
            api_url: server.uri(),
            verify_on_connect: false,
        }
    }

    async fn backend(server: &MockServer) -> CloudDiskBackend {
        CloudDiskBackend::connect(&settings(server), Duration::from_secs(5))
            .await
            .unwrap()
    }

    fn path(raw: &str) -> ProvisionedPath {
        ProvisionedPath::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_connect_rejects_missing_token_and_disabled_route() {
        let server = MockServer::start().await;

        let mut no_token = settings(&server);
        no_token.oauth_token = String::new();
        let err = CloudDiskBackend::connect(&no_token, Duration::from_secs(1)).await.err().unwrap();
        assert_eq!(err.kind(), StorageErrorKind::ConfigInvalid);

        let mut disabled = settings(&server);
        disabled.enabled = false;
        let err = CloudDiskBackend::connect(&disabled, Duration::from_secs(1)).await.err().unwrap();
        assert_eq!(err.kind(), StorageErrorKind::ConfigInvalid);
    }

    #[tokio::test]
    async fn test_verify_on_connect_surfaces_invalid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "UnauthorizedError",
                "description": "Unauthorized"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut verified = settings(&server);
        verified.verify_on_connect = true;
        let err = CloudDiskBackend::connect(&verified, Duration::from_secs(5)).await.err().unwrap();
        assert_eq!(err.kind(), StorageErrorKind::Auth);
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[tokio::test]
    async fn test_directory_exists_sends_oauth_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/resources"))
            .and(query_param("path", "disk:/ar/acme"))
            .and(header("Authorization", "OAuth good-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "dir"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(url_path("/resources"))
            .and(query_param("path", "disk:/ar/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": "DiskNotFoundError"
            })))
            .mount(&server)
            .await;

        let disk = backend(&server).await;
        assert!(disk.directory_exists(&path("acme")).await.unwrap());
        assert!(!disk.exists(&path("acme")).await.unwrap());
        assert!(!disk.directory_exists(&path("ghost")).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_token_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/resources"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "UnauthorizedError",
                "description": "Unauthorized"
            })))
            .mount(&server)
            .await;

        let disk = backend(&server).await;
        let err = disk.directory_exists(&path("acme")).await.unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::Auth);
    }

    #[tokio::test]
    async fn test_create_directory_conflicts() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(url_path("/resources"))
            .and(query_param("path", "disk:/ar/acme"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": "DiskPathPointsToExistentDirectoryError"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(url_path("/resources"))
            .and(query_param("path", "disk:/ar/acme/x/y"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": PARENT_MISSING
            })))
            .mount(&server)
            .await;

        let disk = backend(&server).await;
        assert_eq!(
            disk.create_directory(&path("acme")).await.unwrap_err().kind(),
            StorageErrorKind::AlreadyExists
        );
        assert_eq!(
            disk.create_directory(&path("acme/x/y")).await.unwrap_err().kind(),
            StorageErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_save_creates_missing_parents_and_retries_once() {
        let server = MockServer::start().await;
        let href = format!("{}/upload-target", server.uri());

        Mock::given(method("GET"))
            .and(url_path("/resources/upload"))
            .and(query_param("path", "disk:/ar/acme/d/1.png"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": PARENT_MISSING
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(url_path("/resources/upload"))
            .and(query_param("path", "disk:/ar/acme/d/1.png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "href": href,
                "method": "PUT"
            })))
            .expect(1)
            .mount(&server)
            .await;
        // "acme" already exists, "acme/d" is created
        Mock::given(method("PUT"))
            .and(url_path("/resources"))
            .and(query_param("path", "disk:/ar/acme"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": "DiskPathPointsToExistentDirectoryError"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(url_path("/resources"))
            .and(query_param("path", "disk:/ar/acme/d"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(url_path("/upload-target"))
            .and(body_bytes(b"png".to_vec()))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let disk = backend(&server).await;
        let stored = disk
            .save(&path("acme/d/1.png"), Bytes::from_static(b"png"))
            .await
            .unwrap();
        assert_eq!(stored.as_str(), "acme/d/1.png");
    }

    #[tokio::test]
    async fn test_full_disk_is_quota() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/resources/upload"))
            .respond_with(ResponseTemplate::new(507).set_body_json(json!({
                "error": "DiskInsufficientStorageError"
            })))
            .mount(&server)
            .await;

        let disk = backend(&server).await;
        let err = disk
            .save(&path("acme/1.png"), Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::QuotaExceeded);
    }

    #[tokio::test]
    async fn test_read_follows_download_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/resources/download"))
            .and(query_param("path", "disk:/ar/acme/1.png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "href": format!("{}/blob", server.uri())
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(url_path("/blob"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
            .mount(&server)
            .await;

        let disk = backend(&server).await;
        let data = disk.read(&path("acme/1.png")).await.unwrap();
        assert_eq!(data, Bytes::from_static(b"payload"));
        assert_eq!(disk.public_url(&path("acme/1.png")), None);
    }

    #[tokio::test]
    async fn test_server_errors_are_transport() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(url_path("/resources"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let disk = backend(&server).await;
        let err = disk.delete(&path("acme/1.png")).await.unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::Transport);
    }
}
