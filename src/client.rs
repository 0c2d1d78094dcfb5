//! Storage API client
//!
//! `DataService` is the seam between the viewer and the remote service.
//! `HttpDataService` talks to the real REST API:
//!
//! | Operation   | Request                          |
//! |-------------|----------------------------------|
//! | list files  | `GET  /api/files`                |
//! | upload      | `POST /api/upload` (field `file`)|
//! | list sheets | `GET  /api/sheets/{file}`        |
//! | get rows    | `GET  /api/data/{file}/{sheet}`  |
//!
//! Requests run on tokio's blocking pool since `ureq` is synchronous.

use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ViewerError, ViewerResult};
use crate::types::Dataset;

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk. The upload name is the path's file name.
    pub fn from_path(path: &Path) -> ViewerResult<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.xlsx".to_string());
        Ok(Self { name, bytes })
    }
}

/// Operations the remote storage service offers.
#[async_trait]
pub trait DataService: Send + Sync {
    async fn list_files(&self) -> ViewerResult<Vec<String>>;

    /// The response body is returned as-is; callers only care that it parsed.
    async fn upload(&self, file: UploadFile) -> ViewerResult<Value>;

    async fn list_sheets(&self, file: &str) -> ViewerResult<Vec<String>>;

    async fn fetch_rows(&self, file: &str, sheet: &str) -> ViewerResult<Dataset>;
}

/// `DataService` over HTTP.
#[derive(Clone)]
pub struct HttpDataService {
    agent: ureq::Agent,
    config: ClientConfig,
}

impl HttpDataService {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { agent, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn get_json<T>(&self, url: Url) -> ViewerResult<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || {
            debug!(%url, "GET");
            let response = agent.get(url.as_str()).call();
            decode_response(&url, response)
        })
        .await?
    }
}

#[async_trait]
impl DataService for HttpDataService {
    async fn list_files(&self) -> ViewerResult<Vec<String>> {
        self.get_json(self.config.endpoint(&["files"])).await
    }

    async fn upload(&self, file: UploadFile) -> ViewerResult<Value> {
        let url = self.config.endpoint(&["upload"]);
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || {
            let boundary = format!("rainsheet-{}", Uuid::new_v4().simple());
            let body = multipart_body(&boundary, "file", &file);
            info!(%url, file = %file.name, bytes = file.bytes.len(), "uploading");
            let response = agent
                .post(url.as_str())
                .set(
                    "Content-Type",
                    &format!("multipart/form-data; boundary={}", boundary),
                )
                .send_bytes(&body);
            decode_response(&url, response)
        })
        .await?
    }

    async fn list_sheets(&self, file: &str) -> ViewerResult<Vec<String>> {
        self.get_json(self.config.endpoint(&["sheets", file])).await
    }

    async fn fetch_rows(&self, file: &str, sheet: &str) -> ViewerResult<Dataset> {
        self.get_json(self.config.endpoint(&["data", file, sheet]))
            .await
    }
}

fn decode_response<T: DeserializeOwned>(
    url: &Url,
    response: Result<ureq::Response, ureq::Error>,
) -> ViewerResult<T> {
    let response = match response {
        Ok(response) => response,
        Err(ureq::Error::Status(code, _)) => {
            return Err(ViewerError::Status {
                code,
                url: url.to_string(),
            })
        }
        Err(ureq::Error::Transport(transport)) => {
            return Err(ViewerError::Transport {
                url: url.to_string(),
                message: transport.to_string(),
            })
        }
    };

    let mut body = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut body)
        .map_err(|e| ViewerError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    serde_json::from_slice(&body).map_err(|e| ViewerError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Encode a single file part as `multipart/form-data`.
pub fn multipart_body(boundary: &str, field: &str, file: &UploadFile) -> Vec<u8> {
    let file_name = file.name.replace('"', "%22").replace(['\r', '\n'], " ");
    let mut body = Vec::with_capacity(file.bytes.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(&file.bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_body_layout() {
        let file = UploadFile::new("hujan.xlsx", b"PK\x03\x04".to_vec());
        let body = multipart_body("XYZ", "file", &file);
        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with("--XYZ\r\n"));
        assert!(text.contains("name=\"file\"; filename=\"hujan.xlsx\"\r\n"));
        assert!(text.contains("\r\n\r\nPK\u{3}\u{4}\r\n--XYZ--\r\n"));
        assert!(text.ends_with("--XYZ--\r\n"));
    }

    #[test]
    fn test_multipart_body_escapes_quotes() {
        let file = UploadFile::new("a\"b\r\n.xlsx", Vec::new());
        let body = multipart_body("B", "file", &file);
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("filename=\"a%22b  .xlsx\""));
    }

    #[test]
    fn test_upload_file_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("Curah Hujan.xlsx");
        std::fs::write(&path, b"abc").unwrap();
        let file = UploadFile::from_path(&path).unwrap();
        assert_eq!(file.name, "Curah Hujan.xlsx");
        assert_eq!(file.bytes, b"abc");
    }

    #[test]
    fn test_upload_file_missing_path() {
        let result = UploadFile::from_path(Path::new("/definitely/not/here.xlsx"));
        assert!(matches!(result, Err(ViewerError::Io(_))));
    }

    #[test]
    fn test_http_service_uses_config() {
        let service = HttpDataService::new(ClientConfig::default());
        assert_eq!(service.config().base_url.as_str(), "http://localhost:5000/");
    }
}
