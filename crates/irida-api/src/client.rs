//! IRIDA REST API client
//!
//! Implements the remote ports over HTTP. Authentication uses the OAuth2
//! password grant; the access token is fetched lazily and reused for every
//! request made by the same client.

use crate::error::ApiError;
use crate::ports::*;
use async_trait::async_trait;
use irida_model::{IridaResourceError, Project, RunMetadata, RunStatus, Sample, SequenceFile};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// IRIDA connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IridaConfig {
    /// API root, e.g. `http://localhost:8080/irida-latest/api`
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    /// Per-request timeout in seconds (0 disables the timeout)
    pub timeout_secs: u64,
}

impl Default for IridaConfig {
    fn default() -> Self {
        IridaConfig {
            base_url: std::env::var("IRIDA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api".to_string()),
            client_id: std::env::var("IRIDA_CLIENT_ID").unwrap_or_else(|_| "uploader".to_string()),
            client_secret: std::env::var("IRIDA_CLIENT_SECRET").unwrap_or_default(),
            username: std::env::var("IRIDA_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            password: std::env::var("IRIDA_PASSWORD").unwrap_or_default(),
            timeout_secs: std::env::var("IRIDA_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),
        }
    }
}

impl IridaConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific server
    pub fn new(base_url: &str) -> Self {
        IridaConfig {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Set OAuth client credentials
    pub fn with_client(mut self, client_id: &str, client_secret: &str) -> Self {
        self.client_id = client_id.to_string();
        self.client_secret = client_secret.to_string();
        self
    }

    /// Set user credentials
    pub fn with_user(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Join a relative API path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// IRIDA wraps every payload in `{"resource": ...}`; collections carry
// their items in `resource.resources`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    resource: T,
}

#[derive(Debug, Deserialize)]
struct Collection<T> {
    resources: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Identified {
    identifier: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteSample {
    identifier: String,
    sample_name: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// IRIDA client for validation and upload
pub struct IridaClient {
    config: IridaConfig,
    http_client: reqwest::Client,
    token: Mutex<Option<String>>,
}

impl IridaClient {
    /// Create a new IRIDA client
    pub fn new(config: IridaConfig) -> ApiResult<Self> {
        let mut builder =
            reqwest::Client::builder().user_agent(concat!("irida-uploader/", env!("CARGO_PKG_VERSION")));
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let http_client = builder.build()?;

        Ok(IridaClient {
            config,
            http_client,
            token: Mutex::new(None),
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> ApiResult<Self> {
        Self::new(IridaConfig::from_env())
    }

    pub fn config(&self) -> &IridaConfig {
        &self.config
    }

    /// Return the cached access token, requesting one if needed
    async fn access_token(&self) -> ApiResult<String> {
        let mut token = self.token.lock().await;
        if let Some(t) = token.as_ref() {
            return Ok(t.clone());
        }

        debug!(url = %self.config.base_url, "Requesting IRIDA access token");
        let response = self
            .http_client
            .post(self.config.url("oauth/token"))
            .form(&[
                ("grant_type", "password"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "IRIDA token request rejected");
            return Err(ApiError::Authentication(format!("HTTP {status}: {body}")));
        }

        let parsed: TokenResponse = response.json().await?;
        *token = Some(parsed.access_token.clone());
        Ok(parsed.access_token)
    }

    /// Attach the bearer token and send
    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let token = self.access_token().await?;
        Ok(request.bearer_auth(token).send().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Option<T>> {
        let url = self.config.url(path);
        let response = self.send(self.http_client.get(&url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response)?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(Some(envelope.resource))
    }

    /// Remote samples of a project, or `None` if the project does not exist
    async fn project_samples(&self, project_id: &str) -> ApiResult<Option<Vec<RemoteSample>>> {
        let samples: Option<Collection<RemoteSample>> = self
            .get_json(&format!("projects/{project_id}/samples"))
            .await?;
        Ok(samples.map(|c| c.resources))
    }

    /// Numeric IRIDA identifier of a sample, looked up by sample name
    async fn sample_identifier(&self, sample_name: &str, project_id: &str) -> ApiResult<String> {
        let samples = self.project_samples(project_id).await?.ok_or_else(|| {
            IridaResourceError::for_resource("project does not exist", project_id)
        })?;
        samples
            .into_iter()
            .find(|s| s.sample_name == sample_name)
            .map(|s| s.identifier)
            .ok_or_else(|| {
                IridaResourceError::for_resource("sample does not exist", sample_name).into()
            })
    }

    async fn set_seq_run_status(&self, upload_id: &UploadId, status: RunStatus) -> ApiResult<bool> {
        let url = self.config.url(&format!("sequencingrun/{upload_id}"));
        debug!(upload_id = %upload_id, status = %status, "Setting sequencing run status");
        let response = self
            .send(
                self.http_client
                    .patch(&url)
                    .json(&json!({ "uploadStatus": status.as_str() })),
            )
            .await?;
        check_status(response)?;
        Ok(true)
    }
}

fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Http {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

/// Multipart part that streams the file from disk while the request is sent.
async fn file_part(path: &Path) -> ApiResult<Part> {
    let file = tokio::fs::File::open(path).await?;
    let length = file.metadata().await?.len();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sequence.fastq".to_string());
    Ok(Part::stream_with_length(Body::from(file), length)
        .file_name(file_name)
        .mime_str("application/octet-stream")?)
}

#[async_trait]
impl RemoteState for IridaClient {
    async fn project_exists(&self, project_id: &str) -> ApiResult<bool> {
        let project: Option<Identified> = self.get_json(&format!("projects/{project_id}")).await?;
        Ok(project.is_some_and(|p| p.identifier == project_id))
    }

    async fn sample_exists(&self, sample_id: &str, project_id: &str) -> ApiResult<bool> {
        let samples = self.project_samples(project_id).await?.unwrap_or_default();
        Ok(samples.iter().any(|s| s.sample_name == sample_id))
    }

    async fn send_sample(&self, sample: &Sample, project_id: &str) -> ApiResult<bool> {
        let url = self.config.url(&format!("projects/{project_id}/samples"));
        info!(sample = %sample.identifier, project = %project_id, "Creating sample in IRIDA");
        let response = self
            .send(self.http_client.post(&url).json(&json!({
                "sampleName": sample.identifier,
                "description": sample.description,
            })))
            .await?;
        let status = response.status();
        if !status.is_success() {
            debug!(sample = %sample.identifier, %status, "IRIDA did not create sample");
        }
        Ok(status.is_success())
    }
}

#[async_trait]
impl RemoteUpload for IridaClient {
    async fn create_seq_run(&self, metadata: &RunMetadata) -> ApiResult<UploadId> {
        let url = self.config.url("sequencingrun/miseqrun");
        let response = self
            .send(self.http_client.post(&url).json(metadata))
            .await?;
        let created: Envelope<Identified> = check_status(response)?.json().await?;
        info!(upload_id = %created.resource.identifier, "Created sequencing run");
        Ok(UploadId(created.resource.identifier))
    }

    async fn set_seq_run_uploading(&self, upload_id: &UploadId) -> ApiResult<bool> {
        self.set_seq_run_status(upload_id, RunStatus::Uploading).await
    }

    async fn send_sequence_files(
        &self,
        project_id: &str,
        sample_name: &str,
        sequence_file: &SequenceFile,
        upload_id: &UploadId,
    ) -> ApiResult<bool> {
        let sample_id = self.sample_identifier(sample_name, project_id).await?;

        let mut parameters = json!({ "miseqRunId": upload_id.as_str() });
        for (key, value) in &sequence_file.properties {
            parameters[key] = json!(value);
        }
        let parameters = serde_json::to_string(&parameters)?;

        let (endpoint, form) = match sequence_file.file_list.as_slice() {
            [single] => (
                "sequenceFiles",
                Form::new()
                    .part("file", file_part(single).await?)
                    .text("parameters", parameters),
            ),
            [forward, reverse] => (
                "pairs",
                Form::new()
                    .part("file1", file_part(forward).await?)
                    .text("parameters1", parameters.clone())
                    .part("file2", file_part(reverse).await?)
                    .text("parameters2", parameters),
            ),
            other => {
                return Err(IridaResourceError::for_resource(
                    format!("expected 1 or 2 sequence files, found {}", other.len()),
                    sample_name,
                )
                .into())
            }
        };

        let url = self
            .config
            .url(&format!("projects/{project_id}/samples/{sample_id}/{endpoint}"));
        debug!(sample = %sample_name, url = %url, "Uploading sequence files");
        let response = self.send(self.http_client.post(&url).multipart(form)).await?;
        check_status(response)?;
        Ok(true)
    }

    async fn set_seq_run_complete(&self, upload_id: &UploadId) -> ApiResult<bool> {
        self.set_seq_run_status(upload_id, RunStatus::Complete).await
    }

    async fn set_seq_run_error(&self, upload_id: &UploadId) -> ApiResult<bool> {
        self.set_seq_run_status(upload_id, RunStatus::Error).await
    }
}

#[async_trait]
impl RemoteProject for IridaClient {
    async fn send_project(&self, project: &Project) -> ApiResult<bool> {
        let url = self.config.url("projects");
        let response = self
            .send(self.http_client.post(&url).json(&json!({
                "name": project.name,
                "projectDescription": project.description.clone().unwrap_or_default(),
            })))
            .await?;
        let created: Envelope<Identified> = check_status(response)?.json().await?;
        info!(project = %created.resource.identifier, "Created project");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn test_irida_config_new() {
        let config = IridaConfig::new("https://irida.example.com/api");
        assert_eq!(config.base_url, "https://irida.example.com/api");
        assert!(!config.client_id.is_empty());
    }

    #[test]
    fn test_irida_config_builders() {
        let config = IridaConfig::new("http://localhost/api")
            .with_client("uploader", "secret")
            .with_user("tech", "pw")
            .with_timeout(30);
        assert_eq!(config.client_secret, "secret");
        assert_eq!(config.username, "tech");
        assert_eq!(config.password, "pw");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_config_url_joining() {
        let config = IridaConfig::new("http://localhost/api/");
        assert_eq!(
            config.url("/projects/6/samples"),
            "http://localhost/api/projects/6/samples"
        );
        assert_eq!(config.url("oauth/token"), "http://localhost/api/oauth/token");
    }

    #[test]
    fn test_envelope_parsing() {
        let body = r#"{"resource":{"resources":[
            {"identifier":"12","sampleName":"01-1111","description":""},
            {"identifier":"13","sampleName":"02-2222"}
        ],"links":[]}}"#;
        let parsed: Envelope<Collection<RemoteSample>> = serde_json::from_str(body).unwrap();
        let names: Vec<&str> = parsed
            .resource
            .resources
            .iter()
            .map(|s| s.sample_name.as_str())
            .collect();
        assert_eq!(names, vec!["01-1111", "02-2222"]);
        assert_eq!(parsed.resource.resources[0].identifier, "12");
    }

    /// Serve canned `(status, body)` responses in order, recording each request.
    async fn canned_server(responses: Vec<(u16, &'static str)>) -> (String, Arc<StdMutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/api", listener.local_addr().unwrap());
        let requests = Arc::new(StdMutex::new(Vec::new()));
        let responses = Arc::new(StdMutex::new(VecDeque::from(responses)));

        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve_connection(socket, responses.clone(), seen.clone()));
            }
        });
        (base_url, requests)
    }

    async fn serve_connection(
        mut socket: TcpStream,
        responses: Arc<StdMutex<VecDeque<(u16, &'static str)>>>,
        seen: Arc<StdMutex<Vec<String>>>,
    ) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            let head_end = loop {
                if let Some(p) = find(&buf, b"\r\n\r\n", 0) {
                    break p + 4;
                }
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
            let content_length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok());
            let request_end = loop {
                let end = match content_length {
                    Some(len) => (buf.len() >= head_end + len).then_some(head_end + len),
                    None if head.contains("transfer-encoding: chunked") => {
                        find(&buf, b"\r\n0\r\n\r\n", head_end).map(|p| p + 7)
                    }
                    None => Some(head_end),
                };
                if let Some(end) = end {
                    break end;
                }
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            };
            seen.lock()
                .unwrap()
                .push(String::from_utf8_lossy(&buf[..request_end]).into_owned());
            buf.drain(..request_end);

            let (status, body) = responses.lock().unwrap().pop_front().unwrap_or((500, ""));
            let reply = format!(
                "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
                body.len()
            );
            if socket.write_all(reply.as_bytes()).await.is_err() {
                return;
            }
        }
    }

    fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
        haystack
            .get(from..)?
            .windows(needle.len())
            .position(|w| w == needle)
            .map(|p| p + from)
    }

    const TOKEN: (u16, &str) = (200, r#"{"access_token":"t0k3n","token_type":"bearer"}"#);

    #[tokio::test]
    async fn test_status_update_keeps_http_error() {
        let (base_url, requests) = canned_server(vec![TOKEN, (401, "")]).await;
        let client = IridaClient::new(IridaConfig::new(&base_url)).unwrap();

        let err = client
            .set_seq_run_uploading(&UploadId::from("55"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Http { status: 401, .. }));
        let requests = requests.lock().unwrap();
        assert!(requests[1].starts_with("PATCH /api/sequencingrun/55"));
        assert!(requests[1].contains("UPLOADING"));
    }

    #[tokio::test]
    async fn test_status_update_accepted() {
        let (base_url, _) = canned_server(vec![TOKEN, (200, "{}")]).await;
        let client = IridaClient::new(IridaConfig::new(&base_url)).unwrap();

        assert!(client.set_seq_run_complete(&UploadId::from("55")).await.unwrap());
    }

    #[tokio::test]
    async fn test_sequence_file_streamed_in_multipart_body() {
        let dir = tempfile::tempdir().unwrap();
        let fastq = dir.path().join("01-1111_S1_L001_R1_001.fastq");
        std::fs::write(&fastq, "@read1\nACGTACGT\n+\nIIIIIIII\n").unwrap();

        let samples = r#"{"resource":{"resources":[{"identifier":"12","sampleName":"01-1111"}]}}"#;
        let (base_url, requests) =
            canned_server(vec![TOKEN, (200, samples), (201, "{}")]).await;
        let client = IridaClient::new(IridaConfig::new(&base_url)).unwrap();

        let sent = client
            .send_sequence_files(
                "6",
                "01-1111",
                &SequenceFile::new(vec![fastq]),
                &UploadId::from("55"),
            )
            .await
            .unwrap();

        assert!(sent);
        let requests = requests.lock().unwrap();
        let upload = &requests[2];
        assert!(upload.starts_with("POST /api/projects/6/samples/12/sequenceFiles"));
        assert!(upload.contains("filename=\"01-1111_S1_L001_R1_001.fastq\""));
        assert!(upload.contains("@read1\nACGTACGT\n+\nIIIIIIII\n"));
        assert!(upload.contains(r#""miseqRunId":"55""#));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let config = IridaConfig::new("http://127.0.0.1:9/api").with_timeout(2);
        let client = IridaClient::new(config).unwrap();

        let err = client.project_exists("6").await.unwrap_err();
        assert!(matches!(err, ApiError::Connection(_)));
    }
}
