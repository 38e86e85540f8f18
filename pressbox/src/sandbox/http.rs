//! HTTP sandbox provider
//!
//! REST client for a sandbox API:
//!
//! - `POST /sandboxes` creates a sandbox
//! - `GET /sandboxes/{id}` looks one up
//! - `POST /sandboxes/{id}/cmd` runs a command
//! - `POST /sandboxes/{id}/fs/write` writes files (base64 contents)
//! - `POST /sandboxes/{id}/stop` stops it
//!
//! Requests carry a bearer token. A 404 maps to [`SandboxError::NotFound`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::errors::SandboxError;
use crate::sandbox::executor::{
    CommandOutput, CommandSpec, Environment, EnvironmentSpec, FileWrite, RemoteExecutor,
    SandboxProvider,
};

/// Connection to the sandbox API, shared by the provider and its sandboxes
struct ApiClient {
    client: Client,
    base_url: String,
    token: SecretString,
}

impl ApiClient {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SandboxError> {
        let response = request.bearer_auth(self.token.expose_secret()).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            let url = response.url().to_string();
            return Err(SandboxError::NotFound(url));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Sandbox API request failed: {} - {}", status, body);
            return Err(SandboxError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SandboxError::InvalidResponse(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SandboxError> {
        let url = self.url(path);
        debug!("GET {}", url);
        self.send(self.client.get(&url)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, SandboxError> {
        let url = self.url(path);
        debug!("POST {}", url);
        self.send(self.client.post(&url).json(body)).await
    }
}

#[derive(Debug, Deserialize)]
struct SandboxEnvelope {
    sandbox: Environment,
}

#[derive(Debug, Deserialize)]
struct CommandResponse {
    /// Absent for detached commands that were only launched
    exit_code: Option<i32>,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
}

#[derive(Debug, Serialize)]
struct WriteFilesRequest {
    files: Vec<EncodedFile>,
}

#[derive(Debug, Serialize)]
struct EncodedFile {
    path: String,
    content: String,
}

/// Sandbox provider backed by the sandbox REST API
pub struct HttpSandboxProvider {
    api: Arc<ApiClient>,
}

impl HttpSandboxProvider {
    /// Create a provider for the API at `base_url`
    pub fn new(base_url: &str, token: SecretString) -> Result<Self, SandboxError> {
        // No request timeout: package installs can run for minutes and the
        // sandbox lifetime is the only bound on a step.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            api: Arc::new(ApiClient {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                token,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.api.base_url
    }
}

#[async_trait]
impl SandboxProvider for HttpSandboxProvider {
    async fn create(&self, spec: &EnvironmentSpec) -> Result<Arc<dyn RemoteExecutor>, SandboxError> {
        let envelope: SandboxEnvelope = self.api.post("/sandboxes", spec).await?;
        info!(
            "Sandbox {} created ({} vCPUs, ports {:?})",
            envelope.sandbox.id, spec.vcpus, spec.ports
        );

        Ok(Arc::new(HttpSandbox {
            api: self.api.clone(),
            environment: envelope.sandbox,
        }))
    }

    async fn get(&self, id: &str) -> Result<Environment, SandboxError> {
        let envelope: SandboxEnvelope = self
            .api
            .get(&format!("/sandboxes/{}", id))
            .await
            .map_err(|e| match e {
                SandboxError::NotFound(_) => SandboxError::NotFound(id.to_string()),
                other => other,
            })?;
        Ok(envelope.sandbox)
    }

    async fn stop(&self, id: &str) -> Result<(), SandboxError> {
        let _: serde_json::Value = self
            .api
            .post(&format!("/sandboxes/{}/stop", id), &serde_json::json!({}))
            .await
            .map_err(|e| match e {
                SandboxError::NotFound(_) => SandboxError::NotFound(id.to_string()),
                other => other,
            })?;
        Ok(())
    }
}

/// One sandbox reached through the REST API
pub struct HttpSandbox {
    api: Arc<ApiClient>,
    environment: Environment,
}

#[async_trait]
impl RemoteExecutor for HttpSandbox {
    fn environment(&self) -> &Environment {
        &self.environment
    }

    async fn run_command(&self, command: &CommandSpec) -> Result<CommandOutput, SandboxError> {
        debug!("[{}] $ {}", self.environment.id, command.display());

        let path = format!("/sandboxes/{}/cmd", self.environment.id);
        let response: CommandResponse = self.api.post(&path, command).await?;

        let exit_code = match (response.exit_code, command.detached) {
            (Some(code), _) => code,
            (None, true) => 0,
            (None, false) => {
                return Err(SandboxError::InvalidResponse(format!(
                    "no exit code for `{}`",
                    command.display()
                )))
            }
        };

        Ok(CommandOutput {
            exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
        })
    }

    async fn write_files(&self, files: &[FileWrite]) -> Result<(), SandboxError> {
        let request = WriteFilesRequest {
            files: files
                .iter()
                .map(|file| EncodedFile {
                    path: file.path.clone(),
                    content: STANDARD.encode(&file.content),
                })
                .collect(),
        };

        let path = format!("/sandboxes/{}/fs/write", self.environment.id);
        let _: serde_json::Value = self.api.post(&path, &request).await?;
        Ok(())
    }
}
