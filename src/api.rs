//! Remote storage API client
//!
//! The router-side backend exposes a single endpoint speaking a form-POST
//! command protocol: `cmd=filenames|filecontent|filesave|fileremove|login|
//! getversion|<service action>`, answering with a JSON envelope carrying a
//! numeric `status` (0 = ok, HTTP-like codes otherwise). This client maps
//! that protocol onto [`FileStorage`] plus session, service-control, and
//! version commands.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{RetryConfig, StorageConfig};
use crate::error::{Error, Result, StorageError};
use crate::retry::with_retry;
use crate::storage::FileStorage;
use crate::types::ServiceAction;
use crate::version::Version;

/// JSON envelope returned by every command
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    status: i32,
    #[serde(default)]
    files: Option<Vec<String>>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    service: Option<bool>,
    #[serde(default)]
    version: Option<String>,
}

/// Client for the storage command endpoint
///
/// Read-only commands are retried on transient transport failures per the
/// retry configuration; mutating commands (save, remove, login, service
/// actions) are sent exactly once.
pub struct ApiClient {
    client: reqwest::Client,
    endpoint: String,
    retry: RetryConfig,
}

impl ApiClient {
    /// Build a client from storage and retry settings.
    pub fn new(config: &StorageConfig, retry: RetryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            retry,
        })
    }

    /// Authenticate against the backend, establishing a session cookie.
    ///
    /// Also reports the service running state when the backend includes it
    /// in the login response.
    pub async fn login(&self, user: &str, password: &str) -> Result<Option<bool>> {
        let response = self
            .post("login", &[("user", user), ("password", password)])
            .await?;
        Ok(response.service)
    }

    /// Execute a service control action, returning the resulting running
    /// state.
    ///
    /// Backends that report the state include it in the response envelope;
    /// otherwise it is inferred from the action (only `stop` leaves the
    /// service down).
    pub async fn service_action(&self, action: ServiceAction) -> Result<bool> {
        let response = self.post(action.as_command(), &[]).await?;
        Ok(response
            .service
            .unwrap_or(action != ServiceAction::Stop))
    }

    /// Fetch the installed service version.
    pub async fn fetch_version(&self) -> Result<Version> {
        let response = self.post_with_retry("getversion", &[]).await?;
        let raw = response.version.ok_or_else(|| {
            StorageError::InvalidResponse("getversion response carried no version".into())
        })?;
        raw.parse()
    }

    async fn post_with_retry(&self, cmd: &str, params: &[(&str, &str)]) -> Result<ApiResponse> {
        with_retry(&self.retry, || self.post(cmd, params)).await
    }

    async fn post(&self, cmd: &str, params: &[(&str, &str)]) -> Result<ApiResponse> {
        let mut form: Vec<(&str, &str)> = vec![("cmd", cmd)];
        form.extend_from_slice(params);

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(StorageError::Unauthorized.into());
        }
        if !response.status().is_success() {
            return Err(StorageError::Transport(format!(
                "command {cmd} answered HTTP {}",
                response.status()
            ))
            .into());
        }

        let envelope: ApiResponse = response.json().await.map_err(|e| {
            StorageError::InvalidResponse(format!("command {cmd}: {e}"))
        })?;

        match envelope.status {
            0 => Ok(envelope),
            401 => Err(StorageError::Unauthorized.into()),
            403 => Err(StorageError::PermissionDenied(cmd.to_string()).into()),
            404 => Err(StorageError::NotFound(cmd.to_string()).into()),
            status => Err(StorageError::InvalidResponse(format!(
                "command {cmd} failed with status {status}"
            ))
            .into()),
        }
    }

    /// Like [`Self::post`], but maps envelope-level NotFound to the filename
    /// instead of the command name.
    async fn post_for_file(
        &self,
        cmd: &str,
        filename: &str,
        params: &[(&str, &str)],
    ) -> Result<ApiResponse> {
        self.post(cmd, params).await.map_err(|e| match e {
            Error::Storage(StorageError::NotFound(_)) => {
                Error::Storage(StorageError::NotFound(filename.to_string()))
            }
            Error::Storage(StorageError::PermissionDenied(_)) => {
                Error::Storage(StorageError::PermissionDenied(filename.to_string()))
            }
            other => other,
        })
    }
}

#[async_trait]
impl FileStorage for ApiClient {
    async fn list_files(&self) -> Result<Vec<String>> {
        let response = self.post_with_retry("filenames", &[]).await?;
        response.files.ok_or_else(|| {
            StorageError::InvalidResponse("filenames response carried no file list".into()).into()
        })
    }

    async fn read_file(&self, filename: &str) -> Result<String> {
        let params = [("filename", filename)];
        let response = with_retry(&self.retry, || {
            self.post_for_file("filecontent", filename, &params)
        })
        .await?;
        // An absent content field means an empty file
        Ok(response.content.unwrap_or_default())
    }

    async fn write_file(&self, filename: &str, content: &str) -> Result<()> {
        self.post_for_file(
            "filesave",
            filename,
            &[("filename", filename), ("content", content)],
        )
        .await?;
        Ok(())
    }

    async fn delete_file(&self, filename: &str) -> Result<()> {
        self.post_for_file("fileremove", filename, &[("filename", filename)])
            .await?;
        Ok(())
    }
}
