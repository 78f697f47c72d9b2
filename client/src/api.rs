//! Transport to the task REST API

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use board_core::task::{ListParams, NewTaskRequest, Task, TaskPatchRequest};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Remote operations the sync layer relies on
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list(&self, params: &ListParams) -> Result<Vec<Task>>;

    async fn create(&self, request: &NewTaskRequest) -> Result<Task>;

    async fn update(&self, id: Uuid, patch: &TaskPatchRequest) -> Result<Task>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// [`TaskApi`] over HTTP/JSON
pub struct HttpTaskApi {
    client: Client,
    base_url: String,
}

impl HttpTaskApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn tasks_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }

    fn task_url(&self, id: Uuid) -> String {
        format!("{}/tasks/{}", self.base_url, id)
    }
}

/// Turn a non-2xx response into `ClientError::Api`, keeping the server's message.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.error,
        Err(_) if !text.trim().is_empty() => text,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = check(response).await?;
    Ok(response.json().await?)
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list(&self, params: &ListParams) -> Result<Vec<Task>> {
        debug!("GET {}", self.tasks_url());
        let response = self.client.get(self.tasks_url()).query(params).send().await?;
        decode(response).await
    }

    async fn create(&self, request: &NewTaskRequest) -> Result<Task> {
        let response = self
            .client
            .post(self.tasks_url())
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    async fn update(&self, id: Uuid, patch: &TaskPatchRequest) -> Result<Task> {
        let response = self
            .client
            .patch(self.task_url(id))
            .json(patch)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let response = self.client.delete(self.task_url(id)).send().await?;
        check(response).await?;
        Ok(())
    }
}
