//! Typed task endpoints on top of the gateway.

use crate::error::{ClientError, ClientResult};
use crate::gateway::{ApiRequest, Gateway};
use crate::types::{NewTask, Task, TaskId, TaskPatch};
use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Remote task operations used by the application layer.
#[async_trait]
pub trait TaskService: Send + Sync {
    async fn list_tasks(&self) -> ClientResult<Vec<Task>>;

    async fn create_task(&self, task: &NewTask) -> ClientResult<Task>;

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> ClientResult<Task>;

    async fn delete_task(&self, id: &TaskId) -> ClientResult<()>;
}

/// [`TaskService`] backed by the REST API.
///
/// - list: `GET {tasks}`
/// - create: `POST {tasks}` with `{title, completed}`
/// - update: `PATCH {tasks}{id}/` with any subset of `{title, completed}`
/// - delete: `DELETE {tasks}{id}/`
#[derive(Clone)]
pub struct TaskApi {
    gateway: Gateway,
}

impl TaskApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    fn collection_path(&self) -> String {
        self.gateway.api().tasks_path.clone()
    }

    fn item_path(&self, id: &TaskId) -> String {
        let id = id.to_string();
        format!(
            "{}{}/",
            self.gateway.api().tasks_path,
            urlencoding::encode(&id)
        )
    }
}

#[async_trait]
impl TaskService for TaskApi {
    async fn list_tasks(&self) -> ClientResult<Vec<Task>> {
        let request = ApiRequest::get(self.collection_path());
        let response = expect_success(self.gateway.send(&request).await?).await?;
        let tasks: Vec<Task> = decode(response).await?;
        debug!(count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    async fn create_task(&self, task: &NewTask) -> ClientResult<Task> {
        let request = ApiRequest::post(self.collection_path()).json(task)?;
        let response = expect_success(self.gateway.send(&request).await?).await?;
        let created: Task = decode(response).await?;
        debug!(id = %created.id, "Created task");
        Ok(created)
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> ClientResult<Task> {
        let request = ApiRequest::patch(self.item_path(id)).json(patch)?;
        let response = expect_success(self.gateway.send(&request).await?).await?;
        let updated: Task = decode(response).await?;
        debug!(id = %updated.id, "Updated task");
        Ok(updated)
    }

    async fn delete_task(&self, id: &TaskId) -> ClientResult<()> {
        let request = ApiRequest::delete(self.item_path(id));
        expect_success(self.gateway.send(&request).await?).await?;
        debug!(id = %id, "Deleted task");
        Ok(())
    }
}

/// Turn a non-2xx response into [`ClientError::HttpError`].
async fn expect_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::http(status, body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::store::{MemoryStorage, StorageCredentials};
    use std::sync::Arc;

    fn api(tasks_path: &str) -> TaskApi {
        let mut config = ApiConfig::with_base_url("http://localhost/api/");
        config.tasks_path = tasks_path.to_string();
        let credentials = Arc::new(StorageCredentials::new(Arc::new(MemoryStorage::new())));
        TaskApi::new(Gateway::with_client(reqwest::Client::new(), config, credentials))
    }

    #[test]
    fn item_paths_use_trailing_slash() {
        assert_eq!(api("").item_path(&TaskId::Number(5)), "5/");
        assert_eq!(api("tasks/").item_path(&TaskId::Number(5)), "tasks/5/");
    }

    #[test]
    fn item_paths_encode_text_ids() {
        assert_eq!(
            api("").item_path(&TaskId::Text("a b/c".into())),
            "a%20b%2Fc/"
        );
    }
}
