//! Operations scoped to one index.
//!
//! An [`Index`] is a cheap handle: creating one performs no request. Every
//! method is a single call through the shared [`RequestDispatcher`] and
//! returns the server's JSON answer untouched.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};
use tokio::time::sleep;
use tracing::{debug, trace};

use crate::api::{Method, encode_segment, json_body};
use crate::dispatcher::RequestDispatcher;
use crate::keys::{Keys, UserKey};
use crate::query::Query;
use crate::{Error, Result};

const TASK_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchAction {
    AddObject,
    UpdateObject,
    PartialUpdateObject,
    DeleteObject,
}

/// One entry of a `/batch` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOperation {
    pub action: BatchAction,
    pub body: Value,
}

impl BatchOperation {
    pub fn new(action: BatchAction, body: Value) -> Self {
        Self { action, body }
    }
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    requests: &'a [BatchOperation],
}

#[derive(Clone)]
pub struct Index {
    dispatcher: Arc<RequestDispatcher>,
    name: String,
    path: String,
}

impl Index {
    pub(crate) fn new(dispatcher: Arc<RequestDispatcher>, name: &str) -> Self {
        Self {
            dispatcher,
            name: name.to_string(),
            path: format!("/1/indexes/{}", encode_segment(name)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Searches the index. An empty query returns the first page of objects.
    pub async fn search(&self, query: &Query) -> Result<Value> {
        let params = query.to_query_string();
        let path = if params.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, params)
        };
        self.get(&path).await
    }

    /// Adds an object; the server assigns its `objectID`.
    pub async fn add_object(&self, object: &Value) -> Result<Value> {
        self.send(Method::Post, &self.path, Some(json_body(object)?))
            .await
    }

    /// Adds an object under `object_id`, replacing any existing one.
    pub async fn add_object_with_id(&self, object: &Value, object_id: &str) -> Result<Value> {
        let path = self.object_path(require_id(object_id)?);
        self.send(Method::Put, &path, Some(json_body(object)?))
            .await
    }

    /// Replaces the object named by its `objectID` attribute.
    pub async fn save_object(&self, object: &Value) -> Result<Value> {
        let path = self.object_path(object_id(object)?);
        self.send(Method::Put, &path, Some(json_body(object)?))
            .await
    }

    /// Updates only the attributes present in `object`.
    pub async fn partial_update_object(&self, object: &Value) -> Result<Value> {
        let path = format!("{}/partial", self.object_path(object_id(object)?));
        self.send(Method::Post, &path, Some(json_body(object)?))
            .await
    }

    pub async fn get_object(&self, object_id: &str) -> Result<Value> {
        let path = self.object_path(require_id(object_id)?);
        self.get(&path).await
    }

    /// Fetches an object restricted to `attributes`.
    pub async fn get_object_attributes(
        &self,
        object_id: &str,
        attributes: &[&str],
    ) -> Result<Value> {
        let mut path = self.object_path(require_id(object_id)?);
        if !attributes.is_empty() {
            path.push_str("?attributes=");
            path.push_str(&encode_segment(&attributes.join(",")));
        }
        self.get(&path).await
    }

    pub async fn delete_object(&self, object_id: &str) -> Result<Value> {
        let path = self.object_path(require_id(object_id)?);
        self.send(Method::Delete, &path, None).await
    }

    pub async fn add_objects(&self, objects: &[Value]) -> Result<Value> {
        let operations: Vec<BatchOperation> = objects
            .iter()
            .map(|object| BatchOperation::new(BatchAction::AddObject, object.clone()))
            .collect();
        self.batch(&operations).await
    }

    /// Replaces several objects; each must carry an `objectID`.
    pub async fn save_objects(&self, objects: &[Value]) -> Result<Value> {
        let operations = with_ids(objects, BatchAction::UpdateObject)?;
        self.batch(&operations).await
    }

    pub async fn partial_update_objects(&self, objects: &[Value]) -> Result<Value> {
        let operations = with_ids(objects, BatchAction::PartialUpdateObject)?;
        self.batch(&operations).await
    }

    pub async fn delete_objects(&self, object_ids: &[&str]) -> Result<Value> {
        let operations = object_ids
            .iter()
            .map(|id| {
                require_id(id)?;
                Ok(BatchOperation::new(
                    BatchAction::DeleteObject,
                    json!({ "objectID": id }),
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        self.batch(&operations).await
    }

    /// Sends several write operations in one request.
    pub async fn batch(&self, operations: &[BatchOperation]) -> Result<Value> {
        debug!(
            "Sending batch of {} operations to {}",
            operations.len(),
            self.name
        );
        let body = json_body(&BatchRequest {
            requests: operations,
        })?;
        let path = format!("{}/batch", self.path);
        self.send(Method::Post, &path, Some(body)).await
    }

    /// Polls the task until the server reports it as published.
    ///
    /// Write operations are asynchronous on the server side; their answer
    /// carries a `taskID` to pass here. An answer without a string `status`,
    /// such as the error body for an unknown task, ends the wait with
    /// [`Error::UnexpectedResponse`].
    pub async fn wait_task(&self, task_id: u64) -> Result<Value> {
        let path = format!("{}/task/{}", self.path, task_id);
        loop {
            let task = self.get(&path).await?;
            match task.get("status").and_then(Value::as_str) {
                Some("published") => return Ok(task),
                Some(status) => {
                    trace!("Task {} on {} is {}", task_id, self.name, status);
                }
                None => return Err(Error::UnexpectedResponse(task)),
            }
            sleep(TASK_POLL_INTERVAL).await;
        }
    }

    /// Deletes every object but keeps settings.
    pub async fn clear_index(&self) -> Result<Value> {
        let path = format!("{}/clear", self.path);
        self.send(Method::Post, &path, None).await
    }

    pub async fn get_settings(&self) -> Result<Value> {
        let path = format!("{}/settings", self.path);
        self.get(&path).await
    }

    pub async fn set_settings(&self, settings: &Value) -> Result<Value> {
        let path = format!("{}/settings", self.path);
        self.send(Method::Put, &path, Some(json_body(settings)?))
            .await
    }

    /// Pages through every object of the index, ignoring ranking.
    pub async fn browse(&self, page: u32, hits_per_page: u32) -> Result<Value> {
        let path = format!(
            "{}/browse?page={}&hitsPerPage={}",
            self.path, page, hits_per_page
        );
        self.get(&path).await
    }

    pub async fn list_user_keys(&self) -> Result<Value> {
        self.keys()?.list().await
    }

    pub async fn get_user_key_acl(&self, key: &str) -> Result<Value> {
        self.keys()?.get(key).await
    }

    pub async fn delete_user_key(&self, key: &str) -> Result<Value> {
        self.keys()?.delete(key).await
    }

    /// Creates a key restricted to this index.
    pub async fn add_user_key(&self, key: &UserKey) -> Result<Value> {
        self.keys()?.add(key).await
    }

    fn keys(&self) -> Result<Keys<'_>> {
        self.require_name()?;
        Ok(Keys::new(&self.dispatcher, &self.path))
    }

    /// An unnamed handle would address the index collection itself.
    fn require_name(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::MissingIndexName);
        }
        Ok(())
    }

    fn object_path(&self, object_id: &str) -> String {
        format!("{}/{}", self.path, encode_segment(object_id))
    }

    async fn get(&self, path: &str) -> Result<Value> {
        self.send(Method::Get, path, None).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<String>) -> Result<Value> {
        self.require_name()?;
        self.dispatcher.execute(method, path, body).await
    }
}

fn require_id(object_id: &str) -> Result<&str> {
    if object_id.is_empty() {
        Err(Error::MissingObjectId)
    } else {
        Ok(object_id)
    }
}

fn object_id(object: &Value) -> Result<&str> {
    object
        .get("objectID")
        .and_then(Value::as_str)
        .ok_or(Error::MissingObjectId)
        .and_then(require_id)
}

fn with_ids(objects: &[Value], action: BatchAction) -> Result<Vec<BatchOperation>> {
    objects
        .iter()
        .map(|object| {
            object_id(object)?;
            Ok(BatchOperation::new(action, object.clone()))
        })
        .collect()
}
