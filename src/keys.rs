use serde::Serialize;
use serde_json::Value;

use crate::api::{Method, encode_segment, json_body};
use crate::dispatcher::RequestDispatcher;
use crate::{Error, Result};

/// Rights granted to an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Acl {
    /// Search, over HTTP or HTTPS.
    Search,
    AddObject,
    DeleteObject,
    DeleteIndex,
    Settings,
    EditSettings,
}

/// Definition of a key to create.
///
/// Zero values mean "no limit" and are left out of the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserKey {
    pub acl: Vec<Acl>,
    /// Seconds until the key expires.
    #[serde(skip_serializing_if = "is_zero")]
    pub validity: u32,
    #[serde(rename = "maxQueriesPerIPPerHour", skip_serializing_if = "is_zero")]
    pub max_queries_per_ip_per_hour: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub max_hits_per_query: u32,
}

impl UserKey {
    pub fn new(acl: impl Into<Vec<Acl>>) -> Self {
        Self {
            acl: acl.into(),
            ..Self::default()
        }
    }
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Key CRUD under a base path, either `/1` or `/1/indexes/{name}`.
pub(crate) struct Keys<'a> {
    dispatcher: &'a RequestDispatcher,
    path: String,
}

impl<'a> Keys<'a> {
    pub(crate) fn new(dispatcher: &'a RequestDispatcher, base: &str) -> Self {
        Self {
            dispatcher,
            path: format!("{base}/keys"),
        }
    }

    pub(crate) async fn list(&self) -> Result<Value> {
        self.dispatcher.execute(Method::Get, &self.path, None).await
    }

    pub(crate) async fn get(&self, key: &str) -> Result<Value> {
        let path = self.key_path(key)?;
        self.dispatcher.execute(Method::Get, &path, None).await
    }

    pub(crate) async fn delete(&self, key: &str) -> Result<Value> {
        let path = self.key_path(key)?;
        self.dispatcher.execute(Method::Delete, &path, None).await
    }

    pub(crate) async fn add(&self, key: &UserKey) -> Result<Value> {
        let body = json_body(key)?;
        self.dispatcher
            .execute(Method::Post, &self.path, Some(body))
            .await
    }

    /// An empty key would address the key collection itself.
    fn key_path(&self, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(Error::MissingUserKey);
        }
        Ok(format!("{}/{}", self.path, encode_segment(key)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::dispatcher::tests::{FakeTransport, dispatcher};

    #[test]
    fn user_key_omits_unlimited_fields() {
        let key = UserKey::new([Acl::Search, Acl::EditSettings]);
        assert_eq!(
            serde_json::to_value(&key).unwrap(),
            json!({ "acl": ["search", "editSettings"] })
        );
    }

    #[test]
    fn user_key_serializes_limits() {
        let key = UserKey {
            acl: vec![Acl::AddObject],
            validity: 3600,
            max_queries_per_ip_per_hour: 100,
            max_hits_per_query: 20,
        };
        assert_eq!(
            serde_json::to_value(&key).unwrap(),
            json!({
                "acl": ["addObject"],
                "validity": 3600,
                "maxQueriesPerIPPerHour": 100,
                "maxHitsPerQuery": 20
            })
        );
    }

    #[tokio::test]
    async fn empty_key_is_rejected_before_sending() {
        let transport = Arc::new(FakeTransport::default());
        let dispatcher = dispatcher(&transport);
        let keys = Keys::new(&dispatcher, "/1/indexes/contacts");

        let err = keys.get("").await.unwrap_err();
        assert!(matches!(err, Error::MissingUserKey));
        let err = keys.delete("").await.unwrap_err();
        assert!(matches!(err, Error::MissingUserKey));

        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn key_is_percent_encoded() {
        let transport = Arc::new(FakeTransport::default());
        let dispatcher = dispatcher(&transport);

        Keys::new(&dispatcher, "/1").get("a/b").await.unwrap();

        assert!(transport.requests()[0].url.ends_with("/1/keys/a%2Fb"));
    }
}
