use std::sync::Arc;

use secrecy::ExposeSecret;
use serde_json::{Value, json};

use crate::api::{Method, encode_segment, json_body};
use crate::config::{ClientConfig, default_hosts};
use crate::dispatcher::RequestDispatcher;
use crate::index::Index;
use crate::keys::{Keys, UserKey};
use crate::{Error, Result};

/// Entry point for application-wide operations.
///
/// Cloning is cheap; clones share one [`RequestDispatcher`], including its
/// rate limit forwarding state.
///
/// # Example
///
/// ```rust,no_run
/// use algoliasearch::{Client, Query};
///
/// # async fn example() -> algoliasearch::Result<()> {
/// let client = Client::new("YourApplicationID", "YourAPIKey")?;
/// let index = client.init_index("contacts");
/// let hits = index.search(&Query::with_text("jimmie")).await?;
/// println!("{hits}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    dispatcher: Arc<RequestDispatcher>,
}

impl Client {
    /// Creates a client for the default hosts of `application_id`.
    pub fn new(application_id: &str, api_key: &str) -> Result<Self> {
        Self::with_hosts(application_id, api_key, default_hosts(application_id))
    }

    pub fn with_hosts(application_id: &str, api_key: &str, hosts: Vec<String>) -> Result<Self> {
        let dispatcher = RequestDispatcher::new(application_id, api_key, hosts)?;
        Ok(Self::with_dispatcher(Arc::new(dispatcher)))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .unwrap_or_default();
        let hosts = if config.hosts.is_empty() {
            default_hosts(&config.application_id)
        } else {
            config.hosts.clone()
        };

        let dispatcher = RequestDispatcher::new(&config.application_id, api_key, hosts)?
            .with_timeout(config.timeout())
            .with_scheme(config.scheme.clone());
        Ok(Self::with_dispatcher(Arc::new(dispatcher)))
    }

    pub fn with_dispatcher(dispatcher: Arc<RequestDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    /// Returns a handle on `name`. No request is made.
    pub fn init_index(&self, name: &str) -> Index {
        Index::new(Arc::clone(&self.dispatcher), name)
    }

    /// Lists every index with its creation date.
    pub async fn list_indexes(&self) -> Result<Value> {
        self.dispatcher
            .execute(Method::Get, "/1/indexes/", None)
            .await
    }

    pub async fn delete_index(&self, name: &str) -> Result<Value> {
        let path = index_path(name)?;
        self.dispatcher.execute(Method::Delete, &path, None).await
    }

    /// Renames `source` to `destination`, overwriting `destination` if it exists.
    pub async fn move_index(&self, source: &str, destination: &str) -> Result<Value> {
        self.index_operation("move", source, destination).await
    }

    /// Copies `source` to `destination`, overwriting `destination` if it exists.
    pub async fn copy_index(&self, source: &str, destination: &str) -> Result<Value> {
        self.index_operation("copy", source, destination).await
    }

    /// The ten most recent log entries.
    pub async fn get_logs(&self) -> Result<Value> {
        self.dispatcher.execute(Method::Get, "/1/logs", None).await
    }

    /// `length` entries starting `offset` entries back from the most recent one.
    pub async fn get_logs_range(&self, offset: u32, length: u32) -> Result<Value> {
        let path = format!("/1/logs?offset={offset}&length={length}");
        self.dispatcher.execute(Method::Get, &path, None).await
    }

    pub async fn list_user_keys(&self) -> Result<Value> {
        self.keys().list().await
    }

    pub async fn get_user_key_acl(&self, key: &str) -> Result<Value> {
        self.keys().get(key).await
    }

    pub async fn delete_user_key(&self, key: &str) -> Result<Value> {
        self.keys().delete(key).await
    }

    pub async fn add_user_key(&self, key: &UserKey) -> Result<Value> {
        self.keys().add(key).await
    }

    /// See [`RequestDispatcher::enable_rate_limit_forward`].
    pub fn enable_rate_limit_forward(
        &self,
        admin_api_key: &str,
        end_user_ip: &str,
        rate_limit_api_key: &str,
    ) -> Result<()> {
        self.dispatcher
            .enable_rate_limit_forward(admin_api_key, end_user_ip, rate_limit_api_key)
    }

    pub fn disable_rate_limit_forward(&self) {
        self.dispatcher.disable_rate_limit_forward();
    }

    async fn index_operation(
        &self,
        operation: &str,
        source: &str,
        destination: &str,
    ) -> Result<Value> {
        if destination.is_empty() {
            return Err(Error::MissingIndexName);
        }
        let path = format!("{}/operation", index_path(source)?);
        let body = json_body(&json!({
            "operation": operation,
            "destination": destination,
        }))?;
        self.dispatcher
            .execute(Method::Post, &path, Some(body))
            .await
    }

    fn keys(&self) -> Keys<'_> {
        Keys::new(&self.dispatcher, "/1")
    }
}

/// An empty name would address the index collection itself.
fn index_path(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(Error::MissingIndexName);
    }
    Ok(format!("/1/indexes/{}", encode_segment(name)))
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::Acl;
    use crate::dispatcher::tests::{FakeTransport, dispatcher};

    fn client(transport: &Arc<FakeTransport>) -> Client {
        Client::with_dispatcher(Arc::new(dispatcher(transport)))
    }

    fn served_config(mock_server: &MockServer) -> ClientConfig {
        let mut config = ClientConfig::new("app", SecretString::from("key"));
        config.hosts = vec![mock_server.address().to_string()];
        config.scheme = "http".to_string();
        config
    }

    #[test]
    fn new_uses_default_hosts() {
        let client = Client::new("XYZ", "key").unwrap();
        let mut hosts = client.dispatcher().hosts().to_vec();
        hosts.sort();
        assert_eq!(hosts, default_hosts("XYZ"));
    }

    #[test]
    fn from_config_requires_api_key() {
        let mut config = ClientConfig::new("app", SecretString::from("key"));
        config.api_key = None;

        let err = Client::from_config(&config).err().unwrap();
        assert!(matches!(err, Error::MissingApiKey));
    }

    #[test]
    fn from_config_applies_timeout() {
        let mut config = ClientConfig::new("app", SecretString::from("key"));
        config.timeout_seconds = 3;

        let client = Client::from_config(&config).unwrap();
        assert_eq!(client.dispatcher().timeout().as_secs(), 3);
        assert_eq!(client.dispatcher().hosts().len(), 3);
    }

    #[tokio::test]
    async fn move_and_copy_post_operations() {
        let mock_server = MockServer::start().await;

        for operation in ["move", "copy"] {
            Mock::given(method("POST"))
                .and(path("/1/indexes/src%20idx/operation"))
                .and(body_json(json!({ "operation": operation, "destination": "dst" })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "taskID": 1 })))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let client = Client::from_config(&served_config(&mock_server)).unwrap();
        client.move_index("src idx", "dst").await.unwrap();
        client.copy_index("src idx", "dst").await.unwrap();
    }

    #[tokio::test]
    async fn invalid_credentials_are_terminal() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/1/indexes/"))
            .and(header("X-Algolia-Application-Id", "app"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "message": "Invalid Application-ID or API key"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = Client::from_config(&served_config(&mock_server)).unwrap();
        let err = client.list_indexes().await.unwrap_err();

        assert!(matches!(err, Error::InvalidCredentials));
    }

    #[tokio::test]
    async fn logs_range_sends_offset_and_length() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/1/logs"))
            .and(query_param("offset", "10"))
            .and(query_param("length", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "logs": [] })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = Client::from_config(&served_config(&mock_server)).unwrap();
        let logs = client.get_logs_range(10, 50).await.unwrap();

        assert_eq!(logs, json!({ "logs": [] }));
    }

    #[tokio::test]
    async fn forwarded_requests_reach_the_server() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/1/keys"))
            .and(header("X-Algolia-API-Key", "admin"))
            .and(header("X-Forwarded-For", "198.51.100.4"))
            .and(header("X-Forwarded-API-Key", "limited"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "keys": [] })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = Client::from_config(&served_config(&mock_server)).unwrap();
        client
            .enable_rate_limit_forward("admin", "198.51.100.4", "limited")
            .unwrap();

        client.list_user_keys().await.unwrap();
    }

    #[tokio::test]
    async fn key_management_routes() {
        let transport = Arc::new(FakeTransport::default());
        let client = client(&transport);

        client.list_user_keys().await.unwrap();
        client.get_user_key_acl("abc").await.unwrap();
        client
            .add_user_key(&UserKey::new([Acl::Search, Acl::AddObject]))
            .await
            .unwrap();
        client.delete_user_key("abc").await.unwrap();
        client.delete_index("contacts").await.unwrap();
        client.get_logs().await.unwrap();

        let requests = transport.requests();
        let routes: Vec<(Method, &str)> = requests
            .iter()
            .map(|r| {
                let path = r.url.splitn(4, '/').nth(3).unwrap_or_default();
                (r.method, path)
            })
            .collect();
        assert_eq!(
            routes,
            vec![
                (Method::Get, "1/keys"),
                (Method::Get, "1/keys/abc"),
                (Method::Post, "1/keys"),
                (Method::Delete, "1/keys/abc"),
                (Method::Delete, "1/indexes/contacts"),
                (Method::Get, "1/logs"),
            ]
        );
        let body: Value = serde_json::from_slice(requests[2].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({ "acl": ["search", "addObject"] }));
    }

    #[tokio::test]
    async fn clones_share_forwarding_state() {
        let transport = Arc::new(FakeTransport::default());
        let client = client(&transport);
        let other = client.clone();

        client
            .enable_rate_limit_forward("admin", "10.0.0.1", "limited")
            .unwrap();
        assert!(other.dispatcher().is_rate_limit_forwarding());

        other.disable_rate_limit_forward();
        assert!(!client.dispatcher().is_rate_limit_forwarding());
    }

    #[tokio::test]
    async fn empty_names_are_rejected_before_sending() {
        let transport = Arc::new(FakeTransport::default());
        let client = client(&transport);

        let err = client.delete_index("").await.unwrap_err();
        assert!(matches!(err, Error::MissingIndexName));
        let err = client.move_index("", "dst").await.unwrap_err();
        assert!(matches!(err, Error::MissingIndexName));
        let err = client.copy_index("src", "").await.unwrap_err();
        assert!(matches!(err, Error::MissingIndexName));
        let err = client.get_user_key_acl("").await.unwrap_err();
        assert!(matches!(err, Error::MissingUserKey));
        let err = client.delete_user_key("").await.unwrap_err();
        assert!(matches!(err, Error::MissingUserKey));

        assert!(transport.requests().is_empty());
    }
}
