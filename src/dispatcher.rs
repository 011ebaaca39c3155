//! Multi-host request dispatch.
//!
//! A [`RequestDispatcher`] owns the credentials and the host pool of one
//! application. Each call to [`RequestDispatcher::execute`] is a single
//! logical request that is tried against the hosts one after another, in an
//! order shuffled once at construction, until one of them answers with JSON
//! or a terminal status.
//!
//! | outcome of an attempt            | effect                          |
//! |----------------------------------|---------------------------------|
//! | transport failure or timeout     | try the next host               |
//! | HTTP 403                         | [`Error::InvalidCredentials`]   |
//! | HTTP 404                         | [`Error::NotFound`]             |
//! | HTTP 503                         | try the next host               |
//! | body is not JSON                 | try the next host               |
//! | body is JSON                     | returned to the caller          |
//!
//! When every host has been tried the call fails with
//! [`Error::HostsUnreachable`].

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue};
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{HttpRequest, HttpResponse, Method, Transport};
use crate::error::{Error, Result};
use crate::reqwestx::ReqwestTransport;

/// Deadline applied to every attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SCHEME: &str = "https";

pub const APPLICATION_ID_HEADER: &str = "x-algolia-application-id";
pub const API_KEY_HEADER: &str = "x-algolia-api-key";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
pub const FORWARDED_API_KEY_HEADER: &str = "x-forwarded-api-key";

#[derive(Clone)]
struct ForwardedCredentials {
    admin_api_key: HeaderValue,
    end_user_ip: HeaderValue,
    rate_limit_api_key: HeaderValue,
}

pub struct RequestDispatcher {
    application_id: String,
    application_id_header: HeaderValue,
    api_key: HeaderValue,
    hosts: Vec<String>,
    scheme: String,
    timeout: Duration,
    forward: RwLock<Option<ForwardedCredentials>>,
    transport: Arc<dyn Transport>,
}

impl RequestDispatcher {
    /// Creates a dispatcher that talks HTTPS through [`ReqwestTransport`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the application id, the API key or
    /// the host list is empty, if a credential is not a valid header value,
    /// or if the HTTP client cannot be built.
    pub fn new(application_id: &str, api_key: &str, hosts: Vec<String>) -> Result<Self> {
        let transport = ReqwestTransport::new()?;
        Self::with_transport(application_id, api_key, hosts, Arc::new(transport))
    }

    /// Creates a dispatcher on top of any [`Transport`].
    pub fn with_transport(
        application_id: &str,
        api_key: &str,
        mut hosts: Vec<String>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        if application_id.is_empty() {
            return Err(Error::MissingApplicationId);
        }
        if api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }
        if hosts.is_empty() {
            return Err(Error::NoHosts);
        }

        let application_id_header = header_value(application_id, false)?;
        let api_key = header_value(api_key, true)?;

        hosts.shuffle(&mut rand::thread_rng());
        debug!(
            "Dispatcher for {} will try hosts {:?}",
            application_id, hosts
        );

        Ok(Self {
            application_id: application_id.to_string(),
            application_id_header,
            api_key,
            hosts,
            scheme: DEFAULT_SCHEME.to_string(),
            timeout: DEFAULT_TIMEOUT,
            forward: RwLock::new(None),
            transport,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the URL scheme, e.g. `http` behind a local TLS-terminating proxy.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    /// Hosts in the order every request tries them.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Authenticates subsequent requests with `admin_api_key` while
    /// attributing them to `end_user_ip` and the rate limits of
    /// `rate_limit_api_key`.
    ///
    /// On error the previous forwarding state is kept.
    pub fn enable_rate_limit_forward(
        &self,
        admin_api_key: &str,
        end_user_ip: &str,
        rate_limit_api_key: &str,
    ) -> Result<()> {
        let credentials = ForwardedCredentials {
            admin_api_key: header_value(admin_api_key, true)?,
            end_user_ip: header_value(end_user_ip, false)?,
            rate_limit_api_key: header_value(rate_limit_api_key, true)?,
        };
        *self.forward.write() = Some(credentials);
        debug!("Rate limit forwarding enabled for {}", self.application_id);
        Ok(())
    }

    pub fn disable_rate_limit_forward(&self) {
        *self.forward.write() = None;
        debug!("Rate limit forwarding disabled for {}", self.application_id);
    }

    pub fn is_rate_limit_forwarding(&self) -> bool {
        self.forward.read().is_some()
    }

    /// Sends one logical request, failing over across the host pool.
    ///
    /// `path` must start with `/` and already be percent-encoded. `body`, when
    /// present, is sent as `application/json`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCredentials`] on HTTP 403, without trying other hosts
    /// - [`Error::NotFound`] on HTTP 404, without trying other hosts
    /// - [`Error::HostsUnreachable`] once every host failed transiently
    pub async fn execute(&self, method: Method, path: &str, body: Option<String>) -> Result<Value> {
        let headers = self.request_headers(body.is_some());
        let body = body.map(Bytes::from);

        for (attempt, host) in self.hosts.iter().enumerate() {
            let url = format!("{}://{}{}", self.scheme, host, path);
            debug!("Attempting {} {} (attempt {})", method, url, attempt + 1);

            let request = HttpRequest {
                method,
                url,
                headers: headers.clone(),
                body: body.clone(),
                timeout: self.timeout,
            };

            let response = match self.transport.send(request).await {
                Ok(response) => response,
                Err(err) => {
                    debug!("Host {} failed: {}, trying next host", host, err);
                    continue;
                }
            };

            if let Some(value) = classify(host, response)? {
                return Ok(value);
            }
        }

        warn!(
            "All {} hosts failed for {} {}",
            self.hosts.len(),
            method,
            path
        );
        Err(Error::HostsUnreachable)
    }

    fn request_headers(&self, has_body: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(APPLICATION_ID_HEADER, self.application_id_header.clone());

        match self.forward.read().as_ref() {
            None => {
                headers.insert(API_KEY_HEADER, self.api_key.clone());
            }
            Some(forward) => {
                headers.insert(API_KEY_HEADER, forward.admin_api_key.clone());
                headers.insert(FORWARDED_FOR_HEADER, forward.end_user_ip.clone());
                headers.insert(FORWARDED_API_KEY_HEADER, forward.rate_limit_api_key.clone());
            }
        }

        if has_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers
    }
}

/// `Ok(None)` means the attempt failed transiently.
fn classify(host: &str, response: HttpResponse) -> Result<Option<Value>> {
    match response.status {
        403 => Err(Error::InvalidCredentials),
        404 => Err(Error::NotFound),
        503 => {
            debug!("Host {} is unavailable (503), trying next host", host);
            Ok(None)
        }
        status => match serde_json::from_slice(&response.body) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(
                    "Host {} answered {} with an undecodable body: {}, trying next host",
                    host, status, err
                );
                Ok(None)
            }
        },
    }
}

fn header_value(value: &str, sensitive: bool) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value).map_err(Error::InvalidHeaderValue)?;
    value.set_sensitive(sensitive);
    Ok(value)
}
