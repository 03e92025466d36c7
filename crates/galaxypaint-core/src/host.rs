//! Host-page collaborators available to a sandboxed widget.
//!
//! A widget embedded in a sandboxed frame cannot reach the API itself. The host
//! page relays requests on its behalf and answers lookups for values it knows,
//! such as the current site's group id.

use crate::transport::{BoxFuture, TransportError, TransportResult, UploadForm};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use url::Url;

/// Key the host answers with the current site's group id.
pub const SITE_GROUP_ID_KEY: &str = "siteGroupId";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
}

/// Options for a relayed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub method: RequestMethod,
    pub headers: Vec<(String, String)>,
    /// Multipart body, for uploads.
    pub form: Option<UploadForm>,
}

impl ProxyRequest {
    pub fn get() -> Self {
        Self {
            method: RequestMethod::Get,
            headers: Vec::new(),
            form: None,
        }
    }

    pub fn post_form(form: UploadForm) -> Self {
        Self {
            method: RequestMethod::Post,
            headers: Vec::new(),
            form: Some(form),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Response relayed back from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ProxyResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> TransportResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Request proxy supplied by the host page.
pub trait RequestProxy {
    /// Look up a host-provided value.
    fn get(&self, key: &str) -> BoxFuture<'_, TransportResult<String>>;

    /// Perform a request on the widget's behalf.
    fn fetch(&self, url: &str, request: ProxyRequest) -> BoxFuture<'_, TransportResult<ProxyResponse>>;
}

/// A [`RequestProxy`] that performs the relayed requests itself over HTTP.
///
/// This is the host side of the relay: relative URLs resolve against the
/// host's origin, and `get` answers from a fixed set of values.
pub struct HttpRelay {
    client: reqwest::Client,
    origin: Url,
    values: HashMap<String, String>,
}

impl HttpRelay {
    pub fn new(origin: &str) -> TransportResult<Self> {
        let origin = Url::parse(origin).map_err(|_| TransportError::InvalidUrl(origin.to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            origin,
            values: HashMap::new(),
        })
    }

    /// Answer `get(key)` with `value`.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl RequestProxy for HttpRelay {
    fn get(&self, key: &str) -> BoxFuture<'_, TransportResult<String>> {
        let value = self
            .values
            .get(key)
            .cloned()
            .ok_or_else(|| TransportError::Proxy(format!("Host has no value for '{}'", key)));
        Box::pin(async move { value })
    }

    fn fetch(&self, url: &str, request: ProxyRequest) -> BoxFuture<'_, TransportResult<ProxyResponse>> {
        let target = self.origin.join(url).map_err(|_| TransportError::InvalidUrl(url.to_string()));
        let url = url.to_string();
        Box::pin(async move {
            let target = target?;
            let mut builder = match request.method {
                RequestMethod::Get => self.client.get(target),
                RequestMethod::Post => self.client.post(target),
            };
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(form) = request.form {
                builder = builder.multipart(form.into_multipart()?);
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?.to_vec();
            log::debug!("Relayed {:?} {} -> {}", request.method, url, status);
            Ok(ProxyResponse { status, body })
        })
    }
}
