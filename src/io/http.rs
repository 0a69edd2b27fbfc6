use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{CONTENT_LENGTH, RANGE};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;
use tracing::debug;

use super::{ByteStream, ObjectStore, RemoteObject};
use crate::config::HttpStoreConfig;
use crate::error::{Error, Result};

/// Object store reached over HTTP Range requests.
///
/// Objects live at `{endpoint}/{container}/{object}`, which matches the
/// path-style layout of the common cloud storage XML APIs.
pub struct HttpObjectStore {
    client: Client,
    endpoint: Url,
    timeout: Option<Duration>,
}

impl HttpObjectStore {
    /// Build the HTTP client for the given endpoint
    ///
    /// No request is sent until an object is resolved.
    pub fn connect(config: &HttpStoreConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| Error::Connection(format!("invalid endpoint {}: {e}", config.endpoint)))?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::Connection(format!(
                "endpoint cannot hold object paths: {endpoint}"
            )));
        }

        // whole-object streams only time out when idle
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.read_timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            timeout: config.timeout,
        })
    }

    fn object_url(&self, container: &str, name: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(container)
                .extend(name.split('/'));
        }
        url
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    type Object = HttpObject;

    /// Resolve an object with a HEAD request
    async fn object(&self, container: &str, name: &str) -> Result<HttpObject> {
        let url = self.object_url(container, name);
        let label = format!("{container}/{name}");

        let resp = with_deadline(self.client.head(url.clone()), self.timeout)
            .send()
            .await
            .map_err(|e| request_error(&label, e))?;

        match resp.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(Error::NotFound(label)),
            status => return Err(Error::fetch(label, format!("HEAD returned {status}"))),
        }

        let size = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());

        debug!(object = %label, ?size, "resolved http object");

        Ok(HttpObject {
            client: self.client.clone(),
            url,
            name: label,
            size,
            timeout: self.timeout,
        })
    }
}

/// Handle to a single object behind an [`HttpObjectStore`].
pub struct HttpObject {
    client: Client,
    url: Url,
    name: String,
    size: Option<u64>,
    timeout: Option<Duration>,
}

impl HttpObject {
    /// Size reported by the server when the object was resolved, if any
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl RemoteObject for HttpObject {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open_range(&self, start: u64, length: Option<u64>) -> Result<ByteStream> {
        let Some(range) = range_header(start, length) else {
            if length == Some(0) {
                return Ok(Box::new(tokio::io::empty()));
            }
            return Err(Error::fetch(
                &self.name,
                format!("range at offset {start} overflows"),
            ));
        };

        debug!(object = %self.name, %range, "opening range stream");

        let request = self.client.get(self.url.clone()).header(RANGE, &range);
        let deadline = length.and(self.timeout);
        let resp = with_deadline(request, deadline)
            .send()
            .await
            .map_err(|e| request_error(&self.name, e))?;

        match resp.status() {
            StatusCode::PARTIAL_CONTENT => {}
            // Server ignored the Range header; the body still starts at zero.
            StatusCode::OK if start == 0 => {}
            StatusCode::NOT_FOUND => return Err(Error::NotFound(self.name.clone())),
            status => {
                return Err(Error::fetch(
                    &self.name,
                    format!("HTTP {status} for {range}"),
                ));
            }
        }

        let body = Box::pin(resp.bytes_stream().map_err(std::io::Error::other));
        let reader = StreamReader::new(body);

        Ok(match length {
            Some(len) => Box::new(reader.take(len)),
            None => Box::new(reader),
        })
    }
}

/// Format the `Range` header value for `[start, start + length)`.
///
/// Returns `None` for empty ranges and ranges whose end overflows.
fn range_header(start: u64, length: Option<u64>) -> Option<String> {
    match length {
        None => Some(format!("bytes={start}-")),
        Some(0) => None,
        Some(len) => {
            let end = start.checked_add(len - 1)?;
            Some(format!("bytes={start}-{end}"))
        }
    }
}

fn with_deadline(request: RequestBuilder, timeout: Option<Duration>) -> RequestBuilder {
    match timeout {
        Some(timeout) => request.timeout(timeout),
        None => request,
    }
}

fn request_error(object: &str, err: reqwest::Error) -> Error {
    if err.is_connect() {
        Error::Connection(err.to_string())
    } else {
        Error::fetch(object, err)
    }
}
