use std::fmt;
use std::time::Duration;

use anyhow::anyhow;
use tokio::runtime::Handle;

use crate::conf::Network;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    #[inline]
    fn as_reqwest(&self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }
}

/// A single outbound request. Timeouts are carried per request.
///
/// `HttpNetworkService` applies them as one deadline of `connect_timeout +
/// read_timeout` covering connect, send and the whole response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRequest {
    pub url: String,
    pub method: HttpMethod,
    pub body: Option<Vec<u8>>,
    pub headers: Vec<(String, String)>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl NetworkRequest {
    #[inline]
    pub fn new(url: String, method: HttpMethod, timeout: Duration) -> Self {
        Self { url, method, body: None, headers: Vec::new(), connect_timeout: timeout, read_timeout: timeout }
    }

    #[inline]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    #[inline]
    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Deadline for the complete exchange.
    #[inline]
    pub fn deadline(&self) -> Duration {
        self.connect_timeout + self.read_timeout
    }

    #[inline]
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v.as_str())
    }
}

/// The completed response handed to the request's callback.
pub struct HttpConnection {
    response_code: u16,
    response_message: Option<String>,
}

impl HttpConnection {
    #[inline]
    pub fn new(response_code: u16, response_message: Option<String>) -> Self {
        Self { response_code, response_message }
    }

    #[inline]
    pub fn response_code(&self) -> u16 {
        self.response_code
    }

    #[inline]
    pub fn response_message(&self) -> Option<&str> {
        self.response_message.as_deref()
    }

    /// Releases the response.
    #[inline]
    pub fn close(self) {
        log::trace!("connection closed, response code: {}", self.response_code);
    }
}

impl fmt::Debug for HttpConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HttpConnection({}, {:?})", self.response_code, self.response_message)
    }
}

/// Invoked once per request, with `None` if no response could be obtained.
pub type ConnectCallback = Box<dyn FnOnce(Option<HttpConnection>) + Send>;

pub trait Networking: Send + Sync {
    fn connect_async(&self, request: NetworkRequest, callback: ConnectCallback);
}

/// `Networking` on top of a shared reqwest client, requests run on a tokio runtime.
#[derive(Clone)]
pub struct HttpNetworkService {
    client: reqwest::Client,
    handle: Handle,
}

impl HttpNetworkService {
    /// Must be called from within a tokio runtime.
    pub fn new(cfg: &Network) -> Result<Self> {
        let handle = Handle::try_current().map_err(|e| anyhow!("no tokio runtime available, {:?}", e))?;
        Self::with_handle(cfg, handle)
    }

    /// `cfg.connect_timeout` bounds the TCP connect of every request, the
    /// request's own deadline bounds the rest.
    pub fn with_handle(cfg: &Network, handle: Handle) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout)
            .timeout(cfg.connect_timeout + cfg.read_timeout)
            .user_agent(cfg.user_agent.as_str())
            .build()?;
        Ok(Self { client, handle })
    }

    async fn send(client: reqwest::Client, request: NetworkRequest) -> Result<HttpConnection> {
        let mut builder = client
            .request(request.method.as_reqwest(), request.url.as_str())
            .timeout(request.deadline());
        for (k, v) in request.headers.iter() {
            builder = builder.header(k.as_str(), v.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let resp = builder.send().await?;
        let status = resp.status();
        Ok(HttpConnection::new(status.as_u16(), status.canonical_reason().map(String::from)))
    }
}

impl Networking for HttpNetworkService {
    fn connect_async(&self, request: NetworkRequest, callback: ConnectCallback) {
        let client = self.client.clone();
        self.handle.spawn(async move {
            log::debug!("{:?} {}", request.method, request.url);
            let url = request.url.clone();
            match Self::send(client, request).await {
                Ok(conn) => callback(Some(conn)),
                Err(e) => {
                    log::warn!("request to {} failed, {}", url, e);
                    callback(None)
                }
            }
        });
    }
}
