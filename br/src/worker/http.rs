//! HTTP dispatcher backed by a shared reqwest client

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Request, StatusCode};
use tracing::{debug, info, warn};

use crate::config::HttpConfig;
use crate::error::DispatchError;
use crate::job::Job;

use super::executor::Dispatcher;

/// Build the shared client from connection settings
///
/// With `recycle_after_response` set no connection is kept idle, so each
/// response releases its connection.
pub fn build_client(config: &HttpConfig) -> Result<Client, DispatchError> {
    debug!(?config, "build_client: called");
    let max_idle = if config.recycle_after_response {
        0
    } else {
        config.pool_max_idle_per_host
    };
    let mut builder = Client::builder()
        .connect_timeout(config.connect_timeout())
        .tcp_keepalive(config.keep_alive())
        .pool_max_idle_per_host(max_idle)
        .pool_idle_timeout(config.pool_idle_timeout())
        .user_agent(config.user_agent.clone());
    if !config.system_proxy {
        builder = builder.no_proxy();
    }
    builder.build().map_err(DispatchError::Client)
}

/// Turn a job into a request
///
/// Only POST and PUT jobs get a JSON body. A JSON content type is added to
/// bodies unless the job sets its own.
pub fn build_request(client: &Client, job: &Job) -> Result<Request, DispatchError> {
    let mut builder = client.request(job.method().clone(), job.url());

    if let Some(body) = job.body()? {
        let has_content_type = job.headers().keys().any(|k| k.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
        if !has_content_type {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        builder = builder.body(body);
    }

    for (name, value) in job.headers() {
        builder = builder.header(name.as_str(), value.as_str());
    }

    builder.build().map_err(DispatchError::Build)
}

/// Sends jobs over HTTP through one client shared by every worker
///
/// A transport error swaps in a freshly built client; the old connection
/// pool is dropped once in-flight requests holding it finish.
pub struct HttpDispatcher {
    config: HttpConfig,
    client: RwLock<Client>,
    recycles: AtomicU64,
}

impl HttpDispatcher {
    pub fn new(config: &HttpConfig) -> Result<Self, DispatchError> {
        debug!("HttpDispatcher::new: called");
        Ok(Self {
            client: RwLock::new(build_client(config)?),
            config: config.clone(),
            recycles: AtomicU64::new(0),
        })
    }

    fn client(&self) -> Client {
        match self.client.read() {
            Ok(client) => client.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Close idle pooled connections by replacing the client
    pub fn recycle_connections(&self) {
        debug!("HttpDispatcher::recycle_connections: called");
        let fresh = match build_client(&self.config) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Failed to rebuild HTTP client, keeping current pool");
                return;
            }
        };

        match self.client.write() {
            Ok(mut client) => *client = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
        self.recycles.fetch_add(1, Ordering::Relaxed);
    }

    /// How many times the connection pool was recycled
    pub fn recycles(&self) -> u64 {
        self.recycles.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn dispatch(&self, job: &Job) -> Result<StatusCode, DispatchError> {
        let client = self.client();
        let request = build_request(&client, job)?;

        info!(method = %job.method(), url = %job.url(), "Sending: {} {}", job.method(), job.url());
        let response = match client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                self.recycle_connections();
                return Err(DispatchError::Transport(e));
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!(url = %job.url(), error = %DispatchError::ReadBody(e), "Response body lost");
                String::new()
            }
        };

        info!(%status, url = %job.url(), "Status: {} Body: {}", status, body);
        Ok(status)
    }
}
