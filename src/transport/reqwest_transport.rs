use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url;
        debug!(method = %request.method, url = %url, "sending request");

        let mut builder = self
            .client
            .request(request.method, &url)
            .headers(request.headers)
            .timeout(request.timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|err| to_transport_error(&url, err))?;
        let status = response.status();
        let body = response.text().await.map_err(|err| to_transport_error(&url, err))?;
        debug!(status = status.as_u16(), url = %url, "response received");

        Ok(HttpResponse { status, body })
    }
}

fn to_transport_error(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout { url: url.to_owned() }
    } else {
        TransportError::Request {
            url: url.to_owned(),
            message: err.to_string(),
        }
    }
}
