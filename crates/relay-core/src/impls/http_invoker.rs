//! HttpInvoker - posts the SOAP document to the power-on endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::domain::{CallEnvelope, InvocationFailure, RelayError};
use crate::ports::RemoteInvoker;
use crate::translate::WireDocument;

pub const CORRELATION_ID_HEADER: &str = "x-Correlation-Id";
pub const CALL_ID_HEADER: &str = "x-SymX-Call-ID";
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// HttpInvoker issues a single POST per call.
///
/// The underlying `reqwest::Client` pools connections; that is invisible to
/// callers, each `invoke` is still one independent request.
#[derive(Clone)]
pub struct HttpInvoker {
    client: reqwest::Client,
    subscription_key: Option<String>,
}

impl HttpInvoker {
    /// `subscription_key` is sent only when present and not blank.
    pub fn new(timeout: Duration, subscription_key: Option<String>) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Other(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            subscription_key: subscription_key.filter(|key| !key.trim().is_empty()),
        })
    }
}

#[async_trait]
impl RemoteInvoker for HttpInvoker {
    async fn invoke(
        &self,
        call: &CallEnvelope,
        document: &WireDocument,
    ) -> Result<String, InvocationFailure> {
        info!(
            url = %call.instance_url,
            len = document.len(),
            "calling power-on endpoint"
        );

        let mut request = self
            .client
            .post(&call.instance_url)
            .header(CONTENT_TYPE, XML_CONTENT_TYPE)
            .header(CORRELATION_ID_HEADER, call.correlation_id.as_str())
            .header(CALL_ID_HEADER, call.call_id.as_str())
            .body(document.as_str().to_owned());
        if let Some(key) = &self.subscription_key {
            request = request.header(SUBSCRIPTION_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| InvocationFailure::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InvocationFailure::status(
                status.as_u16(),
                format!(
                    "Response status code does not indicate success: {} ({})",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| InvocationFailure::transport(format!("failed to read response: {e}")))?;
        debug!(len = body.len(), response = %body, "power-on endpoint responded");
        Ok(body)
    }
}
