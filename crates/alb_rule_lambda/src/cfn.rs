use std::time::Duration;

use serde_json::json;

use crate::runtime::contract::CustomResourceResponse;

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin HTTP sender for the CloudFormation custom-resource callback.
#[derive(Debug, Clone)]
pub struct ResponseSender {
    client: reqwest::Client,
}

impl ResponseSender {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(RESPONSE_TIMEOUT)
            .build()
            .expect("failed to build response client");
        Self { client }
    }

    /// PUT the response body to the event's presigned response URL.
    ///
    /// CloudFormation holds the stack operation open until this callback
    /// lands, so a delivery failure must surface as a handler error. The
    /// request deliberately sets no `Content-Type`: the URL's signature was
    /// computed without one and a mismatch gets the upload rejected.
    pub async fn send(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), String> {
        match self.deliver(response_url, response).await {
            Ok(http_status) => {
                log_cfn_info(
                    "response_delivered",
                    json!({
                        "status": response.status,
                        "physical_resource_id": response.physical_resource_id.clone(),
                        "http_status": http_status,
                    }),
                );
                Ok(())
            }
            Err(error) => {
                log_cfn_error(
                    "response_delivery_failed",
                    json!({
                        "status": response.status,
                        "error": error.clone(),
                    }),
                );
                Err(error)
            }
        }
    }

    async fn deliver(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<u16, String> {
        let body = serde_json::to_string(response)
            .map_err(|error| format!("Failed to serialize custom-resource response: {error}"))?;

        let reply = self
            .client
            .put(response_url)
            .body(body)
            .send()
            .await
            .map_err(|error| format!("Failed to deliver custom-resource response: {error}"))?;

        let status = reply.status();
        if !status.is_success() {
            return Err(format!(
                "Custom-resource response rejected with status {status}"
            ));
        }
        Ok(status.as_u16())
    }
}

impl Default for ResponseSender {
    fn default() -> Self {
        Self::new()
    }
}

fn log_cfn_info(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "cfn_response",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

fn log_cfn_error(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "cfn_response",
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}
