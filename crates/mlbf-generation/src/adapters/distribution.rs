//! HTTP client for the record distribution service
//!
//! The filter is uploaded as an attachment to one record of a collection:
//! a multipart POST to `{collection_url}/records/{record_id}/attachment`
//! carrying the metadata as a JSON `data` field and the filter as the
//! `attachment` file part. A PATCH of the collection status then asks the
//! service to review or sign the change.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Attachment, PublishMetadata, SignOffStatus};
use crate::error::PublishError;
use crate::ports::outbound::DistributionClient;

/// Distribution client over HTTP.
pub struct HttpDistributionClient {
    client: Client,
    collection_url: String,
    record_id: Option<String>,
    token: Option<String>,
}

impl HttpDistributionClient {
    pub fn new(collection_url: impl Into<String>, timeout: Duration) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(PublishError::Http)?;

        Ok(Self {
            client,
            collection_url: collection_url.into().trim_end_matches('/').to_string(),
            record_id: None,
            token: None,
        })
    }

    /// Upload to a fixed record instead of a fresh one per generation
    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn attachment_url(&self, record_id: &str) -> String {
        format!("{}/records/{}/attachment", self.collection_url, record_id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and turn connection failures and non-2xx statuses into errors
    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, PublishError> {
        let response = self.authorize(request).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                PublishError::Unavailable(format!("Cannot reach {}: {}", url, e))
            } else {
                PublishError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl DistributionClient for HttpDistributionClient {
    async fn publish_attachment(
        &self,
        metadata: &PublishMetadata,
        attachment: Attachment,
    ) -> Result<(), PublishError> {
        let record_id = self
            .record_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let url = self.attachment_url(&record_id);

        let data = serde_json::to_string(metadata)
            .map_err(|e| PublishError::Unavailable(format!("metadata encoding: {}", e)))?;
        let size = attachment.content.len();
        let part = Part::bytes(attachment.content)
            .file_name(attachment.filename)
            .mime_str(&attachment.content_type)?;
        let form = Form::new().text("data", data).part("attachment", part);

        self.send(self.client.post(&url).multipart(form), &url).await?;

        info!(
            record_id = %record_id,
            size,
            generation_time = metadata.generation_time,
            "[mlbf] Uploaded filter attachment"
        );
        Ok(())
    }

    async fn request_sign_off(&self, status: SignOffStatus) -> Result<(), PublishError> {
        let body = json!({ "data": { "status": status.as_str() } });
        let request = self.client.patch(&self.collection_url).json(&body);
        self.send(request, &self.collection_url).await?;
        info!(status = status.as_str(), "[mlbf] Requested collection sign-off");
        Ok(())
    }
}
