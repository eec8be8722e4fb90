//! Credentialed management calls (rs / rsf hosts) / 管理接口调用

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

use super::auth::{Credentials, FORM_CONTENT_TYPE};
use super::types::ErrorBody;
use crate::storage::{StorageError, StorageResult};

/// Bucket management client / 空间管理客户端
pub struct BucketManager {
    client: Client,
    mac: Arc<Credentials>,
    rs_host: String,
    rsf_host: String,
}

impl BucketManager {
    /// `rs_host` / `rsf_host` are full endpoints including the scheme
    pub fn new(client: Client, mac: Arc<Credentials>, rs_host: String, rsf_host: String) -> Self {
        Self { client, mac, rs_host, rsf_host }
    }

    /// Host for object management (stat, delete...) / 资源管理域名
    pub fn rs_req_host(&self) -> &str {
        &self.rs_host
    }

    /// Host for listing / 资源列举域名
    pub fn rsf_req_host(&self) -> &str {
        &self.rsf_host
    }

    /// Signed call whose response body is not needed / 发起签名请求（忽略返回体）
    pub async fn credentialed_call(&self, method: Method, raw_url: &str) -> StorageResult<()> {
        self.send(method, raw_url).await?;
        Ok(())
    }

    /// Signed call decoding a JSON response / 发起签名请求并解析JSON
    pub async fn credentialed_call_json<T: DeserializeOwned>(
        &self,
        method: Method,
        raw_url: &str,
    ) -> StorageResult<T> {
        let resp = self.send(method, raw_url).await?;
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send(&self, method: Method, raw_url: &str) -> StorageResult<Response> {
        let url = Url::parse(raw_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        let authorization =
            self.mac.authorization_v2(method.as_str(), &url, FORM_CONTENT_TYPE, &headers, b"");

        tracing::debug!("Qiniu {} {}", method, url.path());
        let resp = self
            .client
            .request(method, url)
            .headers(headers)
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(response_error(resp).await);
        }
        Ok(resp)
    }
}

/// Turn a non-2xx provider response into an API error / 将非2xx响应转换为错误
pub async fn response_error(resp: Response) -> StorageError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.error,
        Err(_) if !text.trim().is_empty() => text.trim().to_string(),
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    StorageError::Api { status: status.as_u16(), message }
}
