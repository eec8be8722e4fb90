//! Form upload and upload token lifecycle / 表单上传与上传凭证
//!
//! A token is minted with a 4000s deadline but only used for 3600s, so an
//! upload never starts with a token that is about to expire.

use chrono::Utc;
use parking_lot::Mutex;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use std::io::SeekFrom;
use tokio::io::AsyncSeekExt;
use tokio_util::io::ReaderStream;

use super::auth::Credentials;
use super::client::response_error;
use super::types::{PutPolicy, PutRet};
use crate::storage::{ObjectContent, StorageResult};

/// Seconds a minted token is reused before minting a new one / 凭证本地复用时长
pub const TOKEN_REFRESH_SECS: i64 = 3600;
/// Deadline written into the upload policy / 上传策略有效期
pub const TOKEN_EXPIRES_SECS: u64 = 4000;

#[derive(Debug, Clone)]
struct UploadToken {
    token: String,
    minted_at: i64,
}

/// Upload token cache shared by concurrent uploads / 上传凭证缓存
///
/// `get_or_refresh` is the only mutation point; the freshness check and the
/// mint happen under one lock.
pub struct UploadTokenCache {
    bucket: String,
    current: Mutex<Option<UploadToken>>,
}

impl UploadTokenCache {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            current: Mutex::new(None),
        }
    }

    pub fn get_or_refresh(&self, mac: &Credentials) -> StorageResult<String> {
        self.get_or_refresh_at(mac, Utc::now().timestamp())
    }

    /// `get_or_refresh` against an explicit clock reading (unix seconds)
    pub fn get_or_refresh_at(&self, mac: &Credentials, now: i64) -> StorageResult<String> {
        let mut current = self.current.lock();
        if let Some(cached) = current.as_ref() {
            if now - cached.minted_at <= TOKEN_REFRESH_SECS {
                return Ok(cached.token.clone());
            }
        }

        let token = PutPolicy::new(&self.bucket, now, TOKEN_EXPIRES_SECS).upload_token(mac)?;
        tracing::debug!("Minted upload token for bucket {}", self.bucket);
        *current = Some(UploadToken {
            token: token.clone(),
            minted_at: now,
        });
        Ok(token)
    }
}

/// Number of bytes an upload of `object` will send / 计算上传内容大小
///
/// Uses the stream's own size when it has one, otherwise measures by seeking
/// to the end and back to the start, leaving the stream at its start.
pub async fn content_size<C>(object: &mut C) -> std::io::Result<u64>
where
    C: ObjectContent + ?Sized,
{
    if let Some(size) = object.known_size() {
        return Ok(size);
    }
    let end = object.seek(SeekFrom::End(0)).await?;
    let begin = object.seek(SeekFrom::Start(0)).await?;
    Ok(end - begin)
}

/// Multipart form uploader / 表单上传器
pub struct FormUploader {
    client: Client,
    up_host: String,
}

impl FormUploader {
    /// `up_host` is the full upload endpoint including the scheme
    pub fn new(client: Client, up_host: String) -> Self {
        Self { client, up_host }
    }

    pub fn up_host(&self) -> &str {
        &self.up_host
    }

    /// Stream `size` bytes of `object` to `key` / 上传对象
    pub async fn put(
        &self,
        token: &str,
        key: &str,
        object: Box<dyn ObjectContent>,
        size: u64,
    ) -> StorageResult<PutRet> {
        let body = Body::wrap_stream(ReaderStream::new(object));
        let file = Part::stream_with_length(body, size)
            .file_name(key.to_string())
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .text("token", token.to_string())
            .text("key", key.to_string())
            .part("file", file);

        let resp = self.client.post(&self.up_host).multipart(form).send().await?;
        if !resp.status().is_success() {
            return Err(response_error(resp).await);
        }
        Ok(resp.json::<PutRet>().await?)
    }
}
