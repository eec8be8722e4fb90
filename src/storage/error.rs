//! Error types for object client operations / 对象存储客户端错误类型

use thiserror::Error;

use super::Listing;

/// Result type for object client operations / 对象存储操作结果类型
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors surfaced by an object client / 对象存储客户端错误
///
/// No variant is ever retried locally; every failure reaches the caller as-is.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Invalid or incomplete configuration / 配置错误
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Network/HTTP transport failure / 网络传输错误
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Non-200 response while downloading an object / 下载返回非200状态码
    #[error("http status {status}")]
    Status { status: u16 },

    /// Provider API rejected an upload or management call / 服务端API错误
    #[error("{message} (http status {status})")]
    Api { status: u16, message: String },

    /// Malformed request URL / 请求URL格式错误
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Local stream I/O error / 本地流I/O错误
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Response or policy (de)serialization error / 序列化错误
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    /// HTTP status carried by the error, if any / 错误携带的HTTP状态码
    pub fn status(&self) -> Option<u16> {
        match self {
            StorageError::Status { status } | StorageError::Api { status, .. } => Some(*status),
            StorageError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// A listing that failed part way / 分页列举中途失败
///
/// Pages fetched before the failure are kept in `partial`.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct ListError {
    pub partial: Listing,
    #[source]
    pub source: StorageError,
}

impl ListError {
    /// Split into the partial listing and the cause / 拆分为部分结果和错误
    pub fn into_parts(self) -> (Listing, StorageError) {
        (self.partial, self.source)
    }
}
