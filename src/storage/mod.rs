use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tokio::io::{AsyncRead, AsyncSeek, BufReader};

pub mod error;

pub use error::{ListError, StorageError, StorageResult};

/// Readable body of a downloaded object, owned by the caller / 下载对象的读取流
pub type ObjectReader = Box<dyn AsyncRead + Unpin + Send>;

/// Object entry produced by listing / 列举得到的对象条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObject {
    pub key: String,
    pub modified_at: DateTime<Utc>,
}

/// Grouping prefix returned by delimited listing / 分隔符列举返回的公共前缀
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageCommonPrefix(pub String);

impl StorageCommonPrefix {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Accumulated result of a (possibly paginated) listing / 列举结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub objects: Vec<StorageObject>,
    pub prefixes: Vec<StorageCommonPrefix>,
}

/// Seekable upload content / 可寻址的上传内容
///
/// `known_size` is the cheap size check: streams that know their length
/// (in-memory buffers) report the number of bytes left to read. Everything
/// else returns `None` and gets measured by seeking.
pub trait ObjectContent: AsyncRead + AsyncSeek + Unpin + Send + Sync {
    fn known_size(&self) -> Option<u64> {
        None
    }
}

impl<T> ObjectContent for Cursor<T>
where
    T: AsRef<[u8]> + Unpin + Send + Sync,
{
    fn known_size(&self) -> Option<u64> {
        let len = self.get_ref().as_ref().len() as u64;
        Some(len.saturating_sub(self.position()))
    }
}

impl ObjectContent for tokio::fs::File {}

impl<R> ObjectContent for BufReader<R> where R: AsyncRead + AsyncSeek + Unpin + Send + Sync {}

/// Generic object client interface / 通用对象存储客户端接口
///
/// Dropping any returned future aborts the request in flight, so deadlines
/// and cancellation belong to the caller (`tokio::time::timeout`, `select!`).
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Upload an object / 上传对象
    async fn put_object(&self, key: &str, object: Box<dyn ObjectContent>) -> StorageResult<()>;

    /// Download an object, returning its body and length / 下载对象，返回读取流和长度
    ///
    /// Length is 0 when the server does not report a usable Content-Length.
    async fn get_object(&self, key: &str) -> StorageResult<(ObjectReader, u64)>;

    /// List objects and common prefixes under `prefix` / 列举对象和公共前缀
    ///
    /// Empty `delimiter` means a flat listing.
    async fn list(&self, prefix: &str, delimiter: &str) -> Result<Listing, ListError>;

    /// Delete an object / 删除对象
    async fn delete_object(&self, key: &str) -> StorageResult<()>;

    /// Whether an error means the object does not exist / 判断是否为对象不存在错误
    fn is_object_not_found_err(&self, err: &(dyn std::error::Error + 'static)) -> bool;

    /// Release resources / 释放资源
    fn stop(&self);
}
