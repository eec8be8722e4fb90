// Driver package / 驱动包
pub mod qiniu;

use std::sync::Arc;

use crate::storage::{ObjectClient, StorageResult};

/// Create the object client for a Qiniu configuration / 根据配置创建对象存储客户端
pub fn create_object_client(config: qiniu::QiniuStorageConfig) -> StorageResult<Arc<dyn ObjectClient>> {
    Ok(Arc::new(qiniu::QiniuObjectStorage::new(config)?))
}
