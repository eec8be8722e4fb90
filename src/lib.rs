pub mod config;
pub mod storage;

// Driver modules (point to project root drivers via path attribute) / 驱动模块
#[path = "../drivers/mod.rs"]
pub mod drivers;

pub use drivers::create_object_client;
pub use drivers::qiniu::{QiniuObjectStorage, QiniuStorageConfig};
pub use storage::{ObjectClient, StorageError, StorageResult};
