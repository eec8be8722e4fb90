//! 七牛云对象存储驱动模块
//! Qiniu Kodo object storage driver module
//!
//! 将通用对象存储接口（上传/下载/列举/删除）转换为七牛接口调用
//! Translates the generic object client operations into Qiniu API calls

mod auth;
mod client;
mod types;
mod upload;
mod urls;

pub mod config;
pub mod driver;
pub mod zone;

pub use auth::Credentials;
pub use config::QiniuStorageConfig;
pub use driver::QiniuObjectStorage;
pub use urls::UrlStrategy;
