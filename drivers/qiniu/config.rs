//! 七牛驱动配置

use serde::{Deserialize, Serialize};

use crate::storage::{StorageError, StorageResult};

/// 七牛对象存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QiniuStorageConfig {
    /// 下载域名（公开或私有空间绑定的域名）
    pub url: String,
    /// Access Key
    pub access_key_id: String,
    /// Secret Key
    pub secret_access_key: String,
    /// 存储空间名称
    pub bucket_name: String,
    /// 区域ID，如 z0 / z1 / z2 / na0 / as0，留空使用华东
    #[serde(default)]
    pub region: String,
    /// 上传和管理接口使用HTTPS
    #[serde(default)]
    pub use_https: bool,
    /// 使用CDN加速上传域名
    #[serde(default)]
    pub use_cdn: bool,
    /// 私有空间，下载链接需要签名
    #[serde(default)]
    pub private: bool,
    /// 自定义上传域名（私有化部署）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_host: Option<String>,
    /// 自定义管理域名（私有化部署）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rs_host: Option<String>,
    /// 自定义列举域名（私有化部署）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsf_host: Option<String>,
    /// HTTP请求超时（秒），不设置则不限
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl QiniuStorageConfig {
    /// 校验必填项
    pub fn validate(&self) -> StorageResult<()> {
        if self.bucket_name.trim().is_empty() {
            return Err(StorageError::Config("bucket_name is required".to_string()));
        }
        if self.access_key_id.is_empty() || self.secret_access_key.is_empty() {
            return Err(StorageError::Config(
                "access_key_id and secret_access_key are required".to_string(),
            ));
        }
        if self.url.trim().is_empty() {
            return Err(StorageError::Config("url is required".to_string()));
        }
        Ok(())
    }
}

impl Default for QiniuStorageConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            bucket_name: String::new(),
            region: String::new(),
            use_https: false,
            use_cdn: false,
            private: false,
            up_host: None,
            rs_host: None,
            rsf_host: None,
            timeout_secs: None,
        }
    }
}
