//! Configuration file module / 配置文件模块
//!
//! Loads the Qiniu client configuration from a JSON file.
//! Secrets can be supplied through the environment instead of the file / 密钥可通过环境变量提供

use std::path::Path;

use crate::drivers::qiniu::QiniuStorageConfig;
use crate::storage::{StorageError, StorageResult};

/// Environment variable overriding `access_key_id` / 覆盖 access_key_id 的环境变量
pub const ENV_ACCESS_KEY: &str = "QINIU_ACCESS_KEY";
/// Environment variable overriding `secret_access_key` / 覆盖 secret_access_key 的环境变量
pub const ENV_SECRET_KEY: &str = "QINIU_SECRET_KEY";

/// Default config file name / 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Load configuration from file, then apply environment overrides / 加载配置文件并应用环境变量
pub fn load_config(path: &Path) -> StorageResult<QiniuStorageConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| StorageError::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

    let mut config: QiniuStorageConfig = serde_json::from_str(&content)
        .map_err(|e| StorageError::Config(format!("Failed to parse config file {:?}: {}", path, e)))?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    config.validate()?;

    tracing::info!("Loaded configuration from {:?}", path);
    Ok(config)
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(path: &Path, config: &QiniuStorageConfig) -> StorageResult<()> {
    let content = serde_json::to_string_pretty(config)?;

    std::fs::write(path, content)
        .map_err(|e| StorageError::Config(format!("Failed to write config file {:?}: {}", path, e)))?;

    Ok(())
}

/// Override credentials with non-empty values from `lookup` / 用环境变量覆盖凭证
fn apply_env_overrides<F>(config: &mut QiniuStorageConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(ak) = lookup(ENV_ACCESS_KEY).filter(|v| !v.is_empty()) {
        config.access_key_id = ak;
    }
    if let Some(sk) = lookup(ENV_SECRET_KEY).filter(|v| !v.is_empty()) {
        config.secret_access_key = sk;
    }
}
