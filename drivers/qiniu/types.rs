//! Qiniu wire types / 七牛接口数据类型

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::auth::Credentials;
use crate::storage::StorageResult;

/// Upload policy; serialized field order is part of the signed payload
/// 上传策略
#[derive(Debug, Clone, Serialize)]
pub struct PutPolicy {
    pub scope: String,
    /// Absolute unix deadline / 截止时间（秒）
    pub deadline: u64,
}

impl PutPolicy {
    /// Policy for `scope` valid `expires` seconds after `now`
    pub fn new(scope: &str, now: i64, expires: u64) -> Self {
        Self {
            scope: scope.to_string(),
            deadline: (now.max(0) as u64).saturating_add(expires),
        }
    }

    /// 生成上传凭证
    pub fn upload_token(&self, mac: &Credentials) -> StorageResult<String> {
        let json = serde_json::to_vec(self)?;
        Ok(mac.sign_with_data(&json))
    }
}

/// Form upload response / 表单上传返回
#[derive(Debug, Clone, Deserialize)]
pub struct PutRet {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub key: String,
}

/// One object in a listing page / 列举条目
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub key: String,
    /// Upload time in 100ns units since the unix epoch
    #[serde(default)]
    pub put_time: i64,
}

impl ListItem {
    pub fn modified_at(&self) -> DateTime<Utc> {
        Utc.timestamp_nanos(self.put_time.saturating_mul(100))
    }
}

/// One listing page / 列举分页结果
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesRet {
    #[serde(default)]
    pub marker: String,
    #[serde(default)]
    pub items: Option<Vec<ListItem>>,
    #[serde(default)]
    pub common_prefixes: Option<Vec<String>>,
}

/// Error body returned by upload and management APIs / 接口错误返回
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
