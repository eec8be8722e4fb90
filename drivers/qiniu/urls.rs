//! Download links and management URIs / 下载链接与管理接口URI

use base64::{engine::general_purpose::URL_SAFE as BASE64_URL, Engine as _};
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::time::Duration;

use super::auth::Credentials;

/// Characters kept verbatim in an object key path (`/` and sub-delims are legal)
const PATH_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

/// Page size of one listing request / 单次列举数量
pub const LIST_LIMIT: u32 = 1000;

/// How download links are built, chosen once per client / 下载链接构造方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlStrategy {
    /// Plain public link / 公开空间链接
    Public,
    /// Signed link expiring `ttl` after it is built / 私有空间签名链接
    Private { ttl: Duration },
}

impl UrlStrategy {
    pub fn build_url(&self, mac: &Credentials, domain: &str, key: &str) -> String {
        self.build_url_at(mac, domain, key, Utc::now().timestamp())
    }

    /// Same as `build_url` with an explicit clock reading (unix seconds)
    pub fn build_url_at(&self, mac: &Credentials, domain: &str, key: &str, now: i64) -> String {
        match self {
            UrlStrategy::Public => make_public_url(domain, key),
            UrlStrategy::Private { ttl } => {
                let deadline = now.saturating_add(ttl.as_secs() as i64);
                make_private_url(mac, domain, key, deadline)
            }
        }
    }
}

/// `http(s)://domain/escaped-key`, `http://` added when the domain has no scheme
pub fn make_public_url(domain: &str, key: &str) -> String {
    let domain = domain.trim_end_matches('/');
    let escaped = utf8_percent_encode(key, PATH_ESCAPE);
    if domain.starts_with("http://") || domain.starts_with("https://") {
        format!("{}/{}", domain, escaped)
    } else {
        format!("http://{}/{}", domain, escaped)
    }
}

/// Public URL plus `e=<deadline>&token=<sign>` / 私有下载链接
pub fn make_private_url(mac: &Credentials, domain: &str, key: &str, deadline: i64) -> String {
    let mut url_to_sign = make_public_url(domain, key);
    url_to_sign.push_str(if url_to_sign.contains('?') { "&e=" } else { "?e=" });
    url_to_sign.push_str(&deadline.to_string());
    let token = mac.sign(url_to_sign.as_bytes());
    format!("{}&token={}", url_to_sign, token)
}

/// `urlsafe_base64("bucket:key")`
pub fn encoded_entry(bucket: &str, key: &str) -> String {
    BASE64_URL.encode(format!("{}:{}", bucket, key))
}

/// Delete URI path for an object / 删除接口路径
pub fn uri_delete(bucket: &str, key: &str) -> String {
    format!("/delete/{}", encoded_entry(bucket, key))
}

/// Listing URL up to and including `marker=`, the escaped marker is appended per page.
/// Query keys are sorted; empty prefix/delimiter are omitted.
pub fn uri_list(host: &str, bucket: &str, prefix: &str, delimiter: &str) -> String {
    let mut query = vec![("bucket", bucket.to_string())];
    if !delimiter.is_empty() {
        query.push(("delimiter", delimiter.to_string()));
    }
    query.push(("limit", LIST_LIMIT.to_string()));
    if !prefix.is_empty() {
        query.push(("prefix", prefix.to_string()));
    }

    let encoded = query
        .iter()
        .map(|(k, v)| format!("{}={}", k, query_escape(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}/list?{}&marker=", host, encoded)
}

/// Form-style query escaping: unreserved characters kept, space becomes `+`
pub fn query_escape(s: &str) -> String {
    urlencoding::encode(s).replace("%20", "+")
}
