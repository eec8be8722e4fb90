//! 七牛对象存储客户端实现
//!
//! 设计原则：
//! - 只做通用对象存储接口到七牛接口的转换，不重试、不缓存
//! - 上传凭证在并发上传间共享，刷新时加锁
//! - 公开/私有空间的下载链接构造方式在创建时确定

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, USER_AGENT};
use reqwest::{Client, Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::io::StreamReader;

use super::auth::Credentials;
use super::client::BucketManager;
use super::config::QiniuStorageConfig;
use super::types::ListFilesRet;
use super::upload::{content_size, FormUploader, UploadTokenCache};
use super::urls::{query_escape, uri_delete, uri_list, UrlStrategy};
use super::zone::{endpoint, region_by_id, Zone, ZONE_HUADONG};
use crate::storage::{
    ListError, Listing, ObjectClient, ObjectContent, ObjectReader, StorageCommonPrefix,
    StorageError, StorageObject, StorageResult,
};

/// Lifetime of a signed download link / 私有链接有效期
const PRIVATE_URL_TTL: Duration = Duration::from_secs(3600);
/// User agent sent with downloads / 下载请求的User-Agent
const DOWNLOAD_USER_AGENT: &str = "storage";

/// 七牛对象存储客户端
pub struct QiniuObjectStorage {
    mac: Arc<Credentials>,
    bucket: String,
    base: String,
    client: Client,
    uploader: FormUploader,
    manager: BucketManager,
    tokens: UploadTokenCache,
    make_url: UrlStrategy,
}

impl QiniuObjectStorage {
    /// 创建客户端，不发起任何网络请求
    pub fn new(config: QiniuStorageConfig) -> StorageResult<Self> {
        config.validate()?;

        let zone = Self::select_zone(&config.region)?;
        let mac = Arc::new(Credentials::new(&config.access_key_id, &config.secret_access_key));

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        let up_host = config
            .up_host
            .as_deref()
            .unwrap_or_else(|| zone.up_host(config.use_cdn));
        let rs_host = config.rs_host.as_deref().unwrap_or(zone.rs_host);
        let rsf_host = config.rsf_host.as_deref().unwrap_or(zone.rsf_host);

        let uploader = FormUploader::new(client.clone(), endpoint(config.use_https, up_host));
        let manager = BucketManager::new(
            client.clone(),
            mac.clone(),
            endpoint(config.use_https, rs_host),
            endpoint(config.use_https, rsf_host),
        );

        let make_url = if config.private {
            UrlStrategy::Private { ttl: PRIVATE_URL_TTL }
        } else {
            UrlStrategy::Public
        };

        tracing::info!(
            "Qiniu client created: bucket={}, zone={}, up_host={}, private={}",
            config.bucket_name,
            zone.id,
            uploader.up_host(),
            config.private
        );

        Ok(Self {
            mac,
            tokens: UploadTokenCache::new(&config.bucket_name),
            bucket: config.bucket_name,
            base: config.url,
            client,
            uploader,
            manager,
            make_url,
        })
    }

    /// Empty region selects the default zone, an unknown one is rejected
    fn select_zone(region: &str) -> StorageResult<&'static Zone> {
        let region = region.trim();
        if region.is_empty() {
            return Ok(&ZONE_HUADONG);
        }
        region_by_id(region).ok_or_else(|| {
            StorageError::Config(format!("unknown qiniu region: {}", region))
        })
    }

    /// 获取对象下载链接
    pub fn object_url(&self, key: &str) -> String {
        self.make_url.build_url(&self.mac, &self.base, key)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Declared body length, 0 when the header is missing or malformed
/// 响应体长度，缺失或无法解析时为0
fn content_length(headers: &HeaderMap) -> u64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

#[async_trait]
impl ObjectClient for QiniuObjectStorage {
    async fn put_object(&self, key: &str, mut object: Box<dyn ObjectContent>) -> StorageResult<()> {
        let token = self.tokens.get_or_refresh(&self.mac)?;
        let size = content_size(object.as_mut()).await?;

        tracing::debug!("Qiniu upload: key={}, size={}", key, size);
        let ret = self.uploader.put(&token, key, object, size).await?;
        tracing::debug!("Qiniu upload done: key={}, hash={}", ret.key, ret.hash);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> StorageResult<(ObjectReader, u64)> {
        let raw_url = self.object_url(key);

        let resp = self
            .client
            .get(&raw_url)
            .header(USER_AGENT, DOWNLOAD_USER_AGENT)
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            drop(resp);
            tracing::debug!("Qiniu download failed: key={}, status={}", key, status);
            return Err(StorageError::Status { status: status.as_u16() });
        }

        let total = content_length(resp.headers());

        let stream = resp
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let reader: ObjectReader = Box::new(StreamReader::new(Box::pin(stream)));
        Ok((reader, total))
    }

    async fn list(&self, prefix: &str, delimiter: &str) -> Result<Listing, ListError> {
        let mut listing = Listing::default();
        let base = uri_list(self.manager.rsf_req_host(), &self.bucket, prefix, delimiter);
        let mut marker = String::new();

        loop {
            let raw_url = format!("{}{}", base, query_escape(&marker));
            let ret: ListFilesRet = match self.manager.credentialed_call_json(Method::POST, &raw_url).await {
                Ok(ret) => ret,
                Err(source) => {
                    tracing::warn!(
                        "Qiniu list failed after {} objects: prefix={}, error={}",
                        listing.objects.len(),
                        prefix,
                        source
                    );
                    return Err(ListError { partial: listing, source });
                }
            };

            listing.objects.extend(ret.items.unwrap_or_default().into_iter().map(|item| {
                StorageObject {
                    modified_at: item.modified_at(),
                    key: item.key,
                }
            }));
            listing
                .prefixes
                .extend(ret.common_prefixes.unwrap_or_default().into_iter().map(StorageCommonPrefix));

            if ret.marker.is_empty() {
                break;
            }
            marker = ret.marker;
        }

        tracing::debug!(
            "Qiniu list: prefix={}, objects={}, prefixes={}",
            prefix,
            listing.objects.len(),
            listing.prefixes.len()
        );
        Ok(listing)
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        let raw_url = format!("{}{}", self.manager.rs_req_host(), uri_delete(&self.bucket, key));
        self.manager.credentialed_call(Method::POST, &raw_url).await
    }

    /// Matches any error whose text contains `404`. `Api` errors render as
    /// `"<message> (http status N)"`, so an upload or management call that
    /// answered 404 counts as not-found too, not only a failed download.
    fn is_object_not_found_err(&self, err: &(dyn std::error::Error + 'static)) -> bool {
        err.to_string().contains("404")
    }

    fn stop(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::io::AsyncReadExt;
    use wiremock::matchers::{body_string_contains, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer) -> QiniuStorageConfig {
        QiniuStorageConfig {
            url: server.uri(),
            access_key_id: "ak".to_string(),
            secret_access_key: "sk".to_string(),
            bucket_name: "loki".to_string(),
            up_host: Some(server.uri()),
            rs_host: Some(server.uri()),
            rsf_host: Some(server.uri()),
            ..Default::default()
        }
    }

    fn page(marker: &str, keys: &[&str], prefixes: &[&str]) -> serde_json::Value {
        let items: Vec<serde_json::Value> = keys
            .iter()
            .map(|k| serde_json::json!({ "key": k, "hash": "h", "fsize": 1, "putTime": 16094592000000000i64 }))
            .collect();
        serde_json::json!({ "marker": marker, "items": items, "commonPrefixes": prefixes })
    }

    #[test]
    fn test_new_selects_zone() {
        let mut config = QiniuStorageConfig {
            url: "cdn.example.com".to_string(),
            access_key_id: "ak".to_string(),
            secret_access_key: "sk".to_string(),
            bucket_name: "loki".to_string(),
            ..Default::default()
        };
        let client = QiniuObjectStorage::new(config.clone()).unwrap();
        assert_eq!(client.uploader.up_host(), "http://up.qiniup.com");
        assert_eq!(client.manager.rs_req_host(), "http://rs-z0.qiniuapi.com");

        config.region = "z2".to_string();
        config.use_https = true;
        config.use_cdn = true;
        let client = QiniuObjectStorage::new(config.clone()).unwrap();
        assert_eq!(client.uploader.up_host(), "https://upload-z2.qiniup.com");
        assert_eq!(client.manager.rsf_req_host(), "https://rsf-z2.qiniuapi.com");

        config.region = "mars-1".to_string();
        assert!(matches!(QiniuObjectStorage::new(config), Err(StorageError::Config(_))));
    }

    #[test]
    fn test_object_url_modes() {
        let mut config = QiniuStorageConfig {
            url: "cdn.example.com".to_string(),
            access_key_id: "ak".to_string(),
            secret_access_key: "sk".to_string(),
            bucket_name: "loki".to_string(),
            ..Default::default()
        };
        let public = QiniuObjectStorage::new(config.clone()).unwrap();
        assert_eq!(public.object_url("a/b"), "http://cdn.example.com/a/b");
        assert_eq!(public.object_url("a/b"), public.object_url("a/b"));

        config.private = true;
        let private = QiniuObjectStorage::new(config).unwrap();
        let url = private.object_url("a/b");
        assert!(url.starts_with("http://cdn.example.com/a/b?e="));
        assert!(url.contains("&token=ak:"));
    }

    #[test]
    fn test_is_object_not_found_err() {
        let client = QiniuObjectStorage::new(QiniuStorageConfig {
            url: "cdn.example.com".to_string(),
            access_key_id: "ak".to_string(),
            secret_access_key: "sk".to_string(),
            bucket_name: "loki".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert!(client.is_object_not_found_err(&StorageError::Status { status: 404 }));
        assert!(!client.is_object_not_found_err(&StorageError::Status { status: 403 }));
        let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        assert!(!client.is_object_not_found_err(&reset));

        let api_missing = StorageError::Api { status: 404, message: "no such bucket".to_string() };
        assert!(client.is_object_not_found_err(&api_missing));
        let api_other = StorageError::Api { status: 612, message: "no such file or directory".to_string() };
        assert!(!client.is_object_not_found_err(&api_other));
    }

    #[test]
    fn test_content_length_fallback() {
        use reqwest::header::HeaderValue;

        let mut headers = HeaderMap::new();
        assert_eq!(content_length(&headers), 0);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("abc"));
        assert_eq!(content_length(&headers), 0);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("-1"));
        assert_eq!(content_length(&headers), 0);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("11"));
        assert_eq!(content_length(&headers), 11);
    }

    #[tokio::test]
    async fn test_put_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(body_string_contains("name=\"token\""))
            .and(body_string_contains("ak:"))
            .and(body_string_contains("name=\"key\""))
            .and(body_string_contains("chunk-1"))
            .and(body_string_contains("chunk payload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "hash": "Fh", "key": "chunk-1" })))
            .expect(2)
            .mount(&server)
            .await;

        let client = QiniuObjectStorage::new(test_config(&server)).unwrap();
        client
            .put_object("chunk-1", Box::new(Cursor::new(b"chunk payload".to_vec())))
            .await
            .unwrap();
        let token = client.tokens.get_or_refresh(&client.mac).unwrap();

        client
            .put_object("chunk-1", Box::new(Cursor::new(b"chunk payload".to_vec())))
            .await
            .unwrap();
        assert_eq!(client.tokens.get_or_refresh(&client.mac).unwrap(), token);
    }

    #[tokio::test]
    async fn test_put_object_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({ "error": "bad token" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = QiniuObjectStorage::new(test_config(&server)).unwrap();
        let err = client
            .put_object("chunk-1", Box::new(Cursor::new(vec![1u8, 2, 3])))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bad token (http status 401)");
    }

    #[tokio::test]
    async fn test_put_object_cancelled_by_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = QiniuObjectStorage::new(test_config(&server)).unwrap();
        let put = client.put_object("slow", Box::new(Cursor::new(vec![0u8; 16])));
        let result = tokio::time::timeout(Duration::from_millis(100), put).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fake/chunk-1"))
            .and(header("User-Agent", "storage"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello chunk".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let client = QiniuObjectStorage::new(test_config(&server)).unwrap();
        let (mut reader, size) = client.get_object("fake/chunk-1").await.unwrap();
        let mut body = Vec::new();
        reader.read_to_end(&mut body).await.unwrap();

        assert_eq!(size, 11);
        assert_eq!(body, b"hello chunk");
    }

    #[tokio::test]
    async fn test_get_object_private_link_is_signed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chunk"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
            .mount(&server)
            .await;

        let mut config = test_config(&server);
        config.private = true;
        let client = QiniuObjectStorage::new(config).unwrap();
        client.get_object("chunk").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let query = requests[0].url.query().unwrap_or_default().to_string();
        assert!(query.starts_with("e="));
        assert!(query.contains("&token=ak:"));
    }

    #[tokio::test]
    async fn test_get_object_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .expect(1)
            .mount(&server)
            .await;

        let client = QiniuObjectStorage::new(test_config(&server)).unwrap();
        let err = match client.get_object("missing").await {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        };
        assert_eq!(err.to_string(), "http status 404");
        assert!(client.is_object_not_found_err(&err));
    }

    #[tokio::test]
    async fn test_list_paginates_until_empty_marker() {
        let server = MockServer::start().await;
        let pages = [
            ("", page("m1", &["a/1", "a/2"], &["a/x/"])),
            ("m1", page("m2", &["a/3"], &[])),
            ("m2", page("m3", &[], &["a/y/"])),
            ("m3", page("", &["a/4"], &["a/z/"])),
        ];
        for (marker, body) in pages {
            Mock::given(method("POST"))
                .and(path("/list"))
                .and(query_param("bucket", "loki"))
                .and(query_param("prefix", "a/"))
                .and(query_param("delimiter", "/"))
                .and(query_param("limit", "1000"))
                .and(query_param("marker", marker))
                .and(header_exists("Authorization"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = QiniuObjectStorage::new(test_config(&server)).unwrap();
        let listing = client.list("a/", "/").await.unwrap();

        let keys: Vec<&str> = listing.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a/1", "a/2", "a/3", "a/4"]);
        let prefixes: Vec<&str> = listing.prefixes.iter().map(|p| p.as_str()).collect();
        assert_eq!(prefixes, vec!["a/x/", "a/y/", "a/z/"]);
        assert_eq!(server.received_requests().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_list_returns_partial_results_on_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/list"))
            .and(query_param("marker", ""))
            .respond_with(ResponseTemplate::new(200).set_body_json(page("m1", &["k1", "k2"], &["p/"])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/list"))
            .and(query_param("marker", "m1"))
            .respond_with(ResponseTemplate::new(599).set_body_json(serde_json::json!({ "error": "server error" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = QiniuObjectStorage::new(test_config(&server)).unwrap();
        let err = client.list("", "").await.unwrap_err();

        assert_eq!(err.partial.objects.len(), 2);
        assert_eq!(err.partial.prefixes, vec![StorageCommonPrefix("p/".to_string())]);
        assert_eq!(err.source.status(), Some(599));
    }

    #[tokio::test]
    async fn test_delete_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/delete/bG9raTpmYWtlL2NodW5rLTE="))
            .and(header("Content-Type", "application/x-www-form-urlencoded"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = QiniuObjectStorage::new(test_config(&server)).unwrap();
        client.delete_object("fake/chunk-1").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let auth = requests[0].headers.get("Authorization").unwrap().to_str().unwrap();
        assert!(auth.starts_with("Qiniu ak:"));
    }

    #[tokio::test]
    async fn test_delete_object_error_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(612).set_body_json(serde_json::json!({ "error": "no such file or directory" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = QiniuObjectStorage::new(test_config(&server)).unwrap();
        let err = client.delete_object("gone").await.unwrap_err();
        assert!(matches!(err, StorageError::Api { status: 612, .. }));
        assert!(!client.is_object_not_found_err(&err));
    }
}
