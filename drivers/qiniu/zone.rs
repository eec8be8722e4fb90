//! Qiniu storage regions / 七牛存储区域

/// Hosts serving one region / 区域域名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub id: &'static str,
    pub src_up_host: &'static str,
    pub cdn_up_host: &'static str,
    pub rs_host: &'static str,
    pub rsf_host: &'static str,
}

/// 华东 (default region)
pub const ZONE_HUADONG: Zone = Zone {
    id: "z0",
    src_up_host: "up.qiniup.com",
    cdn_up_host: "upload.qiniup.com",
    rs_host: "rs-z0.qiniuapi.com",
    rsf_host: "rsf-z0.qiniuapi.com",
};

/// 华北
pub const ZONE_HUABEI: Zone = Zone {
    id: "z1",
    src_up_host: "up-z1.qiniup.com",
    cdn_up_host: "upload-z1.qiniup.com",
    rs_host: "rs-z1.qiniuapi.com",
    rsf_host: "rsf-z1.qiniuapi.com",
};

/// 华南
pub const ZONE_HUANAN: Zone = Zone {
    id: "z2",
    src_up_host: "up-z2.qiniup.com",
    cdn_up_host: "upload-z2.qiniup.com",
    rs_host: "rs-z2.qiniuapi.com",
    rsf_host: "rsf-z2.qiniuapi.com",
};

/// 北美
pub const ZONE_BEIMEI: Zone = Zone {
    id: "na0",
    src_up_host: "up-na0.qiniup.com",
    cdn_up_host: "upload-na0.qiniup.com",
    rs_host: "rs-na0.qiniuapi.com",
    rsf_host: "rsf-na0.qiniuapi.com",
};

/// 新加坡
pub const ZONE_XINJIAPO: Zone = Zone {
    id: "as0",
    src_up_host: "up-as0.qiniup.com",
    cdn_up_host: "upload-as0.qiniup.com",
    rs_host: "rs-as0.qiniuapi.com",
    rsf_host: "rsf-as0.qiniuapi.com",
};

/// 华东-浙江2
pub const ZONE_HUADONG_ZHEJIANG2: Zone = Zone {
    id: "cn-east-2",
    src_up_host: "up-cn-east-2.qiniup.com",
    cdn_up_host: "upload-cn-east-2.qiniup.com",
    rs_host: "rs-cn-east-2.qiniuapi.com",
    rsf_host: "rsf-cn-east-2.qiniuapi.com",
};

static ZONES: [&Zone; 6] = [
    &ZONE_HUADONG,
    &ZONE_HUABEI,
    &ZONE_HUANAN,
    &ZONE_BEIMEI,
    &ZONE_XINJIAPO,
    &ZONE_HUADONG_ZHEJIANG2,
];

/// Look up a region by its id / 根据区域ID查找区域
pub fn region_by_id(id: &str) -> Option<&'static Zone> {
    ZONES.iter().copied().find(|zone| zone.id == id)
}

impl Zone {
    /// Upload host, CDN-accelerated or source / 上传域名
    pub fn up_host(&self, use_cdn: bool) -> &'static str {
        if use_cdn {
            self.cdn_up_host
        } else {
            self.src_up_host
        }
    }
}

/// Apply the configured scheme to a host, replacing any scheme it carries
/// 为域名加上协议前缀
pub fn endpoint(use_https: bool, host: &str) -> String {
    let host = host.trim();
    let host = host
        .strip_prefix("http://")
        .or_else(|| host.strip_prefix("https://"))
        .unwrap_or(host)
        .trim_end_matches('/');
    if use_https {
        format!("https://{}", host)
    } else {
        format!("http://{}", host)
    }
}
