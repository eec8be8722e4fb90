use chrono::Utc;

/// Stamps the build time shown by `qiniu-chunk --version`
/// 记录构建时间，供 `qiniu-chunk --version` 显示
fn main() {
    let built_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    println!("cargo:rustc-env=BUILD_TIME={}", built_at);
    println!("cargo:rerun-if-changed=build.rs");
}
