use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qiniu_chunk_client::config;
use qiniu_chunk_client::{create_object_client, ObjectClient, QiniuStorageConfig};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")");

/// Qiniu chunk object client / 七牛对象存储命令行工具
#[derive(Parser)]
#[command(name = "qiniu-chunk", version, long_version = LONG_VERSION)]
struct Cli {
    /// Config file path / 配置文件路径
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a config template / 生成配置模板
    InitConfig,
    /// Upload a local file / 上传文件
    Put { key: String, file: PathBuf },
    /// Download an object (stdout when no output file) / 下载对象
    Get { key: String, output: Option<PathBuf> },
    /// List objects / 列举对象
    List {
        #[arg(long, default_value = "")]
        prefix: String,
        #[arg(long, default_value = "")]
        delimiter: String,
    },
    /// Delete an object / 删除对象
    Delete { key: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qiniu_chunk_client=debug,qiniu_chunk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Command::InitConfig = cli.command {
        if cli.config.exists() {
            return Err(anyhow!("Config file already exists: {:?}", cli.config));
        }
        config::save_config(&cli.config, &QiniuStorageConfig::default())?;
        tracing::info!("Created config template at {:?}", cli.config);
        return Ok(());
    }

    let storage_config = config::load_config(&cli.config)?;
    let client = create_object_client(storage_config)?;

    let result = run(client.as_ref(), cli.command).await;
    client.stop();

    if let Err(e) = &result {
        if client.is_object_not_found_err(&**e) {
            return Err(anyhow!("Object not found: {}", e));
        }
    }
    result
}

async fn run(client: &dyn ObjectClient, command: Command) -> anyhow::Result<()> {
    match command {
        Command::InitConfig => {}
        Command::Put { key, file } => {
            let content = tokio::fs::File::open(&file)
                .await
                .with_context(|| format!("Failed to open {:?}", file))?;
            client.put_object(&key, Box::new(content)).await?;
            tracing::info!("Uploaded {:?} as {}", file, key);
        }
        Command::Get { key, output } => {
            let (mut reader, size) = client.get_object(&key).await?;
            let copied = match output {
                Some(path) => {
                    let mut file = tokio::fs::File::create(&path).await?;
                    let n = tokio::io::copy(&mut reader, &mut file).await?;
                    file.flush().await?;
                    n
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    let n = tokio::io::copy(&mut reader, &mut stdout).await?;
                    stdout.flush().await?;
                    n
                }
            };
            tracing::info!("Downloaded {}: {} bytes (content-length {})", key, copied, size);
        }
        Command::List { prefix, delimiter } => {
            let listing = client.list(&prefix, &delimiter).await.map_err(|e| {
                tracing::warn!(
                    "Listing incomplete, {} objects fetched before the failure",
                    e.partial.objects.len()
                );
                e
            })?;
            for p in &listing.prefixes {
                println!("{}", p.as_str());
            }
            for obj in &listing.objects {
                println!("{}\t{}", obj.modified_at.to_rfc3339(), obj.key);
            }
        }
        Command::Delete { key } => {
            client.delete_object(&key).await?;
            tracing::info!("Deleted {}", key);
        }
    }
    Ok(())
}
