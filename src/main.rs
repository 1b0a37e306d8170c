use anyhow::{Context, Result, bail};
use ms3_client::{
    ClientBuilder, ObjectMetadata, ObjectStoreClient, routes::routes::app,
    services::storage_service::StorageService,
};
use std::io::ErrorKind;
use tokio::{io::AsyncWriteExt, net::TcpListener};
use tracing_subscriber::EnvFilter;

mod config;

use config::{AppConfig, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // --- Parse config + command ---
    let (cfg, command) = AppConfig::from_env_and_args()?;
    tracing::debug!("Running {:?} with config: {:?}", command, cfg);

    if let Command::Serve = command {
        return serve(&cfg).await;
    }

    let mut builder = ClientBuilder::standard();
    if let Some(url) = &cfg.server_url {
        builder = builder.server_url(url);
    }
    let client = builder.build().context("configuring ms3 client")?;

    run(&client, command).await
}

async fn run(client: &ObjectStoreClient, command: Command) -> Result<()> {
    match command {
        Command::Buckets => {
            for bucket in client.list_buckets().await? {
                let created = bucket
                    .creation_date
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_else(|| "-".into());
                println!("{}\t{}", created, bucket.name);
            }
        }
        Command::CreateBucket { name } => {
            let bucket = client.create_bucket(&name).await?;
            println!("created {}", bucket.name);
        }
        Command::Ls { bucket, prefix } => {
            for object in client.list_objects(&bucket, prefix.as_deref()).await? {
                println!(
                    "{}\t{:>12}\t{}",
                    object.last_modified.to_rfc3339(),
                    object.size,
                    object.key
                );
            }
        }
        Command::Stat { bucket, key } => {
            let metadata = client.get_object_metadata(&bucket, &key).await?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Command::Get {
            bucket,
            key,
            output: Some(path),
        } => {
            client.get_object_to_file(&bucket, &key, &path).await?;
            tracing::info!("Saved {}/{} to {}", bucket, key, path.display());
        }
        Command::Get {
            bucket,
            key,
            output: None,
        } => {
            let mut content = client.get_object(&bucket, &key).await?.into_content();
            let mut stdout = tokio::io::stdout();
            tokio::io::copy(&mut content, &mut stdout).await?;
            stdout.flush().await?;
        }
        Command::Put {
            bucket,
            key,
            file,
            content,
            meta,
            content_type,
        } => {
            let mut metadata = ObjectMetadata::new();
            for (k, v) in meta {
                metadata.add_user_metadata(k, v);
            }
            if let Some(content_type) = content_type {
                metadata.set_content_type(content_type);
            }

            let result = match (file, content) {
                (Some(path), _) => {
                    let len = tokio::fs::metadata(&path)
                        .await
                        .with_context(|| format!("reading {}", path.display()))?
                        .len();
                    metadata.set_content_length(len);
                    client
                        .put_object_from_file(&bucket, &key, &path, Some(&metadata))
                        .await?
                }
                (None, Some(text)) => {
                    metadata.set_content_length(text.len() as u64);
                    if metadata.content_type().is_none() {
                        metadata.set_content_type("text/plain");
                    }
                    client
                        .put_object(&bucket, &key, std::io::Cursor::new(text.into_bytes()), Some(&metadata))
                        .await?
                }
                (None, None) => bail!("put needs --file or --content"),
            };
            println!("stored {}/{} etag={}", bucket, key, result.etag.as_deref().unwrap_or("-"));
        }
        Command::Url { bucket, key } => match client.get_access_url(&bucket, &key).await {
            Some(url) => println!("{}", url),
            None => bail!("no access url available for {}/{}", bucket, key),
        },
        Command::Serve => bail!("`serve` does not talk to a server"),
    }

    Ok(())
}

async fn serve(cfg: &AppConfig) -> Result<()> {
    let app = app(StorageService::new());

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("MS3 reference server listening on http://{}/", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
