use crate::cli::ServeArgs;
use crate::config::{read_secret, Config, OwnersSourceKind};
use crate::dispatch::Dispatcher;
use crate::error::ConfigError;
use crate::github::{GitHubClient, GitHubClientConfig};
use crate::owners::{GitHubOwnersSource, LocalOwnersSource, OwnersSource};
use crate::webhook::{self, AppState};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn execute(config_path: &Path, args: ServeArgs) -> anyhow::Result<()> {
    info!("Loading config from {:?}", config_path);
    let mut config = Config::load_or_default(config_path)?;

    // Apply CLI overrides
    if let Some(dry_run) = args.dry_run {
        config.github.dry_run = dry_run;
    }
    if let Some(path) = args.hmac_secret_file {
        config.server.hmac_secret_file = path;
    }
    config.validate()?;

    let mut addr = config.socket_addr()?;
    if let Some(port) = args.port {
        addr.set_port(port);
    }

    let secret = read_secret(&config.server.hmac_secret_file)?;
    let token = read_secret(&config.github.token_file)?;

    let client = Arc::new(GitHubClient::new(GitHubClientConfig {
        api_url: config.github.api_url.clone(),
        token,
        timeout_secs: config.github.timeout_sec,
        dry_run: config.github.dry_run,
    })?);
    if client.dry_run() {
        warn!("DRY RUN - review requests will be logged, not sent");
    }

    let owners: Arc<dyn OwnersSource> = match config.owners.source {
        OwnersSourceKind::Github => Arc::new(GitHubOwnersSource::new(
            client.clone(),
            config.owners.filename.clone(),
            config.owners.aliases_filename.clone(),
            config.owners.fetch_concurrency,
        )),
        OwnersSourceKind::Local => {
            let root = config
                .owners
                .local_root
                .clone()
                .ok_or(ConfigError::MissingLocalRoot)?;
            Arc::new(LocalOwnersSource::new(
                root,
                config.owners.filename.clone(),
                config.owners.aliases_filename.clone(),
            ))
        }
    };
    info!(
        "Reading {} files from {}",
        config.owners.filename, config.owners.source
    );
    info!("{}", config.blunderbuss.describe());

    let dispatcher = Dispatcher::new(client, owners, config.blunderbuss.clone())
        .with_max_concurrency(config.server.max_concurrent_handlers);

    webhook::serve(addr, AppState::new(Arc::new(dispatcher), secret)).await?;
    Ok(())
}
