mod config;
mod sink;
mod watcher;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mailwatch_core::{Account, AccountSource, TargetId};
use mailwatch_mail::MailboxConnection;

use crate::config::{StaticAccountSource, TomlAccountSource, env_descriptor, load_config};
use crate::sink::LogSink;
use crate::watcher::MailWatcher;

#[derive(Parser)]
#[command(name = "mailwatch", about = "Polls IMAP mailboxes and emits new-mail notifications")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "mailwatch.toml")]
    config: PathBuf,

    /// Validate the configured accounts, report, and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MAILWATCH_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let loaded = load_config(&cli.config);

    let descriptors = if loaded.accounts.is_empty() {
        match env_descriptor() {
            Some(descriptor) => {
                info!("no accounts in config file, using environment account");
                vec![descriptor]
            }
            None => anyhow::bail!(
                "no accounts configured: add an accounts entry to {} \
                 or set MAILWATCH_HOST/MAILWATCH_USER/MAILWATCH_SECRET",
                cli.config.display()
            ),
        }
    } else {
        loaded.accounts.clone()
    };

    report_account_status(&descriptors).await;
    if cli.once {
        return Ok(());
    }

    let accounts: Arc<dyn AccountSource> = if loaded.accounts.is_empty() {
        Arc::new(StaticAccountSource::new(descriptors))
    } else {
        Arc::new(TomlAccountSource::new(cli.config.clone()))
    };

    let watcher = MailWatcher::new(accounts, Arc::new(LogSink), loaded.config);
    watcher.add_target(TargetId("log".to_string()));
    watcher.start();

    info!("watching, press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    watcher.stop().await;
    Ok(())
}

/// One-shot reachability report. Purely informational: an unreachable
/// account still gets a poller and is retried every cycle.
async fn report_account_status(descriptors: &[String]) {
    for descriptor in descriptors {
        match Account::parse(descriptor) {
            Ok(account) => {
                let user = account.user.clone();
                let checked =
                    tokio::task::spawn_blocking(move || MailboxConnection::test_connection(&account))
                        .await;
                match checked {
                    Ok((true, _)) => info!(user = %user, "account reachable"),
                    Ok((false, detail)) => {
                        warn!(user = %user, detail = %detail.unwrap_or_default(), "account unreachable")
                    }
                    Err(err) => warn!(user = %user, error = %err, "account check did not finish"),
                }
            }
            // The descriptor may hold a secret; log only the parse error.
            Err(err) => warn!(error = %err, "malformed account descriptor"),
        }
    }
}
