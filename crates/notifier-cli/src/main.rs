use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use notifier_core::domain::{CourseOfferingId, FacilitatorId};
use notifier_core::impls::{
    DEFAULT_QUEUE_KEY, HttpMailer, LogMailer, PgDirectory, RedisEventQueue,
};
use notifier_core::ports::Mailer;
use notifier_core::{NotificationService, NotifierBuilder, NotifierConfig};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// RUST_LOG 未設定時のフィルタ
const DEFAULT_LOG_FILTER: &str = "notifier=info,notifier_core=info";

#[derive(Parser)]
#[command(name = "notifier")]
#[command(about = "Activity log notifications for the course management platform", long_about = None)]
struct Cli {
    /// Postgres holding facilitators, course offerings and activity trackers
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    redis_url: String,

    /// Redis list used as the notification queue
    #[arg(long, env = "NOTIFY_QUEUE", default_value = DEFAULT_QUEUE_KEY)]
    queue_key: String,

    /// Recipient of submission notices and overdue alerts
    #[arg(long, env = "MANAGER_EMAIL", default_value = notifier_core::config::DEFAULT_MANAGER_ADDRESS)]
    manager_email: String,

    /// HTTP mail API endpoint. Without it mail is only logged.
    #[arg(long, env = "MAIL_API_URL")]
    mail_api_url: Option<String>,

    #[arg(long, env = "MAIL_API_KEY", default_value = "", hide_env_values = true)]
    mail_api_key: String,

    #[arg(long, env = "MAIL_FROM", default_value = "noreply@example.com")]
    mail_from: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dispatch worker and the hourly overdue scan until Ctrl+C
    Run,
    /// Run one overdue sweep now and print the report
    Sweep,
    /// Queue an activity-log-submitted notification
    Submit {
        #[arg(long)]
        facilitator: FacilitatorId,
        #[arg(long)]
        offering: CourseOfferingId,
        #[arg(long)]
        week: u32,
    },
    /// Print the number of queued notifications
    Depth,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env は任意
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let service = build_service(&cli).await?;

    match cli.command {
        Commands::Run => {
            let worker = service.spawn_worker();
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl+C")?;
            info!("Ctrl+C received, draining worker");
            let counts = worker.shutdown_and_join().await;
            info!(?counts, "worker finished");
        }
        Commands::Sweep => {
            let report = service.scanner().sweep().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Submit {
            facilitator,
            offering,
            week,
        } => {
            service
                .notifier()
                .activity_log_submitted(facilitator, offering, week)
                .await?;
            println!("Queued submission notice for week {week}.");
        }
        Commands::Depth => {
            let depth = service.queue_depth().await?;
            println!("{depth}");
        }
    }

    Ok(())
}

fn notifier_config(cli: &Cli) -> NotifierConfig {
    NotifierConfig::default()
        .with_manager_address(cli.manager_email.clone())
        .with_queue_key(cli.queue_key.clone())
}

async fn build_service(cli: &Cli) -> anyhow::Result<NotificationService> {
    // 接続は最初のクエリまで遅延（depth / submit は DB を触らない）
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_lazy(&cli.database_url)
        .context("invalid DATABASE_URL")?;

    let config = notifier_config(cli);
    let queue = RedisEventQueue::from_config(&cli.redis_url, &config)
        .await
        .context("failed to connect to Redis")?;

    let mailer: Arc<dyn Mailer> = match &cli.mail_api_url {
        Some(endpoint) => {
            if cli.mail_api_key.is_empty() {
                warn!("MAIL_API_URL set without MAIL_API_KEY");
            }
            Arc::new(
                HttpMailer::new(endpoint.clone(), cli.mail_api_key.clone(), cli.mail_from.clone())
                    .context("failed to set up mail client")?,
            )
        }
        None => {
            warn!("MAIL_API_URL not set, notifications will only be logged");
            Arc::new(LogMailer)
        }
    };

    NotifierBuilder::new()
        .config(config)
        .queue(Arc::new(queue))
        .directory(Arc::new(PgDirectory::new(pool)))
        .mailer(mailer)
        .build()
        .context("invalid notifier configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_log_filter_parses() {
        assert!(DEFAULT_LOG_FILTER.parse::<tracing_subscriber::EnvFilter>().is_ok());
    }

    #[test]
    fn queue_key_flag_reaches_the_config() {
        let cli = Cli::try_parse_from([
            "notifier",
            "--database-url",
            "postgres://localhost/platform",
            "--queue-key",
            "platform:notifications",
            "depth",
        ])
        .unwrap();

        let config = notifier_config(&cli);
        assert_eq!(config.queue_key, "platform:notifications");
        assert!(matches!(cli.command, Commands::Depth));
    }
}
