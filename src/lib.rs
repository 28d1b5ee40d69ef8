pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, NoteCommands, TicketCommands};
pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Failed to load .env: {e}");
    }

    let config = Config::load()?;
    config.validate()?;

    let cli = Cli::parse();
    let serving = matches!(cli.command, Some(Commands::Serve));

    let prometheus_handle = if serving && config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config, serving)?;

    match cli.command {
        Some(Commands::Serve) => serve(config, prometheus_handle).await,

        Some(Commands::Init) => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists, leaving it untouched.");
            }
            Ok(())
        }

        Some(Commands::Register {
            name,
            email,
            password,
            remote,
        }) => cli::cmd_register(&remote, &name, &email, &password).await,

        Some(Commands::Login {
            email,
            password,
            remote,
        }) => cli::cmd_login(&remote, &email, &password).await,

        Some(Commands::Whoami { remote }) => cli::cmd_whoami(&remote).await,

        Some(Commands::Passwd {
            current_password,
            new_password,
            remote,
        }) => cli::cmd_passwd(&remote, &current_password, &new_password).await,

        Some(Commands::RotateKey { remote }) => cli::cmd_rotate_key(&remote).await,

        Some(Commands::Tickets { command, remote }) => match command {
            TicketCommands::List => cli::cmd_ticket_list(&remote).await,
            TicketCommands::Show { id } => cli::cmd_ticket_show(&remote, id).await,
            TicketCommands::Create {
                product,
                description,
            } => cli::cmd_ticket_create(&remote, &product, &description.join(" ")).await,
            TicketCommands::Close { id } => cli::cmd_ticket_close(&remote, id).await,
            TicketCommands::Delete { id } => cli::cmd_ticket_delete(&remote, id).await,
        },

        Some(Commands::Notes { command, remote }) => match command {
            NoteCommands::List { ticket_id } => cli::cmd_notes_list(&remote, ticket_id).await,
            NoteCommands::Add { ticket_id, text } => {
                cli::cmd_notes_add(&remote, ticket_id, &text.join(" ")).await
            }
        },

        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

/// Installs the global subscriber. Remote CLI commands only log warnings
/// unless `RUST_LOG` says otherwise.
fn init_tracing(config: &Config, serving: bool) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = if serving {
        config.general.log_level.as_str()
    } else {
        "warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if serving && config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder
            .extra_field("pid", std::process::id().to_string())?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

async fn serve(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Helpdesk v{} starting...", env!("CARGO_PKG_VERSION"));

    if config.security.min_password_length < 8 {
        warn!(
            "security.min_password_length is {}, passwords shorter than 8 characters are weak",
            config.security.min_password_length
        );
    }

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let api_state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(api_state).await;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("🌐 Web Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
