pub mod api;
pub mod config;
pub mod crypto;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use std::path::Path;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "skyguard")?
            .extra_field("env", "production")?
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

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "serve" | "-s" | "--serve" => run_server(config, prometheus_handle).await,

        "keygen" => cmd_keygen(&config),

        "adduser" => {
            if args.len() < 5 {
                println!("Usage: skyguard adduser <username> <password> <role_level> [email]");
                println!("Role levels: -1 admin, 0 leadership, 1 command center,");
                println!("             2 department head, 3 officer");
                return Ok(());
            }
            let role_level: i32 = args[4]
                .parse()
                .context("role_level must be an integer between -1 and 3")?;
            let email = args.get(5).cloned();
            cmd_adduser(&config, &args[2], &args[3], role_level, email).await
        }

        "init" | "--init" => {
            let path = Config::create_default_if_missing()?;
            println!("✓ Config file ready at {}.", path.display());
            println!("  Set security.session_secret and security.data_key_hex,");
            println!("  then run `skyguard keygen` and `skyguard serve`.");
            Ok(())
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    config.validate()?;

    info!("Skyguard v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;
    let state = api::create_app_state_from_config(config, prometheus_handle).await?;

    let app = api::router(state).await;
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server running at http://{addr}");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {e}");
        }
    });

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {e}"),
    }

    server.abort();
    info!("Server stopped");

    Ok(())
}

fn cmd_keygen(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.security.private_key_path);

    if path.exists() {
        println!(
            "Private key already exists at {}; refusing to overwrite.",
            path.display()
        );
        return Ok(());
    }

    println!("Generating 2048-bit RSA key pair (this can take a few seconds)...");
    let key = crypto::envelope::generate_private_key()?;
    crypto::envelope::write_private_key_pem(&key, path)?;

    println!("✓ Private key written to {}", path.display());
    Ok(())
}

async fn cmd_adduser(
    config: &Config,
    username: &str,
    password: &str,
    role_level: i32,
    email: Option<String>,
) -> anyhow::Result<()> {
    use models::Role;

    if Role::from_level(role_level).is_none() {
        anyhow::bail!("Unknown role level: {role_level} (expected -1..=3)");
    }
    if password.len() < 8 {
        anyhow::bail!("Password must be at least 8 characters");
    }

    let store = db::Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    if store.get_user_by_username(username).await?.is_some() {
        anyhow::bail!("Username '{username}' is already taken");
    }

    let user = store
        .create_user(username, password, role_level, email)
        .await?;

    println!(
        "✓ Created user '{}' (id {}, role level {})",
        user.username, user.id, user.role_level
    );
    Ok(())
}

fn print_help() {
    println!("Skyguard - Emergency Incident Coordination Backend");
    println!();
    println!("USAGE:");
    println!("  skyguard <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("  serve             Run the API server");
    println!("  keygen            Generate the RSA private key used for session tokens");
    println!("  adduser <username> <password> <role_level> [email]");
    println!("                    Create an account from the command line");
    println!("  init              Create a default config file");
    println!("  help              Show this help message");
    println!();
    println!("ROLE LEVELS:");
    println!("  -1 admin, 0 leadership, 1 command center, 2 department head, 3 officer");
    println!();
    println!("CONFIG:");
    println!("  Edit skyguard.toml. Secrets may also come from the environment:");
    println!("  SKYGUARD_SESSION_SECRET, SKYGUARD_DATA_KEY.");
}
