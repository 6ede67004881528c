use actix_web::{web, App, HttpServer};
use anyhow::{bail, Context, Result};
use blog_service::db::{self, column_repo};
use blog_service::handlers;
use blog_service::media::MediaStore;
use blog_service::middleware::{JwtAuthMiddleware, MetricsMiddleware};
use blog_service::Config;
use db_pool::DbConfig;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Blog Service
///
/// # Routes
///
/// - `/`, `/article/*` - Listing, detail, authoring, likes and columns
/// - `/comment/*` - Comments and replies
/// - `/health`, `/metrics` - Operations
///
/// # Commands
///
/// - `blog-service` - run the HTTP server
/// - `blog-service create-column <title>` - add a column and exit
#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!(env = %config.app.env, "Starting blog-service");

    let mut db_config = DbConfig::for_service("blog-service");
    db_config.database_url = config.database.url.clone();
    db_config.max_connections = config.database.max_connections;
    db_config.log_config();

    let pool = db::connect(db_config)
        .await
        .context("Failed to initialize database")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(command) = args.first() {
        return match command.as_str() {
            "create-column" => {
                let title = args[1..].join(" ");
                let title = title.trim();
                if title.is_empty() || title.chars().count() > 100 {
                    bail!("usage: blog-service create-column <title> (1 to 100 characters)");
                }
                let column = column_repo::create_column(&pool, title, chrono::Utc::now())
                    .await
                    .context("Failed to create column")?;
                println!("Created column {} ({})", column.id, column.title);
                Ok(())
            }
            other => bail!("unknown command '{}'", other),
        };
    }

    tokio::fs::create_dir_all(&config.media.root)
        .await
        .with_context(|| format!("Failed to create media root {:?}", config.media.root))?;
    let media = MediaStore::new(config.media.root.clone(), config.media.url.clone());

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    let workers = config.app.workers;
    let jwt_secret = config.auth.jwt_secret.clone();

    let pool_data = web::Data::new(pool.clone());
    let config_data = web::Data::new(config);
    let media_data = web::Data::new(media);

    info!("Starting HTTP server on {}", bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .app_data(config_data.clone())
            .app_data(media_data.clone())
            .wrap(JwtAuthMiddleware::new(&jwt_secret))
            .wrap(MetricsMiddleware)
            .wrap(TracingLogger::default())
            .configure(handlers::configure)
    })
    .workers(workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    let handle = server.handle();
    tokio::select! {
        result = server => {
            result.context("HTTP server error")?;
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping HTTP server");
            handle.stop(true).await;
        }
    }

    pool.close().await;
    info!("blog-service stopped");
    Ok(())
}
