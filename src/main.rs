use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use gallerist::{
    Config, create_app,
    gallery::{Gallery, ImageId, SortKey, SortOutcome},
    session, startup_checks,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server (default if no command specified)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,

        /// Automatically quit after specified number of seconds (useful for testing)
        #[arg(long)]
        quit_after: Option<u64>,
    },

    /// Manage galleries
    #[command(subcommand)]
    Gallery(GalleryCommands),

    /// Manage uploaded image metadata
    #[command(subcommand)]
    Attachments(AttachmentCommands),

    /// Issue login sessions
    #[command(subcommand)]
    Session(SessionCommands),
}

#[derive(Subcommand, Debug)]
enum GalleryCommands {
    /// List all galleries
    List,
    /// Replace a gallery's image list, in the given order
    SetImages {
        id: u64,
        #[arg(required = true)]
        images: Vec<i64>,
    },
    /// Save a sort selection, reordering the images when it changed
    Sort {
        id: u64,
        /// One of drag_n_drop, filename_asc/desc, shoot_date_asc/desc,
        /// file_date_asc/desc, upload_date_asc/desc
        key: String,
    },
    /// Move legacy image entries into the image lists
    Migrate,
}

#[derive(Subcommand, Debug)]
enum AttachmentCommands {
    /// List known attachments
    List,
    /// Register the images found under a directory
    Scan {
        directory: PathBuf,
        /// Prefix for the stored image locations
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum SessionCommands {
    /// Print a signed auth cookie for a user
    Issue { username: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging first
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli.config)?;

    match cli.command {
        Some(Commands::Gallery(cmd)) => handle_gallery_command(&config, cmd).await,
        Some(Commands::Attachments(cmd)) => handle_attachment_command(&config, cmd).await,
        Some(Commands::Session(cmd)) => handle_session_command(&config, cmd),
        Some(Commands::Serve {
            port,
            host,
            quit_after,
        }) => run_server(config, port, host, quit_after).await,
        None => {
            // Default to serve command if no subcommand specified
            run_server(config, None, None, None).await
        }
    }
}

fn load_config(config_path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if config_path.exists() {
        let config_content = std::fs::read_to_string(config_path)?;
        info!("Configuration loaded from: {:?}", config_path);
        Ok(toml_edit::de::from_str::<Config>(&config_content)?)
    } else {
        info!("Config file not found at {:?}, using defaults", config_path);
        Ok(Config::default())
    }
}

async fn handle_gallery_command(
    config: &Config,
    cmd: GalleryCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    let gallery = Gallery::load(&config.storage).await?;

    match cmd {
        GalleryCommands::List => {
            let summaries = gallery.summaries().await;
            if summaries.is_empty() {
                println!("No galleries");
            }
            for summary in summaries {
                println!(
                    "  {:>5}  {:<30} {:>4} images  sorting: {}",
                    summary.id, summary.title, summary.image_count, summary.sorting
                );
            }
        }
        GalleryCommands::SetImages { id, images } => {
            let images = gallery
                .replace_images(id, images.into_iter().map(ImageId).collect())
                .await?;
            println!("Gallery {} now has {} images", id, images.len());
        }
        GalleryCommands::Sort { id, key } => {
            if key.parse::<SortKey>().is_err() {
                eprintln!(
                    "Warning: '{}' is not a known sort key, image order will not change",
                    key
                );
            }
            match gallery.update_sorting(id, &key).await? {
                SortOutcome::Sorted(images) => {
                    let ids: Vec<String> = images.iter().map(ImageId::to_string).collect();
                    println!("Gallery {} sorted by {}: {}", id, key, ids.join(", "));
                }
                SortOutcome::Skipped(reason) => {
                    println!("Gallery {} sorting set to {} ({:?})", id, key, reason);
                }
            }
        }
        GalleryCommands::Migrate => {
            let migrated = gallery.migrate_legacy_images().await?;
            println!("Migrated legacy images for {} galleries", migrated);
        }
    }

    Ok(())
}

async fn handle_attachment_command(
    config: &Config,
    cmd: AttachmentCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    let gallery = Gallery::load(&config.storage).await?;

    match cmd {
        AttachmentCommands::List => {
            let attachments = gallery.attachments().await;
            if attachments.is_empty() {
                println!("No attachments");
            }
            for (id, attachment) in attachments.iter() {
                println!("  {:>5}  {}", id, attachment.location);
            }
        }
        AttachmentCommands::Scan {
            directory,
            base_url,
        } => {
            let base_url = base_url.or_else(|| config.app.base_url.clone());
            let registered = gallery.scan_attachments(&directory, base_url).await?;
            println!(
                "Registered {} new attachments from {:?}",
                registered.len(),
                directory
            );
        }
    }

    Ok(())
}

fn handle_session_command(
    config: &Config,
    cmd: SessionCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        SessionCommands::Issue { username } => {
            let username = username.trim().to_lowercase();
            let cookie = session::auth_cookie_pair(&config.app.session_secret, &username)?;
            println!("{}", cookie);
        }
    }

    Ok(())
}

async fn run_server(
    config: Config,
    port: Option<u16>,
    host: Option<String>,
    quit_after: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = host.unwrap_or(config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!("Starting {} server", config.app.name);
    info!("Galleries file: {:?}", config.storage.galleries_file);
    info!("Attachments file: {:?}", config.storage.attachments_file);
    info!("Likes file: {:?}", config.storage.likes_file);

    match startup_checks::perform_startup_checks(&config).await {
        Ok(()) => info!("All startup checks passed"),
        Err(errors) => {
            for error in &errors {
                tracing::error!("Startup check failed: {}", error);
            }

            if errors.iter().any(|e| e.is_critical()) {
                tracing::error!("Critical startup check failed, exiting");
                return Err("Critical startup check failed".into());
            } else {
                tracing::warn!("Non-critical startup checks failed, continuing");
            }
        }
    }

    let app = create_app(config).await?;

    let addr = SocketAddr::from((host.parse::<std::net::IpAddr>()?, port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, app);
    let graceful = server.with_graceful_shutdown(shutdown_signal(quit_after));

    if let Err(e) = graceful.await {
        tracing::error!("Server error: {}", e);
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(quit_after: Option<u64>) {
    use tokio::signal;
    use tokio::time::{Duration, sleep};

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let quit_timer = async {
        if let Some(seconds) = quit_after {
            info!(
                "Server will automatically shut down after {} seconds",
                seconds
            );
            sleep(Duration::from_secs(seconds)).await;
            info!("Quit timer expired, shutting down");
        } else {
            std::future::pending::<()>().await
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        },
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        },
        _ = quit_timer => {},
    }
}
