use anyhow::Result;
use campreview::{app, CampreviewConfig, CameraProviderBuilder, RunOptions};
use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "campreview")]
#[command(about = "Camera preview with still capture to the pictures folder")]
#[command(version)]
#[command(long_about = "Opens a camera, streams a live preview to a surface and saves \
still pictures as timestamped JPEG files under <pictures>/MyCameraApp. \
Press SPACE to take a picture, r to rotate, p to pause/resume and q to quit.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "campreview.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<String>,

    /// Override the camera backend (mock, gstreamer)
    #[arg(long, value_name = "BACKEND")]
    backend: Option<String>,

    /// Take this many pictures once preview is running, then exit
    #[arg(long, value_name = "N")]
    snap: Option<u32>,

    /// Do not read shutter/rotate/quit keys from the terminal
    #[arg(long)]
    no_keyboard: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let _log_guard = init_logging(&args)?;

    info!("Starting campreview v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match CampreviewConfig::load_validated(&args.config, args.backend.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            if args.validate_config {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
            return Err(e.into());
        }
    };

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    if args.snap.is_some() && !config.capture.enabled {
        anyhow::bail!("--snap needs capture.enabled = true");
    }

    let provider = CameraProviderBuilder::new()
        .config(config.camera.clone())
        .build()
        .map_err(|e| {
            error!("Failed to set up camera backend: {}", e);
            e
        })?;

    let options = RunOptions {
        keyboard: !args.no_keyboard && args.snap.is_none(),
        snap: args.snap,
    };

    let stats = app::run(config, provider, options).await.map_err(|e| {
        error!("System error during execution: {}", e);
        e
    })?;

    info!(
        "Campreview exited: {} picture(s) saved, {} failed capture(s)",
        stats.pictures_saved, stats.captures_failed
    );

    if args.snap.is_some_and(|shots| stats.pictures_saved < shots) {
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
    };

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("campreview={}", log_level)));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let stderr_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .boxed()
        }
    };
    layers.push(stderr_layer);

    let guard = match &args.log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "campreview.log");
            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            layers.push(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> campreview::Result<()> {
    let rendered = CampreviewConfig::default().to_toml()?;
    println!("# Campreview Configuration File");
    println!("# Every key can be overridden with CAMPREVIEW__<SECTION>__<KEY>");
    println!();
    println!("{}", rendered);
    Ok(())
}
