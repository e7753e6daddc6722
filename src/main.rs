mod cli;

use dubforge::{
    config,
    media::{self, Collaborators},
    pipeline::{DubRequest, JobOutcome, Orchestrator},
    retention, server,
    state::{AppEvent, AppState},
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;

async fn serve(host: String, port: u16, config_path: Option<&std::path::Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    config.server.host = host;
    config.server.port = port;

    tracing::info!("Starting dubforge server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    config.storage.bootstrap()?;

    let state = AppState::new(config.retention.window_secs);

    // Pick up artifacts left behind by a previous run so they still expire.
    state
        .retention
        .seed_from_dirs(&config.storage.artifact_dirs());
    let sweeper = retention::start_sweeper(
        (*state.retention).clone(),
        config.retention.sweep_interval_secs,
    );

    let config = Arc::new(config);
    let media = Arc::new(Collaborators::production(&config));

    let result = server::start_server(config, state, media).await;

    tracing::info!("Shutting down...");
    sweeper.abort();

    result
}

async fn dub(
    url: String,
    quality: String,
    voice: String,
    accelerator: bool,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    config.storage.bootstrap()?;

    let quality = quality.parse().map_err(anyhow::Error::msg)?;
    let voice_gender = voice.parse().map_err(anyhow::Error::msg)?;

    let state = AppState::new(config.retention.window_secs);
    let config = Arc::new(config);
    let media = Arc::new(Collaborators::production(&config));
    let orchestrator = Orchestrator::new(config, state.clone(), media);

    // Echo progress to the terminal while the job runs.
    let mut rx = state.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event {
                AppEvent::Log { message } => println!("{}", message),
                AppEvent::StepChange { step, message, .. } => {
                    println!("[{}] {}", step, message)
                }
                AppEvent::Progress {
                    step,
                    percent,
                    message,
                    ..
                } => println!("[{}] {:>3}% {}", step, percent, message),
                _ => {}
            }
        }
    });

    let outcome = orchestrator
        .submit(DubRequest {
            url,
            quality,
            voice_gender,
            use_accelerator: accelerator,
        })
        .await;
    printer.abort();

    match outcome {
        JobOutcome::Finished {
            output_file,
            title,
            duration_minutes,
            ..
        } => {
            println!("\nDub complete: {} ({:.1} min)", title, duration_minutes);
            println!("Output: {}", output_file);
            Ok(())
        }
        JobOutcome::Cancelled { session_id } => {
            anyhow::bail!("Job {} was cancelled", session_id)
        }
        JobOutcome::Failed { message, .. } => anyhow::bail!("{}", message),
    }
}

async fn info(url: String, config_path: Option<&std::path::Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let media = Collaborators::production(&config);

    let info = media.fetcher.probe_info(&url).await?;

    println!("Title:    {}", info.title);
    println!(
        "Duration: {:.1} min ({:.0} s)",
        info.duration_seconds / 60.0,
        info.duration_seconds
    );
    if let Some(channel) = info.channel {
        println!("Channel:  {}", channel);
    }
    if let Some(views) = info.view_count {
        println!("Views:    {}", views);
    }
    if let Some(thumb) = info.thumbnail {
        println!("Thumb:    {}", thumb);
    }

    Ok(())
}

fn check_tools(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = media::tools::check_tools(&config.tools);
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Data dir: {:?}", config.storage.data_dir);
            println!(
                "  Retention: {} s window, {} s sweep",
                config.retention.window_secs, config.retention.sweep_interval_secs
            );
            println!(
                "  Languages: {} -> {}",
                config.pipeline.source_lang, config.pipeline.target_lang
            );
            println!(
                "  Long-mode threshold: {} min",
                config.pipeline.long_mode_threshold_min
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Data dir: {:?}", config.storage.data_dir);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on the
    // verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "dubforge=trace,tower_http=debug".to_string()
        } else {
            "dubforge=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve(host, port, cli.config.as_deref()))
        }
        Commands::Dub {
            url,
            quality,
            voice,
            accelerator,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(dub(
                url,
                quality,
                voice,
                accelerator,
                cli.config.as_deref(),
            ))
        }
        Commands::Info { url } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(info(url, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("dubforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
