pub mod apt;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, ClassifyArgs, Commands};
pub use config::Config;
use models::artist::NewArtist;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

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

    init_tracing(&config)?;

    let cli = Cli::parse();
    dispatch(cli, config, prometheus_handle.as_ref()).await
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let (pretty_layer, json_layer) = if config.general.log_format == "json" {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(pretty_layer)
        .with(json_layer);

    if config.observability.loki_enabled {
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

async fn dispatch(
    cli: Cli,
    config: Config,
    metrics: Option<&PrometheusHandle>,
) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        print_help();
        return Ok(());
    };

    match command {
        Commands::Init => cli::cmd_init(),

        Commands::Add {
            name,
            name_ko,
            nationality,
            era,
            born,
            died,
            bio,
        } => {
            let artist = NewArtist {
                name: name.join(" "),
                nationality,
                era,
                birth_year: born,
                death_year: died,
                biography: bio,
                name_ko,
                ..NewArtist::default()
            };
            cli::cmd_add_artist(&config, artist).await
        }

        Commands::List => cli::cmd_list_artists(&config).await,

        Commands::Show { id } => cli::cmd_show_artist(&config, &id).await,

        Commands::Classify {
            all,
            limit,
            force,
            parallelism,
        } => {
            let args = ClassifyArgs {
                all,
                limit,
                force,
                parallelism,
            };
            cli::cmd_classify(&config, args, metrics).await
        }

        Commands::ClassifyOne { id, force, dry_run } => {
            cli::cmd_classify_one(&config, &id, force, dry_run).await
        }

        Commands::Curate { id, file } => cli::cmd_curate(&config, &id, &file).await,

        Commands::Reset { include_protected } => {
            cli::cmd_reset(&config, include_protected).await
        }

        Commands::MigrateLegacy { force } => cli::cmd_migrate_legacy(&config, force).await,
    }
}

fn print_help() {
    println!("sayu-apt - Artist personality classification");
    println!();
    println!("Usage: sayu-apt <command> [args]");
    println!();
    println!("Commands:");
    println!("  init                      Create default config file");
    println!("  add <name> [--era ...]    Add an artist");
    println!("  list, ls                  List artists and their archetypes");
    println!("  show <id>                 Show an artist's profile");
    println!("  classify [--all]          Classify unclassified artists");
    println!("  classify-one <id>         Classify one artist (--dry-run, --force)");
    println!("  curate <id> <file>        Store an expert preset from a JSON file");
    println!("  reset                     Clear stored profiles");
    println!("  migrate-legacy            Convert legacy profiles");
    println!();
    println!("Run 'sayu-apt help <command>' for the options of a command.");
}
