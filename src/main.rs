use std::collections::HashSet;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use anime_source::provider::{
    fallback_order, resolve_with_fallback, CanonicalTitle, ExtractorRegistry, ReqwestTransport,
    ResolveStrategy, ResolverConfig, SiteRegistry, SourceSite, Zoro,
};

#[derive(Parser)]
#[command(name = "anime-source")]
#[command(about = "Find anime on catalog sites and resolve playable streams", long_about = None)]
struct Cli {
    /// Site to query
    #[arg(long, global = true, default_value = "zoro")]
    site: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find the catalog entry for a title
    Search {
        #[arg(long)]
        english: Option<String>,
        #[arg(long)]
        romaji: Option<String>,
        #[arg(long)]
        native: Option<String>,
        /// May be repeated
        #[arg(long)]
        synonym: Vec<String>,
    },
    /// List the episodes of a catalog entry
    Episodes {
        /// Site-relative path of the entry, e.g. /frieren-18542
        path: String,
        /// Episode number to leave out; may be repeated
        #[arg(long)]
        exclude: Vec<u32>,
    },
    /// Resolve an episode reference to a playable source
    Resolve {
        /// Site-relative episode reference, e.g. /watch/frieren-18542?ep=107257
        reference: String,
        /// direct or aggregator; without it both are tried
        #[arg(long)]
        strategy: Option<ResolveStrategy>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_registry(config: &ResolverConfig) -> Result<SiteRegistry> {
    let transport = Arc::new(ReqwestTransport::from_config(config).context("failed to build HTTP client")?);
    let extractors = Arc::new(ExtractorRegistry::with_defaults(transport.clone()));

    let mut registry = SiteRegistry::new();
    registry.register(Arc::new(Zoro::new(config, transport, extractors)));
    Ok(registry)
}

async fn run(cli: Cli) -> Result<bool> {
    let config = ResolverConfig::from_env().context("invalid configuration")?;
    let registry = build_registry(&config)?;
    let site: Arc<dyn SourceSite> = registry
        .by_name(&cli.site)
        .with_context(|| format!("unknown site '{}'", cli.site))?;

    match cli.command {
        Command::Search {
            english,
            romaji,
            native,
            synonym,
        } => {
            let title = CanonicalTitle {
                english,
                romaji,
                native,
                synonyms: synonym,
            };
            match site.find_match(&title).await? {
                Some(result) => print_json(&result).map(|_| true),
                None => {
                    eprintln!("No match on {}", site.name());
                    Ok(false)
                }
            }
        }
        Command::Episodes { path, exclude } => {
            let excluded: HashSet<u32> = exclude.into_iter().collect();
            match site.list_episodes(&path, &excluded).await? {
                Some(episodes) => print_json(&episodes).map(|_| true),
                None => {
                    eprintln!("No episodes found for {}", path);
                    Ok(false)
                }
            }
        }
        Command::Resolve { reference, strategy } => {
            if site.is_info_only() {
                anyhow::bail!("{} does not resolve sources", site.name());
            }
            let resolved = match strategy {
                Some(strategy) => site.resolve_source(&reference, strategy).await?,
                None => {
                    resolve_with_fallback(site.as_ref(), &reference, &fallback_order(config.strategy))
                        .await?
                }
            };
            match resolved {
                Some(source) => print_json(&source).map(|_| true),
                None => {
                    eprintln!("No source resolved for {}", reference);
                    Ok(false)
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
