// Command line interface.
// Parses arguments, wires the cache, upstream client and coordinator, and runs a command.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::cache::{Cache, MemoryCache, RedisCache};
use crate::catalog::{Populator, ReadThrough};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging;
use crate::upstream::CatalogClient;

/// Catalog cache commands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Populate the first pages of the catalog into the cache.
    Warm {
        /// Last page to populate (defaults to `warmup_pages` from the config).
        #[arg(long)]
        pages: Option<i64>,
    },

    /// Read the item ids of a page through the cache.
    Page {
        /// Page number, 1-based. Values below 1 read the first page.
        #[arg(allow_hyphen_values = true)]
        page: Option<String>,
    },

    /// Read a single item through the cache.
    Item {
        /// Item id.
        id: String,
    },
}

/// Command line interface parser.
#[derive(Debug, Parser)]
#[command(name = "catalog-cache", version, about)]
struct Cli {
    /// Path to your configuration file.
    #[arg(long, short, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use a process-local cache instead of Redis.
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

/// Parse a page parameter. A missing page means page 0.
pub fn parse_page(raw: Option<&str>) -> Result<i64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::BadInput(format!("page {:?}", raw))),
    }
}

/// Parse an item id parameter.
pub fn parse_id(raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::BadInput(format!("id {:?}", raw)))
}

/// Runs the command line application.
pub async fn execute() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::get(cli.config.as_deref())?;
    logging::init_logging(&config.logging);

    let cache: Arc<dyn Cache> = if cli.memory {
        Arc::new(MemoryCache::new())
    } else {
        Arc::new(RedisCache::connect(&config.cache.url).await?)
    };
    let client = CatalogClient::new(
        &config.upstream.url,
        &config.upstream.public_key,
        &config.upstream.private_key,
        config.upstream.timeout(),
    )?;
    let populator = Arc::new(Populator::new(
        client,
        Arc::clone(&cache),
        config.populate_options(),
    ));

    match cli.command {
        Command::Warm { pages } => {
            let last_page = pages.unwrap_or(config.warmup_pages);
            tracing::info!(last_page, "warming up cache");
            let report = populator.warm(last_page).await;
            tracing::info!(?report, "warm-up finished");
            if report.failed > 0 {
                return Err(Error::Other(format!(
                    "{} of {} pages failed to populate",
                    report.failed,
                    last_page.max(0)
                )));
            }
        }
        Command::Page { page } => {
            let page = parse_page(page.as_deref())?;
            let coordinator = ReadThrough::new(cache, populator, config.read_through_options());
            let result = coordinator.fetch(page).await;
            coordinator.shutdown().await;
            println!("{}", serde_json::to_string(&result?)?);
        }
        Command::Item { id } => {
            let id = parse_id(&id)?;
            let coordinator = ReadThrough::new(cache, populator, config.read_through_options());
            let result = coordinator.get_by_id(id).await;
            coordinator.shutdown().await;
            println!("{}", serde_json::to_string_pretty(&result?)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None).unwrap(), 0);
        assert_eq!(parse_page(Some("")).unwrap(), 0);
        assert_eq!(parse_page(Some("3")).unwrap(), 3);
        assert_eq!(parse_page(Some("-12")).unwrap(), -12);
        assert_eq!(parse_page(Some("abc")).unwrap_err().kind(), ErrorKind::BadInput);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("1011334").unwrap(), 1011334);
        assert_eq!(parse_id("-1").unwrap_err().kind(), ErrorKind::BadInput);
        assert_eq!(parse_id("x").unwrap_err().kind(), ErrorKind::BadInput);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["catalog-cache", "-c", "cfg.json", "warm", "--pages", "3"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("cfg.json")));
        assert!(matches!(cli.command, Command::Warm { pages: Some(3) }));

        let cli = Cli::try_parse_from(["catalog-cache", "page"]).unwrap();
        assert!(matches!(cli.command, Command::Page { page: None }));
        assert!(!cli.memory);

        let cli = Cli::try_parse_from(["catalog-cache", "item", "7", "--memory"]).unwrap();
        assert!(cli.memory);

        let cli = Cli::try_parse_from(["catalog-cache", "page", "-12"]).unwrap();
        assert!(matches!(cli.command, Command::Page { page: Some(ref p) } if p == "-12"));
    }
}
