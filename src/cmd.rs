//! Command execution: serve the cache or run the pipeline.

use crate::build_inventory;
use crate::cache::{self, CacheGate};
use crate::cli::{Action, Cli};
use crate::config::{self, Config};
use crate::error::{Error, Result};
use crate::ipam::{IpamSource, RecordingSource, SnapshotSource, SwisClient};
use crate::output::{emit, render};
use chrono::{DateTime, Utc};
use std::io::Write;

/// Load configuration, pick the IPAM source and execute the requested action.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let path = cli.config.clone().unwrap_or_else(config::default_path);
    let config = Config::load(&path)?;

    let mut source: Box<dyn IpamSource> = match &cli.snapshot {
        Some(file) => Box::new(SnapshotSource::from_file(file)?),
        None => Box::new(SwisClient::new(&config.swipam, &config.inventory)?),
    };
    execute(cli, &config, source.as_mut(), Utc::now(), out)
}

/// Execute one action against an already loaded configuration.
pub fn execute(
    cli: &Cli,
    config: &Config,
    source: &mut dyn IpamSource,
    now: DateTime<Utc>,
    out: &mut dyn Write,
) -> Result<()> {
    match cli.action() {
        Action::GetCacheFile => print_path(out, &config.cache_file().display().to_string()),
        Action::GetLocalCache => print_path(
            out,
            &config
                .local_cache_file()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        ),
        Action::List => list(cli, config, source, now, out),
    }
}

fn print_path(out: &mut dyn Write, path: &str) -> Result<()> {
    writeln!(out, "{path}").map_err(|e| Error::io("<stdout>", e))
}

fn list(
    cli: &Cli,
    config: &Config,
    source: &mut dyn IpamSource,
    now: DateTime<Utc>,
    out: &mut dyn Write,
) -> Result<()> {
    if let Some(local) = config.local_cache_file() {
        if let Some(document) = cache::read_cache(&local)? {
            log::info!("Serving local cache {}", local.display());
            return emit(out, &document);
        }
    }

    let cache_file = config.cache_file();
    let gate = CacheGate::new(config.timezone()?);
    if !gate.is_valid(&cache_file, &config.path, now, cli.refresh_cache) {
        cache::invalidate(&cache_file)?;
    }
    if let Some(document) = cache::read_cache(&cache_file)? {
        return emit(out, &document);
    }

    log::warn!("Cache file not found: {}", cache_file.display());
    let document = if config.swipam.save_raw {
        let mut recorder = RecordingSource::new(source);
        let document = generate(config, &mut recorder);
        // rows are kept even when the build fails on them
        let raw_file = config.raw_file();
        cache::write_cache(&raw_file, &recorder.to_json()?)?;
        log::info!("Saved raw IPAM rows to {}", raw_file.display());
        document?
    } else {
        generate(config, source)?
    };
    cache::write_cache(&cache_file, &document)?;
    emit(out, &document)
}

fn generate(config: &Config, source: &mut dyn IpamSource) -> Result<String> {
    let inventory = build_inventory(source, &config.inventory)?;
    render(&inventory, config.inventory.pretty)
}
