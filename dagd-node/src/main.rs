// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! dagd storage node: opens the database, the active consensus and any
//! pending staging state, then waits for Ctrl-C.

use anyhow::Context;
use clap::Parser;
use dagd_consensus_exports::ConsensusController;
use dagd_db_exports::Database;
use dagd_db_worker::RocksDatabase;
use dagd_domain::Domain;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

mod settings;

use settings::build_settings;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory holding `base_config/` and the optional `config/` override
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,
    /// Database directory, overrides `database.path`
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn level_filter(level: usize) -> LevelFilter {
    match level {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::WARN,
        2 => LevelFilter::INFO,
        3 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = build_settings(&args.config_dir).with_context(|| {
        format!(
            "could not load settings from {}",
            args.config_dir.display()
        )
    })?;

    let tracing_layer =
        tracing_subscriber::fmt::layer().with_filter(level_filter(settings.logging.level));
    tracing_subscriber::registry().with(tracing_layer).init();

    let db_config = settings.db_config(args.data_dir);
    let db_path = db_config.path.clone();
    let db = Arc::new(
        RocksDatabase::new(db_config)
            .with_context(|| format!("could not open database at {}", db_path.display()))?,
    );
    let domain = Domain::new(settings.consensus_config(), db.clone())
        .context("could not open consensus")?;

    let consensus = domain.consensus();
    info!(
        "node started: prefix {}, {} blocks, {} headers, selected tip {}",
        consensus.prefix(),
        consensus.get_block_count()?,
        consensus.get_header_count()?,
        consensus
            .get_headers_selected_tip()?
            .map_or_else(|| "none".to_string(), |tip| tip.to_string())
    );

    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        if stop_tx.try_send(()).is_err() {
            warn!("stop already requested");
        }
    })
    .context("could not install the Ctrl-C handler")?;

    stop_rx.recv().context("stop channel closed")?;
    info!("stop signal received, shutting down");
    drop(consensus);
    drop(domain);
    db.flush().context("could not flush the database")?;
    info!("node stopped");
    Ok(())
}
