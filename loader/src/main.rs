use std::collections::BTreeMap;
use std::fs;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use relstore_core::StoreConfig;
use relstore_integrity::{DisplayRow, Manifest, Store};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Load line-format data into a relstore and print the result")]
struct Args {
    /// Manifest declaring tables, views and integrity metadata
    #[clap(short, long, env = "RELSTORE_MANIFEST")]
    manifest: String,

    /// Store config file, overriding the manifest's config section
    #[clap(short, long, env = "RELSTORE_CONFIG")]
    config: Option<String>,

    /// Data files in the import line format, loaded in order
    #[clap(short, long)]
    data: Vec<String>,

    /// Rows to delete after loading, as `table:id`; deletes cascade
    #[clap(long = "delete")]
    deletes: Vec<String>,

    /// Tables to print; all tables when omitted
    #[clap(short, long = "table")]
    tables: Vec<String>,

    /// Views to print
    #[clap(long = "view")]
    views: Vec<String>,

    /// Override the tombstone compaction threshold
    #[clap(long)]
    compaction_threshold: Option<usize>,
}

fn parse_target(target: &str) -> Result<(String, i64)> {
    let (table, id) = target
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("expected table:id, found '{}'", target))?;
    if table.trim().is_empty() {
        bail!("missing table name in '{}'", target);
    }
    let id = id
        .trim()
        .parse::<i64>()
        .with_context(|| format!("invalid row id in '{}'", target))?;
    Ok((table.trim().to_string(), id))
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    // Parse command-line arguments
    let args = Args::parse();

    // Load the manifest and apply overrides
    let mut manifest = Manifest::from_file(&args.manifest)
        .with_context(|| format!("loading manifest {}", args.manifest))?;
    if let Some(config_path) = &args.config {
        manifest.config = StoreConfig::from_file(config_path)?;
    }
    if let Some(threshold) = args.compaction_threshold {
        manifest.config.compaction_threshold = threshold;
    }

    let mut store = Store::from_manifest(manifest)?;
    info!("Store ready with tables {:?}", store.database().table_names());

    for path in &args.data {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
        let report = store.import(&text).with_context(|| format!("importing {}", path))?;
        info!("Loaded {} rows from {}", report.len(), path);
    }

    for target in &args.deletes {
        let (table, id) = parse_target(target)?;
        let report = store.delete(&table, id)?;
        if report.is_empty() {
            warn!("No row {} in {}", id, table);
        } else {
            info!(
                "Deleted {} rows from {}:{} ({} orphans)",
                report.len(),
                table,
                id,
                report.orphans_removed
            );
        }
    }

    let tables = if args.tables.is_empty() {
        store.database().table_names()
    } else {
        args.tables.clone()
    };

    let mut output: BTreeMap<String, serde_json::Value> = BTreeMap::new();
    for table in &tables {
        let rows = store
            .read_all(table)?
            .iter()
            .map(|row| store.resolve_display(table, row))
            .collect::<relstore_integrity::Result<Vec<DisplayRow>>>()?;
        output.insert(store.database().normalize(table), serde_json::to_value(rows)?);
    }
    for view in &args.views {
        output.insert(view.clone(), serde_json::to_value(store.get_data(view)?)?);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
