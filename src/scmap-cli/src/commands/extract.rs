//! Extraction command handler
//!
//! Runs one full pass over a data directory and writes every document as
//! `{ "data": ..., "icons": { id: path } }`.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::map_files::{open_store, MISC_FILE, SCRIPT_FILE};
use anyhow::{Context, Result};
use scmap::misc::load_damage_table;
use scmap::{miner_for, Assembler, Baseline, Catalog, ExtractOptions, Extraction};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;
use w3data::{PatchTable, ScriptText};

/// Handle the extract command
pub fn handle(args: &ExtractArgs) -> Result<()> {
    let config = Config::load()?;
    let data_dir = config.data_dir(args.data_dir.as_deref());
    let skins_dir = config.skins_dir(args.skins_dir.as_deref(), &data_dir);
    let output_dir = config.output_dir(args.output.as_deref());

    let mut options = ExtractOptions::new(config.variant(args.variant));
    if let Some(path) = &args.patches {
        let extra = PatchTable::load(path)
            .with_context(|| format!("Failed to read patches from {}", path.display()))?;
        info!("Loaded {} extra patches", extra.len());
        options = options.with_patches(extra);
    }

    let extraction = run(&data_dir, &skins_dir, &options)?;
    let written = write_outputs(&extraction, &output_dir, args.raw)?;

    println!(
        "Extracted {} races ({}) into {} ({} files)",
        extraction.race_files.len(),
        options.variant,
        output_dir.display(),
        written
    );
    Ok(())
}

/// Load every input under `data_dir` and assemble the documents
pub fn run(data_dir: &Path, skins_dir: &Path, options: &ExtractOptions) -> Result<Extraction> {
    let store = open_store(data_dir)?;
    let baseline = Baseline::load(skins_dir)
        .with_context(|| format!("Failed to load stock tables from {}", skins_dir.display()))?;
    let catalog = Catalog::load(&store, baseline, options.patch_table())
        .context("Failed to load object tables")?;

    let script_path = data_dir.join(SCRIPT_FILE);
    let script = ScriptText::load(&script_path)
        .with_context(|| format!("Failed to read script from {}", script_path.display()))?;
    let damage = load_damage_table(&data_dir.join(MISC_FILE))?;

    let miner = miner_for(options.variant, &script, &catalog)?;
    let extraction = Assembler::new(&catalog, miner, damage)
        .run()
        .with_context(|| format!("Extraction failed for {}", data_dir.display()))?;
    Ok(extraction)
}

/// Write every document under `output_dir`, returning the file count
pub fn write_outputs(extraction: &Extraction, output_dir: &Path, raw: bool) -> Result<usize> {
    let races_dir = output_dir.join("races");
    fs::create_dir_all(&races_dir)
        .with_context(|| format!("Failed to create {}", races_dir.display()))?;

    write_json(&output_dir.join("races.json"), &extraction.races)?;
    for race in &extraction.race_files {
        write_json(&races_dir.join(format!("{}.json", race.data.key)), race)?;
    }
    write_json(&output_dir.join("ultimates.json"), &extraction.ultimates)?;
    write_json(&output_dir.join("artifacts.json"), &extraction.artifacts)?;
    write_json(&output_dir.join("misc.json"), &extraction.misc)?;

    let mut written = 4 + extraction.race_files.len();
    if raw {
        write_json(&output_dir.join("raw.json"), &extraction.raw)?;
        written += 1;
    }
    Ok(written)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}
