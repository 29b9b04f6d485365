//! Core CLI definitions

use clap::{Args, Parser, Subcommand};
use scmap::MapVariant;
use std::path::PathBuf;
use w3data::Category;

use super::fourcc::FourccCommand;

#[derive(Parser)]
#[command(name = "scmap")]
#[command(about = "Survival Chaos map data extractor", long_about = None)]
pub struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract races, ultimates, artifacts and misc data from a map
    #[command(visible_alias = "x")]
    Extract(ExtractArgs),

    /// Dump one decoded object table
    #[command(visible_alias = "d")]
    Dump {
        /// Table category (units, items, abilities, upgrades or w3u/w3t/w3a/w3q)
        #[arg(value_parser = parse_category)]
        category: Category,

        /// Directory holding the decoded map files
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Write <category>.raw.json and <category>.json here instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show every field of one entity
    #[command(visible_alias = "e")]
    Entity {
        /// Table category
        #[arg(value_parser = parse_category)]
        category: Category,

        /// Entity id (e.g. "h001")
        id: String,

        /// Only show fields at this level
        #[arg(short, long)]
        level: Option<u32>,

        /// Directory holding the decoded map files
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Convert between ids and their packed integer form
    #[command(visible_alias = "f")]
    Fourcc {
        #[command(subcommand)]
        command: FourccCommand,
    },

    /// Print the if/elseif block starting at a script offset
    #[command(visible_alias = "b")]
    Block {
        /// Path to war3map.j
        script: PathBuf,

        /// Byte offset of the `if` or `elseif`
        offset: usize,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Default map variant (og or oz)
        #[arg(long)]
        variant: Option<MapVariant>,

        /// Default directory holding the decoded map files
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Default directory holding the game's stock tables
        #[arg(long)]
        skins_dir: Option<PathBuf>,

        /// Default directory for extracted documents
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct ExtractArgs {
    /// Map variant (og or oz); uses the configured default if not provided
    #[arg(long)]
    pub variant: Option<MapVariant>,

    /// Directory holding war3map.j and the decoded object tables
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory holding the game's stock profile and SYLK tables
    #[arg(long)]
    pub skins_dir: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Extra corrections (JSON object of entity id to partial object)
    #[arg(long)]
    pub patches: Option<PathBuf>,

    /// Also write raw.json with the unassembled script data
    #[arg(long)]
    pub raw: bool,
}

fn parse_category(name: &str) -> Result<Category, String> {
    Category::from_name(name).ok_or_else(|| format!("unknown category: {name}"))
}
