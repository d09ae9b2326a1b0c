//! CLI module - Command-line interface for sayu-apt
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// sayu-apt - Artist personality classification
/// Scores artists on four trait axes and stores their APT profile
#[derive(Parser)]
#[command(name = "sayu-apt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Add an artist to the catalogue
    #[command(alias = "a")]
    Add {
        /// Artist name
        #[arg(required = true)]
        name: Vec<String>,
        /// Korean display name
        #[arg(long)]
        name_ko: Option<String>,
        #[arg(long)]
        nationality: Option<String>,
        /// Era or movement, e.g. "Abstract Expressionism"
        #[arg(long)]
        era: Option<String>,
        #[arg(long)]
        born: Option<i32>,
        #[arg(long)]
        died: Option<i32>,
        /// Short biography used as local evidence
        #[arg(long)]
        bio: Option<String>,
    },

    /// List all artists with their primary archetype
    #[command(alias = "ls", alias = "l")]
    List,

    /// Show an artist's stored profile
    #[command(alias = "i", alias = "info")]
    Show {
        /// Artist ID
        id: String,
    },

    /// Classify unclassified artists (or all with --all)
    #[command(alias = "c")]
    Classify {
        /// Reclassify every artist, not only those without a profile
        #[arg(long)]
        all: bool,
        /// Maximum number of artists to process
        #[arg(long)]
        limit: Option<u64>,
        /// Overwrite protected expert presets
        #[arg(long)]
        force: bool,
        /// Artists classified concurrently (overrides config)
        #[arg(long)]
        parallelism: Option<usize>,
    },

    /// Classify a single artist
    ClassifyOne {
        /// Artist ID
        id: String,
        /// Overwrite a protected expert preset
        #[arg(long)]
        force: bool,
        /// Print the profile without storing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Store a hand-written profile as a protected expert preset
    Curate {
        /// Artist ID
        id: String,
        /// Path to a JSON profile document
        file: String,
    },

    /// Clear stored profiles so the next batch reclassifies them
    Reset {
        /// Also clear expert presets
        #[arg(long)]
        include_protected: bool,
    },

    /// Convert legacy profiles and mapping rows to the current format
    MigrateLegacy {
        /// Let mapping rows replace existing profiles
        #[arg(long)]
        force: bool,
    },
}

pub use commands::*;
