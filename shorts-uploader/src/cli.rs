//! CLI interface for shorts-uploader: command parsing and the glue between the
//! loaded configuration, the concrete clients and the core pipeline.
//!
//! All business logic (filename parsing, the upload loop, reporting) lives in
//! [`shorts_uploader_core`]. This module only wires things together, in an
//! order that keeps the fail-fast conditions ahead of any network I/O:
//!
//! 1. configuration (environment + optional YAML)
//! 2. local inputs (clip directory, analysis sidecar)
//! 3. object-store client and database connection
//! 4. the upload loop
//!
//! Call [`run`] with a constructed [`Cli`] for programmatic or test use.
use crate::database::PgVideoRepository;
use crate::load_config::{load_config, Overrides};
use crate::storage::R2Store;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shorts_uploader_core::pipeline::{collect_inputs, run_upload};
use shorts_uploader_core::report::UploadReport;
use std::path::PathBuf;

/// CLI for shorts-uploader: publish rendered shorts to R2 and the videos table.
#[derive(Parser)]
#[clap(
    name = "shorts-uploader",
    version,
    about = "Upload rendered short clips to R2 and record them in the database"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload every clip of the shorts directory and upsert its database row
    Upload {
        /// Path to an optional YAML config file (no secrets)
        #[clap(long)]
        config: Option<PathBuf>,

        /// Directory holding the rendered clips
        #[clap(long)]
        shorts_dir: Option<PathBuf>,

        /// Analysis sidecar with per-segment metadata
        #[clap(long)]
        sidecar: Option<PathBuf>,

        /// Only upload clips named after VIDEO_ID
        #[clap(long)]
        only_target_video: bool,

        /// Skip the HEAD check after each upload
        #[clap(long)]
        no_verify: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<UploadReport> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Upload {
            config,
            shorts_dir,
            sidecar,
            only_target_video,
            no_verify,
        } => {
            let overrides = Overrides {
                shorts_dir,
                sidecar,
                only_target_video,
                no_verify,
            };
            let config = load_config(config.as_deref(), &overrides)?;
            let inputs = collect_inputs(&config.settings)?;

            tracing::info!(command = "upload", clips = inputs.clips.len(), "Starting upload");
            let store = R2Store::new(&config.storage);
            let repo = PgVideoRepository::connect(&config.database)
                .await
                .context("Database connection error")?;

            let report = run_upload(&config.settings, &inputs, &store, &repo).await;
            println!("{report}");
            Ok(report)
        }
    }
}
