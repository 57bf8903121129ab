//! Command-line interface definitions.
//!
//! This module defines the CLI structure for the `policy-kit` tool using clap.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::config::{LayoutConfig, WrapOverflow};
use crate::error::{ExportError, ExportResult};

/// Render generated policy documents to paginated PDF.
#[derive(Parser, Debug)]
#[command(name = "policy-kit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to execute.
    #[clap(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a markdown policy to a PDF file.
    Render {
        #[command(flatten)]
        source: SourceArgs,

        /// Output path. Defaults to the title-derived file name in the
        /// current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print which page each line lands on, without writing a file.
    Layout {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print the kind of every line in a markdown policy.
    Classify {
        /// Markdown file to read.
        input: PathBuf,
    },
}

/// Input and layout options shared by `render` and `layout`.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Markdown file to read.
    pub input: PathBuf,

    /// Document title. Defaults to the input file stem.
    #[arg(short, long)]
    pub title: Option<String>,

    /// TOML file overriding the default A4 layout.
    #[arg(long)]
    pub layout: Option<PathBuf>,

    /// Date for the "Generated on" caption (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<String>,

    /// Continue wrapped paragraphs on the next page instead of letting them
    /// run into the bottom margin.
    #[arg(long)]
    pub split_overflow: bool,
}

impl SourceArgs {
    /// The title to print, falling back to the input's file stem.
    pub fn resolved_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => self
                .input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Document".to_string()),
        }
    }

    /// The parsed `--date`, if one was given.
    pub fn resolved_date(&self) -> ExportResult<Option<NaiveDate>> {
        self.date
            .as_deref()
            .map(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| ExportError::InvalidDate(raw.to_string()))
            })
            .transpose()
    }

    /// Load the layout file if one was given, then apply flag overrides.
    pub fn resolved_layout(&self) -> ExportResult<LayoutConfig> {
        let mut layout = match &self.layout {
            Some(path) => LayoutConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
            None => LayoutConfig::default(),
        };
        if self.split_overflow {
            layout.wrap_overflow = WrapOverflow::Split;
        }
        Ok(layout)
    }
}
