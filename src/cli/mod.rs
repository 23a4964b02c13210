//! CLI module for tiny-research
//!
//! Provides command-line interface parsing for the tiny-research binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use crate::utils::config::{ConfigError, ResearchConfig};
use clap::{Parser, Subcommand};
use output::Output;
use std::path::PathBuf;

/// tiny-research - LLM research workflow engine
///
/// Plans a research query, gathers findings with web search, page crawling
/// and Python, and writes a markdown report.
#[derive(Parser, Debug)]
#[command(
    name = "tiny-research",
    version,
    about = "tiny-research - LLM research workflow engine",
    long_about = "Plans a research query, gathers findings with web search, page crawling\n\
                  and Python, and writes a markdown report.\n\n\
                  The model endpoint is read from research.toml, or from LLM_MODEL,\n\
                  LLM_BASE_URL and LLM_TOKEN when no file exists.",
    after_help = "EXAMPLES:\n    \
                  tiny-research research \"What is the GDP of France?\"\n    \
                  tiny-research research --locale zh-CN \"成都有什么好吃的?\"\n    \
                  tiny-research config --validate\n    \
                  tiny-research --config my.toml research \"...\""
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "research.toml", global = true)]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a query and print the report
    Research {
        /// The question to research
        query: String,

        /// Locale the report is written in (overrides the config)
        #[arg(short, long)]
        locale: Option<String>,

        /// Print the stage trace after the report
        #[arg(long)]
        trace: bool,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file and exit
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Load the configuration for this invocation.
    ///
    /// `config --validate` requires the file to exist. Every other command falls
    /// back to defaults, with a warning since logging is not installed yet.
    pub fn load_config(&self, output: &Output) -> Result<ResearchConfig, ConfigError> {
        if matches!(self.command, Commands::Config { validate: true }) {
            return ResearchConfig::load(&self.config);
        }

        if !self.config.exists() {
            output.warning(&format!(
                "No configuration file at {}, using defaults",
                self.config.display()
            ));
        }
        ResearchConfig::load_or_default(&self.config)
    }
}
