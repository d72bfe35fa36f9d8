//! Command-line arguments.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::settings::{SettingValue, SettingsError, parse_assignment};
use crate::document::DEFAULT_NOVEL_PATH;

/// Ask questions about a novel; answers are grounded in retrieved passages
/// and in the agent's own earlier answers.
#[derive(Parser, Debug)]
#[command(name = "novel-agent", version, about)]
pub struct Args {
    /// Novel to load (UTF-8 text).
    #[arg(long, default_value = DEFAULT_NOVEL_PATH)]
    pub novel: PathBuf,

    /// Config file path (default: config/default.toml).
    #[arg(short = 'f', long = "config")]
    pub config_path: Option<PathBuf>,

    /// Maximum passages kept per retrieval.
    #[arg(long = "recall_index", alias = "recall-index")]
    pub recall_index: Option<u64>,

    /// Neighbouring passages added on each side of a hit.
    #[arg(long = "neighbor_num", alias = "neighbor-num")]
    pub neighbor_num: Option<u64>,

    /// Hit count below which deep search kicks in.
    #[arg(long = "deep_search_index", alias = "deep-search-index")]
    pub deep_search_index: Option<u64>,

    /// Extra passages a deep search may add.
    #[arg(long = "deep_search_num", alias = "deep-search-num")]
    pub deep_search_num: Option<u64>,

    #[arg(long = "voter_num", alias = "voter-num")]
    pub voter_num: Option<u64>,

    /// Model context window in tokens.
    #[arg(long = "num_ctx", alias = "num-ctx")]
    pub num_ctx: Option<u64>,

    /// Model name passed to the provider.
    #[arg(long = "common_model", alias = "common-model")]
    pub common_model: Option<String>,

    /// Any setting as name=value; may be repeated.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// Read questions from a file, one per line, instead of stdin.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Skip the seed questions and go straight to user input.
    #[arg(long)]
    pub no_cold_start: bool,

    /// Write diagnostics to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Increase diagnostic verbosity (-v warn, -vv info, -vvv debug, -vvvv trace).
    #[arg(short, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Settings the user supplied explicitly, as one batch.
    /// `--set` entries are applied after the typed flags.
    pub fn overrides(&self) -> Result<BTreeMap<String, SettingValue>, SettingsError> {
        let mut out = BTreeMap::new();
        let counts = [
            ("recall_index", self.recall_index),
            ("neighbor_num", self.neighbor_num),
            ("deep_search_index", self.deep_search_index),
            ("deep_search_num", self.deep_search_num),
            ("voter_num", self.voter_num),
            ("num_ctx", self.num_ctx),
        ];
        for (name, value) in counts {
            if let Some(n) = value {
                out.insert(name.to_string(), SettingValue::Count(n));
            }
        }
        if let Some(model) = &self.common_model {
            out.insert("common_model".to_string(), SettingValue::Text(model.clone()));
        }
        for assignment in &self.set {
            let (name, value) = parse_assignment(assignment)?;
            out.insert(name, value);
        }
        Ok(out)
    }
}

pub fn parse() -> Args {
    Args::parse()
}
