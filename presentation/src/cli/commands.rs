//! CLI command definitions

use clap::{Parser, ValueEnum};
use ensemble_domain::OutputFormat;
use std::path::PathBuf;
use std::str::FromStr;

/// Output format for a finished turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    /// Every branch answer followed by the fused answer
    Full,
    /// Only the fused answer
    Fused,
    /// The persisted turn as JSON
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Full => OutputFormat::Full,
            OutputFormatArg::Fused => OutputFormat::Fused,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

/// A `MODEL=TEMPERATURE` pair from `--temperature`
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureArg {
    pub model: String,
    pub value: f32,
}

impl FromStr for TemperatureArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (model, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected MODEL=TEMPERATURE, got '{}'", s))?;

        let model = model.trim();
        if model.is_empty() {
            return Err("model name cannot be empty".to_string());
        }

        let value: f32 = value
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a number", value.trim()))?;

        Ok(Self {
            model: model.to_string(),
            value,
        })
    }
}

/// CLI arguments for prudence-ensemble
#[derive(Parser, Debug)]
#[command(name = "prudence-ensemble")]
#[command(author, version, about = "Ask several LLMs at once and fuse their answers")]
#[command(long_about = r#"
Prudence Ensemble sends one message to two or three language models at once
and fuses their answers into a single response.

Each turn runs in two steps:
1. Dispatch: every selected model answers the message independently
2. Fusion: a synthesis model combines the successful answers; if it fails,
   the answers are shown one after another instead

Finished turns are kept in a transcript (20 turns by default). With --user
the transcript is written to disk, otherwise it lives only for this process.

Configuration files are loaded from (in priority order):
1. ENSEMBLE_* environment variables
2. --config <path>     Explicit config file
3. ./ensemble.toml     Project-level config
4. ~/.config/prudence-ensemble/config.toml   Global config

Example:
  prudence-ensemble "What's the best way to handle errors in Rust?"
  prudence-ensemble -m qwen-3-32b -m gemini-2.0-flash -o full "Compare async runtimes"
  prudence-ensemble --user alice@example.com --history
"#)]
pub struct Cli {
    /// The message to send to the ensemble
    pub message: Option<String>,

    /// Models to dispatch to, 2 or 3 (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Per-model sampling temperature in [0, 1] (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL=TEMP")]
    pub temperature: Vec<TemperatureArg>,

    /// Model used to fuse the answers
    #[arg(long, value_name = "MODEL")]
    pub synthesis_model: Option<String>,

    /// Signed-in identity; keeps the transcript on disk
    #[arg(long, value_name = "ID")]
    pub user: Option<String>,

    /// List the transcript, most recent first, and exit
    #[arg(long)]
    pub history: bool,

    /// Delete one turn from the transcript and exit
    #[arg(long, value_name = "TURN_ID")]
    pub delete: Option<String>,

    /// List the available models and exit
    #[arg(long)]
    pub list_models: bool,

    /// Output format [default: fused, or output.format from config]
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormatArg>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory for the JSONL conversation log and the trace log file
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_message_and_models() {
        let cli = Cli::try_parse_from([
            "prudence-ensemble",
            "-m",
            "qwen-3-32b",
            "-m",
            "gemini-2.0-flash",
            "-o",
            "full",
            "What is Rust?",
        ])
        .unwrap();

        assert_eq!(cli.message.as_deref(), Some("What is Rust?"));
        assert_eq!(cli.model, vec!["qwen-3-32b", "gemini-2.0-flash"]);
        assert_eq!(cli.output, Some(OutputFormatArg::Full));
        assert_eq!(OutputFormat::from(OutputFormatArg::Full), OutputFormat::Full);
    }

    #[test]
    fn test_temperature_pairs() {
        let cli = Cli::try_parse_from([
            "prudence-ensemble",
            "-t",
            "qwen-3-32b=0.2",
            "--temperature",
            "gemini-2.0-flash = 0.9",
            "hi",
        ])
        .unwrap();

        assert_eq!(
            cli.temperature,
            vec![
                TemperatureArg {
                    model: "qwen-3-32b".to_string(),
                    value: 0.2
                },
                TemperatureArg {
                    model: "gemini-2.0-flash".to_string(),
                    value: 0.9
                },
            ]
        );
    }

    #[test]
    fn test_temperature_arg_rejects_garbage() {
        assert!("qwen-3-32b".parse::<TemperatureArg>().is_err());
        assert!("=0.5".parse::<TemperatureArg>().is_err());
        assert!("qwen-3-32b=warm".parse::<TemperatureArg>().is_err());
    }

    #[test]
    fn test_history_and_user_flags() {
        let cli = Cli::try_parse_from([
            "prudence-ensemble",
            "--user",
            "alice@example.com",
            "--history",
            "-vv",
        ])
        .unwrap();

        assert!(cli.message.is_none());
        assert!(cli.history);
        assert_eq!(cli.user.as_deref(), Some("alice@example.com"));
        assert_eq!(cli.verbose, 2);
        assert!(cli.output.is_none());
    }
}
