//! teachme - a terminal personal-finance tutor.
//!
//! Sends questions to a local Ollama server under a fixed financial-education
//! persona and prints the answers. `chat` keeps a conversation going; `ask`
//! answers one question and exits.

mod bridge;
mod client;
mod config;
mod protocol;
mod session;

use anyhow::{Context, Result};
use bridge::OllamaBridge;
use clap::{Args, Parser, Subcommand};
use client::Console;
use config::{Config, Overrides};
use std::process::Command as ProcessCommand;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "teachme")]
#[command(author, version, about = "TeachMeFinance: an LLM-only finance tutor using a local Ollama server")]
#[command(long_about = "TeachMeFinance: an LLM-only finance tutor using a local Ollama server.\n\nThe server address comes from --host, then $OLLAMA_URL, then the config file, then http://localhost:11434.")]
struct Cli {
    /// Ollama server URL (overrides $OLLAMA_URL and the config file)
    #[arg(long, global = true, value_name = "URL")]
    host: Option<String>,

    /// Log debug output to stderr
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat; type 'exit' or 'quit' to leave
    Chat {
        #[command(flatten)]
        options: ModelOptions,
    },
    /// Answer a single question and exit
    Ask {
        /// Your finance education question
        #[arg(value_name = "QUESTION")]
        question: String,

        #[command(flatten)]
        options: ModelOptions,
    },
    /// Open configuration file in $EDITOR
    Config {
        /// Print the resolved settings instead of opening the editor
        #[arg(long)]
        show: bool,
    },
}

#[derive(Args)]
struct ModelOptions {
    /// Ollama model name [default: qwen2.5:7b-instruct]
    #[arg(short = 'm', long, value_name = "MODEL")]
    model: Option<String>,

    /// Sampling temperature [default: 0.4]
    #[arg(short = 't', long, allow_negative_numbers = true)]
    temperature: Option<f64>,

    /// Maximum number of tokens to generate [default: 512]
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    max_tokens: Option<u32>,
}

impl From<ModelOptions> for Overrides {
    fn from(options: ModelOptions) -> Self {
        Self {
            model: options.model,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Chat { options } => handle_chat(cli.host.as_deref(), options.into()).await,
        Commands::Ask { question, options } => {
            handle_ask(cli.host.as_deref(), &question, options.into()).await
        }
        Commands::Config { show } => handle_config(show, cli.host.as_deref()),
    }
}

/// Default directives: only errors from the crate, since failed exchanges are
/// already shown to the user.
const DEFAULT_LOG_FILTER: &str = "teachme=error,reqwest=warn";

/// Pick the log filter: `--verbose`, then `RUST_LOG`, then the default.
fn log_filter(verbose: bool, env: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("teachme=debug,reqwest=warn");
    }
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Log to stderr so stdout only carries answers.
fn init_logging(verbose: bool) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, env.as_deref()))
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .init();
}

/// Build the bridge for the resolved server address.
fn connect(config: &Config, host: Option<&str>) -> Result<OllamaBridge> {
    let host = config.host(host);
    let bridge = OllamaBridge::new(host).context("Failed to set up the Ollama client")?;
    info!(host = %bridge.base_url(), "using Ollama server");
    Ok(bridge)
}

/// Run the interactive chat loop.
async fn handle_chat(host: Option<&str>, overrides: Overrides) -> Result<()> {
    let config = Config::load()?;
    let settings = overrides.resolve(&config);
    let bridge = connect(&config, host)?;

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut console = Console::stdout();
    let session = session::run_interactive(&bridge, &settings, input, &mut console).await?;

    debug!(
        messages = session.transcript().len(),
        "chat session finished"
    );
    Ok(())
}

/// Answer one question; exit non-zero if it fails.
async fn handle_ask(host: Option<&str>, question: &str, overrides: Overrides) -> Result<()> {
    let config = Config::load()?;
    let settings = overrides.resolve(&config);
    let bridge = connect(&config, host)?;

    let code = session::run_ask(
        &bridge,
        &settings,
        question,
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    )
    .await?;

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Handle the config command.
fn handle_config(show: bool, host: Option<&str>) -> Result<()> {
    let config_path = Config::config_path()?;

    if show {
        let config = Config::load()?;
        let settings = Overrides::default().resolve(&config);
        println!("Config file: {}", config_path.display());
        println!("Server: {}", config.host(host));
        println!("Model: {}", settings.model);
        println!("Temperature: {}", settings.temperature);
        println!("Max tokens: {}", settings.max_tokens);
        return Ok(());
    }

    // Create default config if it doesn't exist
    if !config_path.exists() {
        Config::default().save()?;
        println!("Created default config at {}", config_path.display());
    }

    // Open in editor
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = ProcessCommand::new(&editor)
        .arg(&config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        eprintln!("Editor exited with non-zero status");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ask_arguments() {
        let cli = Cli::parse_from([
            "teachme",
            "ask",
            "What is an index fund?",
            "-m",
            "llama3.2:3b",
            "-t",
            "-0.2",
            "--max-tokens",
            "128",
        ]);
        match cli.command {
            Commands::Ask { question, options } => {
                assert_eq!(question, "What is an index fund?");
                let overrides = Overrides::from(options);
                assert_eq!(overrides.model.as_deref(), Some("llama3.2:3b"));
                assert_eq!(overrides.temperature, Some(-0.2));
                assert_eq!(overrides.max_tokens, Some(128));
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_chat_defaults_left_to_config() {
        let cli = Cli::parse_from(["teachme", "chat", "--host", "http://box:11434"]);
        assert_eq!(cli.host.as_deref(), Some("http://box:11434"));
        match cli.command {
            Commands::Chat { options } => {
                let settings = Overrides::from(options).resolve(&Config::default());
                assert_eq!(settings.model, "qwen2.5:7b-instruct");
                assert_eq!(settings.temperature, 0.4);
                assert_eq!(settings.max_tokens, 512);
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn test_zero_max_tokens_rejected() {
        assert!(Cli::try_parse_from(["teachme", "chat", "--max-tokens", "0"]).is_err());
    }

    #[test]
    fn test_log_filter_quiet_by_default() {
        let filter = log_filter(false, None).to_string().to_lowercase();
        assert!(filter.contains("teachme=error"), "{}", filter);
        assert!(!filter.contains("teachme=warn"), "{}", filter);
    }

    #[test]
    fn test_log_filter_sources() {
        let filter = log_filter(true, Some("teachme=trace")).to_string().to_lowercase();
        assert!(filter.contains("teachme=debug"), "{}", filter);

        let filter = log_filter(false, Some("teachme=info")).to_string().to_lowercase();
        assert!(filter.contains("teachme=info"), "{}", filter);
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Cli::try_parse_from(["teachme", "ask"]).is_err());
    }
}
