use anyhow::Result;
use clap::{Parser, Subcommand};
use reagent_core::{CommandRegistry, ReactLoop, config, providers};
use std::sync::Arc;

mod commands;
mod onboard;

#[derive(Parser)]
#[command(name = "reagent")]
#[command(about = "reagent - a reason/act loop over an LLM and a set of commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive configuration setup.
    Onboard,
    /// Answer a question by reasoning over the registered commands.
    Ask {
        /// The question to answer.
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("reagent_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let command = match cli.command {
        Some(command) => command,
        None => {
            if !config::config_exists() {
                Commands::Onboard
            } else {
                eprintln!("Usage: reagent ask \"<question>\"");
                return Ok(());
            }
        }
    };

    match command {
        Commands::Onboard => {
            let onboard_config = onboard::run_onboard()?;
            config::save_config(&onboard_config)?;
            println!("Configuration saved. Try: reagent ask \"What is 7*77?\"");
        }
        Commands::Ask { question } => {
            let config = config::load_config()?;
            let oracle = providers::create_oracle(&config)?;

            let mut registry = CommandRegistry::new();
            registry.register(Arc::new(commands::CalculateCommand::new()));
            registry.register(Arc::new(commands::WikiSearchCommand::new()));
            registry.register(Arc::new(commands::ScrapeCommand::new()));
            registry.register(Arc::new(commands::UserCommand::new()));

            let react = ReactLoop::new(oracle, registry)?
                .with_observation_budget(config.observation_budget)
                .with_token_ceiling(config.token_ceiling)
                .with_max_turns(config.max_turns);

            println!("QUESTION: {question}");
            match react.ask(&question).await {
                Ok(answer) => println!("ANSWER: {answer}"),
                Err(e) => {
                    eprintln!("Failed to get an answer: {e}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
