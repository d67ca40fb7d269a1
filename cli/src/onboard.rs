use anyhow::Result;
use console::style;
use dialoguer::{Input, Select};
use reagent_core::config::Config;

fn print_step(step: usize, total: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, total, title))
            .cyan()
            .bold()
    );
    println!();
}

pub fn run_onboard() -> Result<Config> {
    println!("{}", style("reagent setup").bold());

    let mut config = Config::default();
    let total = 3;

    print_step(1, total, "Choose a provider");
    let providers = ["openai", "ollama"];
    let selection = Select::new()
        .with_prompt("Provider")
        .items(&providers)
        .default(0)
        .interact()?;
    config.provider = Some(providers[selection].to_string());

    print_step(2, total, "Model");
    let default_model = match providers[selection] {
        "ollama" => "llama3.1",
        _ => "gpt-4o",
    };
    config.model = Input::new()
        .with_prompt("Model name")
        .default(default_model.to_string())
        .interact_text()?;

    print_step(3, total, "Credentials");
    if providers[selection] == "openai" {
        if std::env::var("OPENAI_API_KEY").is_ok() {
            println!("Using OPENAI_API_KEY from the environment.");
        } else {
            config.api_key = Input::new()
                .with_prompt("API key")
                .allow_empty(true)
                .interact_text()?;
        }
    } else {
        let base_url: String = Input::new()
            .with_prompt("Base URL")
            .default("http://localhost:11434".to_string())
            .interact_text()?;
        config.base_url = Some(base_url);
    }

    Ok(config)
}
