//! mistral-gateway binary: run (polling + HTTP), serve (webhook mode), and
//! webhook management commands. Config from env and optional CLI args.

use anyhow::{Context, Result};
use clap::Parser;

use mistral_gateway::components::build_bot;
use mistral_gateway::telegram::webhook;
use mistral_gateway::{load_config, run_gateway, serve_webhook, Cli, Commands, WebhookCommands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => {
            let config = load_config(token)?;
            run_gateway(config).await
        }
        Commands::Serve => {
            let config = load_config(None)?;
            serve_webhook(config).await
        }
        Commands::Webhook { command } => handle_webhook_command(command).await,
    }
}

async fn handle_webhook_command(command: WebhookCommands) -> Result<()> {
    let config = load_config(None)?;
    let bot = build_bot(&config);

    match command {
        WebhookCommands::Setup { base_url } => {
            let base_url = base_url
                .or(config.public_base_url)
                .context("PUBLIC_BASE_URL not set and --base-url not given")?;
            let detail = webhook::register(&bot, &base_url).await?;
            println!("{detail}");
        }
        WebhookCommands::Delete => {
            webhook::unregister(&bot).await?;
            println!("Webhook deleted.");
        }
        WebhookCommands::Status => {
            let status = webhook::status(&bot).await?;
            match status.url {
                Some(url) => {
                    println!("Webhook URL: {url}");
                    println!("Pending updates: {}", status.pending_update_count);
                    match status.last_error_message {
                        Some(message) => println!("Last error: {message}"),
                        None => println!("Last error: never"),
                    }
                }
                None => println!("No webhook registered."),
            }
        }
    }

    Ok(())
}
