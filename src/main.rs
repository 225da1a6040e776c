use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;

mod app;
mod client;
mod config;
mod handler;
mod transcript;
mod tui;
mod ui;

use app::App;
use client::ChatClient;
use config::Config;
use transcript::{BotReply, NO_RESPONSE_TEXT, SERVER_ERROR_TEXT, TRANSPORT_FAILURE_TEXT};

#[derive(Parser)]
#[command(name = "charla")]
#[command(about = "Terminal chat client for a remote HTTP chat backend")]
struct Cli {
    /// Chat endpoint URL (overrides CHARLA_ENDPOINT and the config file)
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send a single message and print the reply
    Ask {
        /// The message to send
        message: String,
    },
    /// Show the configured endpoint, or persist a new one
    Endpoint {
        /// New endpoint URL to save to the config file
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let endpoint = config.resolve_endpoint(cli.endpoint.as_deref());

    match cli.command {
        None | Some(Commands::Chat) => run_chat(&endpoint).await?,
        Some(Commands::Ask { message }) => ask(&endpoint, &message).await,
        Some(Commands::Endpoint { url }) => match url {
            Some(url) => {
                Config::save_endpoint(&url)?;
                println!("Endpoint saved: {}", url.green());
            }
            None => println!("{}", endpoint),
        },
    }

    Ok(())
}

async fn run_chat(endpoint: &str) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let mut app = App::new(ChatClient::new(endpoint));

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(&mut app, event);
        }

        // Settle the in-flight request if it finished; the 300ms tick keeps
        // this loop turning while the user isn't typing
        app.poll_reply().await;
    }

    tui::restore()?;
    Ok(())
}

async fn ask(endpoint: &str, message: &str) {
    match ChatClient::new(endpoint).send(message).await {
        Ok(BotReply::Text(text)) => {
            println!("{}", text);
        }
        Ok(BotReply::ServerError(detail)) => {
            println!("{}", SERVER_ERROR_TEXT.red());
            eprintln!("{}: {}", "Server error".red(), detail);
            std::process::exit(1);
        }
        Ok(BotReply::Empty) => {
            println!("{}", NO_RESPONSE_TEXT.yellow());
        }
        Err(e) => {
            println!("{}", TRANSPORT_FAILURE_TEXT.red());
            eprintln!("{}: {}", "Request failed".red(), e);
            std::process::exit(1);
        }
    }
}
