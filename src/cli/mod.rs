pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "movies-api-rust")]
#[command(about = "Movies API - document store for movies, people and credits")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides PORT")]
        port: Option<u16>,
    },

    #[command(about = "Apply the PostgreSQL schema")]
    Migrate,

    #[command(about = "Create an admin account")]
    CreateAdmin {
        #[arg(help = "Username")]
        username: String,
        #[arg(help = "Password")]
        password: String,
    },

    #[command(about = "Person document management")]
    Person {
        #[command(subcommand)]
        cmd: commands::person::PersonCommands,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::Migrate => commands::admin::migrate(output_format).await,
        Commands::CreateAdmin { username, password } => {
            commands::admin::create_admin(&username, &password, output_format).await
        }
        Commands::Person { cmd } => commands::person::handle(cmd, output_format).await,
    }
}
