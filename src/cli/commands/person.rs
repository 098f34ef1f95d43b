use anyhow::{anyhow, Context};
use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::models::Person;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum PersonCommands {
    #[command(about = "Insert a person document and print its id")]
    Add {
        #[arg(help = "Person attributes as a JSON object, e.g. '{\"name\":\"Frank Herbert\"}'")]
        json: String,
    },
}

pub async fn handle(cmd: PersonCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PersonCommands::Add { json } => add(&json, output_format).await,
    }
}

async fn add(raw: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let value: Value = serde_json::from_str(raw).context("person must be valid JSON")?;
    let Value::Object(attributes) = value else {
        return Err(anyhow!("person must be a JSON object"));
    };

    let state = AppState::from_config(config().clone()).await?;
    let person = state.store.insert_person(Person::new(attributes)).await?;

    tracing::debug!(person_id = %person.id, "Inserted person");
    match output_format {
        OutputFormat::Json => output_success(&output_format, "Person created", Some(json!({ "id": person.id }))),
        OutputFormat::Text => {
            println!("{}", person.id);
            Ok(())
        }
    }
}
