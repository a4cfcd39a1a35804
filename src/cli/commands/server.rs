use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check a running server's health endpoint")]
    Health {
        #[arg(long, default_value = "http://localhost:5000", help = "Server base URL")]
        url: String,
    },

    #[command(about = "Ask the server which sign-in methods an email already has")]
    CheckEmail {
        email: String,

        #[arg(long, default_value = "http://localhost:5000", help = "Server base URL")]
        url: String,
    },
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Health { url } => {
            let endpoint = format!("{}/health", url.trim_end_matches('/'));
            let response = reqwest::get(&endpoint).await?;
            let status = response.status();
            let body: Value = response.json().await?;

            if status.is_success() {
                output_success(&output_format, "Server is healthy", Some(body))
            } else {
                output_error(
                    &output_format,
                    &format!("Server degraded ({}): {}", status, body),
                )
            }
        }
        ServerCommands::CheckEmail { email, url } => {
            let endpoint = format!("{}/api/check-email", url.trim_end_matches('/'));
            let response = reqwest::Client::new()
                .get(&endpoint)
                .query(&[("email", email.as_str())])
                .send()
                .await?;
            let status = response.status();
            let body: Value = response.json().await?;

            if status.is_success() {
                output_success(&output_format, &format!("Lookup for {}", email), Some(body))
            } else {
                output_error(
                    &output_format,
                    &format!(
                        "{}",
                        body.get("message").and_then(Value::as_str).unwrap_or("lookup failed")
                    ),
                )
            }
        }
    }
}
