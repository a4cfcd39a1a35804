use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::identity::token::{self, Claims};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Mint a development bearer token the server will accept")]
    Token {
        #[arg(long, help = "Identity-provider subject id")]
        uid: String,

        #[arg(long, help = "Email claim for the token")]
        email: String,

        #[arg(long, default_value_t = 3600, help = "Token lifetime in seconds")]
        ttl_secs: i64,
    },
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Token { uid, email, ttl_secs } => {
            let identity = &crate::config::config().identity;
            let claims = Claims::new(uid, email, identity, ttl_secs);
            let minted = token::mint(&claims, identity)?;

            output_success(
                &output_format,
                "Token minted",
                Some(json!({ "token": minted, "expiresIn": ttl_secs })),
            )
        }
    }
}
