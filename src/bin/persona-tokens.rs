use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use persona_tokens::cache::MemoryCache;
use persona_tokens::signing;
use persona_tokens::tokens::{ObtainTokenOptions, TokenService, ValidateTokenOptions};
use persona_tokens::transport::ReqwestTransport;
use persona_tokens::utils::config_loader;
use persona_tokens::utils::logging::{self, LogLevel};
use serde_json::json;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "persona-tokens.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// Print the prometheus exposition after the command
    #[arg(long)]
    print_metrics: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Obtain an access token with the client credentials grant
    Obtain {
        #[arg(long, env = "PERSONA_CLIENT_ID")]
        client_id: String,
        #[arg(long, env = "PERSONA_CLIENT_SECRET")]
        client_secret: String,
        #[arg(long)]
        scope: Option<String>,
        #[arg(long)]
        no_cache: bool,
    },
    /// Validate a bearer token, optionally against required scopes
    Validate {
        #[arg(long)]
        token: String,
        #[arg(long = "scope")]
        scopes: Vec<String>,
    },
    /// List the scopes carried by a token
    Scopes {
        #[arg(long)]
        token: String,
    },
    /// Presign a URL with a shared secret
    Presign {
        #[arg(long)]
        url: String,
        #[arg(long, env = "PERSONA_SIGNING_SECRET")]
        secret: String,
        /// Unix timestamp, defaults to fifteen minutes from now
        #[arg(long)]
        expires: Option<i64>,
    },
    /// Check a presigned URL
    VerifyUrl {
        #[arg(long)]
        url: String,
        #[arg(long, env = "PERSONA_SIGNING_SECRET")]
        secret: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, set up logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config.settings, args.log_level);

    // -------------------------------
    // 2. Build the token service
    // -------------------------------

    let service = TokenService::new(
        service_config.persona.clone(),
        Arc::new(MemoryCache::new()),
        Arc::new(ReqwestTransport::new()),
    )
    .context("failed to build token service")?;
    info!(host = %service.settings().host, "token service ready");

    // -------------------------------
    // 3. Run the command
    // -------------------------------

    let output = match args.command {
        Command::Obtain { client_id, client_secret, scope, no_cache } => {
            let options = ObtainTokenOptions { scope, use_cache: !no_cache };
            let token = service.obtain_new_token(&client_id, &client_secret, options).await?;
            serde_json::to_value(token)?
        }
        Command::Validate { token, scopes } => {
            let result = service
                .validate_token(ValidateTokenOptions::token(token).with_scope(scopes))
                .await?;
            serde_json::to_value(result)?
        }
        Command::Scopes { token } => {
            let scopes = service.list_scopes(&token).await?;
            json!({ "scopes": scopes })
        }
        Command::Presign { url, secret, expires } => {
            json!({ "url": signing::presign_url(&url, &secret, expires)? })
        }
        Command::VerifyUrl { url, secret } => {
            json!({ "valid": signing::is_presigned_url_valid(&url, &secret) })
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    // -------------------------------
    // 4. Metrics
    // -------------------------------

    if args.print_metrics || service_config.settings.metrics.is_enabled {
        print!("{}", service.metrics().render()?);
    }

    Ok(())
}
