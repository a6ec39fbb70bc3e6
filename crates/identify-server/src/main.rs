/*!
 * identify
 *
 * Passphrase-protected identities, self-signed bearer tokens and sealed secrets:
 *   identify new-identity --alias alice
 *   identify new-token --id alice
 *   identify put-secret --key k1 --value v1
 *   identify get-secret --id alice --key k1
 *   identify listen
 */

mod api;
mod commands;
mod config;
mod credentials;
mod error;
mod middleware;
mod state;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use config::Config;
use state::AppState;

#[derive(Parser)]
#[command(name = "identify")]
#[command(about = "Authentication and authorization service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Listen,
    /// Create a new identity
    NewIdentity {
        /// Alias to register for the identity (repeatable)
        #[arg(short, long = "alias")]
        aliases: Vec<String>,
    },
    /// Show an identity's public information
    GetIdentity {
        /// Identity ID or alias
        id: String,
    },
    /// Authenticate and issue a token, saving it for later commands
    NewToken {
        /// Identity ID or alias
        #[arg(long)]
        id: String,

        /// Token lifetime in seconds (capped at the server maximum)
        #[arg(long)]
        max_age: Option<u64>,

        /// Permission to grant (repeatable)
        #[arg(short, long = "permission")]
        permissions: Vec<String>,
    },
    /// Revoke a token using the saved token
    DeleteToken {
        /// Token to revoke (defaults to the saved token)
        #[arg(long)]
        token_id: Option<Uuid>,
    },
    /// Store a secret for the identity behind the saved token
    PutSecret {
        #[arg(short, long)]
        key: String,

        #[arg(short, long)]
        value: String,
    },
    /// Read a secret
    GetSecret {
        /// Identity ID or alias
        #[arg(long)]
        id: String,

        #[arg(short, long)]
        key: String,
    },
    /// Seal a message to an identity
    Seal {
        /// Recipient identity ID or alias
        #[arg(long)]
        to: String,

        /// Sender identity ID or alias; seals anonymously when omitted
        #[arg(long)]
        from: Option<String>,

        #[arg(short, long)]
        message: String,
    },
    /// Open a message sealed to you
    Open {
        /// Identity ID or alias
        #[arg(long)]
        id: String,

        /// Expected sender, for messages sealed with `seal --from`
        #[arg(long)]
        from: Option<String>,

        /// Sealed message (base64)
        #[arg(short, long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identify_server=debug,identify_identity=info,identify_tokens=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    if let Commands::Listen = cli.command {
        return commands::listen::listen(config).await;
    }

    let state = AppState::new(config).await?;
    let result = dispatch(&state, cli.command).await;
    state.close().await?;

    result
}

async fn dispatch(state: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Listen => anyhow::bail!("listen opens its own stores"),

        Commands::NewIdentity { aliases } => {
            commands::identity::new_identity(state, &aliases).await
        }

        Commands::GetIdentity { id } => commands::identity::get_identity(state, &id).await,

        Commands::NewToken {
            id,
            max_age,
            permissions,
        } => commands::tokens::new_token(state, &id, max_age, &permissions).await,

        Commands::DeleteToken { token_id } => {
            commands::tokens::delete_token(state, token_id).await
        }

        Commands::PutSecret { key, value } => {
            commands::secrets::put_secret(state, &key, &value).await
        }

        Commands::GetSecret { id, key } => commands::secrets::get_secret(state, &id, &key).await,

        Commands::Seal { to, from, message } => {
            commands::messages::seal(state, &to, from.as_deref(), &message).await
        }

        Commands::Open { id, from, message } => {
            commands::messages::open(state, &id, from.as_deref(), &message).await
        }
    }
}
