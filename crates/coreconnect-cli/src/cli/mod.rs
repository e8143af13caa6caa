//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use coreconnect_core::config;
use tracing_subscriber::EnvFilter;

mod commands;

/// Environment variable holding the log filter (e.g. `debug`, `coreconnect_core=trace`).
const LOG_ENV: &str = "CORECONNECT_LOG";

#[derive(Parser)]
#[command(name = "coreconnect")]
#[command(version)]
#[command(about = "Core Connect HR account client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
        /// Location to continue to after signing in
        #[arg(long, value_name = "PATH")]
        from: Option<String>,
    },

    /// Create an account and sign in
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: Option<String>,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
        /// Defaults to the password
        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Check the stored access token with the server
    Verify,

    /// Exchange the refresh token for a new access token
    Refresh,

    /// Request a password reset email
    ForgotPassword {
        #[arg(long)]
        email: String,
    },

    /// Set a new password with a reset token
    ResetPassword {
        #[arg(long)]
        token: String,
        /// Read from stdin when omitted
        #[arg(long)]
        new_password: Option<String>,
    },

    /// Confirm an email address with the token from the verification email
    VerifyEmail {
        #[arg(value_name = "TOKEN")]
        token: String,
    },

    /// Send the verification email again
    ResendVerification {
        #[arg(long)]
        email: String,
    },

    /// Show the current session
    Status,

    /// Show the signed-in user
    Whoami,

    /// Navigate to a protected location
    Open {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Persist the API base URL
    SetApiUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetApiUrl { url } => commands::config::set_api_url(&url),
        },

        Commands::Login {
            email,
            password,
            from,
        } => {
            commands::auth::login(
                &config,
                &email,
                password.as_deref(),
                from.as_deref(),
            )
            .await
        }
        Commands::Signup {
            first_name,
            last_name,
            email,
            username,
            password,
            confirm_password,
        } => {
            commands::auth::signup(
                &config,
                commands::auth::SignupArgs {
                    first_name,
                    last_name,
                    email,
                    username,
                    password,
                    confirm_password,
                },
            )
            .await
        }
        Commands::Logout => commands::auth::logout(&config).await,
        Commands::Verify => commands::auth::verify(&config).await,
        Commands::Refresh => commands::auth::refresh(&config).await,
        Commands::ForgotPassword { email } => {
            commands::auth::forgot_password(&config, &email).await
        }
        Commands::ResetPassword {
            token,
            new_password,
        } => commands::auth::reset_password(&config, &token, new_password.as_deref()).await,
        Commands::VerifyEmail { token } => commands::auth::verify_email(&config, &token).await,
        Commands::ResendVerification { email } => {
            commands::auth::resend_verification(&config, &email).await
        }

        Commands::Status => commands::session::status(&config),
        Commands::Whoami => commands::session::whoami(&config),
        Commands::Open { path } => commands::session::open(&config, &path),
    }
}
