mod cli;
mod commands;
mod config;
mod hint;
mod output;
mod session;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use reqwest::cookie::Jar;
use salonads_client::{AdService, AuthService, ReqwestTransport, SalonService, SessionConfig};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use cli::{Cli, Commands, OutputFormat};
use hint::SignInHint;
use output::print_error;
use session::StoredSession;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    if let Err(e) = run(cli).await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over `--log-level`. Logs go to stderr so output stays
/// pipeable.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    let profile = cli.profile.as_str();
    let profile_cfg = config::load_profile(profile)?;
    let format = match (cli.format, profile_cfg.format.as_deref()) {
        (Some(format), _) => format,
        (None, Some(stored)) => OutputFormat::from_str(stored, true)
            .map_err(|e| anyhow::anyhow!("Invalid format in config: {e}"))?,
        (None, None) => OutputFormat::default(),
    };

    if let Commands::Config(args) = &cli.command {
        return config_command(&args.command, profile, profile_cfg);
    }

    let server = config::resolve_server(cli.server.as_deref(), profile)?;
    let jar = restore_jar(profile, &server)?;
    let hint = Arc::new(SignInHint::default());
    let auth = connect(&server, Arc::clone(&jar), Arc::clone(&hint))?;

    let outcome = match &cli.command {
        Commands::Login(args) => commands::auth::login(&auth, args, &server).await,
        Commands::Logout => return commands::auth::logout(&auth, &hint, profile).await,
        Commands::Whoami => commands::auth::whoami(&auth, profile, format).await,
        Commands::Register(args) => commands::auth::register(&auth, args, format).await,
        Commands::ForgotPassword(args) => commands::auth::forgot_password(&auth, args).await,
        Commands::ResetPassword(args) => commands::auth::reset_password(&auth, args).await,
        Commands::Salons(args) => {
            let salons = SalonService::new(auth.api().clone());
            commands::salons::run(&salons, &args.command, format).await
        }
        Commands::Ads(args) => {
            let ads = AdService::new(auth.api().clone());
            commands::ads::run(&ads, &args.command, format).await
        }
        // handled before connecting
        Commands::Config(_) => return Ok(()),
    };

    // refreshed tokens arrive as cookies even when the command itself fails
    session::persist_after(outcome, || {
        session::save(profile, &StoredSession::capture(&server, &jar)?)
    })
}

fn restore_jar(profile: &str, server: &str) -> Result<Arc<Jar>> {
    match session::load(profile)? {
        Some(stored) if stored.server == server => stored.restore(),
        Some(stored) => {
            tracing::debug!(stored = %stored.server, server, "Ignoring session for another server");
            Ok(Arc::new(Jar::default()))
        }
        None => Ok(Arc::new(Jar::default())),
    }
}

fn connect(server: &str, jar: Arc<Jar>, hint: Arc<SignInHint>) -> Result<AuthService> {
    let mut config = SessionConfig::load(None).context("Failed to load client configuration")?;
    config.base_url = server.to_string();
    let transport = ReqwestTransport::with_jar(&config, jar)?;
    let auth = AuthService::builder(config)
        .transport(Arc::new(transport))
        .redirect(hint)
        .build()?;
    Ok(auth)
}

fn config_command(
    command: &cli::ConfigCommands,
    profile: &str,
    mut cfg: config::ProfileConfig,
) -> Result<()> {
    match command {
        cli::ConfigCommands::Show => {
            println!("{}: {}", "Profile".cyan(), profile);
            println!(
                "{}: {}",
                "Server".cyan(),
                cfg.server.as_deref().unwrap_or("(not set)")
            );
            println!(
                "{}: {}",
                "Format".cyan(),
                cfg.format.as_deref().unwrap_or("json")
            );
        }
        cli::ConfigCommands::Set(set_args) => {
            match set_args.key.as_str() {
                "server" => {
                    url::Url::parse(&set_args.value)
                        .with_context(|| format!("Invalid URL: {}", set_args.value))?;
                    cfg.server = Some(set_args.value.clone());
                }
                "format" => {
                    OutputFormat::from_str(&set_args.value, true)
                        .map_err(|e| anyhow::anyhow!("Invalid format: {e}"))?;
                    cfg.format = Some(set_args.value.clone());
                }
                other => anyhow::bail!("Unknown config key: {other}. Valid keys: server, format"),
            }
            config::save_profile(profile, &cfg)?;
            output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
        }
    }
    Ok(())
}
