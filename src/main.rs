/// Version injected at compile time via KANIDM_TF_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("KANIDM_TF_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kanidm_tf::config::{Overrides, Settings};
use kanidm_tf::kanidm::{group, http, oauth2, person, service_account};
use kanidm_tf::resource;
use kanidm_tf::KanidmClient;
use serde::Serialize;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Manage Kanidm identity resources
#[derive(Parser, Debug)]
#[command(name = "kanidm-tf", version = VERSION, about, long_about = None)]
struct Args {
    /// Kanidm server URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Kanidm API token
    #[arg(long, global = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Person accounts
    #[command(subcommand)]
    Person(PersonCommand),
    /// Service accounts
    #[command(subcommand)]
    ServiceAccount(ServiceAccountCommand),
    /// Groups
    #[command(subcommand)]
    Group(GroupCommand),
    /// OAuth2 clients
    #[command(subcommand)]
    Oauth2(OAuth2Command),
    /// Settings file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum PersonCommand {
    Get { id: String },
    Delete { id: String },
    /// Mint a one-time credential reset token
    ResetToken {
        id: String,
        /// Token lifetime in seconds
        #[arg(long)]
        ttl: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
enum ServiceAccountCommand {
    Get { id: String },
    Delete { id: String },
    /// Mint a new API token
    Token {
        id: String,
        #[arg(long, default_value = service_account::INITIAL_TOKEN_LABEL)]
        label: String,
        /// Expiry as a unix timestamp in seconds
        #[arg(long)]
        expiry: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    Get { id: String },
    Delete { id: String },
    AddMembers {
        id: String,
        #[arg(required = true)]
        members: Vec<String>,
    },
    RemoveMembers {
        id: String,
        #[arg(required = true)]
        members: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum OAuth2Command {
    Get { name: String },
    Delete { name: String },
    /// Show the client secret
    Secret {
        name: String,
        /// Replace the secret; the old one stops working
        #[arg(long)]
        regenerate: bool,
    },
    #[command(subcommand)]
    ScopeMap(ScopeMapCommand),
}

#[derive(Subcommand, Debug)]
enum ScopeMapCommand {
    Set {
        name: String,
        group: String,
        #[arg(required = true)]
        scopes: Vec<String>,
    },
    Delete { name: String, group: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Show the resolved settings file
    Show,
    /// Persist --url and --timeout to the settings file
    Save,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&PathBuf>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let Some(log_path) = log_file else {
        tracing_subscriber::fmt()
            .with_max_level(tracing_level)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
        return Ok(None);
    };

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {:?}", parent))?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("kanidm-tf {} started with log level: {:?}", VERSION, level);

    Ok(Some(guard))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_guard = setup_logging(args.log_level, args.log_file.as_ref())?;

    let settings = Settings::load();
    let overrides = Overrides {
        url: args.url.clone(),
        token: args.token.clone(),
        timeout_secs: args.timeout,
    };

    if let Command::Config(cmd) = &args.command {
        return run_config(cmd, settings, &overrides);
    }

    let config = settings
        .resolve_from_env(&overrides)
        .context("Failed to resolve Kanidm connection settings")?;
    tracing::info!("Using Kanidm server {}", config.base_url);

    let client = KanidmClient::new(config).context("Failed to create Kanidm client")?;

    if let Err(err) = run(&client, args.command).await {
        if let Some(api_err) = err.downcast_ref::<kanidm_tf::Error>() {
            tracing::error!("{:?}", api_err);
            eprintln!("Error: {}", http::format_error(api_err));
            drop(log_guard);
            std::process::exit(1);
        }
        return Err(err);
    }

    Ok(())
}

fn run_config(cmd: &ConfigCommand, mut settings: Settings, overrides: &Overrides) -> Result<()> {
    let path = Settings::default_path().context("No configuration directory on this platform")?;

    match cmd {
        ConfigCommand::Show => {
            println!("# {}", path.display());
            print_json(&Settings {
                token: settings.token.as_ref().map(|_| "<redacted>".to_string()),
                ..settings
            })
        }
        ConfigCommand::Save => {
            if overrides.url.is_some() {
                settings.url = overrides.url.clone();
            }
            if overrides.timeout_secs.is_some() {
                settings.timeout_secs = overrides.timeout_secs;
            }
            settings.save_to(&path)?;
            println!("Saved {}", path.display());
            Ok(())
        }
    }
}

async fn run(client: &KanidmClient, command: Command) -> Result<()> {
    match command {
        Command::Person(cmd) => match cmd {
            PersonCommand::Get { id } => match resource::person::read(client, &id).await? {
                Some(p) => print_json(&p),
                None => anyhow::bail!("person '{}' not found", id),
            },
            PersonCommand::Delete { id } => Ok(person::delete_person(client, &id).await?),
            PersonCommand::ResetToken { id, ttl } => {
                let token = person::create_person_credential_reset_token(client, &id, ttl).await?;
                println!("{}", token);
                Ok(())
            }
        },
        Command::ServiceAccount(cmd) => match cmd {
            ServiceAccountCommand::Get { id } => {
                print_json(&service_account::get_service_account(client, &id).await?)
            }
            ServiceAccountCommand::Delete { id } => {
                Ok(service_account::delete_service_account(client, &id).await?)
            }
            ServiceAccountCommand::Token { id, label, expiry } => {
                let token = resource::service_account::rotate_token(client, &id, &label, expiry).await?;
                println!("{}", token);
                Ok(())
            }
        },
        Command::Group(cmd) => match cmd {
            GroupCommand::Get { id } => print_json(&group::get_group(client, &id).await?),
            GroupCommand::Delete { id } => Ok(group::delete_group(client, &id).await?),
            GroupCommand::AddMembers { id, members } => {
                Ok(group::add_group_members(client, &id, &members).await?)
            }
            GroupCommand::RemoveMembers { id, members } => {
                Ok(group::remove_group_members(client, &id, &members).await?)
            }
        },
        Command::Oauth2(cmd) => match cmd {
            OAuth2Command::Get { name } => print_json(&oauth2::get_oauth2_client(client, &name).await?),
            OAuth2Command::Delete { name } => Ok(oauth2::delete_oauth2_client(client, &name).await?),
            OAuth2Command::Secret { name, regenerate } => {
                let secret = if regenerate {
                    resource::oauth2::rotate_secret(client, &name).await?
                } else {
                    oauth2::get_oauth2_basic_secret(client, &name).await?
                };
                println!("{}", secret);
                Ok(())
            }
            OAuth2Command::ScopeMap(ScopeMapCommand::Set { name, group, scopes }) => {
                Ok(oauth2::set_oauth2_scope_map(client, &name, &group, &scopes).await?)
            }
            OAuth2Command::ScopeMap(ScopeMapCommand::Delete { name, group }) => {
                Ok(oauth2::delete_oauth2_scope_map(client, &name, &group).await?)
            }
        },
        Command::Config(_) => anyhow::bail!("config commands run without a server connection"),
    }
}
