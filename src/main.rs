use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use project_porter::cli::{self, Action, Invocation};
use project_porter::client::OctopusClient;
use project_porter::config::{Config, ExitPolicy, PartialConfig};
use project_porter::secrets::SqliteSecretStore;
use project_porter::transfer::{self, ImportMode};

#[derive(Parser)]
#[command(name = "porter")]
#[command(about = "Export and import deployment project definitions as JSON snapshots")]
struct Cli {
    /// Config file (default: <config dir>/project-porter/config.json)
    #[arg(long, env = "PORTER_CONFIG")]
    config: Option<PathBuf>,

    /// Deployment server base URL
    #[arg(long)]
    server_url: Option<String>,

    /// API key for the deployment server
    #[arg(long)]
    api_key: Option<String>,

    /// SQLite datastore holding sensitive variable values
    #[arg(long)]
    secret_store: Option<PathBuf>,

    /// Exit non-zero on usage errors and failed operations
    #[arg(long)]
    strict_exit: bool,

    /// /action:(export|import) /project:NAME /path:DIR
    #[arg(value_name = "/KEY:VALUE", allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Cli {
    fn overrides(&self) -> PartialConfig {
        PartialConfig {
            server_url: self.server_url.clone(),
            api_key: self.api_key.clone(),
            secret_store: self.secret_store.clone(),
            exit_policy: self.strict_exit.then_some(ExitPolicy::Strict),
        }
    }
}

/// Logs go to stderr; stdout carries the progress lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "project_porter=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_usage(error: &dyn std::fmt::Display) {
    println!("Incorrect Arguments: {}", error);
    println!("{}", cli::USAGE);
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            print_usage(&e.kind());
            let policy = PartialConfig::from_env().exit_policy.unwrap_or_default();
            return ExitCode::from(policy.usage_code());
        }
    };

    // usage errors are reported before any config is required
    let early_policy = cli
        .overrides()
        .exit_policy
        .or(PartialConfig::from_env().exit_policy)
        .unwrap_or_default();

    let invocation = match cli::parse_tokens(&cli.args) {
        Ok(invocation) => invocation,
        Err(e) => {
            print_usage(&e);
            return ExitCode::from(early_policy.usage_code());
        }
    };

    let config = match Config::load(cli.config.as_deref(), cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            println!("[Error:] -- {:#}", e);
            return ExitCode::from(early_policy.failure_code());
        }
    };

    match run(&config, &invocation).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            println!("[Error:] -- {:#}", e);
            ExitCode::from(config.exit_policy.failure_code())
        }
    }
}

fn open_secret_store(config: &Config) -> anyhow::Result<Option<SqliteSecretStore>> {
    config
        .secret_store
        .as_deref()
        .map(|path| {
            SqliteSecretStore::open(path)
                .with_context(|| format!("Failed to open secret store {}", path.display()))
        })
        .transpose()
}

async fn run(config: &Config, invocation: &Invocation) -> anyhow::Result<()> {
    let client = OctopusClient::from_config(config);
    let name = &invocation.project;
    let path = &invocation.path;

    match invocation.action {
        Action::Export => {
            let secrets = open_secret_store(config)?
                .context("Export needs a secret store (--secret-store)")?;
            println!("---> Exporting project : {} to : {}", name, path.display());
            let report = transfer::export(&client, &secrets, name, path)
                .await
                .context("Exception during export process")?;
            if report.sensitive_missing > 0 {
                println!(
                    "---> {} sensitive values had no stored value and were exported empty",
                    report.sensitive_missing
                );
            }
            println!("---> Project : {} exported", name);
        }
        Action::Import => {
            println!("---> Importing project {} from : {}", name, path.display());
            // the store is only touched when an existing project is updated
            let report = if transfer::project_exists(&client, name).await? {
                let secrets = open_secret_store(config)?;
                transfer::update(&client, secrets.as_ref(), name, path).await?
            } else {
                transfer::create(&client, name, path).await?
            };
            for skipped in &report.channels_skipped {
                println!("---> Channel {} skipped: {}", skipped.name, skipped.reason);
            }
            let verb = match report.mode {
                ImportMode::Created => "created",
                ImportMode::Updated => "updated",
            };
            println!("---> Project : {} imported ({})", name, verb);
        }
    }

    Ok(())
}
