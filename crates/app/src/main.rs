use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use adminshell_application::Shell;
use adminshell_core::{Location, ShellConfig};
use adminshell_gateway::HttpAuthenticator;
use adminshell_storage::KvStore;
use adminshell_ui::Ui;
use anyhow::Context as _;
use clap::Parser;
use directories::ProjectDirs;
use tracing_subscriber::EnvFilter;

const LOGIN_URL_ENV: &str = "ADMINSHELL_LOGIN_URL";
const LOG_ENV: &str = "ADMINSHELL_LOG";

/// Terminal admin console with a sidebar, tabs and a login gate.
#[derive(Debug, Parser)]
#[command(name = "adminshell", version)]
struct Args {
    /// Location to open first, e.g. `/user-list`.
    #[arg(long, default_value = "/")]
    path: String,

    /// Login endpoint; overrides the config file and environment.
    #[arg(long)]
    login_url: Option<String>,

    /// Config file to read instead of the default `config.json`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the durable store and the log file.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let project_dirs =
        ProjectDirs::from("dev", "adminshell", "adminshell").context("resolve project dirs")?;

    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;

    init_logging(&data_dir.join("adminshell.log"));

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| project_dirs.config_dir().join("config.json"));
    let file_config = load_config(&config_path)?;
    let config = resolve_config(
        file_config,
        std::env::var(LOGIN_URL_ENV).ok(),
        args.login_url.clone(),
    );
    tracing::info!(
        login_url = %config.login_url,
        policy = %config.home_tab_policy,
        "starting"
    );

    let durable = KvStore::open(&data_dir.join("adminshell.db"))?;
    let ephemeral = KvStore::ephemeral()?;
    let authenticator = HttpAuthenticator::new(&config.login_url, config.login_timeout())?;

    let shell = Shell::new(
        config,
        durable,
        ephemeral,
        Arc::new(authenticator),
        Location::new(&args.path),
    );
    let mut ui = Ui::new(shell);
    ui.run()?;

    tracing::info!("exit");
    Ok(())
}

/// Reads `path` as JSON. A missing file yields the defaults.
fn load_config(path: &Path) -> anyhow::Result<ShellConfig> {
    if !path.exists() {
        return Ok(ShellConfig::default());
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse config {}", path.display()))
}

/// Applies overrides in order: file, environment, command line.
fn resolve_config(
    mut config: ShellConfig,
    env_login_url: Option<String>,
    cli_login_url: Option<String>,
) -> ShellConfig {
    if let Some(url) = env_login_url.filter(|url| !url.trim().is_empty()) {
        config.login_url = url;
    }
    if let Some(url) = cli_login_url {
        config.login_url = url;
    }
    config.normalize();
    config
}

fn init_logging(log_path: &Path) {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let file = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("failed to open log file {}: {err}", log_path.display());
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}
