use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use accounts::config::AccountsConfig;
use accounts::contract::model::{AccountPatch, AccountProfile, NewAccount, PasswordChange};
use accounts::contract::{AccountsApi, AccountsError};
use accounts::infra::storage::bootstrap_schema;
use accounts::Accounts;
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use db::{ConnectOpts, DbEngine, DbHandle};
use runtime::{AppConfig, CliArgs, DatabaseConfig};

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps in-memory DSNs as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> Result<String> {
    if db::is_sqlite_memory(dsn) {
        return Ok(dsn.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))
        .ok_or_else(|| anyhow!("DSN must start with sqlite: (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    // Rebuild DSN with absolute path and normalized slashes
    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Accounts CLI - manage user accounts from the command line
#[derive(Parser)]
#[command(name = "accounts-cli")]
#[command(about = "Accounts CLI - create, inspect and authenticate user accounts")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database URL (overrides config)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use a throwaway in-memory database
    #[arg(long, global = true)]
    mock: bool,

    /// Create the users table if it is missing
    #[arg(long, global = true)]
    init_schema: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check configuration
    Check,
    /// Create an account
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Show an account
    Get {
        #[arg(long)]
        username: String,
    },
    /// Check credentials
    SignIn(Credentials),
    /// Replace username and email of an account
    Update {
        #[arg(long)]
        username: String,
        #[arg(long)]
        new_username: String,
        #[arg(long)]
        new_email: String,
    },
    /// Change the password of an account
    ChangePassword {
        #[arg(long)]
        username: String,
        #[arg(long)]
        current_password: String,
        #[arg(long)]
        new_password: String,
        /// Repeat of the new password; defaults to --new-password
        #[arg(long)]
        confirm_password: Option<String>,
    },
}

#[derive(Args)]
struct Credentials {
    #[arg(long)]
    username: String,
    #[arg(long)]
    password: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // CLI args passed down to config/app
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        database_url: cli.database_url.clone(),
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    // Apply CLI overrides (database / verbosity)
    config.apply_cli_overrides(&args);

    // Initialize logging
    runtime::logging::init_logging_from_config(&config);
    tracing::debug!("Accounts CLI starting");

    // Print config and exit if requested
    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        check_config(&config).await?;
        return Ok(ExitCode::SUCCESS);
    };

    let command = match command {
        Commands::Check => {
            check_config(&config).await?;
            return Ok(ExitCode::SUCCESS);
        }
        other => other,
    };

    let accounts_cfg: AccountsConfig = config.module_config("accounts")?;
    let db = connect_db(&config, cli.mock || cli.init_schema).await?;
    let module = Accounts::init(db.clone(), &accounts_cfg)?;
    let client = module.client();

    let outcome = run_command(client.as_ref(), command).await;
    db.pool().close().await;

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::debug!(error = %e, "Command failed");
            eprintln!("error: {e}");
            Ok(ExitCode::from(exit_code_for(&e)))
        }
    }
}

async fn run_command(client: &dyn AccountsApi, command: Commands) -> Result<(), AccountsError> {
    match command {
        Commands::Check => Ok(()),
        Commands::Create {
            username,
            email,
            password,
        } => {
            let id = client
                .create_account(NewAccount {
                    username,
                    email,
                    password,
                })
                .await?;
            println!("created account {id}");
            Ok(())
        }
        Commands::Get { username } => {
            let profile = client.get_account(&username).await?;
            print_profile(&profile);
            Ok(())
        }
        Commands::SignIn(Credentials { username, password }) => {
            let profile = client.sign_in(&username, &password).await?;
            println!("signed in");
            print_profile(&profile);
            Ok(())
        }
        Commands::Update {
            username,
            new_username,
            new_email,
        } => {
            let profile = client
                .update_account(
                    &username,
                    AccountPatch {
                        username: new_username,
                        email: new_email,
                    },
                )
                .await?;
            print_profile(&profile);
            Ok(())
        }
        Commands::ChangePassword {
            username,
            current_password,
            new_password,
            confirm_password,
        } => {
            let confirm_password = confirm_password.unwrap_or_else(|| new_password.clone());
            client
                .change_password(
                    &username,
                    PasswordChange {
                        current_password,
                        new_password,
                        confirm_password,
                    },
                )
                .await?;
            println!("password changed");
            Ok(())
        }
    }
}

fn print_profile(profile: &AccountProfile) {
    println!("id: {}", profile.id);
    println!("username: {}", profile.username);
    println!("email: {}", profile.email);
}

/// Distinct exit status per failure kind so scripts can branch on it.
fn exit_code_for(e: &AccountsError) -> u8 {
    match e {
        AccountsError::Unexpected => 1,
        AccountsError::ValidationFailed { .. } => 2,
        AccountsError::NotFound { .. } => 3,
        AccountsError::UsernameTaken { .. } => 4,
        AccountsError::InvalidPassword => 5,
    }
}

fn database_config(config: &AppConfig) -> Result<&DatabaseConfig> {
    let db_config = config
        .database
        .as_ref()
        .ok_or_else(|| anyhow!("Database URL not configured"))?;
    if db_config.url.trim().is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    Ok(db_config)
}

async fn connect_db(config: &AppConfig, init_schema: bool) -> Result<Arc<DbHandle>> {
    let db_config = database_config(config)?;

    let mut dsn = db_config.url.trim().to_owned();
    let engine = DbHandle::detect(&dsn)?;

    // Absolutize sqlite DSNs to avoid cwd issues
    if engine == DbEngine::Sqlite {
        dsn = absolutize_sqlite_dsn(&dsn, Path::new(&config.home_dir))?;
    }

    let connect_opts = ConnectOpts {
        max_conns: db_config.max_conns,
        acquire_timeout: Some(Duration::from_secs(5)),
        sqlite_busy_timeout: db_config
            .busy_timeout_ms
            .map(|ms| Duration::from_millis(ms as u64)),
        create_sqlite_dirs: true,
        ..Default::default()
    };

    tracing::info!(dsn = %db::redact_credentials_in_dsn(&dsn), "Connecting to database");
    let db = DbHandle::connect(&dsn, connect_opts)
        .await
        .context("Failed to connect to database")?;
    tracing::info!(backend = ?db.engine(), dsn = %db.dsn(), "Connected to database");

    if init_schema {
        bootstrap_schema(&db)
            .await
            .context("Failed to create users table")?;
    }

    Ok(Arc::new(db))
}

async fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    // AppConfig::load_* already normalized & created home_dir
    let db_config = database_config(config)?;
    DbHandle::detect(&db_config.url).context("Invalid database URL")?;
    config.module_config::<AccountsConfig>("accounts")?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);

    Ok(())
}
