//! `todo` command-line client
//!
//! Manages a remote to-do list through the authenticated gateway. Tokens and
//! preferences persist in a local JSON storage file between invocations.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde_json::json;
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use todo_client::api::TaskApi;
use todo_client::app::TodoApp;
use todo_client::cli::{Cli, Command, DarkModeArg, LoginArgs};
use todo_client::config::{Config, ConfigLoader, ConfigPaths};
use todo_client::error::ClientError;
use todo_client::format::{
    OutputFormat, StatusReport, format_status_markdown, format_task_markdown,
    format_tasks_markdown, to_json,
};
use todo_client::gateway::Gateway;
use todo_client::logging::{self, LogTarget};
use todo_client::preferences::Preferences;
use todo_client::store::{FileStorage, StorageCredentials};
use todo_client::types::{Task, TaskId};
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&LogTarget::parse(&cli.log), cli.verbose) {
        eprintln!("Warning: failed to initialize logging: {:#}", e);
    }

    let format = OutputFormat::from(cli.format);
    match run(cli).await {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_error(&err, format);
            ExitCode::FAILURE
        }
    }
}

/// Load tiered configuration and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut paths = ConfigPaths::discover();
    if let Some(ref path) = cli.config {
        paths = paths.with_explicit_file(path);
    }

    let loader = ConfigLoader::load_with_paths(paths)?;
    if let Some(path) = loader.config_path() {
        debug!(path = %path.display(), "Using config file");
    }
    let mut config = loader.into_config();

    if let Some(ref url) = cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(ref storage) = cli.storage {
        config.storage.path = storage.into();
    }

    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<String> {
    let format = OutputFormat::from(cli.format);
    let config = load_config(&cli)?;

    let storage = Arc::new(FileStorage::open(&config.storage.path).with_context(|| {
        format!("opening storage file {}", config.storage.path.display())
    })?);
    let credentials = Arc::new(StorageCredentials::new(storage.clone()));
    let gateway = Gateway::new(config.api.clone(), credentials)?;
    let preferences = Preferences::new(storage.clone());
    let mut app = TodoApp::new(TaskApi::new(gateway.clone()), preferences);

    match cli.command {
        Command::List { filter } => {
            app.set_filter(filter.into());
            app.load().await?;
            Ok(render_list(&app, format))
        }
        Command::Add { title } => match app.add(&title.join(" ")).await? {
            Some(task) => Ok(render_task(&task, format)),
            None => Err(anyhow!("task title must not be blank")),
        },
        Command::Toggle { id } => {
            let id = TaskId::parse(&id);
            app.load().await?;
            let task = app.toggle(&id).await?;
            Ok(render_task(&task, format))
        }
        Command::Edit { id, title } => {
            let id = TaskId::parse(&id);
            app.load().await?;
            app.start_editing(&id)?;
            let renamed = app.rename(&id, &title.join(" ")).await;
            app.stop_editing(&id);
            match renamed? {
                Some(task) => Ok(render_task(&task, format)),
                None => Err(anyhow!("task title must not be blank")),
            }
        }
        Command::Delete { id } => {
            let id = TaskId::parse(&id);
            app.load().await?;
            let task = app.delete(&id).await?;
            Ok(match format {
                OutputFormat::Json => format!("{}\n", to_json(&json!({ "deleted": task }))),
                OutputFormat::Markdown => format!("Deleted `{}` {}\n", task.id, task.title),
            })
        }
        Command::Login(args) => login(&gateway, args, format).await,
        Command::Logout => {
            gateway.logout()?;
            Ok(render_message("Logged out", format))
        }
        Command::Status => {
            let claims = gateway.session_claims();
            let status = StatusReport::new(
                config.api.base_url.clone(),
                storage.path().display().to_string(),
                gateway.is_authenticated(),
                claims.as_ref(),
                app.dark_mode(),
            );
            Ok(match format {
                OutputFormat::Json => format!("{}\n", to_json(&status)),
                OutputFormat::Markdown => format_status_markdown(&status),
            })
        }
        Command::DarkMode { mode } => {
            let enabled = match mode {
                None => app.dark_mode(),
                Some(DarkModeArg::On) => {
                    app.set_dark_mode(true)?;
                    true
                }
                Some(DarkModeArg::Off) => {
                    app.set_dark_mode(false)?;
                    false
                }
                Some(DarkModeArg::Toggle) => app.toggle_dark_mode()?,
            };
            Ok(match format {
                OutputFormat::Json => format!("{}\n", to_json(&json!({ "dark_mode": enabled }))),
                OutputFormat::Markdown => {
                    format!("Dark mode: {}\n", if enabled { "on" } else { "off" })
                }
            })
        }
    }
}

async fn login(gateway: &Gateway, args: LoginArgs, format: OutputFormat) -> Result<String> {
    let password = match args.password {
        Some(password) => password,
        None => read_password()?,
    };
    gateway.login(&args.username, &password).await?;
    Ok(render_message(
        &format!("Logged in as {}", args.username),
        format,
    ))
}

fn read_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn render_list<S: todo_client::api::TaskService>(app: &TodoApp<S>, format: OutputFormat) -> String {
    let visible = app.visible();
    match format {
        OutputFormat::Json => format!("{}\n", to_json(&visible)),
        OutputFormat::Markdown => format_tasks_markdown(&visible, app.filter(), app.counts()),
    }
}

fn render_task(task: &Task, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format!("{}\n", to_json(task)),
        OutputFormat::Markdown => format_task_markdown(task),
    }
}

fn render_message(message: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format!("{}\n", to_json(&json!({ "message": message }))),
        OutputFormat::Markdown => format!("{}\n", message),
    }
}

/// What the user should do about a failed command.
fn hint_for(err: &ClientError) -> Option<&'static str> {
    if err.requires_login() {
        return Some("Your session has expired. Run `todo login --username <name>`.");
    }
    match err {
        ClientError::LoginFailed(_) => Some("Check the username and password."),
        ClientError::NetworkFailure(_) => {
            Some("Check that the API is reachable (see `todo status` for the URL).")
        }
        ClientError::TaskNotFound(_) => Some("Run `todo list` to see task ids."),
        _ => None,
    }
}

fn report_error(err: &anyhow::Error, format: OutputFormat) {
    match err.downcast_ref::<ClientError>() {
        Some(client_err) => {
            debug!(code = ?client_err.code(), error = %client_err, "Command failed");
            let mut report = client_err.report();
            if let Some(hint) = hint_for(client_err) {
                report = report.with_hint(hint);
            }
            match format {
                OutputFormat::Json => println!("{}", to_json(&report)),
                OutputFormat::Markdown => {
                    eprintln!("Error: {}", report.message);
                    if let Some(ref hint) = report.hint {
                        eprintln!("{}", hint);
                    }
                }
            }
        }
        None => {
            debug!(error = %format!("{:#}", err), "Command failed");
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    to_json(&json!({ "code": "INTERNAL_ERROR", "message": format!("{:#}", err) }))
                ),
                OutputFormat::Markdown => eprintln!("Error: {:#}", err),
            }
        }
    }
}
