//! RPA Console - Entry Point
//!
//! Operator console for a fleet of shadow bot automation hosts: lists
//! accounts, tasks and execution logs, starts and stops tasks through the
//! backend's control proxy, and follows the backend push channel.

use std::collections::HashMap;
use std::env;
use std::process::ExitCode;

use anyhow::Context;
use rpa_console::app::commands;
use rpa_console::app::options::AppOptions;
use rpa_console::app::run::run;
use rpa_console::control::{ControlDirective, ControlLedger, TaskController};
use rpa_console::http::HttpClient;
use rpa_console::logs::{init_logging, LogOptions};
use rpa_console::storage::settings::Settings;
use rpa_console::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    if cli_args.contains_key("version") {
        return print_json(&serde_json::to_value(version_info()).unwrap_or_default());
    }

    let settings = match Settings::load(cli_args.get("settings").map(String::as_str)).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to load settings: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match init_logging(LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: settings.log_dir.clone(),
        json_format: settings.json_logs,
        ..Default::default()
    }) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    // The API base URL is required before anything else happens
    let options = match AppOptions::from_settings(&settings) {
        Ok(options) => options,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match dispatch(&cli_args, options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli_args: &HashMap<String, String>, options: AppOptions) -> anyhow::Result<()> {
    let http_client = HttpClient::with_timeout(&options.api_base_url, options.request_timeout)?;
    let search = cli_args.get("search").map(String::as_str);
    let arg = |key: &str| cli_args.get(key).map(String::as_str).unwrap_or_default();

    if cli_args.contains_key("accounts") {
        print_json(&commands::accounts(&http_client, search).await.context("listing accounts")?);
        return Ok(());
    }
    if cli_args.contains_key("tasks") {
        print_json(&commands::tasks(&http_client, search).await.context("listing tasks")?);
        return Ok(());
    }
    if cli_args.contains_key("logs") {
        print_json(&commands::logs(&http_client, search).await.context("listing logs")?);
        return Ok(());
    }
    if cli_args.contains_key("stats") {
        let days = cli_args.get("days").and_then(|d| d.parse().ok()).unwrap_or(7);
        print_json(&commands::stats(&http_client, days).await.context("loading dashboard")?);
        return Ok(());
    }
    if let Some(path) = cli_args.get("export-logs") {
        let written = commands::export_logs(&http_client, path).await.context("exporting logs")?;
        println!("{} bytes written to {}", written, path);
        return Ok(());
    }
    if let Some(path) = cli_args.get("upload-config") {
        let response = commands::upload_config(&http_client, path, arg("account"), arg("app"))
            .await
            .context("uploading config file")?;
        print_json(&response);
        return Ok(());
    }
    if let Some(reference) = cli_args.get("resolve") {
        print_json(&commands::resolve(&options.resource_urls(), reference));
        return Ok(());
    }
    if let Some(reference) = cli_args.get("download") {
        let out = cli_args
            .get("out")
            .context("--download needs --out=<path>")?;
        let written = commands::download(&http_client, &options.resource_urls(), reference, out)
            .await
            .context("downloading resource")?;
        println!("{} bytes written to {}", written, out);
        return Ok(());
    }

    let ledger = ControlLedger::new();
    let controller = TaskController::with_ledger(http_client, ledger.clone());

    if let Some(task_id) = cli_args.get("force-stop") {
        let task = commands::force_stop(&controller, task_id, cli_args.contains_key("yes"))
            .await
            .with_context(|| format!("force stopping task {task_id}"))?;
        println!("Task {} forced to {}", task.id, task.status);
        return Ok(());
    }

    let directive = if let Some(task_id) = cli_args.get("start") {
        Some((task_id, ControlDirective::Start))
    } else {
        cli_args.get("stop").map(|task_id| (task_id, ControlDirective::StopAll))
    };
    if let Some((task_id, directive)) = directive {
        let (task, outcome) = commands::control(&controller, task_id, directive)
            .await
            .with_context(|| format!("{} request for task {task_id}", directive.verb()))?;
        println!("{} ({}): {}", task.task_name, task.status, outcome.message());
        if !cli_args.contains_key("watch") {
            return Ok(());
        }
    }

    info!("Running RPA console watch mode");
    run(options, ledger, await_shutdown_signal()).await?;
    Ok(())
}

fn print_json(value: &serde_json::Value) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to render output: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) = match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            _ => {
                error!("Unable to install signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down...");
    }
}
