use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use regex::Regex;
use tracing::{error, info};

use vsphere_admin::config::cli::{print_default_config, CliArgs, Command};
use vsphere_admin::config::AppConfig;
use vsphere_admin::error::{AppError, ConfigError};
use vsphere_admin::report::{collect_vnic_report, render_json, render_text};
use vsphere_admin::tasks::{self, parse_trigger_time};
use vsphere_admin::vsphere::inventory::InventoryClient;
use vsphere_admin::vsphere::finish_session;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    if cli.print_default_config {
        print_default_config();
        return ExitCode::SUCCESS;
    }

    let config = match AppConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging; stdout is reserved for report output
    tracing_subscriber::fmt()
        .with_env_filter(config.log_level.as_str())
        .with_writer(std::io::stderr)
        .init();

    match run(&cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &CliArgs, config: &AppConfig) -> Result<(), AppError> {
    config.validate()?;

    if cli.validate_config {
        info!("Configuration is valid: {:?}", config);
        return Ok(());
    }

    let command = cli.command.clone().ok_or_else(|| ConfigError::MissingRequired {
        field: "command (vnics, remove-tasks or schedule-shutdown)".to_string(),
    })?;

    match command {
        Command::Vnics { vm_filter, json } => {
            let vm_filter = vm_filter
                .map(|pattern| Regex::new(&pattern))
                .transpose()
                .map_err(|e| ConfigError::InvalidFormat(format!("--vm-filter: {}", e)))?;

            let client = connect(config).await?;
            let result = collect_vnic_report(&client, vm_filter.as_ref()).await;
            let report = finish_session(client, result).await?;

            if json {
                println!("{}", render_json(&report)?);
            } else {
                print!("{}", render_text(&report));
            }
        }
        Command::RemoveTasks { vm_name, dry_run } => {
            let mut client = connect(config).await?;
            let result = tasks::remove_once_tasks(&mut client, &vm_name, dry_run).await;
            let report = finish_session(client, result).await?;

            let verb = if report.dry_run { "Would remove" } else { "Removed" };
            for task in &report.removed {
                println!("{} {} '{}' ({})", verb, task.key, task.spec.name, task.spec.scheduler);
            }
            for task in &report.kept {
                println!("Kept {} '{}' ({})", task.key, task.spec.name, task.spec.scheduler);
            }
            println!(
                "{}: {} run-once task(s) {}, {} kept",
                report.vm_name,
                report.removed.len(),
                if report.dry_run { "to remove" } else { "removed" },
                report.kept.len()
            );
        }
        Command::ScheduleShutdown { vm_name, date } => {
            let run_at = parse_trigger_time(&date)?;

            let mut client = connect(config).await?;
            let now = Local::now().naive_local();
            let result = tasks::schedule_guest_shutdown(&mut client, &vm_name, run_at, now).await;
            let task = finish_session(client, result).await?;

            println!(
                "Created {} '{}' ({})",
                task.key, task.spec.name, task.spec.scheduler
            );
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> Result<InventoryClient, AppError> {
    let credentials = config.credentials()?;
    let client = InventoryClient::connect(&config.inventory_path, &credentials).await?;
    Ok(client)
}
