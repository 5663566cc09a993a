//! Command-line argument parsing

use crate::config::AppConfig;
use crate::error::ConfigError;
use clap::{Parser, Subcommand};

/// Command-line arguments structure
#[derive(Parser, Debug)]
#[command(name = "vsphere-admin")]
#[command(about = "vSphere administration utilities: vNIC/VLAN reporting and scheduled tasks")]
#[command(version)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, global = true, help = "Path to TOML configuration file")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, help = "Set the logging level")]
    pub log_level: Option<String>,

    #[arg(short = 's', long, global = true, help = "Remote host to connect to")]
    pub host: Option<String>,

    #[arg(short = 'o', long, global = true, help = "Port to connect on [default: 443]")]
    pub port: Option<u16>,

    #[arg(short, long, global = true, help = "User name to use when connecting to host")]
    pub user: Option<String>,

    /// Prompted for on the terminal when not given anywhere else
    #[arg(short, long, global = true, help = "Password to use when connecting to host")]
    pub password: Option<String>,

    #[arg(long, global = true, help = "Path to the inventory snapshot document")]
    pub inventory: Option<String>,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit without connecting")]
    pub validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    pub print_default_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Report virtual NIC to portgroup/VLAN mappings for every VM
    Vnics {
        #[arg(long, help = "Only report VMs whose name matches this regular expression")]
        vm_filter: Option<String>,

        #[arg(long, help = "Output in JSON format")]
        json: bool,
    },

    /// Remove run-once scheduled tasks from a VM
    RemoveTasks {
        #[arg(short = 'n', long, help = "VM name on which the action will be performed")]
        vm_name: String,

        #[arg(long, help = "List the tasks that would be removed without removing them")]
        dry_run: bool,
    },

    /// Schedule a one-time guest shutdown of a VM
    ScheduleShutdown {
        #[arg(short = 'n', long, help = "VM name on which the action will be performed")]
        vm_name: String,

        #[arg(
            short,
            long,
            help = "Date and time used to create the scheduled task with the format d/m/Y H:M"
        )]
        date: String,
    },
}

impl CliArgs {
    /// Apply CLI arguments over base configuration
    pub fn apply_to_config(&self, mut base_config: AppConfig) -> Result<AppConfig, ConfigError> {
        if let Some(ref host) = self.host {
            base_config.connection.host = host.clone();
        }

        if let Some(port) = self.port {
            base_config.connection.port = port;
        }

        if let Some(ref user) = self.user {
            base_config.connection.user = user.clone();
        }

        if let Some(ref password) = self.password {
            base_config.connection.password = Some(password.clone());
        }

        if let Some(ref path) = self.inventory {
            base_config.inventory_path = path.clone();
        }

        if let Some(ref level) = self.log_level {
            base_config.log_level = level.clone();
        }

        Ok(base_config)
    }
}

/// Print default configuration in TOML format
pub fn print_default_config() {
    print!("{}", default_config_toml());
}

fn default_config_toml() -> String {
    let default_config = AppConfig::default();
    let mut out = String::new();

    out.push_str("# vsphere-admin configuration\n");
    out.push_str("# This is the default configuration with all available options\n\n");
    out.push_str("[connection]\n");
    out.push_str("# Management endpoint host name or address\n");
    out.push_str("host = \"\"\n");
    out.push_str(&format!("port = {}\n", default_config.connection.port));
    out.push_str("user = \"\"\n");
    out.push_str("# Omit to be prompted on the terminal\n");
    out.push_str("# password = \"\"\n\n");
    out.push_str("[inventory]\n");
    out.push_str("# Inventory snapshot document served as the management endpoint\n");
    out.push_str(&format!("path = \"{}\"\n\n", default_config.inventory_path));
    out.push_str("[logging]\n");
    out.push_str("# Log level: trace, debug, info, warn, error\n");
    out.push_str(&format!("level = \"{}\"\n", default_config.log_level));
    out
}
