use blocktime_core::config::AppConfig;
use clap::Subcommand;
use std::path::{Path, PathBuf};

use super::{
    utils::{print_info, print_success, CliError, CliResult},
    GlobalArgs,
};

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to config file (defaults to --config or config.toml)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show the effective configuration (file, env and flags applied)
    Show {
        /// Path to config file (defaults to --config or config.toml)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Generate a configuration file with default values
    Generate {
        /// Output path; a `.json` extension writes JSON, anything else TOML
        #[arg(short, long, default_value = super::DEFAULT_CONFIG_FILE)]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn handle_config_command(command: ConfigCommands, global: &GlobalArgs) -> CliResult<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(&resolve(file, global), global),
        ConfigCommands::Show { file } => show_config(&resolve(file, global), global),
        ConfigCommands::Generate { output, force } => generate_config(&output, force),
    }
}

fn resolve(file: Option<PathBuf>, global: &GlobalArgs) -> PathBuf {
    file.unwrap_or_else(|| global.config_path())
}

fn load(file: &Path, global: &GlobalArgs) -> CliResult<AppConfig> {
    GlobalArgs { config: Some(file.to_path_buf()), ..global.clone() }.load_config()
}

fn validate_config(file: &Path, global: &GlobalArgs) -> CliResult<()> {
    if !file.exists() {
        return Err(CliError::Config(format!("File not found: {}", file.display())));
    }

    print_info(&format!("Loading configuration from {}...", file.display()));
    let config = load(file, global)?;

    print_info("Validating configuration...");
    config.validate().map_err(CliError::Config)?;

    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!("  Chain: {} ({})", config.chain.chain_id, config.chain.rpc_endpoint);
    println!(
        "  Sampling: {} blocks, min {} intervals",
        config.calculator.sample_size, config.calculator.min_sample_size
    );
    println!(
        "  Outliers: {}",
        if config.calculator.use_median_absolute { "MAD" } else { "IQR" }
    );
    println!("  Output: {}", config.output.format);

    Ok(())
}

fn show_config(file: &Path, global: &GlobalArgs) -> CliResult<()> {
    let config = load(file, global)?;

    println!("# Effective configuration ({})", file.display());
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn render_defaults(output: &Path) -> CliResult<String> {
    let defaults = AppConfig::default();
    let is_json = output.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let rendered = if is_json {
        serde_json::to_string_pretty(&defaults)? + "\n"
    } else {
        format!("# Block time estimator configuration\n\n{}", toml::to_string_pretty(&defaults)?)
    };
    Ok(rendered)
}

fn generate_config(output: &Path, force: bool) -> CliResult<()> {
    if output.exists() && !force {
        return Err(CliError::Config(format!(
            "File {} already exists. Use --force to overwrite.",
            output.display()
        )));
    }

    std::fs::write(output, render_defaults(output)?)?;

    print_success(&format!("Configuration generated: {}", output.display()));
    print_info("Set chain.rpc_endpoint to your node before running calculations");

    Ok(())
}
