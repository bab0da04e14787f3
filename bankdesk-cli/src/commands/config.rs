use anyhow::{anyhow, Context, Result};
use bankdesk_core::DeskConfig;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a config file with default values
    Init(InitArgs),
    /// Get a config value by dot-notation key
    Get(GetArgs),
    /// Show the effective config (file + environment)
    Show,
    /// Validate the config file
    Validate,
    /// Show config file path
    Path,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// API base URL to store
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Dot-notation key (e.g., "api.endpoint", "list.page_sizes")
    pub key: String,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init(args) => run_init(args),
        ConfigCommands::Get(args) => run_get(args),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Validate => run_validate(),
        ConfigCommands::Path => run_path(),
    }
}

fn run_init(args: InitArgs) -> Result<()> {
    let config_path = DeskConfig::config_path();

    if config_path.exists() && !args.force {
        return Err(anyhow!(
            "Config already exists at {:?}\n\nUse --force to overwrite",
            config_path
        ));
    }

    let config = DeskConfig::default().with_endpoint_override(args.endpoint);
    config.validate()?;
    let written = config.save().context("Failed to write config file")?;

    println!("✅ Created config at: {:?}", written);
    println!("\nNext steps:");
    println!("  1. Edit the config: $EDITOR {:?}", written);
    println!("  2. Run: bankdesk config validate");
    println!("  3. Run: bankdesk login --email <email>");

    Ok(())
}

fn run_get(args: GetArgs) -> Result<()> {
    let config = DeskConfig::load_or_default()?;
    println!("{}", get_config_value(&config, &args.key)?);
    Ok(())
}

fn run_show() -> Result<()> {
    let config = DeskConfig::load_or_default()?;
    let toml_str = toml::to_string_pretty(&config).context("Failed to serialize config to TOML")?;
    println!("{}", toml_str);
    Ok(())
}

fn run_validate() -> Result<()> {
    println!("🔍 Validating configuration...");

    let config = DeskConfig::load()?;
    println!("   ✓ Config loaded successfully");
    println!("   Endpoint: {}", config.api.endpoint);
    println!(
        "   Page sizes: {:?} (default {})",
        config.list.page_sizes, config.list.default_page_size
    );

    if config.api.insecure {
        println!("\n⚠️  api.insecure is set: TLS certificates are not verified");
    }

    println!("\n✅ Configuration valid!");
    Ok(())
}

fn run_path() -> Result<()> {
    println!("{}", DeskConfig::config_path().display());
    Ok(())
}

/// Look up a dot-notation key in the serialized config
fn get_config_value(config: &DeskConfig, key: &str) -> Result<String> {
    let mut value = toml::Value::try_from(config).context("Failed to serialize config")?;
    for part in key.split('.') {
        value = value
            .get(part)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown config key: {}", key))?;
    }

    Ok(match value {
        toml::Value::String(s) => s,
        other => other.to_string(),
    })
}
