//! bankdesk CLI - back-office user management for the banking API
//!
//! This is the main entry point for the bankdesk command-line tool, which provides:
//! - Account registration and sign-in sessions (`signup`, `login`, `logout`, `whoami`)
//! - One-shot user administration (`users list|stats|show|create|update|delete|...`)
//! - A full-screen paginated user list (`browse`)
//! - Configuration management (`config init|path|show|validate`)

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod tracing_setup;
mod tui;

use commands::Desk;
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "bankdesk",
    author,
    version,
    about = "Back-office user management for the banking API",
    long_about = "Sign in, page through, search and administer back-office users from the \
                  terminal. `bankdesk browse` opens a live paginated list."
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the `telemetry` feature)
    #[arg(long, global = true)]
    otel: bool,

    /// Banking API base URL (default: http://localhost:8000/api)
    #[arg(long, env = "BANKDESK_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    insecure: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a new account
    Signup(commands::auth::SignupArgs),
    /// Sign in and store the session token
    Login(commands::auth::LoginArgs),
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami(commands::auth::WhoamiArgs),
    /// User administration (list, stats, show, create, update, delete)
    Users(commands::users::UsersArgs),
    /// Interactive paginated user list
    Browse,
    /// Manage bankdesk configuration (init, path, show, validate)
    Config(commands::config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_file = matches!(cli.command, Commands::Browse).then(tui::log_path);
    tracing_setup::init(&TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
        log_file,
    })
    .ok();

    let result = run(cli).await;
    tracing_setup::shutdown_otel();
    result
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Config(args) => commands::config::run_config(args),
        Commands::Completions(args) => run_completions(args),
        command => {
            let desk = Desk::load(cli.endpoint, cli.insecure)?;
            match command {
                Commands::Signup(args) => commands::auth::run_signup(&desk, args).await,
                Commands::Login(args) => commands::auth::run_login(&desk, args).await,
                Commands::Logout => commands::auth::run_logout(&desk),
                Commands::Whoami(args) => commands::auth::run_whoami(&desk, args).await,
                Commands::Users(args) => commands::users::run_users(&desk, args).await,
                Commands::Browse => tui::run(&desk).await,
                Commands::Config(_) | Commands::Completions(_) => Ok(()),
            }
        }
    }
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
