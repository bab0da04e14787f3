//! Session commands: signup, login, logout, whoami

use std::io::{IsTerminal, Read};

use anyhow::{anyhow, bail, Context, Result};
use bankdesk_client::NewRegistration;
use bankdesk_core::{FetchError, SessionContext, SessionUser};
use clap::Parser;
use inquire::Password;
use tracing::info;

use super::Desk;

#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long, short)]
    pub email: String,

    /// Password (prompted for when omitted)
    #[arg(long, env = "BANKDESK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Read the password from stdin
    #[arg(long, conflicts_with = "password")]
    pub password_stdin: bool,
}

#[derive(Parser, Debug)]
pub struct SignupArgs {
    /// Full name
    #[arg(long, short)]
    pub name: String,

    /// Account email
    #[arg(long, short)]
    pub email: String,

    /// Password, at least 6 characters (prompted for when omitted)
    #[arg(long, env = "BANKDESK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Read the password from stdin
    #[arg(long, conflicts_with = "password")]
    pub password_stdin: bool,
}

#[derive(Parser, Debug)]
pub struct WhoamiArgs {
    /// Ask the server instead of reading the cached user
    #[arg(long)]
    pub remote: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn read_password(password: Option<&str>, from_stdin: bool, confirm: bool) -> Result<String> {
    // Priority: --password > --password-stdin > prompt
    if let Some(password) = password {
        return Ok(password.to_string());
    }

    if from_stdin {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read password from stdin")?;
        return Ok(buffer.trim_end_matches(['\r', '\n']).to_string());
    }

    if !std::io::stdin().is_terminal() {
        bail!("No password given. Use --password-stdin or set BANKDESK_PASSWORD");
    }

    let prompt = Password::new("Password:");
    let prompt = if confirm {
        prompt.with_custom_confirmation_message("Confirm password:")
    } else {
        prompt.without_confirmation()
    };
    prompt.prompt().context("Failed to read password")
}

pub async fn run_login(desk: &Desk, args: LoginArgs) -> Result<()> {
    let password = read_password(args.password.as_deref(), args.password_stdin, false)?;
    if password.is_empty() {
        bail!("Password cannot be empty");
    }

    let api = desk.api()?;
    let session = match api.login(args.email.trim(), &password).await {
        Ok(session) => session,
        Err(FetchError::Forbidden(message)) => bail!("Login failed: {}", message),
        Err(err) => return Err(anyhow!(err).context("Login failed")),
    };

    let user = session.user.clone();
    desk.session
        .save(session)
        .context("Failed to store session")?;
    info!(path = %desk.session.path().display(), "session stored");

    match user {
        Some(user) => println!("✓ Signed in as {} <{}> ({})", user.name, user.email, user.role),
        None => println!("✓ Signed in as {}", args.email.trim()),
    }
    Ok(())
}

/// Create a `user` account. Does not sign in.
pub async fn run_signup(desk: &Desk, args: SignupArgs) -> Result<()> {
    let password = read_password(args.password.as_deref(), args.password_stdin, true)?;
    let registration = NewRegistration::new(&args.name, &args.email, &password);
    if let Err(reason) = registration.validate() {
        bail!("Cannot register: {}", reason);
    }

    let receipt = desk
        .api()?
        .register(&registration)
        .await
        .map_err(|err| anyhow!(err).context("Registration failed"))?;

    let name = receipt.name().unwrap_or(&registration.name);
    println!("✓ Registered {} <{}>", name, registration.email);
    println!();
    println!("Run: bankdesk login --email {}", registration.email);
    Ok(())
}

pub fn run_logout(desk: &Desk) -> Result<()> {
    if !desk.session.is_authenticated() {
        println!("Not signed in");
        return Ok(());
    }
    desk.session.invalidate();
    println!("✓ Signed out");
    Ok(())
}

fn print_user(user: &SessionUser, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(user)?);
    } else {
        println!("{} <{}>", user.name, user.email);
        println!("  id:   {}", user.id);
        println!("  role: {}", user.role);
        if user.can_manage_users() {
            println!("  may manage users");
        }
    }
    Ok(())
}

pub async fn run_whoami(desk: &Desk, args: WhoamiArgs) -> Result<()> {
    desk.require_session()?;

    if args.remote {
        let user = desk.api()?.me().await.map_err(|e| desk.api_error(e))?;
        return print_user(&user, args.json);
    }

    match desk.session.current_user() {
        Some(user) => print_user(&user, args.json),
        None => {
            println!("Signed in (no cached user, try --remote)");
            Ok(())
        }
    }
}
