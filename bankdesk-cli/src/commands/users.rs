//! User administration commands
//!
//! ```bash
//! bankdesk users list --search doe --role manager --page 2
//! bankdesk users list --json | jq '.users[] | {id, email}'
//! bankdesk users deactivate 42
//! ```

use std::io::IsTerminal;

use anyhow::{bail, Context, Result};
use bankdesk_core::{
    page_window, AccountStatus, ItemRange, ListQuery, ListResult, NewUser, PageLink, Role,
    UserRecord, UserUpdate, ALL_FILTER,
};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password};
use serde::Serialize;

use super::{get_output_format, Desk, OutputFormat};

#[derive(Parser, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommands,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    /// List one page of users
    List(ListArgs),
    /// Dashboard counters
    Stats(StatsArgs),
    /// Show one user
    Show(ShowArgs),
    /// Create a user (admin only)
    Create(CreateArgs),
    /// Update fields of a user
    Update(UpdateArgs),
    /// Delete a user (admin only)
    Delete(DeleteArgs),
    /// Mark a user active
    Activate(IdArg),
    /// Mark a user inactive
    Deactivate(IdArg),
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Page number (1-based)
    #[arg(long, short, default_value = "1")]
    pub page: u32,

    /// Rows per page (one of list.page_sizes)
    #[arg(long, short)]
    pub limit: Option<u32>,

    /// Search name or email
    #[arg(long, short)]
    pub search: Option<String>,

    /// Filter by role (user, admin, staff, manager or All)
    #[arg(long, short)]
    pub role: Option<String>,

    /// Filter by status (active, inactive or All)
    #[arg(long)]
    pub status: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Shorthand for --output json
    #[arg(long, conflicts_with = "output")]
    pub json: bool,

    /// Shorthand for --output quiet
    #[arg(long, short, conflicts_with = "output")]
    pub quiet: bool,
}

#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    pub id: i64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct IdArg {
    pub id: i64,
}

#[derive(Parser, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    /// Initial password (prompted for when omitted)
    #[arg(long)]
    pub password: Option<String>,

    #[arg(long, default_value = "user")]
    pub role: Role,

    #[arg(long, default_value = "N/A")]
    pub department: String,

    #[arg(long, default_value = "active")]
    pub status: AccountStatus,
}

#[derive(Parser, Debug)]
pub struct UpdateArgs {
    pub id: i64,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    #[arg(long)]
    pub role: Option<Role>,

    #[arg(long)]
    pub department: Option<String>,

    #[arg(long)]
    pub status: Option<AccountStatus>,
}

#[derive(Parser, Debug)]
pub struct DeleteArgs {
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

pub async fn run_users(desk: &Desk, args: UsersArgs) -> Result<()> {
    desk.require_session()?;

    match args.command {
        UsersCommands::List(args) => run_list(desk, args).await,
        UsersCommands::Stats(args) => run_stats(desk, args).await,
        UsersCommands::Show(args) => run_show(desk, args).await,
        UsersCommands::Create(args) => run_create(desk, args).await,
        UsersCommands::Update(args) => run_update(desk, args).await,
        UsersCommands::Delete(args) => run_delete(desk, args).await,
        UsersCommands::Activate(args) => run_set_status(desk, args.id, AccountStatus::Active).await,
        UsersCommands::Deactivate(args) => {
            run_set_status(desk, args.id, AccountStatus::Inactive).await
        }
    }
}

/// Build the list query, applying the same checks as the interactive view
fn build_query(desk: &Desk, args: &ListArgs) -> Result<ListQuery> {
    let settings = desk.config.list_settings();
    let page_size = settings.check_page_size(args.limit.unwrap_or(settings.default_page_size))?;
    if args.page < 1 {
        bail!("--page must be 1 or greater");
    }

    Ok(ListQuery {
        page: args.page,
        page_size,
        search: args.search.clone().unwrap_or_default(),
        filter: settings.resolve_filter(args.role.as_deref().unwrap_or(ALL_FILTER))?,
        status: settings.resolve_status(args.status.as_deref().unwrap_or(ALL_FILTER))?,
    })
}

#[derive(Serialize)]
struct ListOutput<'a> {
    users: &'a [UserRecord],
    total: u64,
    #[serde(rename = "totalPages")]
    total_pages: u32,
    page: u32,
}

async fn run_list(desk: &Desk, args: ListArgs) -> Result<()> {
    let format = get_output_format(args.output, args.json, args.quiet);
    let query = build_query(desk, &args)?;

    let api = desk.api()?;
    let result = api
        .list_users(&query)
        .await
        .map_err(|e| desk.api_error(e))?
        .normalize(&query);

    match format {
        OutputFormat::Json => {
            let output = ListOutput {
                users: &result.items,
                total: result.total,
                total_pages: result.total_pages,
                page: result.page,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Quiet => {
            for user in &result.items {
                println!("{}", user.id);
            }
        }
        OutputFormat::Human => print_table(&query, &result),
    }

    Ok(())
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn print_table(query: &ListQuery, result: &ListResult<UserRecord>) {
    let mut filters = vec![format!("role: {}", query.filter_label())];
    filters.push(format!("status: {}", query.status_label()));
    if let Some(term) = query.search_term() {
        filters.push(format!("search: '{}'", term));
    }
    println!("┌─ Users ({})", filters.join(", "));
    println!("│");

    if result.items.is_empty() {
        println!("└─ (no users found)");
        return;
    }

    println!(
        "│  {:>5}  {:<22} {:<28} {:<8} {:<14} {:<9} {}",
        "ID", "Name", "Email", "Role", "Department", "Status", "Last login"
    );
    for user in &result.items {
        println!(
            "│  {:>5}  {:<22} {:<28} {:<8} {:<14} {:<9} {}",
            user.id,
            truncate(&user.name, 22),
            truncate(&user.email, 28),
            truncate(&user.role, 8),
            truncate(&user.department, 14),
            user.status,
            user.last_login
        );
    }
    println!("│");

    let range = ItemRange::new(result.page, query.page_size, result.total)
        .map(|r| r.to_string())
        .unwrap_or_default();
    println!("└─ {}   {}", range, format_page_bar(result.page, result.total_pages));
}

/// Text rendering of the page-number bar, e.g. `« 1 … 4 [5] 6 … 10 »`
pub fn format_page_bar(current: u32, total_pages: u32) -> String {
    let mut parts = Vec::new();
    if current > 1 {
        parts.push("«".to_string());
    }
    for link in page_window(current, total_pages) {
        parts.push(match link {
            PageLink::Page(p) if p == current => format!("[{}]", p),
            PageLink::Page(p) => p.to_string(),
            PageLink::Ellipsis => "…".to_string(),
        });
    }
    if current < total_pages {
        parts.push("»".to_string());
    }
    parts.join(" ")
}

async fn run_stats(desk: &Desk, args: StatsArgs) -> Result<()> {
    let stats = desk.api()?.stats().await.map_err(|e| desk.api_error(e))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Total users:          {}", stats.total_users);
        println!("Active users:         {}", stats.active_users);
        println!("Pending approvals:    {}", stats.pending_approvals);
        println!("New this month:       {}", stats.new_users_this_month);
    }
    Ok(())
}

/// Render an API timestamp as `YYYY-MM-DD HH:MM`, or as-is if unparseable
fn format_timestamp(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

async fn run_show(desk: &Desk, args: ShowArgs) -> Result<()> {
    let user = desk
        .api()?
        .get_user(args.id)
        .await
        .map_err(|e| desk.api_error(e))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!("{} <{}>", user.name, user.email);
    println!("  id:         {}", user.id);
    println!("  role:       {}", user.role);
    println!("  department: {}", user.department);
    println!("  status:     {}", user.status);
    println!("  last login: {}", format_timestamp(&user.last_login));
    if let Some(created) = &user.created_at {
        println!("  created:    {}", format_timestamp(created));
    }
    if let Some(updated) = &user.updated_at {
        println!("  updated:    {}", format_timestamp(updated));
    }
    Ok(())
}

async fn run_create(desk: &Desk, args: CreateArgs) -> Result<()> {
    let password = match args.password {
        Some(password) => password,
        None if std::io::stdin().is_terminal() => Password::new("Initial password:")
            .prompt()
            .context("Failed to read password")?,
        None => bail!("--password is required when stdin is not a terminal"),
    };

    let new_user = NewUser {
        name: args.name.trim().to_string(),
        email: args.email.trim().to_string(),
        password,
        role: args.role,
        department: args.department,
        status: args.status,
    };

    let receipt = desk
        .api()?
        .create_user(&new_user)
        .await
        .map_err(|e| desk.api_error(e))?;

    match receipt.id() {
        Some(id) => println!("✓ Created {} (id: {})", receipt.name().unwrap_or(&new_user.name), id),
        None => println!("✓ Created {}", new_user.name),
    }
    Ok(())
}

async fn run_update(desk: &Desk, args: UpdateArgs) -> Result<()> {
    let update = UserUpdate {
        name: args.name,
        email: args.email,
        password: args.password,
        role: args.role,
        department: args.department,
        status: args.status,
    };
    if update.is_empty() {
        bail!("Nothing to update. Pass at least one of --name, --email, --password, --role, --department, --status");
    }

    let receipt = desk
        .api()?
        .update_user(args.id, &update)
        .await
        .map_err(|e| desk.api_error(e))?;
    println!("✓ {}", non_empty(&receipt.message, "User updated"));
    Ok(())
}

async fn run_delete(desk: &Desk, args: DeleteArgs) -> Result<()> {
    if !args.yes {
        if !std::io::stdin().is_terminal() {
            bail!("Refusing to delete without confirmation. Pass --yes");
        }
        let confirmed = Confirm::new(&format!("Delete user {}?", args.id))
            .with_default(false)
            .prompt()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Cancelled");
            return Ok(());
        }
    }

    let receipt = desk
        .api()?
        .delete_user(args.id)
        .await
        .map_err(|e| desk.api_error(e))?;
    println!("✓ {}", non_empty(&receipt.message, "User deleted"));
    Ok(())
}

async fn run_set_status(desk: &Desk, id: i64, status: AccountStatus) -> Result<()> {
    desk.api()?
        .set_status(id, status)
        .await
        .map_err(|e| desk.api_error(e))?;
    println!("✓ User {} is now {}", id, status);
    Ok(())
}

fn non_empty<'a>(s: &'a str, fallback: &'a str) -> &'a str {
    if s.trim().is_empty() {
        fallback
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bar_marks_current_page() {
        assert_eq!(format_page_bar(1, 1), "[1]");
        assert_eq!(format_page_bar(2, 3), "« 1 [2] 3 »");
        assert_eq!(format_page_bar(5, 10), "« 1 … 4 [5] 6 … 10 »");
        assert_eq!(format_page_bar(10, 10), "« 1 … 6 7 8 9 [10]");
    }

    #[test]
    fn timestamps_are_shortened() {
        assert_eq!(format_timestamp("2024-03-05T14:07:09.123456"), "2024-03-05 14:07");
        assert_eq!(format_timestamp("Never"), "Never");
    }

    #[test]
    fn long_cells_are_truncated() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-name", 6), "a-ver…");
    }
}
