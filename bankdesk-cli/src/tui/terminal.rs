//! Terminal management and main run loop

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bankdesk_client::ApiClient;
use bankdesk_core::{
    ControlError, ControllerEvent, FetchError, FetchOutcome, ListController, MutationKind,
    SessionContext,
};
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use super::app::App;
use super::event::{handle_key, poll_event, HandleResult};
use super::ui;
use crate::commands::Desk;

type Users = ListController<ApiClient>;

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Run the browse view until the user quits or the session expires
pub async fn run(desk: &Desk) -> Result<()> {
    desk.require_session()?;

    let api = desk.api()?;
    let session: Arc<dyn SessionContext> = desk.session.clone();
    let controller = ListController::new(api.clone(), session, desk.config.list_settings());
    let mut events = controller.events();
    let (notices, mut notices_rx) = mpsc::unbounded_channel::<String>();

    let mut app = App::new(controller.settings().clone(), desk.session.current_user());

    {
        let controller = controller.clone();
        let notices = notices.clone();
        tokio::spawn(async move {
            if let FetchOutcome::Failed(err) = controller.initialize().await {
                notices.send(failure_notice(&err)).ok();
            }
        });
    }

    let mut terminal = init_terminal()?;
    info!(endpoint = %api.endpoint(), "browse view started");

    let result = run_loop(
        &mut terminal,
        &mut app,
        &controller,
        &api,
        &notices,
        &mut notices_rx,
        &mut events,
    )
    .await;

    controller.teardown();
    // Restore terminal (even if loop failed)
    restore_terminal(&mut terminal)?;
    info!("browse view closed");

    result
}

#[allow(clippy::too_many_arguments)]
async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    controller: &Users,
    api: &ApiClient,
    notices: &mpsc::UnboundedSender<String>,
    notices_rx: &mut mpsc::UnboundedReceiver<String>,
    events: &mut broadcast::Receiver<ControllerEvent>,
) -> Result<()> {
    loop {
        app.sync(controller.snapshot());
        terminal.draw(|frame| ui::render(frame, app))?;

        while let Ok(notice) = notices_rx.try_recv() {
            app.set_status(notice);
        }

        loop {
            match events.try_recv() {
                Ok(ControllerEvent::SessionExpired) => {
                    bail!("Session expired, run `bankdesk login`");
                }
                Ok(ControllerEvent::Forbidden(message)) => {
                    app.set_status(format!("Access denied: {}", message));
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "controller events lagged");
                }
                Err(_) => break,
            }
        }

        // Blocking poll, off the async workers (100ms timeout for responsive UI)
        let event = tokio::task::block_in_place(|| poll_event(Duration::from_millis(100)))?;
        if let Some(Event::Key(key)) = event {
            let action = handle_key(app, key);
            if action == HandleResult::Quit {
                break;
            }
            dispatch(app, controller, api, notices, action);
        }
    }

    Ok(())
}

/// Hand an action to the controller. Fetches run on spawned tasks so the
/// loading state is rendered while they are in flight.
fn dispatch(
    app: &mut App,
    controller: &Users,
    api: &ApiClient,
    notices: &mpsc::UnboundedSender<String>,
    action: HandleResult,
) {
    match action {
        HandleResult::Continue | HandleResult::Quit => {}
        HandleResult::Search(term) => controller.set_search_term(term),
        HandleResult::SetRole(key) => report(app, controller.set_filter(&key)),
        HandleResult::SetStatus(key) => report(app, controller.set_status_filter(&key)),
        HandleResult::SetPageSize(size) => report(app, controller.set_page_size(size)),
        HandleResult::GoToPage(page) => {
            let controller = controller.clone();
            spawn_navigation(notices, async move { controller.go_to_page(page).await });
        }
        HandleResult::NextPage => {
            let controller = controller.clone();
            spawn_navigation(notices, async move { controller.next_page().await });
        }
        HandleResult::PrevPage => {
            let controller = controller.clone();
            spawn_navigation(notices, async move { controller.prev_page().await });
        }
        HandleResult::Refresh => {
            app.clear_status();
            let controller = controller.clone();
            let notices = notices.clone();
            tokio::spawn(async move {
                if let FetchOutcome::Failed(err) = controller.refetch().await {
                    notices.send(failure_notice(&err)).ok();
                }
            });
        }
        HandleResult::SetAccountStatus { id, status } => {
            let controller = controller.clone();
            let api = api.clone();
            let notices = notices.clone();
            tokio::spawn(async move {
                let mutation = api.set_status(id, status);
                let notice = match controller.run_mutation(MutationKind::Update, 1, mutation).await {
                    Ok(_) => format!("User {} is now {}", id, status),
                    Err(err) => failure_notice(&err),
                };
                notices.send(notice).ok();
            });
        }
        HandleResult::Delete { id } => {
            let controller = controller.clone();
            let api = api.clone();
            let notices = notices.clone();
            tokio::spawn(async move {
                let mutation = api.delete_user(id);
                let notice = match controller.run_mutation(MutationKind::Delete, 1, mutation).await {
                    Ok(receipt) if !receipt.message.is_empty() => receipt.message,
                    Ok(_) => format!("User {} deleted", id),
                    Err(err) => failure_notice(&err),
                };
                notices.send(notice).ok();
            });
        }
    }
}

fn report(app: &mut App, outcome: Result<(), ControlError>) {
    match outcome {
        Ok(()) => app.clear_status(),
        Err(err) => app.set_status(err.to_string()),
    }
}

fn spawn_navigation<F>(notices: &mpsc::UnboundedSender<String>, navigation: F)
where
    F: std::future::Future<Output = Result<FetchOutcome, ControlError>> + Send + 'static,
{
    let notices = notices.clone();
    tokio::spawn(async move {
        let notice = match navigation.await {
            Ok(FetchOutcome::Failed(err)) => Some(failure_notice(&err)),
            Ok(_) => None,
            Err(err) => Some(err.to_string()),
        };
        if let Some(notice) = notice {
            notices.send(notice).ok();
        }
    });
}

fn failure_notice(err: &FetchError) -> String {
    match err {
        FetchError::Forbidden(message) => format!("Access denied: {}", message),
        other => format!("Failed: {}", other),
    }
}
