//! Movie browser TUI main loop.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cinedex_api::tmdb::{MovieCredits, MovieDetails, TmdbApi};
use cinedex_core::{
    FetchController, SearchMetrics, SearchOptions, SearchSession, movie_credits, movie_details,
};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use super::state::{BrowserAction, BrowserState, View};
use super::ui;

/// Redraw interval while no key is pressed.
const TICK: Duration = Duration::from_millis(50);

/// Controllers backing an open detail page.
struct DetailPage {
    details: FetchController<u64, MovieDetails>,
    credits: FetchController<u64, MovieCredits>,
}

/// Runs the movie browser TUI until the user quits.
///
/// # Errors
///
/// Returns an error if terminal setup or event handling fails.
pub async fn run_browser<A, M>(api: Arc<A>, metrics: Arc<M>, options: &SearchOptions) -> Result<()>
where
    A: TmdbApi + Send + Sync + 'static,
    M: SearchMetrics + Send + Sync + 'static,
{
    let session = SearchSession::spawn(Arc::clone(&api), metrics, options);
    let mut state = BrowserState::new();

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen)
        .context("failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    let result = run_event_loop(&mut terminal, &mut state, &session, &api, &options.language).await;

    // Cleanup (always attempt even if event loop failed)
    disable_raw_mode().context("failed to disable raw mode")?;
    crossterm::execute!(io::stdout(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;

    result
}

/// Main event loop.
///
/// Key polling never blocks; the loop sleeps between polls so fetch and
/// debounce tasks make progress on the current-thread runtime.
async fn run_event_loop<A>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut BrowserState,
    session: &SearchSession,
    api: &Arc<A>,
    language: &str,
) -> Result<()>
where
    A: TmdbApi + Send + Sync + 'static,
{
    let mut page: Option<DetailPage> = None;

    loop {
        state.sync_search(session.settled_query(), session.state());
        if let Some(page) = &page {
            state.sync_detail(page.details.state(), page.credits.state());
        }

        terminal
            .draw(|frame| ui::draw(frame, state))
            .context("failed to draw TUI")?;

        if !event::poll(Duration::ZERO).context("failed to poll events")? {
            tokio::time::sleep(TICK).await;
            continue;
        }
        let Event::Key(key) = event::read().context("failed to read event")? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let action = match state.view {
            View::Search => handle_search_input(state, key.code, key.modifiers),
            View::Detail(_) => handle_detail_input(state, key.code, key.modifiers),
        };

        match action {
            BrowserAction::None => {}
            BrowserAction::Quit => return Ok(()),
            BrowserAction::QueryChanged => {
                session.input(state.query.clone());
            }
            BrowserAction::Refetch => match &page {
                Some(page) => {
                    page.details.refetch();
                    page.credits.refetch();
                }
                None => session.refetch(),
            },
            BrowserAction::Reset => match &page {
                Some(page) => {
                    page.details.reset();
                    page.credits.reset();
                }
                None => session.reset(),
            },
            BrowserAction::OpenDetail(target) => {
                tracing::debug!(movie_id = target.id, "opening detail page");
                page = Some(DetailPage {
                    details: FetchController::new(
                        target.id,
                        movie_details(Arc::clone(api), language),
                    ),
                    credits: FetchController::new(
                        target.id,
                        movie_credits(Arc::clone(api), language),
                    ),
                });
            }
            BrowserAction::CloseDetail => page = None,
            BrowserAction::OpenUrl(url) => {
                if let Err(e) = open::that(&url) {
                    tracing::warn!(url, error = %e, "failed to open homepage");
                }
            }
        }
    }
}

/// Handles key input on the search screen.
fn handle_search_input(
    state: &mut BrowserState,
    key: KeyCode,
    modifiers: KeyModifiers,
) -> BrowserAction {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    match key {
        KeyCode::Char('c') if ctrl => BrowserAction::Quit,
        KeyCode::Char('r') if ctrl => BrowserAction::Refetch,
        KeyCode::Char('l') if ctrl => BrowserAction::Reset,
        KeyCode::Esc => BrowserAction::Quit,
        KeyCode::Up => {
            state.move_up();
            BrowserAction::None
        }
        KeyCode::Down => {
            state.move_down();
            BrowserAction::None
        }
        KeyCode::Enter => state
            .open_selected()
            .map_or(BrowserAction::None, BrowserAction::OpenDetail),
        KeyCode::Backspace => {
            if state.query_pop() {
                BrowserAction::QueryChanged
            } else {
                BrowserAction::None
            }
        }
        KeyCode::Char(c) if !ctrl => {
            state.query_push(c);
            BrowserAction::QueryChanged
        }
        _ => BrowserAction::None,
    }
}

/// Handles key input on the detail page.
fn handle_detail_input(
    state: &mut BrowserState,
    key: KeyCode,
    modifiers: KeyModifiers,
) -> BrowserAction {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    match key {
        KeyCode::Char('c') if ctrl => BrowserAction::Quit,
        KeyCode::Char('l') if ctrl => BrowserAction::Reset,
        KeyCode::Char('q') => BrowserAction::Quit,
        KeyCode::Char('r') => BrowserAction::Refetch,
        KeyCode::Char('o') => state
            .homepage()
            .map_or(BrowserAction::None, |url| BrowserAction::OpenUrl(String::from(url))),
        KeyCode::Esc | KeyCode::Backspace => {
            state.close_detail();
            BrowserAction::CloseDetail
        }
        _ => BrowserAction::None,
    }
}
