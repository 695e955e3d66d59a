//! Movie browser TUI state management.

use cinedex_api::tmdb::{MovieCredits, MovieDetails, MovieSummary};
use cinedex_core::FetchState;

/// Currently shown screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Query input and result list.
    Search,
    /// Detail page for one movie.
    Detail(DetailTarget),
}

/// Movie shown on the detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTarget {
    /// TMDB movie ID.
    pub id: u64,
    /// Title from the result list, shown while details load.
    pub title: String,
}

/// Side effect requested by a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserAction {
    /// Nothing to do outside the state.
    None,
    /// The typed query changed.
    QueryChanged,
    /// Run the current fetch(es) again.
    Refetch,
    /// Clear the current fetch state(s).
    Reset,
    /// Open the detail page for a movie.
    OpenDetail(DetailTarget),
    /// Leave the detail page.
    CloseDetail,
    /// Open a URL with the system opener.
    OpenUrl(String),
    /// Exit the browser.
    Quit,
}

/// State for the movie browser TUI.
#[derive(Debug)]
pub struct BrowserState {
    /// Typed query.
    pub query: String,
    /// Query the current results belong to.
    pub settled_query: String,
    /// Search results.
    pub results: FetchState<Vec<MovieSummary>>,
    /// Cursor position in the result list.
    pub cursor: usize,
    /// Current screen.
    pub view: View,
    /// Detail page data.
    pub details: FetchState<MovieDetails>,
    /// Detail page cast.
    pub credits: FetchState<MovieCredits>,
}

impl BrowserState {
    /// Creates an empty search screen.
    pub fn new() -> Self {
        Self {
            query: String::new(),
            settled_query: String::new(),
            results: FetchState::default(),
            cursor: 0,
            view: View::Search,
            details: FetchState::default(),
            credits: FetchState::default(),
        }
    }

    /// Replaces the search snapshot and clamps the cursor.
    pub fn sync_search(&mut self, settled_query: String, results: FetchState<Vec<MovieSummary>>) {
        self.settled_query = settled_query;
        self.results = results;
        let len = self.movies().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    /// Replaces the detail page snapshot.
    pub fn sync_detail(
        &mut self,
        details: FetchState<MovieDetails>,
        credits: FetchState<MovieCredits>,
    ) {
        self.details = details;
        self.credits = credits;
    }

    /// Movies currently listed (kept through a failed refresh).
    pub fn movies(&self) -> &[MovieSummary] {
        self.results.data.as_deref().unwrap_or_default()
    }

    /// Movie under the cursor.
    pub fn selected(&self) -> Option<&MovieSummary> {
        self.movies().get(self.cursor)
    }

    /// Moves the cursor up.
    pub const fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Moves the cursor down.
    pub fn move_down(&mut self) {
        if self.cursor.saturating_add(1) < self.movies().len() {
            self.cursor = self.cursor.saturating_add(1);
        }
    }

    /// Appends a character to the query.
    pub fn query_push(&mut self, c: char) {
        self.query.push(c);
        self.cursor = 0;
    }

    /// Removes the last character of the query. Returns `false` if empty.
    pub fn query_pop(&mut self) -> bool {
        let popped = self.query.pop().is_some();
        if popped {
            self.cursor = 0;
        }
        popped
    }

    /// Enters the detail page for the selected movie.
    pub fn open_selected(&mut self) -> Option<DetailTarget> {
        let movie = self.selected()?;
        let target = DetailTarget {
            id: movie.id,
            title: movie.title.clone(),
        };
        self.view = View::Detail(target.clone());
        self.details = FetchState::default();
        self.credits = FetchState::default();
        Some(target)
    }

    /// Returns to the search screen.
    pub fn close_detail(&mut self) {
        self.view = View::Search;
        self.details = FetchState::default();
        self.credits = FetchState::default();
    }

    /// Homepage of the loaded detail page.
    pub fn homepage(&self) -> Option<&str> {
        self.details.data.as_ref().and_then(MovieDetails::homepage)
    }

    /// Status line for the search screen.
    ///
    /// Loading and errors take precedence; an empty result for a settled,
    /// non-blank query reports that nothing was found.
    pub fn search_status(&self) -> Option<String> {
        if self.results.loading {
            return Some(String::from("Loading..."));
        }
        if let Some(error) = &self.results.error {
            return Some(format!("Error: {error}"));
        }
        let query = self.settled_query.trim();
        if query.is_empty() {
            return None;
        }
        match self.results.data.as_deref() {
            Some([]) => Some(format!("No results found for \"{query}\".")),
            Some(movies) => Some(format!("Search results for \"{query}\": {}", movies.len())),
            None => None,
        }
    }

    /// Status line for the detail page.
    pub fn detail_status(&self) -> Option<String> {
        if self.details.loading || self.credits.loading {
            return Some(String::from("Loading..."));
        }
        self.details
            .error
            .as_ref()
            .or(self.credits.error.as_ref())
            .map(|error| format!("Error: {error}"))
    }
}

impl Default for BrowserState {
    fn default() -> Self {
        Self::new()
    }
}
