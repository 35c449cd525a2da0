//! Search & Selection Controller
//!
//! A small state machine over [`SearchState`]. Input events come in as
//! method calls; focus changes go out through [`FocusView`], so the
//! controller never depends on how (or whether) anything is drawn.

use super::filter::{filter_directory, is_searchable, MAX_SUGGESTIONS, MIN_QUERY_CHARS};
use crate::detail::{DetailView, ExpandedSections, DEFAULT_PREVIEW_LINES};
use crate::directory::{Directory, InstitutionRecord};
use crate::logging;
use crate::search_log::{DisabledSearchLog, SearchLogEntry, SearchLogSink};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

// ============================================================================
// State
// ============================================================================

/// Transient UI state, owned by the controller and never persisted
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub query_text: String,
    pub suggestions: Vec<InstitutionRecord>,
    /// -1 means nothing is highlighted
    pub highlighted_index: isize,
    pub selected_institution: Option<InstitutionRecord>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query_text: String::new(),
            suggestions: Vec::new(),
            highlighted_index: -1,
            selected_institution: None,
        }
    }
}

impl SearchState {
    /// Highlight as an index, if any.
    pub fn highlighted(&self) -> Option<usize> {
        usize::try_from(self.highlighted_index).ok()
    }

    fn clear_suggestions(&mut self) {
        self.suggestions.clear();
        self.highlighted_index = -1;
    }
}

/// Observable phase of the search widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Typing,
    Suggesting,
    Selected,
}

/// Highlight movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Keys the search widget reacts to, independent of any terminal library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKey {
    Up,
    Down,
    Enter,
    Space,
    Escape,
}

// ============================================================================
// Focus
// ============================================================================

/// Focus movement the view layer performs on the controller's behalf.
pub trait FocusView {
    fn focus_suggestion(&mut self, index: usize);
    fn focus_query_input(&mut self);
    fn focus_confirm_button(&mut self);
}

/// For callers without a notion of focus (the CLI).
pub struct NoFocus;

impl FocusView for NoFocus {
    fn focus_suggestion(&mut self, _index: usize) {}
    fn focus_query_input(&mut self) {}
    fn focus_confirm_button(&mut self) {}
}

/// Keeps the global Escape binding alive.
///
/// Returned by [`Controller::mount`]; dropping it (unmount) releases the
/// binding, after which [`Controller::on_global_escape`] does nothing.
pub struct EscapeSubscription {
    active: Rc<Cell<bool>>,
}

impl EscapeSubscription {
    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Drop for EscapeSubscription {
    fn drop(&mut self) {
        self.active.set(false);
        logging::debug("SEARCH", "Global escape binding released");
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Tunables for the controller
#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub max_suggestions: usize,
    pub min_query_chars: usize,
    pub preview_lines: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            max_suggestions: MAX_SUGGESTIONS,
            min_query_chars: MIN_QUERY_CHARS,
            preview_lines: DEFAULT_PREVIEW_LINES,
        }
    }
}

pub struct Controller {
    directory: Directory,
    state: SearchState,
    options: ControllerOptions,
    /// Suggestions currently come from reveal-all rather than the filter
    revealed_all: bool,
    /// "Read More" toggles for the current selection
    expanded: ExpandedSections,
    escape_binding: Rc<Cell<bool>>,
    search_log: Box<dyn SearchLogSink>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(ControllerOptions::default())
    }
}

impl Controller {
    pub fn new(options: ControllerOptions) -> Self {
        Self {
            directory: Arc::from(Vec::new()),
            state: SearchState::default(),
            options,
            revealed_all: false,
            expanded: ExpandedSections::default(),
            escape_binding: Rc::new(Cell::new(false)),
            search_log: Box::new(DisabledSearchLog),
        }
    }

    pub fn with_directory(mut self, directory: Directory) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_search_log(mut self, sink: Box<dyn SearchLogSink>) -> Self {
        self.search_log = sink;
        self
    }

    /// Block until pending search-log posts are done.
    pub fn flush_search_log(&self) {
        self.search_log.flush();
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn directory(&self) -> &[InstitutionRecord] {
        &self.directory
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    pub fn phase(&self) -> Phase {
        if self.state.selected_institution.is_some() {
            Phase::Selected
        } else if !self.state.suggestions.is_empty() {
            Phase::Suggesting
        } else if self.state.query_text.is_empty() {
            Phase::Idle
        } else {
            Phase::Typing
        }
    }

    /// Register the global Escape binding for this mount.
    pub fn mount(&mut self) -> EscapeSubscription {
        self.escape_binding.set(true);
        logging::debug("SEARCH", "Global escape binding acquired");
        EscapeSubscription {
            active: Rc::clone(&self.escape_binding),
        }
    }

    /// Install the directory once it has loaded and re-run the current query.
    pub fn set_directory(&mut self, directory: Directory, view: &mut dyn FocusView) {
        self.directory = directory;
        if self.state.selected_institution.is_none() && !self.revealed_all {
            let query = self.state.query_text.clone();
            self.apply_query(query, view);
        }
    }

    // --- Transitions ---

    /// Replace the query text and recompute suggestions.
    pub fn set_query(&mut self, text: impl Into<String>, view: &mut dyn FocusView) {
        let text = text.into();

        if self.revealed_all && text == self.state.query_text {
            // Nothing changed since reveal-all; keep the full list.
            return;
        }

        if self.state.selected_institution.take().is_some() {
            logging::debug("SEARCH", "Typing replaced the current selection");
            self.expanded = ExpandedSections::default();
        }

        self.apply_query(text, view);
    }

    fn apply_query(&mut self, text: String, view: &mut dyn FocusView) {
        let had_highlight = self.state.highlighted_index >= 0;
        self.revealed_all = false;
        self.state.query_text = text;

        if is_searchable(&self.state.query_text, self.options.min_query_chars) {
            self.state.suggestions = filter_directory(
                &self.directory,
                &self.state.query_text,
                self.options.max_suggestions,
            );
        } else {
            self.state.suggestions.clear();
        }
        self.state.highlighted_index = -1;

        if had_highlight {
            view.focus_query_input();
        }
    }

    /// List the whole directory, highlighting the first entry.
    pub fn reveal_all(&mut self, view: &mut dyn FocusView) {
        if self.directory.is_empty() {
            return;
        }
        self.state.suggestions = self.directory.to_vec();
        self.state.highlighted_index = 0;
        self.revealed_all = true;
        view.focus_suggestion(0);
    }

    /// Move the highlight. Only meaningful while suggesting.
    pub fn move_highlight(&mut self, direction: Direction, view: &mut dyn FocusView) {
        if self.phase() != Phase::Suggesting {
            return;
        }

        let last = self.state.suggestions.len() as isize - 1;
        let current = self.state.highlighted_index;
        let next = match direction {
            Direction::Down => (current + 1).min(last),
            Direction::Up => (current - 1).max(-1),
        };
        if next == current {
            return;
        }

        self.state.highlighted_index = next;
        match self.state.highlighted() {
            Some(index) => view.focus_suggestion(index),
            None => view.focus_query_input(),
        }
    }

    /// Select the only suggestion, or the highlighted one.
    ///
    /// Returns true when a selection was made.
    pub fn confirm_selection(&mut self, view: &mut dyn FocusView) -> bool {
        let index = if self.state.suggestions.len() == 1 {
            Some(0)
        } else {
            self.state.highlighted()
        };

        match index {
            Some(index) => self.select_suggestion(index, view),
            None => false,
        }
    }

    /// Select a specific suggestion (pointer click, Space on a row).
    pub fn select_suggestion(&mut self, index: usize, view: &mut dyn FocusView) -> bool {
        let Some(record) = self.state.suggestions.get(index).cloned() else {
            return false;
        };

        logging::info("SEARCH", &format!("Selected '{}'", record.name));
        self.search_log.record(SearchLogEntry::for_record(&record));

        self.state.query_text = record.name.clone();
        self.state.selected_institution = Some(record);
        self.state.clear_suggestions();
        self.revealed_all = false;
        self.expanded = ExpandedSections::default();

        view.focus_confirm_button();
        true
    }

    /// Hide the suggestion list, keeping query and selection.
    pub fn cancel_suggestions(&mut self, view: &mut dyn FocusView) {
        self.state.clear_suggestions();
        self.revealed_all = false;
        view.focus_query_input();
    }

    /// Drop the selection and start over.
    pub fn clear_selection(&mut self, view: &mut dyn FocusView) {
        if let Some(record) = &self.state.selected_institution {
            logging::debug("SEARCH", &format!("Cleared selection '{}'", record.name));
        }
        self.state = SearchState::default();
        self.revealed_all = false;
        self.expanded = ExpandedSections::default();
        view.focus_query_input();
    }

    /// Global Escape: clears a selection while the binding is mounted.
    pub fn on_global_escape(&mut self, view: &mut dyn FocusView) -> bool {
        if !self.escape_binding.get() || self.state.selected_institution.is_none() {
            return false;
        }
        self.clear_selection(view);
        true
    }

    /// Route a navigation key. Returns false if the key was not consumed.
    pub fn handle_key(&mut self, key: SearchKey, view: &mut dyn FocusView) -> bool {
        match key {
            SearchKey::Down => {
                if self.phase() == Phase::Suggesting {
                    self.move_highlight(Direction::Down, view);
                } else if self.phase() == Phase::Idle {
                    self.reveal_all(view);
                }
                true
            }
            SearchKey::Up => {
                self.move_highlight(Direction::Up, view);
                true
            }
            SearchKey::Enter => {
                self.confirm_selection(view);
                true
            }
            SearchKey::Space => match self.state.highlighted() {
                Some(index) => self.select_suggestion(index, view),
                None => false,
            },
            SearchKey::Escape => {
                if !self.state.suggestions.is_empty() {
                    self.cancel_suggestions(view);
                    true
                } else {
                    self.on_global_escape(view)
                }
            }
        }
    }

    // --- Detail ---

    /// View-model for the current selection.
    pub fn detail(&self) -> Option<DetailView> {
        self.state
            .selected_institution
            .as_ref()
            .map(|r| DetailView::build(r, self.expanded, self.options.preview_lines))
    }

    pub fn benefits_expanded(&self) -> bool {
        self.expanded.benefits
    }

    pub fn other_details_expanded(&self) -> bool {
        self.expanded.other_details
    }

    /// Flip "Read More" / "Show Less" on the benefits text. No-op without a
    /// selection.
    pub fn toggle_benefits(&mut self) {
        if self.state.selected_institution.is_some() {
            self.expanded.benefits = !self.expanded.benefits;
        }
    }

    /// Same as [`toggle_benefits`](Self::toggle_benefits) for the
    /// additional information block.
    pub fn toggle_other_details(&mut self) {
        if self.state.selected_institution.is_some() {
            self.expanded.other_details = !self.expanded.other_details;
        }
    }
}
