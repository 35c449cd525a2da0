use crate::directory::{DirectoryStore, LoadResult, LoadState};
use crate::error::FetchError;
use crate::logging;
use crate::search::{Controller, EscapeSubscription, FocusView, Phase, SearchKey};
use crate::tui::search::QueryInput;
use crate::tui::ui;
use arboard::Clipboard;
use crossbeam_channel::{Receiver, TryRecvError};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use std::time::{Duration, Instant};

/// Which widget has keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    QueryInput,
    Suggestion(usize),
    ConfirmButton,
}

impl FocusView for Focus {
    fn focus_suggestion(&mut self, index: usize) {
        *self = Focus::Suggestion(index);
    }

    fn focus_query_input(&mut self) {
        *self = Focus::QueryInput;
    }

    fn focus_confirm_button(&mut self) {
        *self = Focus::ConfirmButton;
    }
}

/// Short-lived message in the status bar
pub struct StatusMessage {
    pub text: String,
    pub expires_at: Instant,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            text: text.into(),
            expires_at: Instant::now() + duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

pub struct App {
    // Data
    pub load_state: LoadState,
    pub controller: Controller,

    // Widgets
    pub input: QueryInput,
    pub focus: Focus,
    pub status: Option<StatusMessage>,

    // Held for as long as the search view is up
    escape: Option<EscapeSubscription>,

    // One-shot result of the background directory load
    load_receiver: Option<Receiver<LoadResult>>,

    clipboard: Option<Clipboard>,

    // Quit flag
    pub should_quit: bool,
}

impl App {
    pub fn new(mut controller: Controller) -> Self {
        let escape = Some(controller.mount());
        Self {
            load_state: LoadState::NotStarted,
            controller,
            input: QueryInput::default(),
            focus: Focus::QueryInput,
            status: None,
            escape,
            load_receiver: None,
            clipboard: None,
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> crate::Result<()> {
        let tick_rate = Duration::from_millis(50);
        let mut last_tick = Instant::now();

        loop {
            terminal
                .draw(|frame| ui::draw(frame, self))
                .map_err(|e| crate::FertilikeyError::Terminal(e.to_string()))?;

            let timeout = tick_rate.saturating_sub(last_tick.elapsed());
            if event::poll(timeout).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            if last_tick.elapsed() >= tick_rate {
                self.process_messages();
                if self.status.as_ref().is_some_and(StatusMessage::is_expired) {
                    self.status = None;
                }
                last_tick = Instant::now();
            }

            if self.should_quit {
                self.escape = None;
                return Ok(());
            }
        }
    }

    /// Kick off the one directory load on a background thread.
    pub fn start_load(&mut self, store: DirectoryStore) {
        if !self.load_state.begin() {
            return;
        }
        self.load_receiver = Some(store.spawn_load());
    }

    /// Accept a load result delivered by some other means (tests, CLI).
    pub fn finish_load(&mut self, result: LoadResult) {
        if !self.load_state.is_loading() {
            self.load_state.begin();
        }
        self.apply_load(result);
    }

    pub fn process_messages(&mut self) {
        let Some(rx) = &self.load_receiver else {
            return;
        };

        match rx.try_recv() {
            Ok(result) => {
                self.load_receiver = None;
                self.apply_load(result);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.load_receiver = None;
                self.apply_load(Err(FetchError::Network(
                    "directory loader exited early".to_string(),
                )));
            }
        }
    }

    fn apply_load(&mut self, result: LoadResult) {
        self.load_state.complete(result);
        match &self.load_state {
            LoadState::Ready(directory) => {
                let directory = directory.clone();
                self.controller.set_directory(directory, &mut self.focus);
                self.sync_input();
                self.status = Some(StatusMessage::new(
                    format!("{} institutions loaded", self.controller.directory().len()),
                    Duration::from_secs(2),
                ));
            }
            LoadState::Failed(e) => {
                logging::error("TUI", &format!("Directory unavailable: {}", e));
            }
            _ => {}
        }
    }

    /// Copy the controller's query into the editor after it changed it.
    fn sync_input(&mut self) {
        if self.input.text != self.controller.state().query_text {
            self.input.set(&self.controller.state().query_text);
        }
    }

    // --- Key handling ---

    pub fn handle_key(&mut self, key: KeyEvent) {
        // Global keys
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                self.should_quit = true;
                return;
            }
            _ => {}
        }

        if !matches!(self.load_state, LoadState::Ready(_)) {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                self.should_quit = true;
            }
            return;
        }

        if self.focus == Focus::ConfirmButton && self.handle_detail_key(key) {
            return;
        }

        self.handle_search_key(key);
        self.sync_input();
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let focus = &mut self.focus;
        match key.code {
            KeyCode::Down => {
                self.controller.handle_key(SearchKey::Down, focus);
            }
            KeyCode::Up => {
                self.controller.handle_key(SearchKey::Up, focus);
            }
            KeyCode::Enter => {
                self.controller.handle_key(SearchKey::Enter, focus);
            }
            KeyCode::Esc => {
                self.controller.handle_key(SearchKey::Escape, focus);
            }
            KeyCode::Tab => {
                if *focus != Focus::QueryInput {
                    focus.focus_query_input();
                } else if self.controller.phase() == Phase::Selected {
                    focus.focus_confirm_button();
                }
            }
            KeyCode::Char(' ') if matches!(*focus, Focus::Suggestion(_)) => {
                self.controller.handle_key(SearchKey::Space, focus);
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.insert(c);
                self.query_edited();
            }
            KeyCode::Backspace => {
                if self.input.backspace() {
                    self.query_edited();
                }
            }
            KeyCode::Delete => {
                if self.input.delete() {
                    self.query_edited();
                }
            }
            KeyCode::Left => self.input.left(),
            KeyCode::Right => self.input.right(),
            KeyCode::Home => self.input.home(),
            KeyCode::End => self.input.end(),
            _ => {}
        }
    }

    fn query_edited(&mut self) {
        self.focus.focus_query_input();
        self.controller.set_query(self.input.text.clone(), &mut self.focus);
    }

    /// Keys for the detail view. Returns false to fall through to the
    /// search keys.
    fn handle_detail_key(&mut self, key: KeyEvent) -> bool {
        let Some(detail) = self.controller.detail() else {
            return false;
        };

        match key.code {
            KeyCode::Char('r') => {
                self.controller.toggle_benefits();
                true
            }
            KeyCode::Char('a') if detail.other_details.is_some() => {
                self.controller.toggle_other_details();
                true
            }
            KeyCode::Char('o') => {
                match detail.footer.url.as_deref() {
                    Some(url) => self.open_link(url),
                    None => self.notify("No website on file"),
                }
                true
            }
            KeyCode::Char('y') => {
                match detail.footer.url.as_deref() {
                    Some(url) => self.copy(url),
                    None => self.notify("No website on file"),
                }
                true
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                match detail.citation_links().get(index) {
                    Some(url) => self.open_link(url),
                    None => self.notify(format!("No source link {}", c)),
                }
                true
            }
            _ => false,
        }
    }

    // --- Actions ---

    fn open_link(&mut self, url: &str) {
        match open::that(url) {
            Ok(()) => {
                logging::info("TUI", &format!("Opened {}", url));
                self.notify(format!("Opened {}", url));
            }
            Err(e) => {
                logging::warn("TUI", &format!("Failed to open {}: {}", url, e));
                self.notify(format!("Could not open link: {}", e));
            }
        }
    }

    fn copy(&mut self, text: &str) {
        if self.clipboard.is_none() {
            self.clipboard = Clipboard::new().ok();
        }
        let copied = self
            .clipboard
            .as_mut()
            .map(|clipboard| clipboard.set_text(text.to_owned()).is_ok())
            .unwrap_or(false);

        if copied {
            self.notify(format!("Copied: {}", text));
        } else {
            self.notify("Clipboard unavailable");
        }
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage::new(text, Duration::from_secs(3)));
    }
}
