//! Main application state and logic.
//!
//! Every key press maps to at most one [`DeckStore`] call. The next frame is
//! drawn from the store's state, so handlers never render.

use std::fmt::Display;
use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Local, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{block::BorderType, Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use super::theme::Theme;
use super::widgets::{
    AnswerButtons, CompletionScreen, FlashcardWidget, KeyHints, Logo, RetentionForecast, StatsBar,
};
use crate::analytics::{self, Analytics, DeckSummary};
use crate::config::Config;
use crate::error::StoreError;
use crate::models::{Card, Deck, Difficulty, ReviewOutcome, SessionStats};
use crate::session::StudySession;
use crate::storage::DeckStorage;
use crate::store::DeckStore;

// ══════════════════════════════════════════════════════════════════════════
// Application State
// ══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    DeckSelect,
    DeckView,
    AddCard,
    Study,
    Complete,
    DeckStats,
    Stats,
}

/// What a text prompt is collecting.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptKind {
    NewDeck,
    RenameDeck(String),
    ImportPath,
    ImportName(PathBuf),
}

impl PromptKind {
    fn title(&self) -> &'static str {
        match self {
            PromptKind::NewDeck => " New deck name ",
            PromptKind::RenameDeck(_) => " Rename deck ",
            PromptKind::ImportPath => " Import file (.json, .csv, .txt) ",
            PromptKind::ImportName(_) => " Deck name (blank keeps the file's) ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

/// Destructive actions waiting for a yes/no.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirm {
    DeleteDeck(String),
    ResetDeck(String),
    ClearAll,
}

/// Summary of the last finished session, shown on the results screen.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub stats: SessionStats,
    pub learned: usize,
    pub total_cards: usize,
    pub duration_mins: u64,
}

pub struct App {
    pub screen: Screen,
    pub running: bool,

    // Config and theme
    pub config: Config,
    pub theme: Theme,

    // Decks
    pub store: DeckStore,
    pub deck_list_state: ListState,
    pub current_deck: Option<String>,

    // Study state
    pub session: Option<StudySession>,
    pub showing_answer: bool,
    pub session_start: Option<Instant>,
    pub interval_preview: [(ReviewOutcome, String); 3],
    pub last_result: Option<SessionResult>,

    // Add card state
    pub add_card_front: String,
    pub add_card_back: String,
    pub add_card_focus: usize, // 0 = front, 1 = back

    // Card browser state
    pub card_list_state: ListState,
    pub card_delete_pending: bool,

    // Overlays
    pub prompt: Option<Prompt>,
    pub confirm: Option<Confirm>,

    // Status message (shown temporarily), flagged when it reports an error
    pub status_message: Option<(String, bool, Instant)>,
}

impl App {
    pub fn new(store: DeckStore, config: Config) -> Self {
        let theme = Theme::from_name(&config.theme);
        let selected = if store.decks().is_empty() { None } else { Some(0) };

        Self {
            screen: Screen::DeckSelect,
            running: true,
            config,
            theme,
            store,
            deck_list_state: ListState::default().with_selected(selected),
            current_deck: None,
            session: None,
            showing_answer: false,
            session_start: None,
            interval_preview: ReviewOutcome::ALL.map(|o| (o, String::new())),
            last_result: None,
            add_card_front: String::new(),
            add_card_back: String::new(),
            add_card_focus: 0,
            card_list_state: ListState::default(),
            card_delete_pending: false,
            prompt: None,
            confirm: None,
            status_message: None,
        }
    }

    fn selected_deck(&self) -> Option<&Deck> {
        self.deck_list_state
            .selected()
            .and_then(|i| self.store.decks().get(i))
    }

    fn selected_deck_id(&self) -> Option<String> {
        self.selected_deck().map(|d| d.id.clone())
    }

    fn current_deck(&self) -> Option<&Deck> {
        self.current_deck.as_deref().and_then(|id| self.store.deck(id))
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some((message, false, Instant::now()));
    }

    fn set_error(&mut self, err: impl Display) {
        log::warn!("{}", err);
        self.status_message = Some((err.to_string(), true, Instant::now()));
    }

    /// Turn a store error into a status line.
    fn report<T>(&mut self, result: Result<T, StoreError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.set_error(err);
                None
            }
        }
    }

    fn clamp_deck_selection(&mut self) {
        let len = self.store.decks().len();
        match self.deck_list_state.selected() {
            _ if len == 0 => self.deck_list_state.select(None),
            Some(i) if i >= len => self.deck_list_state.select(Some(len - 1)),
            None => self.deck_list_state.select(Some(0)),
            _ => {}
        }
    }

    fn select_deck_by_id(&mut self, id: &str) {
        let index = self.store.decks().iter().position(|d| d.id == id);
        self.deck_list_state.select(index);
    }

    pub fn cycle_theme(&mut self) {
        let new_theme_name = self.theme.name.next();
        self.theme = Theme::new(new_theme_name);
        self.config.theme = new_theme_name.as_str().to_string();
        if let Err(err) = self.config.save() {
            log::warn!("Could not save theme: {:#}", err);
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Actions
    // ══════════════════════════════════════════════════════════════════════

    fn open_prompt(&mut self, kind: PromptKind, input: String) {
        self.prompt = Some(Prompt { kind, input });
    }

    fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };

        match prompt.kind.clone() {
            PromptKind::NewDeck => match self.store.create_deck(&prompt.input) {
                Ok(deck) => {
                    self.select_deck_by_id(&deck.id);
                    self.current_deck = Some(deck.id);
                    self.add_card_focus = 0;
                    self.screen = Screen::AddCard;
                }
                Err(err) => {
                    self.set_error(err);
                    self.prompt = Some(prompt);
                }
            },
            PromptKind::RenameDeck(id) => match self.store.rename_deck(&id, &prompt.input) {
                Ok(_) => self.set_status(format!("Renamed deck to '{}'", prompt.input.trim())),
                Err(err) => {
                    self.set_error(err);
                    self.prompt = Some(prompt);
                }
            },
            PromptKind::ImportPath => {
                let path = prompt.input.trim();
                if path.is_empty() {
                    self.set_error("Please select a file");
                    self.prompt = Some(prompt);
                } else {
                    self.open_prompt(PromptKind::ImportName(PathBuf::from(path)), String::new());
                }
            }
            PromptKind::ImportName(path) => {
                let result = self.store.import_file(&path, Some(prompt.input.as_str()));
                if let Some(decks) = self.report(result) {
                    self.clamp_deck_selection();
                    self.set_status(format!("Successfully imported {} deck(s)!", decks.len()));
                }
            }
        }
    }

    fn run_confirmed(&mut self, confirm: Confirm) {
        match confirm {
            Confirm::DeleteDeck(id) => {
                let result = self.store.delete_deck(&id);
                if let Some(true) = self.report(result) {
                    self.clamp_deck_selection();
                }
            }
            Confirm::ResetDeck(id) => {
                let name = self.store.deck(&id).map(|d| d.name.clone()).unwrap_or_default();
                let result = self.store.reset_deck(&id);
                if let Some(true) = self.report(result) {
                    self.set_status(format!("Deck \"{}\" has been reset!", name));
                }
            }
            Confirm::ClearAll => {
                let result = self.store.clear_all();
                if self.report(result).is_some() {
                    self.clamp_deck_selection();
                    self.set_status("All data cleared!".to_string());
                }
            }
        }
    }

    pub fn start_study(&mut self, deck_id: &str) {
        let Some(deck) = self.store.deck(deck_id) else {
            return;
        };

        let session = StudySession::new(deck, self.config.due_only);
        if session.is_finished() {
            let message = if self.config.due_only {
                "No cards need review in this deck"
            } else {
                "This deck has no cards yet"
            };
            self.set_status(message.to_string());
            return;
        }

        self.current_deck = Some(deck_id.to_string());
        self.session = Some(session);
        self.session_start = Some(Instant::now());
        self.showing_answer = false;
        self.screen = Screen::Study;
        self.refresh_preview();
    }

    fn refresh_preview(&mut self) {
        let preview = self
            .session
            .as_ref()
            .and_then(|s| s.current_card(&self.store))
            .map(|card| self.store.scheduler().preview_intervals(card));
        if let Some(preview) = preview {
            self.interval_preview = preview;
        }
    }

    pub fn show_answer(&mut self) {
        self.showing_answer = true;
    }

    pub fn answer(&mut self, outcome: ReviewOutcome) {
        if outcome != ReviewOutcome::Skip && !self.showing_answer {
            return;
        }

        let result = match self.session.as_mut() {
            Some(session) => session.answer(&mut self.store, outcome),
            None => return,
        };
        if self.report(result).is_none() {
            return;
        }

        if self.session.as_ref().map_or(true, StudySession::is_finished) {
            self.finish_study();
        } else {
            self.showing_answer = false;
            self.refresh_preview();
        }
    }

    /// Leave the study screen. Sessions with answers are folded into the deck stats.
    pub fn finish_study(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        if session.stats().total() == 0 {
            self.screen = Screen::DeckSelect;
            return;
        }

        let stats = *session.stats();
        let deck_id = session.deck_id().to_string();
        let result = session.finish(&mut self.store);
        if self.report(result).is_none() {
            self.screen = Screen::DeckSelect;
            return;
        }

        let (learned, total_cards) = self
            .store
            .deck(&deck_id)
            .map(|d| (d.learned_count(), d.cards.len()))
            .unwrap_or_default();
        let duration_mins = self
            .session_start
            .map(|s| s.elapsed().as_secs() / 60)
            .unwrap_or(0);

        self.last_result = Some(SessionResult {
            stats,
            learned,
            total_cards,
            duration_mins,
        });
        self.screen = Screen::Complete;
    }

    pub fn add_card(&mut self) {
        let Some(deck_id) = self.current_deck.clone() else {
            return;
        };

        let result = self
            .store
            .add_card(&deck_id, &self.add_card_front, &self.add_card_back);
        if let Some(Some(_)) = self.report(result) {
            self.add_card_front.clear();
            self.add_card_back.clear();
            self.add_card_focus = 0;
        }
    }

    pub fn export_backup(&mut self) {
        let path = DeckStorage::default_backup_path();
        match self.store.export_to(&path) {
            Ok(count) => self.set_status(format!("Exported {} decks to {}", count, path.display())),
            Err(e) => self.set_error(format!("Export failed: {}", e)),
        }
    }

    pub fn enter_deck_view(&mut self, deck_id: String) {
        let has_cards = self
            .store
            .deck(&deck_id)
            .map_or(false, |d| !d.cards.is_empty());
        self.card_list_state = ListState::default().with_selected(has_cards.then_some(0));
        self.card_delete_pending = false;
        self.current_deck = Some(deck_id);
        self.screen = Screen::DeckView;
    }

    pub fn delete_selected_card(&mut self) {
        self.card_delete_pending = false;
        let (Some(deck_id), Some(i)) = (self.current_deck.clone(), self.card_list_state.selected())
        else {
            return;
        };

        let result = self.store.delete_card(&deck_id, i);
        if let Some(true) = self.report(result) {
            let len = self.current_deck().map_or(0, |d| d.cards.len());
            if len == 0 {
                self.card_list_state.select(None);
            } else if i >= len {
                self.card_list_state.select(Some(len - 1));
            }
        }
    }

    fn back_to_decks(&mut self) {
        self.screen = Screen::DeckSelect;
        self.current_deck = None;
        self.clamp_deck_selection();
    }

    // ══════════════════════════════════════════════════════════════════════
    // Event Handling
    // ══════════════════════════════════════════════════════════════════════

    pub fn handle_events(&mut self) -> anyhow::Result<()> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code);
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        if let Some(confirm) = self.confirm.take() {
            if matches!(key, KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter) {
                self.run_confirmed(confirm);
            }
            return;
        }

        if self.prompt.is_some() {
            self.handle_prompt_keys(key);
            return;
        }

        match self.screen {
            Screen::DeckSelect => self.handle_deck_select_keys(key),
            Screen::DeckView => self.handle_deck_view_keys(key),
            Screen::AddCard => self.handle_add_card_keys(key),
            Screen::Study => self.handle_study_keys(key),
            Screen::Complete => self.handle_complete_keys(key),
            Screen::DeckStats | Screen::Stats => self.handle_stats_keys(key),
        }
    }

    fn handle_prompt_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Enter => self.submit_prompt(),
            KeyCode::Backspace => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_deck_select_keys(&mut self, key: KeyCode) {
        let len = self.store.decks().len();
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('t') => self.cycle_theme(),
            KeyCode::Up | KeyCode::Char('k') if len > 0 => {
                let i = self.deck_list_state.selected().unwrap_or(0);
                let new_i = if i == 0 { len - 1 } else { i - 1 };
                self.deck_list_state.select(Some(new_i));
            }
            KeyCode::Down | KeyCode::Char('j') if len > 0 => {
                let i = self.deck_list_state.selected().unwrap_or(0);
                let new_i = if i >= len - 1 { 0 } else { i + 1 };
                self.deck_list_state.select(Some(new_i));
            }
            KeyCode::Enter => {
                if let Some(id) = self.selected_deck_id() {
                    self.start_study(&id);
                }
            }
            KeyCode::Char('n') => self.open_prompt(PromptKind::NewDeck, String::new()),
            KeyCode::Char('i') => self.open_prompt(PromptKind::ImportPath, String::new()),
            KeyCode::Char('x') => self.export_backup(),
            KeyCode::Char('s') => self.screen = Screen::Stats,
            KeyCode::Char('C') => self.confirm = Some(Confirm::ClearAll),
            KeyCode::Char('b') => {
                if let Some(id) = self.selected_deck_id() {
                    self.enter_deck_view(id);
                }
            }
            KeyCode::Char('v') => {
                if let Some(id) = self.selected_deck_id() {
                    self.current_deck = Some(id);
                    self.screen = Screen::DeckStats;
                }
            }
            KeyCode::Char('r') => {
                if let Some(deck) = self.selected_deck() {
                    let (id, name) = (deck.id.clone(), deck.name.clone());
                    self.open_prompt(PromptKind::RenameDeck(id), name);
                }
            }
            KeyCode::Char('R') => {
                self.confirm = self.selected_deck_id().map(Confirm::ResetDeck);
            }
            KeyCode::Char('d') => {
                self.confirm = self.selected_deck_id().map(Confirm::DeleteDeck);
            }
            _ => {}
        }
    }

    fn handle_study_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => self.finish_study(),
            KeyCode::Char('t') => self.cycle_theme(),
            KeyCode::Char(' ') | KeyCode::Enter => {
                if !self.showing_answer {
                    self.show_answer();
                }
            }
            KeyCode::Char(c) => {
                if let Some(outcome) = ReviewOutcome::from_key(c) {
                    self.answer(outcome);
                }
            }
            _ => {}
        }
    }

    fn focused_field(&mut self) -> &mut String {
        if self.add_card_focus == 0 {
            &mut self.add_card_front
        } else {
            &mut self.add_card_back
        }
    }

    fn handle_add_card_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => match self.current_deck.clone() {
                Some(id) => self.enter_deck_view(id),
                None => self.back_to_decks(),
            },
            KeyCode::Tab => self.add_card_focus = (self.add_card_focus + 1) % 2,
            KeyCode::Enter => {
                if self.add_card_focus == 0 {
                    self.add_card_focus = 1;
                } else {
                    self.add_card();
                }
            }
            KeyCode::Char(c) => self.focused_field().push(c),
            KeyCode::Backspace => {
                self.focused_field().pop();
            }
            _ => {}
        }
    }

    fn handle_complete_keys(&mut self, key: KeyCode) {
        if matches!(key, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
            self.last_result = None;
            self.back_to_decks();
        }
    }

    fn handle_stats_keys(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => self.back_to_decks(),
            KeyCode::Char('t') => self.cycle_theme(),
            _ => {}
        }
    }

    fn handle_deck_view_keys(&mut self, key: KeyCode) {
        let len = self.current_deck().map_or(0, |d| d.cards.len());
        if key != KeyCode::Char('d') {
            self.card_delete_pending = false;
        }

        match key {
            KeyCode::Esc | KeyCode::Char('q') => self.back_to_decks(),
            KeyCode::Up | KeyCode::Char('k') if len > 0 => {
                let i = self.card_list_state.selected().unwrap_or(0);
                let new_i = if i == 0 { len - 1 } else { i - 1 };
                self.card_list_state.select(Some(new_i));
            }
            KeyCode::Down | KeyCode::Char('j') if len > 0 => {
                let i = self.card_list_state.selected().unwrap_or(0);
                let new_i = if i >= len - 1 { 0 } else { i + 1 };
                self.card_list_state.select(Some(new_i));
            }
            KeyCode::Char('d') => {
                if self.card_delete_pending {
                    self.delete_selected_card();
                } else if self.card_list_state.selected().is_some() {
                    self.card_delete_pending = true;
                }
            }
            KeyCode::Char('a') => {
                self.add_card_focus = 0;
                self.screen = Screen::AddCard;
            }
            KeyCode::Char('r') => {
                if let Some(deck) = self.current_deck() {
                    let (id, name) = (deck.id.clone(), deck.name.clone());
                    self.open_prompt(PromptKind::RenameDeck(id), name);
                }
            }
            KeyCode::Char('t') => self.cycle_theme(),
            _ => {}
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Rendering
    // ══════════════════════════════════════════════════════════════════════

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        frame.render_widget(Clear, area);
        frame.render_widget(
            Block::default().style(Style::default().bg(self.theme.colors.bg_dark)),
            area,
        );

        match self.screen {
            Screen::DeckSelect => self.render_deck_select(frame, area),
            Screen::DeckView => self.render_deck_view(frame, area),
            Screen::AddCard => self.render_add_card(frame, area),
            Screen::Study => self.render_study(frame, area),
            Screen::Complete => self.render_complete(frame, area),
            Screen::DeckStats => self.render_deck_stats(frame, area),
            Screen::Stats => self.render_stats(frame, area),
        }

        self.render_status(frame, area);
        self.render_overlays(frame, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        // Show status message if recent (within 5 seconds)
        let Some((ref msg, is_error, time)) = self.status_message else {
            return;
        };
        if time.elapsed().as_secs() >= 5 {
            return;
        }

        let color = if is_error {
            self.theme.colors.error
        } else {
            self.theme.colors.success
        };
        let status_area = Rect {
            x: area.x,
            y: area.bottom().saturating_sub(3),
            width: area.width,
            height: 1,
        };
        frame.render_widget(
            Paragraph::new(msg.as_str())
                .alignment(Alignment::Center)
                .style(Style::default().fg(color)),
            status_area,
        );
    }

    fn render_overlays(&self, frame: &mut Frame, area: Rect) {
        if let Some(ref prompt) = self.prompt {
            let popup = centered_box(60, 3, area);
            frame.render_widget(Clear, popup);
            let input = Paragraph::new(prompt.input.as_str())
                .style(Style::default().fg(self.theme.colors.text).bg(self.theme.colors.bg_elevated))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(self.theme.colors.accent))
                        .title(prompt.kind.title())
                        .title_style(self.theme.key_highlight()),
                );
            frame.render_widget(input, popup);

            let text_width = prompt.input.chars().filter_map(|c| c.width()).sum::<usize>() as u16;
            let cursor_x = (popup.x + 1 + text_width).min(popup.right().saturating_sub(2));
            frame.set_cursor_position((cursor_x, popup.y + 1));
        } else if let Some(ref confirm) = self.confirm {
            let name_of = |id: &str| {
                self.store
                    .deck(id)
                    .map(|d| d.name.clone())
                    .unwrap_or_default()
            };
            let question = match confirm {
                Confirm::DeleteDeck(id) => format!("Delete \"{}\"?", name_of(id)),
                Confirm::ResetDeck(id) => format!(
                    "Reset \"{}\"? All progress will be lost.",
                    name_of(id)
                ),
                Confirm::ClearAll => "Delete every deck? This cannot be undone!".to_string(),
            };

            let popup = centered_box(60, 5, area);
            frame.render_widget(Clear, popup);
            let body = Paragraph::new(vec![
                Line::from(Span::styled(question, Style::default().fg(self.theme.colors.text))),
                Line::from(""),
                Line::from(vec![
                    Span::styled("y", self.theme.key_highlight()),
                    Span::styled(" confirm  ", self.theme.key_hint()),
                    Span::styled("any", self.theme.key_highlight()),
                    Span::styled(" cancel", self.theme.key_hint()),
                ]),
            ])
            .alignment(Alignment::Center)
            .style(Style::default().bg(self.theme.colors.bg_elevated))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(self.theme.colors.warning))
                    .title(" Confirm ")
                    .title_style(Style::default().fg(self.theme.colors.warning)),
            );
            frame.render_widget(body, popup);
        }
    }

    fn render_deck_select(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(2), // Top padding
            Constraint::Length(5), // Logo
            Constraint::Length(2), // Spacing
            Constraint::Min(5),    // Deck list
            Constraint::Length(3), // Help
        ])
        .split(area);

        Logo::render_to(&self.theme, chunks[1], frame.buffer_mut());

        let list_area = centered_rect(60, 100, chunks[3]);
        let now = Utc::now();

        let items: Vec<ListItem> = self
            .store
            .decks()
            .iter()
            .map(|deck| {
                let counts = deck.counts_at(now);
                let mut spans = vec![
                    Span::styled(deck.name.as_str(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(
                        format!(
                            "  {}/{} cards learned",
                            counts.learned_cards, counts.total_cards
                        ),
                        Style::default().fg(self.theme.colors.text_muted),
                    ),
                ];
                if counts.due_cards > 0 {
                    spans.push(Span::styled(
                        format!(" • {} need review", counts.due_cards),
                        Style::default().fg(self.theme.colors.warning),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.colors.primary))
            .title(" Decks ")
            .title_style(self.theme.highlight());

        if items.is_empty() {
            let empty = Paragraph::new("No decks yet. Press n to create one or i to import.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(self.theme.colors.text_dim))
                .block(block);
            frame.render_widget(empty, list_area);
        } else {
            let list = List::new(items)
                .block(block)
                .highlight_style(self.theme.selected())
                .highlight_symbol("> ");
            frame.render_stateful_widget(list, list_area, &mut self.deck_list_state);
        }

        let theme_hint = format!("[{}]", self.theme.name.display_name());
        let hints_data: [(&str, &str); 12] = [
            ("Enter", "study"),
            ("b", "cards"),
            ("v", "stats"),
            ("n", "new"),
            ("r", "rename"),
            ("R", "reset"),
            ("d", "del"),
            ("i", "import"),
            ("x", "export"),
            ("s", "analytics"),
            ("t", &theme_hint),
            ("q", "quit"),
        ];
        frame.render_widget(KeyHints::new(&hints_data, &self.theme), chunks[4]);
    }

    fn render_study(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(2), // Header
            Constraint::Length(1), // Progress
            Constraint::Length(1), // Stats
            Constraint::Length(1), // Separator
            Constraint::Min(10),   // Card
            Constraint::Length(1), // Separator
            Constraint::Length(5), // Buttons
            Constraint::Length(2), // Hints
        ])
        .split(area);

        let (Some(deck), Some(session)) = (self.current_deck(), self.session.as_ref()) else {
            return;
        };

        let header = Paragraph::new(Line::from(Span::styled(deck.name.as_str(), self.theme.title())))
            .alignment(Alignment::Center);
        frame.render_widget(header, chunks[0]);

        let (current, total) = session.progress();
        let gauge = Gauge::default()
            .gauge_style(self.theme.progress().bg(self.theme.colors.bg_elevated))
            .ratio(current as f64 / total.max(1) as f64)
            .label(format!("Card {} of {}", current, total));
        frame.render_widget(gauge, centered_rect(60, 100, chunks[1]));

        frame.render_widget(StatsBar::new(deck.counts(), &self.theme), chunks[2]);

        if let Some(card) = session.current_card(&self.store) {
            let (content, is_front) = if self.showing_answer {
                (card.back.as_str(), false)
            } else {
                (card.front.as_str(), true)
            };
            frame.render_widget(
                FlashcardWidget::new(content, is_front, &self.theme),
                centered_rect(80, 100, chunks[4]),
            );
        }

        frame.render_widget(
            AnswerButtons::new(&self.interval_preview, self.showing_answer, &self.theme),
            centered_rect(90, 100, chunks[6]),
        );

        let hints: &[(&str, &str)] = if self.showing_answer {
            &[("1", "Hard"), ("2", "Easy"), ("3", "Skip"), ("Esc", "finish")]
        } else {
            &[("Space", "show answer"), ("3", "skip"), ("Esc", "finish")]
        };
        frame.render_widget(KeyHints::new(hints, &self.theme), chunks[7]);
    }

    fn render_add_card(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(3), // Title
            Constraint::Length(1), // Spacing
            Constraint::Length(3), // Front input
            Constraint::Length(1), // Spacing
            Constraint::Length(3), // Back input
            Constraint::Length(2), // Spacing
            Constraint::Length(3), // Count
            Constraint::Min(1),    // Spacer
            Constraint::Length(2), // Hints
        ])
        .split(centered_rect(60, 100, area));

        let (deck_name, count) = self
            .current_deck()
            .map(|d| (d.name.as_str(), d.cards.len()))
            .unwrap_or(("Deck", 0));

        let title = Paragraph::new(format!("Add Card to {}", deck_name))
            .alignment(Alignment::Center)
            .style(self.theme.title());
        frame.render_widget(title, chunks[0]);

        let fields = [
            (&self.add_card_front, " Front (Question) ", chunks[2]),
            (&self.add_card_back, " Back (Answer) ", chunks[4]),
        ];
        for (focus, (text, label, chunk)) in fields.into_iter().enumerate() {
            let style = if self.add_card_focus == focus {
                Style::default().fg(self.theme.colors.accent)
            } else {
                Style::default().fg(self.theme.colors.text_muted)
            };
            let input = Paragraph::new(text.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(style)
                    .title(label)
                    .title_style(style),
            );
            frame.render_widget(input, chunk);
        }

        let status = Paragraph::new(format!("Cards: {}", count))
            .alignment(Alignment::Center)
            .style(Style::default().fg(self.theme.colors.text_muted));
        frame.render_widget(status, chunks[6]);

        let hints = KeyHints::new(
            &[("Tab", "switch field"), ("Enter", "add card"), ("Esc", "done")],
            &self.theme,
        );
        frame.render_widget(hints, chunks[8]);
    }

    fn render_deck_view(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([
            Constraint::Length(3), // Header
            Constraint::Length(1), // Spacing
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Hints
        ])
        .split(area);

        let deck = self.current_deck.as_deref().and_then(|id| self.store.deck(id));
        let Some(deck) = deck else {
            return;
        };

        let title = Paragraph::new(format!("{} - Cards", deck.name))
            .alignment(Alignment::Center)
            .style(self.theme.title());
        frame.render_widget(title, chunks[0]);

        let main_chunks = Layout::horizontal([
            Constraint::Percentage(35), // Card list
            Constraint::Percentage(65), // Card details
        ])
        .split(chunks[2]);

        let now = Utc::now();
        let items: Vec<ListItem> = deck
            .cards
            .iter()
            .map(|card| {
                let status = if card.is_new() {
                    "(new)".to_string()
                } else if card.is_due_at(now) {
                    "(due)".to_string()
                } else {
                    format!("({}d)", days_until(card.next_review_date, now))
                };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        truncate_to_width(&card.front, 25),
                        Style::default().fg(self.theme.colors.text),
                    ),
                    Span::styled(
                        format!(" {}", status),
                        Style::default().fg(self.theme.colors.text_muted),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(self.theme.colors.primary))
                    .title(" Cards ")
                    .title_style(self.theme.highlight()),
            )
            .highlight_style(self.theme.selected())
            .highlight_symbol("> ");

        frame.render_stateful_widget(list, main_chunks[0], &mut self.card_list_state);

        if let Some(card) = self.card_list_state.selected().and_then(|i| deck.cards.get(i)) {
            self.render_card_details(frame, main_chunks[1], card);
        }

        let hints = if self.card_delete_pending {
            KeyHints::new(&[("d", "confirm delete"), ("any", "cancel")], &self.theme)
        } else {
            KeyHints::new(
                &[("j/k", "nav"), ("a", "add"), ("d", "delete"), ("r", "rename"), ("Esc", "back")],
                &self.theme,
            )
        };
        frame.render_widget(hints, chunks[3]);
    }

    fn render_card_details(&self, frame: &mut Frame, area: Rect, card: &Card) {
        let chunks = Layout::vertical([
            Constraint::Length(5), // Front
            Constraint::Length(1), // Spacing
            Constraint::Length(5), // Back
            Constraint::Length(1), // Spacing
            Constraint::Min(6),    // Metadata
        ])
        .split(area);

        let sides = [
            (card.front.as_str(), " Front ", self.theme.colors.accent, chunks[0]),
            (card.back.as_str(), " Back ", self.theme.colors.success, chunks[2]),
        ];
        for (text, label, color, chunk) in sides {
            let side = Paragraph::new(text)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(color))
                        .title(label)
                        .title_style(Style::default().fg(color)),
                )
                .wrap(Wrap { trim: true });
            frame.render_widget(side, chunk);
        }

        let due_str = if card.is_due() {
            "Needs review".to_string()
        } else {
            match days_until(card.next_review_date, Utc::now()) {
                1 => "Due tomorrow".to_string(),
                days => format!("Due in {} days", days),
            }
        };
        let difficulty = match card.difficulty {
            Difficulty::New => "New",
            Difficulty::Easy => "Easy",
            Difficulty::Hard => "Hard",
        };
        let last_review = card
            .last_review
            .map(format_local)
            .unwrap_or_else(|| "Never".to_string());

        let muted = Style::default().fg(self.theme.colors.text_muted);
        let value = Style::default().fg(self.theme.colors.text);
        let metadata = vec![
            Line::from(vec![
                Span::styled("Status: ", muted),
                Span::styled(due_str, Style::default().fg(self.theme.colors.primary)),
            ]),
            Line::from(vec![Span::styled("Difficulty: ", muted), Span::styled(difficulty, value)]),
            Line::from(vec![
                Span::styled("Learned: ", muted),
                Span::styled(if card.learned { "Yes" } else { "No" }, value),
            ]),
            Line::from(vec![Span::styled("Reviews: ", muted), Span::styled(card.reviews.to_string(), value)]),
            Line::from(vec![Span::styled("Last review: ", muted), Span::styled(last_review, value)]),
            Line::from(vec![
                Span::styled("Next review: ", muted),
                Span::styled(format_local(card.next_review_date), value),
            ]),
        ];

        let metadata_block = Paragraph::new(metadata).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(self.theme.colors.text_dim))
                .title(" Review ")
                .title_style(muted),
        );
        frame.render_widget(metadata_block, chunks[4]);
    }

    fn render_deck_stats(&mut self, frame: &mut Frame, area: Rect) {
        let Some(deck) = self.current_deck() else {
            return;
        };
        let now = Utc::now();
        let summary = DeckSummary::of(deck, now);

        let chunks = Layout::vertical([
            Constraint::Length(3), // Title
            Constraint::Length(9), // Numbers
            Constraint::Length(3), // Progress
            Constraint::Length(7), // Forecast
            Constraint::Min(0),
            Constraint::Length(2), // Hints
        ])
        .split(centered_rect(70, 100, area));

        let title = Paragraph::new(format!("{} - Statistics", summary.name))
            .alignment(Alignment::Center)
            .style(self.theme.title());
        frame.render_widget(title, chunks[0]);

        let lines = vec![
            self.stat_line("Total Cards", summary.cards.to_string()),
            self.stat_line("Learned", summary.learned.to_string()),
            self.stat_line("Retention", format!("{:.1}%", summary.retention)),
            self.stat_line("Total Reviews", summary.total_reviews.to_string()),
            self.stat_line("Study Sessions", summary.sessions.to_string()),
            self.stat_line("Last Accuracy", format!("{:.1}%", summary.average_accuracy)),
            self.stat_line("Needs Review", summary.needs_review.to_string()),
        ];
        frame.render_widget(Paragraph::new(lines).block(self.panel(" Overview ")), chunks[1]);

        let gauge = Gauge::default()
            .block(self.panel(" Overall Progress "))
            .gauge_style(self.theme.progress().bg(self.theme.colors.bg_elevated))
            .ratio((summary.retention / 100.0).clamp(0.0, 1.0))
            .label(format!("{:.1}%", summary.retention));
        frame.render_widget(gauge, chunks[2]);

        if summary.learned > 0 {
            let steps = analytics::forecast(now);
            frame.render_widget(RetentionForecast::new(&steps, &self.theme), chunks[3]);
        }

        let hints = KeyHints::new(&[("t", "theme"), ("Esc", "back")], &self.theme);
        frame.render_widget(hints, chunks[5]);
    }

    fn render_stats(&mut self, frame: &mut Frame, area: Rect) {
        let now = Utc::now();
        let analytics = Analytics::of(self.store.decks(), now);

        let chunks = Layout::vertical([
            Constraint::Length(3),  // Title
            Constraint::Length(10), // Overview
            Constraint::Min(5),     // Per-deck
            Constraint::Length(7),  // Schedule
            Constraint::Length(2),  // Hints
        ])
        .split(centered_rect(70, 100, area));

        let title = Paragraph::new("Analytics")
            .alignment(Alignment::Center)
            .style(self.theme.title());
        frame.render_widget(title, chunks[0]);

        let overview = vec![
            self.stat_line("Total Decks", analytics.total_decks.to_string()),
            self.stat_line("Total Cards", analytics.total_cards.to_string()),
            self.stat_line("Cards Learned", analytics.total_learned.to_string()),
            self.stat_line("Overall Retention", format!("{:.1}%", analytics.overall_retention)),
            self.stat_line("Total Reviews", analytics.total_reviews.to_string()),
            self.stat_line("Study Sessions", analytics.total_sessions.to_string()),
            self.stat_line("Avg Cards/Deck", format!("{:.1}", analytics.avg_cards_per_deck)),
            self.stat_line("Avg Reviews/Deck", format!("{:.1}", analytics.avg_reviews_per_deck)),
        ];
        frame.render_widget(Paragraph::new(overview).block(self.panel(" Overview ")), chunks[1]);

        let deck_lines: Vec<Line> = if analytics.decks.is_empty() {
            vec![Line::from(Span::styled(
                "No decks yet.",
                Style::default().fg(self.theme.colors.text_dim),
            ))]
        } else {
            analytics
                .decks
                .iter()
                .map(|d| {
                    Line::from(vec![
                        Span::styled(
                            truncate_to_width(&d.name, 24),
                            Style::default().fg(self.theme.colors.text).add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!(
                                "  cards {}  learned {}  retention {:.1}%  reviews {}  sessions {}  due {}",
                                d.cards, d.learned, d.retention, d.total_reviews, d.sessions, d.needs_review
                            ),
                            Style::default().fg(self.theme.colors.text_muted),
                        ),
                    ])
                })
                .collect()
        };
        frame.render_widget(
            Paragraph::new(deck_lines).block(self.panel(" Deck Details ")),
            chunks[2],
        );

        let steps = analytics::forecast(now);
        frame.render_widget(RetentionForecast::new(&steps, &self.theme), chunks[3]);

        let hints = KeyHints::new(&[("t", "theme"), ("Esc", "back")], &self.theme);
        frame.render_widget(hints, chunks[4]);
    }

    fn render_complete(&mut self, frame: &mut Frame, area: Rect) {
        let Some(ref result) = self.last_result else {
            return;
        };

        let chunks = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(13), // Results
            Constraint::Length(7),  // Forecast
            Constraint::Min(0),
        ])
        .split(centered_rect(50, 100, area));

        frame.render_widget(
            CompletionScreen::new(
                result.stats,
                result.learned,
                result.total_cards,
                result.duration_mins,
                &self.theme,
            ),
            chunks[1],
        );

        if result.learned > 0 {
            let steps = analytics::forecast(Utc::now());
            frame.render_widget(RetentionForecast::new(&steps, &self.theme), chunks[2]);
        }
    }

    fn stat_line(&self, label: &str, value: String) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{}: ", label), Style::default().fg(self.theme.colors.text_muted)),
            Span::styled(
                value,
                Style::default().fg(self.theme.colors.primary).add_modifier(Modifier::BOLD),
            ),
        ])
    }

    fn panel(&self, title: &'static str) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.colors.primary))
            .title(title)
            .title_style(self.theme.highlight())
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Helper Functions
// ══════════════════════════════════════════════════════════════════════════

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(r);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

/// A box `height` rows tall, centered, `percent_x` of the width.
fn centered_box(percent_x: u16, height: u16, r: Rect) -> Rect {
    let height = height.min(r.height);
    let row = Rect {
        y: r.y + (r.height - height) / 2,
        height,
        ..r
    };
    centered_rect(percent_x, 100, row)
}

/// Cut `text` to at most `max` display columns, marking the cut with `…`.
fn truncate_to_width(text: &str, max: usize) -> String {
    let mut out = String::new();
    let mut width = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max.saturating_sub(1) {
            out.push('…');
            return out;
        }
        width += w;
        out.push(c);
    }
    out
}

fn days_until(date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = date.signed_duration_since(now).num_seconds().max(0);
    (seconds + 86_399) / 86_400
}

fn format_local(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_app() -> (App, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = DeckStorage::new(temp_dir.path().join("decks.json")).unwrap();
        let store = DeckStore::open(storage).unwrap();
        (App::new(store, Config::default()), temp_dir)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    fn app_with_deck(cards: &[(&str, &str)]) -> (App, TempDir) {
        let (mut app, temp) = create_test_app();
        app.handle_key(KeyCode::Char('n'));
        type_text(&mut app, "Spanish");
        app.handle_key(KeyCode::Enter);
        for (front, back) in cards {
            type_text(&mut app, front);
            app.handle_key(KeyCode::Enter);
            type_text(&mut app, back);
            app.handle_key(KeyCode::Enter);
        }
        app.handle_key(KeyCode::Esc); // to the card list
        app.handle_key(KeyCode::Esc); // to the deck list
        (app, temp)
    }

    #[test]
    fn test_create_deck_and_add_cards() {
        let (app, _temp) = app_with_deck(&[("Hola", "Hello"), ("Gracias", "Thanks")]);

        assert_eq!(app.screen, Screen::DeckSelect);
        let deck = &app.store.decks()[0];
        assert_eq!(deck.name, "Spanish");
        assert_eq!(deck.cards.len(), 2);
        assert_eq!(deck.cards[1].back, "Thanks");
    }

    #[test]
    fn test_blank_deck_name_keeps_prompt_open() {
        let (mut app, _temp) = create_test_app();
        app.handle_key(KeyCode::Char('n'));
        type_text(&mut app, "   ");
        app.handle_key(KeyCode::Enter);

        assert!(app.prompt.is_some());
        assert!(app.store.decks().is_empty());
        assert!(matches!(app.status_message, Some((_, true, _))));
    }

    #[test]
    fn test_study_session_to_completion() {
        let (mut app, _temp) = app_with_deck(&[("Hola", "Hello"), ("Gracias", "Thanks"), ("Si", "Yes")]);

        app.handle_key(KeyCode::Enter);
        assert_eq!(app.screen, Screen::Study);

        // Rating needs the answer shown first.
        app.handle_key(KeyCode::Char('2'));
        assert_eq!(app.session.as_ref().unwrap().stats().total(), 0);

        app.handle_key(KeyCode::Char(' '));
        app.handle_key(KeyCode::Char('2'));
        app.handle_key(KeyCode::Char(' '));
        app.handle_key(KeyCode::Char('1'));
        app.handle_key(KeyCode::Char('3'));

        assert_eq!(app.screen, Screen::Complete);
        let result = app.last_result.as_ref().unwrap();
        assert_eq!(result.stats, SessionStats { easy: 1, hard: 1, skipped: 1 });
        assert_eq!(result.learned, 1);
        assert_eq!(result.total_cards, 3);

        let stats = &app.store.decks()[0].stats;
        assert_eq!(stats.total_study_sessions, 1);
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.average_accuracy, 33.3);
    }

    #[test]
    fn test_stopping_without_answers_records_nothing() {
        let (mut app, _temp) = app_with_deck(&[("Hola", "Hello")]);
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Esc);

        assert_eq!(app.screen, Screen::DeckSelect);
        assert_eq!(app.store.decks()[0].stats.total_study_sessions, 0);
    }

    #[test]
    fn test_delete_deck_needs_confirmation() {
        let (mut app, _temp) = app_with_deck(&[("Hola", "Hello")]);

        app.handle_key(KeyCode::Char('d'));
        app.handle_key(KeyCode::Char('n'));
        assert_eq!(app.store.decks().len(), 1);

        app.handle_key(KeyCode::Char('d'));
        app.handle_key(KeyCode::Char('y'));
        assert!(app.store.decks().is_empty());
        assert_eq!(app.deck_list_state.selected(), None);
    }

    #[test]
    fn test_delete_card_from_browser() {
        let (mut app, _temp) = app_with_deck(&[("a", "1"), ("b", "2")]);
        app.handle_key(KeyCode::Char('b'));
        assert_eq!(app.screen, Screen::DeckView);

        app.handle_key(KeyCode::Char('j'));
        app.handle_key(KeyCode::Char('d'));
        app.handle_key(KeyCode::Char('d'));

        let fronts: Vec<&str> = app.store.decks()[0].cards.iter().map(|c| c.front.as_str()).collect();
        assert_eq!(fronts, vec!["a"]);
        assert_eq!(app.card_list_state.selected(), Some(0));
    }

    #[test]
    fn test_import_through_prompts() {
        let (mut app, temp) = create_test_app();
        let path = temp.path().join("french.txt");
        std::fs::write(&path, "Bonjour\nHello\nMerci\nThanks\n").unwrap();

        app.handle_key(KeyCode::Char('i'));
        type_text(&mut app, &path.to_string_lossy());
        app.handle_key(KeyCode::Enter);
        type_text(&mut app, "French");
        app.handle_key(KeyCode::Enter);

        assert!(app.prompt.is_none());
        let deck = &app.store.decks()[0];
        assert_eq!(deck.name, "French");
        assert_eq!(deck.cards.len(), 2);
        assert_eq!(app.deck_list_state.selected(), Some(0));
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_to_width("日本語テキスト", 6), "日本…");
    }

    #[test]
    fn test_days_until_rounds_up() {
        let now = Utc::now();
        assert_eq!(days_until(now + chrono::Duration::hours(30), now), 2);
        assert_eq!(days_until(now + chrono::Duration::days(3), now), 3);
        assert_eq!(days_until(now - chrono::Duration::days(1), now), 0);
    }
}
