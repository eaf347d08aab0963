use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use armybook_core::{
    army::export::entry_line, validation::parse_model_count, AppConfig, CollectionItem,
    CollectionQuery, Error as CoreError, SortKey, Tracker,
};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::form::{CountPrompt, FormField, ItemForm};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Collection,
    Army,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
}

#[derive(Debug, Clone)]
struct DeleteConfirm {
    id: u64,
    name: String,
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Cursor and scroll offset over a list of known length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ListCursor {
    cursor: usize,
    offset: usize,
}

impl ListCursor {
    fn move_by(&mut self, delta: isize, len: usize, height: usize) {
        if len == 0 {
            *self = Self::default();
            return;
        }
        let mut idx = self.cursor as isize + delta;
        if idx < 0 {
            idx = 0;
        } else if idx >= len as isize {
            idx = len as isize - 1;
        }
        self.cursor = idx as usize;
        self.ensure_visible(len, height);
    }

    fn move_to(&mut self, index: usize, len: usize, height: usize) {
        if len == 0 {
            *self = Self::default();
            return;
        }
        self.cursor = index.min(len - 1);
        self.ensure_visible(len, height);
    }

    fn clamp(&mut self, len: usize) {
        if len == 0 {
            *self = Self::default();
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    fn ensure_visible(&mut self, len: usize, height: usize) {
        if len == 0 || height == 0 {
            self.offset = 0;
            return;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }
        let max_offset = len.saturating_sub(height);
        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }
}

/// Application state for the collection tracker TUI.
pub struct ArmybookApp {
    tracker: Tracker,
    config: AppConfig,
    screen: Screen,
    mode: Mode,
    query: CollectionQuery,
    collection_cursor: ListCursor,
    army_cursor: ListCursor,
    list_height: usize,
    status: String,
    should_quit: bool,
    form: Option<ItemForm>,
    confirm: Option<DeleteConfirm>,
    count_prompt: Option<CountPrompt>,
    theme: Theme,
}

impl ArmybookApp {
    pub fn new(tracker: Tracker, config: AppConfig) -> Self {
        Self {
            tracker,
            config,
            screen: Screen::Collection,
            mode: Mode::Browse,
            query: CollectionQuery::default(),
            collection_cursor: ListCursor::default(),
            army_cursor: ListCursor::default(),
            list_height: 1,
            status: "Ready".to_string(),
            should_quit: false,
            form: None,
            confirm: None,
            count_prompt: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.set_status(format!(
            "Loaded {} items and {} army entries",
            self.tracker.collection().len(),
            self.tracker.army().len()
        ));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }
            match event_rx.recv().await {
                Some(AppEvent::Input(event)) => {
                    if let Err(err) = self.handle_input(event) {
                        error!(?err, "Input handling failed");
                        self.set_status(format!("Error: {err}"));
                    }
                }
                Some(AppEvent::Tick) => self.handle_tick(),
                None => break,
            }
            if self.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        info!("Exiting armybook");
        Ok(())
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    /// Report a failed store mutation. Validation problems are expected user
    /// errors; anything else is logged.
    fn report(&mut self, context: &str, err: CoreError) {
        if !matches!(err, CoreError::Validation(_)) {
            error!(?err, "{context}");
        }
        self.set_status(format!("{context}: {err}"));
    }

    fn handle_tick(&mut self) {
        if self.mode == Mode::Search {
            self.set_status(format!("Search: {}", self.query.search));
        }
    }

    fn visible_ids(&self) -> Vec<u64> {
        self.query
            .apply(self.tracker.collection().items())
            .into_iter()
            .map(|item| item.id)
            .collect()
    }

    fn current_item(&self) -> Option<&CollectionItem> {
        let id = *self.visible_ids().get(self.collection_cursor.cursor)?;
        self.tracker.collection().get(id)
    }

    fn refresh_collection_cursor(&mut self) {
        let len = self.visible_ids().len();
        self.collection_cursor.clamp(len);
        self.collection_cursor.ensure_visible(len, self.list_height);
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if self.form.is_some() {
            self.handle_form_key(key);
        } else if self.confirm.is_some() {
            self.handle_confirm_key(key);
        } else if self.count_prompt.is_some() {
            self.handle_count_prompt_key(key);
        } else {
            match self.screen {
                Screen::Collection => match self.mode {
                    Mode::Search => self.handle_search_key(key),
                    Mode::Browse => self.handle_collection_key(key)?,
                },
                Screen::Army => self.handle_army_key(key)?,
            }
        }
        Ok(())
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Browse;
                self.query.search.clear();
                self.collection_cursor = ListCursor::default();
                self.set_status("Search cleared".to_string());
            }
            KeyCode::Enter => {
                self.mode = Mode::Browse;
                self.set_status(format!("Search applied: {}", self.query.search));
            }
            KeyCode::Backspace => {
                self.query.search.pop();
                self.collection_cursor = ListCursor::default();
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.query.search.push(c);
                    self.collection_cursor = ListCursor::default();
                }
            }
            _ => {}
        }
    }

    fn handle_collection_key(&mut self, key: KeyEvent) -> Result<()> {
        let len = self.visible_ids().len();
        let height = self.list_height;
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.collection_cursor.move_by(1, len, height),
            KeyCode::Char('k') | KeyCode::Up => self.collection_cursor.move_by(-1, len, height),
            KeyCode::Char('g') | KeyCode::Home => self.collection_cursor.move_to(0, len, height),
            KeyCode::Char('G') | KeyCode::End => {
                self.collection_cursor
                    .move_to(len.saturating_sub(1), len, height)
            }
            KeyCode::PageDown => self.collection_cursor.move_by(height as isize, len, height),
            KeyCode::PageUp => self
                .collection_cursor
                .move_by(-(height as isize), len, height),
            KeyCode::Tab => {
                self.screen = Screen::Army;
                self.set_status(format!(
                    "Army Builder: {} pts",
                    self.tracker.army().grand_total()
                ));
            }
            KeyCode::Char('/') => {
                self.mode = Mode::Search;
                self.set_status("Enter search text".to_string());
            }
            KeyCode::Char('f') => self.cycle_faction_filter(),
            KeyCode::Char('p') => {
                self.query.painted_only = !self.query.painted_only;
                self.collection_cursor = ListCursor::default();
                let message = if self.query.painted_only {
                    "Showing painted only"
                } else {
                    "Showing painted and unpainted"
                };
                self.set_status(message.to_string());
            }
            KeyCode::Char('s') => {
                self.query.sort = self.query.sort.next();
                self.set_status(format!("Sorted by {}", self.query.sort));
            }
            KeyCode::Char('c') => {
                self.query = CollectionQuery {
                    sort: self.query.sort,
                    ..CollectionQuery::default()
                };
                self.collection_cursor = ListCursor::default();
                self.set_status("Filters cleared".to_string());
            }
            KeyCode::Char('a') => {
                self.form = Some(ItemForm::add());
            }
            KeyCode::Char('e') => match self.current_item().map(ItemForm::edit) {
                Some(form) => self.form = Some(form),
                None => self.set_status("No item selected".to_string()),
            },
            KeyCode::Char('d') => self.request_delete(),
            KeyCode::Enter => self.add_current_to_army(),
            _ => {}
        }
        Ok(())
    }

    fn cycle_faction_filter(&mut self) {
        let factions = self.tracker.collection().factions();
        let next = match self.query.faction.as_deref() {
            None => factions.first().cloned(),
            Some(current) => factions
                .iter()
                .position(|faction| faction == current)
                .and_then(|idx| factions.get(idx + 1).cloned()),
        };
        let message = match next.as_deref() {
            Some(faction) => format!("Faction filter: {faction}"),
            None => "Faction filter: all".to_string(),
        };
        self.query.faction = next;
        self.collection_cursor = ListCursor::default();
        self.set_status(message);
    }

    fn request_delete(&mut self) {
        let Some(item) = self.current_item() else {
            self.set_status("No item selected".to_string());
            return;
        };
        let confirm = DeleteConfirm {
            id: item.id,
            name: item.name.clone(),
        };
        if self.config.confirm_delete {
            self.confirm = Some(confirm);
        } else {
            self.delete_item(confirm);
        }
    }

    fn delete_item(&mut self, target: DeleteConfirm) {
        match self.tracker.collection_mut().remove(target.id) {
            Ok(Some(_)) => self.set_status(format!("Deleted {}", target.name)),
            Ok(None) => self.set_status(format!("{} was already removed", target.name)),
            Err(err) => self.report("Delete failed", err),
        }
        self.refresh_collection_cursor();
    }

    fn add_current_to_army(&mut self) {
        let Some(id) = self.current_item().map(|item| item.id) else {
            self.set_status("No item selected".to_string());
            return;
        };
        match self.tracker.add_to_army(id) {
            Ok(Some(index)) => {
                let total = self.tracker.army().grand_total();
                if let Some(entry) = self.tracker.army().get(index) {
                    let message = format!("Added {} to army (army total {total} pts)", entry.name);
                    self.set_status(message);
                }
            }
            Ok(None) => self.set_status("Item no longer in collection".to_string()),
            Err(err) => self.report("Add to army failed", err),
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let Some(confirm) = self.confirm.take() else {
            return;
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.delete_item(confirm),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status("Delete cancelled".to_string());
            }
            _ => self.confirm = Some(confirm),
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.form = None;
                self.set_status("Cancelled".to_string());
                return;
            }
            KeyCode::Enter => {
                self.submit_form();
                return;
            }
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
            KeyCode::Char(' ') if form.focused() == FormField::Painted => form.toggle_painted(),
            _ => {
                if let Some(input) = form.focused_input_mut() {
                    match key.code {
                        KeyCode::Left => input.move_cursor(-1),
                        KeyCode::Right => input.move_cursor(1),
                        KeyCode::Home => input.move_home(),
                        KeyCode::End => input.move_end(),
                        KeyCode::Backspace => input.backspace(),
                        KeyCode::Delete => input.delete(),
                        KeyCode::Char(ch) => {
                            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                                input.insert(ch);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    fn submit_form(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let (draft, coerced) = match form.to_draft() {
            Ok(result) => result,
            Err(err) => {
                self.set_status(format!("Cannot save: {err}"));
                return;
            }
        };
        let name = draft.name.clone();
        let result = match form.editing {
            Some(id) => self
                .tracker
                .collection_mut()
                .update(id, draft)
                .map(|updated| updated.is_some()),
            None => self.tracker.collection_mut().add(draft).map(|_| true),
        };
        match result {
            Ok(true) => {
                let mut message = format!("Saved {name}");
                if coerced {
                    message.push_str(" (invalid points set to 0)");
                }
                self.form = None;
                self.set_status(message);
                self.refresh_collection_cursor();
            }
            Ok(false) => {
                self.form = None;
                self.set_status(format!("{name} no longer exists"));
            }
            Err(err) => self.report("Save failed", err),
        }
    }

    fn handle_army_key(&mut self, key: KeyEvent) -> Result<()> {
        let len = self.tracker.army().len();
        let height = self.list_height;
        let index = self.army_cursor.cursor;
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.should_quit = true,
            KeyCode::Tab | KeyCode::Esc => {
                self.screen = Screen::Collection;
                self.set_status("Collection".to_string());
            }
            KeyCode::Char('j') | KeyCode::Down => self.army_cursor.move_by(1, len, height),
            KeyCode::Char('k') | KeyCode::Up => self.army_cursor.move_by(-1, len, height),
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_model_count(index, 1),
            KeyCode::Char('-') => self.adjust_model_count(index, -1),
            KeyCode::Char('m') => {
                if let Some(entry) = self.tracker.army().get(index) {
                    self.count_prompt = Some(CountPrompt::new(index, entry.model_count));
                }
            }
            KeyCode::Char(ch @ '1'..='9') => {
                let slot = ch as usize - '1' as usize;
                self.toggle_enhancement_slot(index, slot);
            }
            KeyCode::Char('x') => match self.tracker.army_mut().remove_from_army(index) {
                Ok(Some(entry)) => {
                    self.army_cursor.clamp(self.tracker.army().len());
                    self.set_status(format!("Removed {} from army", entry.name));
                }
                Ok(None) => self.set_status("Army list is empty".to_string()),
                Err(err) => self.report("Remove failed", err),
            },
            KeyCode::Char('C') => match self.tracker.army_mut().clear() {
                Ok(()) => {
                    self.army_cursor = ListCursor::default();
                    self.set_status("Army list cleared".to_string());
                }
                Err(err) => self.report("Clear failed", err),
            },
            KeyCode::Char('w') => self.export_army(),
            _ => {}
        }
        Ok(())
    }

    fn adjust_model_count(&mut self, index: usize, delta: i64) {
        let Some(current) = self.tracker.army().get(index).map(|entry| entry.model_count) else {
            return;
        };
        let next = i64::from(current) + delta;
        let Ok(next) = u32::try_from(next) else {
            return;
        };
        if next == 0 {
            self.set_status("Model count must be at least 1".to_string());
            return;
        }
        self.apply_model_count(index, next);
    }

    fn apply_model_count(&mut self, index: usize, count: u32) {
        match self.tracker.army_mut().set_model_count(index, count) {
            Ok(Some(_)) => {
                if let Some(entry) = self.tracker.army().get(index) {
                    let message = entry_line(entry);
                    self.set_status(message);
                }
            }
            Ok(None) => {}
            Err(err) => self.report("Model count rejected", err),
        }
    }

    fn toggle_enhancement_slot(&mut self, index: usize, slot: usize) {
        let Some(name) = self
            .tracker
            .army()
            .get(index)
            .and_then(|entry| entry.enhancements.get(slot))
            .map(|enhancement| enhancement.name.clone())
        else {
            self.set_status(format!("No enhancement #{}", slot + 1));
            return;
        };
        match self.tracker.army_mut().toggle_enhancement(index, &name) {
            Ok(Some(selected)) => {
                let verb = if selected { "Selected" } else { "Deselected" };
                let total = self
                    .tracker
                    .army()
                    .get(index)
                    .map(|entry| entry.total())
                    .unwrap_or_default();
                self.set_status(format!("{verb} {name} ({total} pts)"));
            }
            Ok(None) => {}
            Err(err) => self.report("Toggle failed", err),
        }
    }

    fn export_army(&mut self) {
        if self.tracker.army().is_empty() {
            self.set_status("Army list is empty; nothing to export".to_string());
            return;
        }
        let path = self.config.export_path.clone();
        match self.tracker.export(&path) {
            Ok(()) => self.set_status(format!(
                "Exported {} entries to {} at {}",
                self.tracker.army().len(),
                path.display(),
                Local::now().format("%H:%M:%S")
            )),
            Err(err) => {
                error!(?err, "Export failed");
                self.set_status(format!("Export failed: {err}"));
            }
        }
    }

    fn handle_count_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.count_prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.count_prompt = None;
                self.set_status("Model count unchanged".to_string());
            }
            KeyCode::Enter => {
                let index = prompt.index;
                let parsed = parse_model_count(prompt.input.value());
                self.count_prompt = None;
                match parsed {
                    Ok(count) => self.apply_model_count(index, count),
                    Err(err) => self.set_status(format!("{err}; keeping previous value")),
                }
            }
            KeyCode::Left => prompt.input.move_cursor(-1),
            KeyCode::Right => prompt.input.move_cursor(1),
            KeyCode::Backspace => prompt.input.backspace(),
            KeyCode::Delete => prompt.input.delete(),
            KeyCode::Char(ch) => prompt.input.insert(ch),
            _ => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(4)])
            .split(area);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[0]);
        self.list_height = body[0].height.saturating_sub(2) as usize;

        match self.screen {
            Screen::Collection => {
                self.render_collection_list(frame, body[0]);
                self.render_item_details(frame, body[1]);
            }
            Screen::Army => {
                self.render_army_list(frame, body[0]);
                self.render_entry_details(frame, body[1]);
            }
        }
        self.render_status(frame, chunks[1]);

        if let Some(form) = &self.form {
            self.render_form(frame, form);
        } else if let Some(confirm) = &self.confirm {
            self.render_confirm(frame, confirm);
        } else if let Some(prompt) = &self.count_prompt {
            self.render_count_prompt(frame, prompt);
        }
    }

    fn render_collection_list(&mut self, frame: &mut Frame, area: Rect) {
        self.refresh_collection_cursor();
        let visible = self.query.apply(self.tracker.collection().items());
        let height = area.height.saturating_sub(2) as usize;
        let cursor = self.collection_cursor;

        let items: Vec<ListItem> = visible
            .iter()
            .enumerate()
            .skip(cursor.offset)
            .take(height)
            .map(|(idx, item)| {
                let marker = if idx == cursor.cursor {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let badge_color = if item.painted {
                    self.theme.success
                } else {
                    self.theme.warning
                };
                let mut line = vec![
                    marker,
                    Span::styled(
                        item.name.clone(),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                ];
                if !item.faction.is_empty() {
                    line.push(Span::styled(
                        format!(" · {}", item.faction),
                        Style::default().fg(self.theme.muted),
                    ));
                }
                line.push(Span::raw(format!("  {} pts ", item.base_points)));
                line.push(Span::styled(
                    format!("[{}]", item.painted_label()),
                    Style::default().fg(badge_color),
                ));
                ListItem::new(Line::from(line))
            })
            .collect();

        let mut list_state = ListState::default();
        if !items.is_empty() {
            list_state.select(Some(cursor.cursor.saturating_sub(cursor.offset)));
        }

        let title = if self.query.is_unfiltered() {
            format!("Your Collection ({}) · sort: {}", visible.len(), self.query.sort)
        } else {
            format!(
                "Your Collection ({} of {}) · sort: {}",
                visible.len(),
                self.tracker.collection().len(),
                self.query.sort
            )
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        if items.is_empty() {
            let message = if self.tracker.collection().is_empty() {
                "No items found. Press 'a' to add one."
            } else {
                "No items match the current filters."
            };
            frame.render_widget(Paragraph::new(message).block(block), area);
            return;
        }
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_item_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Details");
        let Some(item) = self.current_item() else {
            frame.render_widget(Paragraph::new("No item selected").block(block), area);
            return;
        };
        let mut lines = vec![Line::from(Span::styled(
            item.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        if !item.faction.is_empty() {
            lines.push(Line::from(Span::styled(
                item.faction.clone(),
                Style::default().fg(self.theme.muted),
            )));
        }
        lines.push(Line::from(format!("Base points: {}", item.base_points)));
        lines.push(Line::from(format!("Status: {}", item.painted_label())));
        if !item.notes.is_empty() {
            lines.push(Line::from(format!("Notes: {}", item.notes)));
        }
        lines.push(Line::from(""));
        if item.enhancements.is_empty() {
            lines.push(Line::from("No enhancements"));
        } else {
            lines.push(Line::from("Enhancements:"));
            for enhancement in &item.enhancements {
                lines.push(Line::from(format!("  • {}", enhancement.label())));
            }
        }
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_army_list(&mut self, frame: &mut Frame, area: Rect) {
        let army = self.tracker.army();
        self.army_cursor.clamp(army.len());
        self.army_cursor
            .ensure_visible(army.len(), area.height.saturating_sub(2) as usize);
        let cursor = self.army_cursor;
        let height = area.height.saturating_sub(2) as usize;

        let items: Vec<ListItem> = army
            .entries()
            .iter()
            .enumerate()
            .skip(cursor.offset)
            .take(height)
            .map(|(idx, entry)| {
                let marker = if idx == cursor.cursor {
                    Span::styled("▶ ", Style::default().fg(self.theme.accent))
                } else {
                    Span::raw("  ")
                };
                ListItem::new(Line::from(vec![
                    marker,
                    Span::raw(entry_line(entry)),
                    Span::styled(
                        format!("  ×{}", entry.model_count),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();

        let title = format!("Army Builder · Total: {} pts", army.grand_total());
        let block = Block::default().borders(Borders::ALL).title(title);
        if items.is_empty() {
            let paragraph = Paragraph::new(
                "Army list is empty. Press Tab, select a unit and press Enter to add it.",
            )
            .block(block)
            .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }
        let mut list_state = ListState::default();
        list_state.select(Some(cursor.cursor.saturating_sub(cursor.offset)));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_entry_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Entry");
        let Some(entry) = self.tracker.army().get(self.army_cursor.cursor) else {
            frame.render_widget(Paragraph::new("No entry selected").block(block), area);
            return;
        };
        let mut lines = vec![
            Line::from(Span::styled(
                entry.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Model Count: {}", entry.model_count)),
            Line::from(format!(
                "{} pts × {} = {} pts",
                entry.base_points,
                entry.model_count,
                u64::from(entry.base_points) * u64::from(entry.model_count)
            )),
            Line::from(""),
        ];
        if entry.enhancements.is_empty() {
            lines.push(Line::from("No enhancements"));
        }
        for (slot, enhancement) in entry.enhancements.iter().enumerate() {
            let selected = entry.is_selected(&enhancement.name);
            let checkbox = if selected { "[x]" } else { "[ ]" };
            let style = if selected {
                Style::default().fg(self.theme.success)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!("{} {checkbox} {}", slot + 1, enhancement.label()),
                style,
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Points: {}", entry.total()),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = if self.mode == Mode::Search && self.screen == Screen::Collection {
            format!("Search: {}", self.query.search)
        } else {
            self.status.clone()
        };
        let help = match self.screen {
            Screen::Collection => {
                "a add · e edit · d delete · Enter add to army · / search · f faction · p painted · s sort · c clear · Tab army · q quit"
            }
            Screen::Army => {
                "+/- models · m set models · 1-9 enhancements · x remove · C clear · w export · Tab collection · q quit"
            }
        };
        let paragraph = Paragraph::new(vec![
            Line::from(primary),
            Line::from(Span::styled(help, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_form(&self, frame: &mut Frame, form: &ItemForm) {
        let area = modal_area(frame.size(), 70, FormField::ALL.len() as u16 + 5);
        frame.render_widget(Clear, area);

        let label_width = 14usize;
        let mut lines = Vec::new();
        let mut cursor_pos = None;
        for (row, field) in FormField::ALL.iter().enumerate() {
            let focused = form.focused() == *field;
            let label_style = if focused {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let value = match form.input(*field) {
                Some(input) => {
                    if focused {
                        cursor_pos = Some((row, input.cursor()));
                    }
                    input.value().to_string()
                }
                None if form.painted => "[x]".to_string(),
                None => "[ ]".to_string(),
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<width$}", field.label(), width = label_width),
                    label_style,
                ),
                Span::raw(value),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enhancements as Name=pts; Name=pts",
            Style::default().fg(self.theme.muted),
        )));
        lines.push(Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" save  "),
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" next field  "),
            Span::styled("Space", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" toggle painted  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(form.title()));
        frame.render_widget(paragraph, area);

        if let Some((row, column)) = cursor_pos {
            let x = (area.x + 1 + label_width as u16 + column as u16)
                .min(area.x + area.width.saturating_sub(2));
            let y = area.y + 1 + row as u16;
            frame.set_cursor(x, y);
        }
    }

    fn render_confirm(&self, frame: &mut Frame, confirm: &DeleteConfirm) {
        let area = modal_area(frame.size(), 50, 6);
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(format!("Are you sure you want to delete {}?", confirm.name)),
            Line::from(""),
            Line::from(vec![
                Span::styled("y", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" confirm  "),
                Span::styled("n", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" cancel"),
            ]),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Delete")
                .border_style(Style::default().fg(self.theme.danger)),
        )
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_count_prompt(&self, frame: &mut Frame, prompt: &CountPrompt) {
        let area = modal_area(frame.size(), 40, 5);
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(vec![
                Span::styled("> ", Style::default().fg(self.theme.accent)),
                Span::raw(prompt.input.value().to_string()),
            ]),
            Line::from(""),
            Line::from("Enter apply · Esc cancel"),
        ])
        .block(Block::default().borders(Borders::ALL).title("Model Count"));
        frame.render_widget(paragraph, area);
        let x = (area.x + 3 + prompt.input.cursor() as u16)
            .min(area.x + area.width.saturating_sub(2));
        frame.set_cursor(x, area.y + 1);
    }
}

fn modal_area(frame_area: Rect, max_width: u16, height: u16) -> Rect {
    let width = cmp::max(
        cmp::min(max_width, frame_area.width.saturating_sub(4)),
        cmp::min(24, frame_area.width),
    );
    let height = height.min(frame_area.height);
    let x = frame_area.x + frame_area.width.saturating_sub(width) / 2;
    let y = frame_area.y + frame_area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}
