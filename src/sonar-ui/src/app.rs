use std::io::{self, stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use sonar_audio::{AudioEventReceiver, AudioResource};
use sonar_core::catalog::CatalogClient;
use sonar_search::SearchStatus;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::engine::{engine_channel, forward_audio_events, Engine, EngineEvent, EngineReceiver};
use crate::help::HelpContent;
use crate::projector::{BannerKind, CardView, PlayerBarView, View};
use crate::theme::Theme;

const MIN_WIDTH: u16 = 50;
const MIN_HEIGHT: u16 = 12;
const HELP_WIDTH: u16 = 70;
const HELP_HEIGHT: u16 = 80;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Everything the interactive session needs from the caller.
pub struct UiContext {
    pub catalog: Arc<dyn CatalogClient>,
    pub audio: Arc<dyn AudioResource>,
    pub audio_events: AudioEventReceiver,
    pub debounce: Duration,
    pub theme: Theme,
}

#[derive(Debug, Error)]
pub enum UiError {
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, UiError> {
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen);
    }
}

/// Reads terminal input on its own thread; crossterm's reader blocks.
struct InputReader {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl InputReader {
    fn spawn(tx: mpsc::UnboundedSender<io::Result<Event>>) -> Result<Self, UiError> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let handle = thread::Builder::new()
            .name("sonar-input".into())
            .spawn(move || {
                while !flag.load(Ordering::Relaxed) {
                    match event::poll(POLL_INTERVAL) {
                        Ok(true) => {
                            if tx.send(event::read()).is_err() {
                                break;
                            }
                        }
                        Ok(false) => {}
                        Err(err) => {
                            let _ = tx.send(Err(err));
                            break;
                        }
                    }
                }
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Runs the interactive session until the user quits. Must be called from
/// within a tokio runtime; the engine and all spawned work share it.
pub async fn run_ui(context: UiContext) -> Result<(), UiError> {
    let _guard = TerminalGuard::enter()?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let (events, engine_rx) = engine_channel();
    let forwarder = forward_audio_events(context.audio_events, events.clone());
    let engine = Engine::new(context.catalog, context.audio, context.debounce, events);
    let app = App::new(context.theme, engine.view());

    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let reader = InputReader::spawn(input_tx)?;

    tracing::info!("interactive session started");
    let result = event_loop(&mut terminal, engine, engine_rx, app, input_rx).await;
    drop(reader);
    forwarder.abort();
    tracing::info!("interactive session ended");
    result
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    mut engine: Engine,
    mut engine_rx: EngineReceiver,
    mut app: App,
    mut input_rx: mpsc::UnboundedReceiver<io::Result<Event>>,
) -> Result<(), UiError> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        tokio::select! {
            Some(event) = engine_rx.recv() => {
                let mut dirty = engine.handle(event);
                while let Ok(event) = engine_rx.try_recv() {
                    dirty |= engine.handle(event);
                }
                if dirty {
                    app.sync(engine.view());
                }
            }
            input = input_rx.recv() => match input {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    match app.handle_key(key) {
                        KeyAction::Quit => return Ok(()),
                        KeyAction::Engine(event) => {
                            if engine.handle(event) {
                                app.sync(engine.view());
                            }
                        }
                        KeyAction::None => {}
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
                None => return Ok(()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    Results,
}

#[derive(Debug)]
enum KeyAction {
    None,
    Quit,
    Engine(EngineEvent),
}

struct App {
    theme: Theme,
    query: String,
    focus: Focus,
    selected: usize,
    show_help: bool,
    help: HelpContent,
    view: View,
}

impl App {
    fn new(theme: Theme, view: View) -> Self {
        Self {
            theme,
            query: String::new(),
            focus: Focus::Input,
            selected: 0,
            show_help: false,
            help: HelpContent::new(),
            view,
        }
    }

    fn sync(&mut self, view: View) {
        self.view = view;
        if self.view.cards.is_empty() {
            self.selected = 0;
            self.focus = Focus::Input;
        } else if self.selected >= self.view.cards.len() {
            self.selected = self.view.cards.len() - 1;
        }
    }

    fn selected_card(&self) -> Option<&CardView> {
        self.view.cards.get(self.selected)
    }

    fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }
        if key.code == KeyCode::F(1) {
            self.show_help = !self.show_help;
            return KeyAction::None;
        }
        if self.show_help {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return KeyAction::None;
        }
        if ctrl && key.code == KeyCode::Char('p') {
            return KeyAction::Engine(EngineEvent::TogglePlayPause);
        }

        match key.code {
            KeyCode::Esc if self.view.banners.is_empty() => KeyAction::Quit,
            KeyCode::Esc => KeyAction::Engine(EngineEvent::DismissNotice),
            KeyCode::Tab | KeyCode::BackTab => {
                self.toggle_focus();
                KeyAction::None
            }
            _ => match self.focus {
                Focus::Input => self.input_key(key, ctrl),
                Focus::Results => self.results_key(key),
            },
        }
    }

    fn input_key(&mut self, key: KeyEvent, ctrl: bool) -> KeyAction {
        match key.code {
            KeyCode::Char(c) if !ctrl => {
                self.query.push(c);
                KeyAction::Engine(EngineEvent::InputChanged(self.query.clone()))
            }
            KeyCode::Backspace => match self.query.pop() {
                Some(_) => KeyAction::Engine(EngineEvent::InputChanged(self.query.clone())),
                None => KeyAction::None,
            },
            KeyCode::Enter => KeyAction::Engine(EngineEvent::Submit(self.query.clone())),
            KeyCode::Down => {
                self.toggle_focus();
                KeyAction::None
            }
            _ => KeyAction::None,
        }
    }

    fn results_key(&mut self, key: KeyEvent) -> KeyAction {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                if self.selected == 0 {
                    self.focus = Focus::Input;
                } else {
                    self.selected -= 1;
                }
                KeyAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.view.cards.len() {
                    self.selected += 1;
                }
                KeyAction::None
            }
            KeyCode::Enter | KeyCode::Char(' ') => match self.selected_card() {
                Some(card) => KeyAction::Engine(EngineEvent::Activate(card.track.id)),
                None => KeyAction::None,
            },
            KeyCode::Char('?') => {
                self.show_help = true;
                KeyAction::None
            }
            KeyCode::Char('/') => {
                self.focus = Focus::Input;
                KeyAction::None
            }
            _ => KeyAction::None,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input if !self.view.cards.is_empty() => Focus::Results,
            Focus::Input => Focus::Input,
            Focus::Results => Focus::Input,
        };
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.size();
        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            let message = format!(
                "Resize terminal to at least {MIN_WIDTH}x{MIN_HEIGHT} (current: {}x{})",
                area.width, area.height
            );
            let paragraph = Paragraph::new(message)
                .wrap(Wrap { trim: true })
                .block(Block::default().title("Sonar").borders(Borders::ALL));
            frame.render_widget(paragraph, area);
            return;
        }

        let player_height = if self.view.player.visible { 4 } else { 3 };
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(self.view.banners.len() as u16),
                Constraint::Min(3),
                Constraint::Length(player_height),
            ])
            .split(area);

        self.render_input(frame, layout[0]);
        self.render_banners(frame, layout[1]);
        self.render_results(frame, layout[2]);
        self.render_player(frame, layout[3]);

        if self.show_help {
            self.render_help(frame, area);
        }
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Input;
        let mut spans = vec![Span::raw(self.query.clone())];
        if focused {
            spans.push(Span::styled("▏", Style::default().fg(self.theme.title)));
        }
        let border = if focused {
            Style::default().fg(self.theme.title)
        } else {
            Style::default().fg(self.theme.muted)
        };
        let paragraph = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title("Search"),
        );
        frame.render_widget(paragraph, area);
    }

    fn render_banners(&self, frame: &mut Frame, area: Rect) {
        if self.view.banners.is_empty() {
            return;
        }
        let lines: Vec<Line> = self
            .view
            .banners
            .iter()
            .map(|banner| {
                let style = self.theme.banner(banner.kind == BannerKind::Search);
                Line::from(vec![
                    Span::styled(format!(" ! {}", banner.message), style),
                    Span::styled("  (Esc to dismiss)", Style::default().fg(self.theme.muted)),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(Text::from(lines)), area);
    }

    fn render_results(&self, frame: &mut Frame, area: Rect) {
        let title = match &self.view.status {
            SearchStatus::Loading { .. } => format!("Results ({}) searching…", self.view.cards.len()),
            _ if self.view.cards.is_empty() => "Results".to_string(),
            _ => format!("Results ({})", self.view.cards.len()),
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.view.cards.is_empty() {
            let message = match &self.view.status {
                SearchStatus::Empty => "Type to search for tracks.".to_string(),
                SearchStatus::Loading { query } => format!("Searching for \"{query}\"…"),
                SearchStatus::NoResults => "No tracks found.".to_string(),
                SearchStatus::Error { .. } | SearchStatus::Results => String::new(),
            };
            let paragraph = Paragraph::new(Span::styled(
                message,
                Style::default().fg(self.theme.muted),
            ))
            .block(block)
            .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = self
            .view
            .cards
            .iter()
            .map(|card| ListItem::new(self.card_line(card)))
            .collect();
        let mut list = List::new(items).block(block);
        if self.focus == Focus::Results {
            list = list.highlight_style(self.theme.selected());
        }
        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn card_line(&self, card: &CardView) -> Line<'static> {
        let (marker, marker_style) = if card.is_active_and_playing {
            ("▶ ", self.theme.playing_style())
        } else if card.is_active {
            ("‖ ", Style::default().fg(self.theme.playing))
        } else {
            ("  ", Style::default())
        };
        let muted = Style::default().fg(self.theme.muted);
        let mut spans = vec![
            Span::styled(marker, marker_style),
            Span::styled(
                card.track.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {} · {}  ", card.track.artist_name, card.track.album_title),
                muted,
            ),
            Span::raw(card.duration.clone()),
        ];
        if !card.track.has_preview() {
            spans.push(Span::styled(
                "  (no preview)",
                muted.add_modifier(Modifier::ITALIC),
            ));
        }
        Line::from(spans)
    }

    fn render_player(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Player");
        let PlayerBarView {
            track,
            is_playing,
            is_loading,
            ..
        } = &self.view.player;

        let Some(track) = track else {
            let idle = Paragraph::new(Span::styled(
                "Nothing playing",
                Style::default()
                    .fg(self.theme.muted)
                    .add_modifier(Modifier::DIM),
            ))
            .block(block);
            frame.render_widget(idle, area);
            return;
        };

        let state = if *is_loading {
            "…"
        } else if *is_playing {
            "▶"
        } else {
            "‖"
        };
        let now = Line::from(vec![
            Span::styled(format!("{state} "), self.theme.playing_style()),
            Span::styled(
                track.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" · {}", track.artist_name)),
        ]);
        let cover = Line::from(Span::styled(
            format!(
                "  cover: {}",
                track.cover_url.as_deref().unwrap_or("(none)")
            ),
            Style::default().fg(self.theme.muted),
        ));
        frame.render_widget(Paragraph::new(Text::from(vec![now, cover])).block(block), area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(HELP_WIDTH, HELP_HEIGHT, area);
        let help = Paragraph::new(self.help.text())
            .block(
                Block::default()
                    .title("Help (F1 or Esc to close)")
                    .borders(Borders::ALL),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(Clear, popup_area);
        frame.render_widget(help, popup_area);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projector::{card, player_bar, Banner};
    use ratatui::backend::TestBackend;
    use sonar_core::models::{NowPlaying, Track, TrackId};
    use sonar_player::PlaybackState;

    fn track(id: u64) -> Track {
        Track {
            id: TrackId(id),
            title: format!("track-{id}"),
            artist_name: format!("artist-{id}"),
            album_title: "album".into(),
            cover_url: Some(format!("https://img/{id}.jpg")),
            duration_seconds: 30,
            preview_url: Some(format!("https://cdn/{id}.mp3")),
        }
    }

    fn view(ids: &[u64], playback: &PlaybackState) -> View {
        View {
            status: if ids.is_empty() {
                SearchStatus::Empty
            } else {
                SearchStatus::Results
            },
            cards: ids.iter().map(|id| card(&track(*id), playback)).collect(),
            player: player_bar(playback),
            banners: Vec::new(),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).expect("terminal");
        terminal.draw(|frame| app.render(frame)).expect("draw");
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn typing_emits_input_changes() {
        let mut app = App::new(Theme::default(), view(&[], &PlaybackState::Idle));
        app.handle_key(key(KeyCode::Char('d')));
        let action = app.handle_key(key(KeyCode::Char('a')));
        assert!(matches!(action, KeyAction::Engine(EngineEvent::InputChanged(ref t)) if t == "da"));

        let action = app.handle_key(key(KeyCode::Backspace));
        assert!(matches!(action, KeyAction::Engine(EngineEvent::InputChanged(ref t)) if t == "d"));
        app.handle_key(key(KeyCode::Backspace));
        assert!(matches!(app.handle_key(key(KeyCode::Backspace)), KeyAction::None));
    }

    #[test]
    fn enter_in_input_submits() {
        let mut app = App::new(Theme::default(), view(&[], &PlaybackState::Idle));
        for c in "daft".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        let action = app.handle_key(key(KeyCode::Enter));
        assert!(matches!(action, KeyAction::Engine(EngineEvent::Submit(ref t)) if t == "daft"));
    }

    #[test]
    fn results_navigation_and_activation() {
        let mut app = App::new(Theme::default(), view(&[1, 2, 3], &PlaybackState::Idle));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.focus, Focus::Results);

        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.selected, 2);

        let action = app.handle_key(key(KeyCode::Enter));
        assert!(matches!(action, KeyAction::Engine(EngineEvent::Activate(TrackId(3)))));

        app.handle_key(key(KeyCode::Up));
        app.handle_key(key(KeyCode::Up));
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.focus, Focus::Input);
    }

    #[test]
    fn focus_stays_on_input_without_cards() {
        let mut app = App::new(Theme::default(), view(&[], &PlaybackState::Idle));
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Input);
    }

    #[test]
    fn sync_clamps_selection_and_resets_focus() {
        let mut app = App::new(Theme::default(), view(&[1, 2, 3], &PlaybackState::Idle));
        app.focus = Focus::Results;
        app.selected = 2;
        app.sync(view(&[1], &PlaybackState::Idle));
        assert_eq!(app.selected, 0);
        app.sync(view(&[], &PlaybackState::Idle));
        assert_eq!(app.focus, Focus::Input);
    }

    #[test]
    fn esc_dismisses_banner_before_quitting() {
        let mut v = view(&[1], &PlaybackState::Idle);
        v.banners.push(Banner {
            kind: BannerKind::Playback,
            message: "Unable to play this track.".into(),
        });
        let mut app = App::new(Theme::default(), v);
        assert!(matches!(
            app.handle_key(key(KeyCode::Esc)),
            KeyAction::Engine(EngineEvent::DismissNotice)
        ));

        app.sync(view(&[1], &PlaybackState::Idle));
        assert!(matches!(app.handle_key(key(KeyCode::Esc)), KeyAction::Quit));
    }

    #[test]
    fn control_keys() {
        let mut app = App::new(Theme::default(), view(&[1], &PlaybackState::Idle));
        assert!(matches!(
            app.handle_key(ctrl('p')),
            KeyAction::Engine(EngineEvent::TogglePlayPause)
        ));
        assert!(app.query.is_empty());
        assert!(matches!(app.handle_key(ctrl('c')), KeyAction::Quit));
    }

    #[test]
    fn help_overlay_swallows_keys() {
        let mut app = App::new(Theme::default(), view(&[1], &PlaybackState::Idle));
        app.handle_key(key(KeyCode::F(1)));
        assert!(app.show_help);
        assert!(matches!(app.handle_key(key(KeyCode::Char('x'))), KeyAction::None));
        assert!(app.query.is_empty());
        app.handle_key(key(KeyCode::Esc));
        assert!(!app.show_help);

        // '?' types into the search box but opens help from the results
        app.handle_key(key(KeyCode::Char('?')));
        assert_eq!(app.query, "?");
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Char('?')));
        assert!(app.show_help);
    }

    #[test]
    fn renders_cards_and_player_bar() {
        let playing = PlaybackState::Playing(NowPlaying::from(&track(2)));
        let app = App::new(Theme::default(), view(&[1, 2], &playing));
        let text = screen(&app);
        assert!(text.contains("track-1"));
        assert!(text.contains("▶ track-2"));
        assert!(text.contains("cover: https://img/2.jpg"));
    }

    #[test]
    fn renders_empty_state() {
        let app = App::new(Theme::default(), view(&[], &PlaybackState::Idle));
        let text = screen(&app);
        assert!(text.contains("Type to search for tracks."));
        assert!(text.contains("Nothing playing"));
    }
}
