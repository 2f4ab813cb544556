// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use stockcheck_app::{
    Manifest, Phase, Row, RowId, SessionCommand, SessionEvent, SessionState, format_quantity,
};
use time::OffsetDateTime;
use time::macros::format_description;

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const CURSOR_MARK: &str = "▏";
const SELECTED_MARK: &str = "›";

/// Side effects the session shell needs from its host.
pub trait SessionRuntime {
    /// Writes every row of `manifest` and returns where the file landed.
    fn export_manifest(&mut self, manifest: &Manifest) -> Result<PathBuf>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RemarkEditor {
    visible: bool,
    draft: String,
    row: Option<RowId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ViewData {
    store_cursor: usize,
    remark: RemarkEditor,
    help_visible: bool,
    status_token: u64,
    last_export: Option<PathBuf>,
}

pub fn run_app<R: SessionRuntime>(state: &mut SessionState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    sync_remark_draft(state, &mut view_data);
    if state.manifest().is_empty() {
        emit_status(
            state,
            &mut view_data,
            &internal_tx,
            "manifest has no product rows",
        );
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut SessionState,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                let _ = state.dispatch(SessionCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut SessionState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    let _ = state.dispatch(SessionCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: SessionRuntime>(
    state: &mut SessionState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('q') {
        return true;
    }
    if ctrl && key.code == KeyCode::Char('s') {
        export(state, runtime, view_data, internal_tx);
        return false;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.remark.visible {
        handle_remark_editor_key(state, view_data, internal_tx, key);
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => {
            view_data.help_visible = true;
            return false;
        }
        _ => {}
    }

    match state.phase() {
        Phase::SelectingStore => handle_store_list_key(state, view_data, internal_tx, key),
        Phase::Reviewing => handle_review_key(state, view_data, internal_tx, key),
        Phase::Complete => {
            if key.code == KeyCode::Char('b') {
                dispatch_and_sync(state, view_data, internal_tx, SessionCommand::BackToSelection);
            }
        }
    }
    false
}

fn handle_store_list_key(
    state: &mut SessionState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let store_count = state.manifest().stores().len();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if view_data.store_cursor + 1 < store_count {
                view_data.store_cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.store_cursor = view_data.store_cursor.saturating_sub(1);
        }
        KeyCode::Char('g') | KeyCode::Home => view_data.store_cursor = 0,
        KeyCode::Char('G') | KeyCode::End => {
            view_data.store_cursor = store_count.saturating_sub(1);
        }
        KeyCode::Enter => {
            let Some(store) = state
                .manifest()
                .stores()
                .get(view_data.store_cursor)
                .map(|store| (*store).to_owned())
            else {
                emit_status(state, view_data, internal_tx, "no stores to check");
                return;
            };
            dispatch_and_sync(
                state,
                view_data,
                internal_tx,
                SessionCommand::SelectStore(store),
            );
        }
        _ => {}
    }
}

fn handle_review_key(
    state: &mut SessionState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('c') => commit_draft(state, view_data, internal_tx),
        KeyCode::Char('r') => view_data.remark.visible = true,
        _ => {}
    }
}

fn handle_remark_editor_key(
    state: &mut SessionState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => view_data.remark.visible = false,
        KeyCode::Enter => {
            view_data.remark.visible = false;
            commit_draft(state, view_data, internal_tx);
        }
        KeyCode::Backspace => {
            view_data.remark.draft.pop();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.remark.draft.clear();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.remark.draft.push(ch);
        }
        _ => {}
    }
}

fn commit_draft(
    state: &mut SessionState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let text = view_data.remark.draft.clone();
    dispatch_and_sync(state, view_data, internal_tx, SessionCommand::CommitRemark(text));
}

fn dispatch_and_sync(
    state: &mut SessionState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: SessionCommand,
) {
    let events = match state.dispatch(command) {
        Ok(events) => events,
        Err(error) => {
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("remark not saved: {error}"),
            );
            return;
        }
    };
    sync_remark_draft(state, view_data);

    for event in events {
        match event {
            SessionEvent::StoreCompleted(store) => {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("all products checked for {store}"),
                );
            }
            SessionEvent::SelectionIgnored(store) => {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("store {store:?} is not in the manifest"),
                );
            }
            SessionEvent::SelectionReset => view_data.store_cursor = 0,
            _ => {}
        }
    }
}

/// Pre-fills the editor with the stored remark whenever the row under review changes.
fn sync_remark_draft(state: &SessionState, view_data: &mut ViewData) {
    let current = state.current_row().map(|row| row.id);
    if current == view_data.remark.row {
        return;
    }
    view_data.remark.row = current;
    view_data.remark.visible = false;
    view_data.remark.draft = state
        .current_row()
        .map(|row| row.remark.clone())
        .unwrap_or_default();
}

fn export<R: SessionRuntime>(
    state: &mut SessionState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match runtime.export_manifest(state.manifest()) {
        Ok(path) => {
            let message = format!(
                "exported {} rows to {} at {} UTC",
                state.manifest().len(),
                path.display(),
                export_timestamp(OffsetDateTime::now_utc())
            );
            view_data.last_export = Some(path);
            emit_status(state, view_data, internal_tx, message);
        }
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "export failed");
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("export failed: {error:#}"),
            );
        }
    }
}

fn export_timestamp(at: OffsetDateTime) -> String {
    at.format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

fn render(frame: &mut ratatui::Frame<'_>, state: &SessionState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(state))
        .block(Block::default().title("stockcheck").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let (title, body) = match state.phase() {
        Phase::SelectingStore => ("select a store", render_store_list_text(state, view_data)),
        Phase::Reviewing => ("product", render_review_text(state, view_data)),
        Phase::Complete => ("done", render_complete_text(state, view_data)),
    };
    let body = Paragraph::new(body)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(body, layout[1]);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if view_data.remark.visible {
        let area = centered_rect(70, 30, frame.area());
        frame.render_widget(Clear, area);
        let editor = Paragraph::new(format!("{}{CURSOR_MARK}", view_data.remark.draft))
            .wrap(Wrap { trim: false })
            .style(Style::default().add_modifier(Modifier::BOLD))
            .block(
                Block::default()
                    .title("remark · enter save & next · esc close")
                    .borders(Borders::ALL),
            );
        frame.render_widget(editor, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn header_text(state: &SessionState) -> String {
    let rows = state.manifest().len();
    match state.selected_store() {
        Some(store) => format!("{store} | {} | {rows} rows loaded", state.phase().label()),
        None => format!(
            "{} stores | {rows} rows loaded",
            state.manifest().stores().len()
        ),
    }
}

fn render_store_list_text(state: &SessionState, view_data: &ViewData) -> String {
    let manifest = state.manifest();
    let stores = manifest.stores();
    if stores.is_empty() {
        return "no stores found in the manifest".to_owned();
    }

    stores
        .iter()
        .enumerate()
        .map(|(index, store)| {
            let mark = if index == view_data.store_cursor {
                SELECTED_MARK
            } else {
                " "
            };
            let count = manifest.store_row_count(store);
            let noun = if count == 1 { "product" } else { "products" };
            format!("{mark} {store} ({count} {noun})")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_review_text(state: &SessionState, view_data: &ViewData) -> String {
    let (Some(row), Some(progress)) = (state.current_row(), state.progress()) else {
        return String::new();
    };

    let mut lines = vec![
        format!("Product: {}", row.product),
        format!("Planned Qty: {}", row.planned_qty),
        format!("Received Qty: {}{}", row.received_qty, gap_suffix(row)),
        format!("Rack Name: {}", row.rack_name),
        "Product Unit Tags:".to_owned(),
    ];
    if row.unit_tags.is_empty() {
        lines.push("  (none)".to_owned());
    } else {
        lines.extend(row.unit_tags.iter().map(|tag| format!("  • {tag}")));
    }

    lines.push(String::new());
    let remark = if view_data.remark.draft.is_empty() {
        "(none)"
    } else {
        view_data.remark.draft.as_str()
    };
    lines.push(format!("Remark: {remark}"));
    lines.push(String::new());
    lines.push(format!(
        "{} of {} products checked",
        progress.position, progress.total
    ));
    lines.join("\n")
}

fn gap_suffix(row: &Row) -> String {
    let Some(gap) = row.quantity_gap() else {
        return String::new();
    };
    if gap < 0.0 {
        format!(" (short {})", format_quantity(-gap))
    } else if gap > 0.0 {
        format!(" (over {})", format_quantity(gap))
    } else {
        String::new()
    }
}

fn render_complete_text(state: &SessionState, view_data: &ViewData) -> String {
    let store = state.selected_store().unwrap_or_default();
    let export_line = match &view_data.last_export {
        Some(path) => format!("last export: {}", path.display()),
        None => "not exported yet".to_owned(),
    };
    format!(
        "All products checked for {store}!\n{export_line}\n\nb: back to store selection | ctrl+s: export"
    )
}

fn status_text(state: &SessionState, view_data: &ViewData) -> String {
    let hints = if view_data.help_visible {
        "esc/? close help"
    } else if view_data.remark.visible {
        "type remark | enter save & next | ctrl+u clear | esc close"
    } else {
        match state.phase() {
            Phase::SelectingStore => "j/k move | enter check store | ctrl+s export | ? help | q quit",
            Phase::Reviewing => {
                "enter/c mark as correct & next | r remark | ctrl+s export | ? help | q quit"
            }
            Phase::Complete => "b back to stores | ctrl+s export | ? help | q quit",
        }
    };

    let mode = state.phase().label().to_uppercase();
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+s export every store | ctrl+q quit | ? help\n\
stores: j/k or up/down move | g/G first/last | enter start checking\n\
review: enter or c mark as correct & next | r edit remark\n\
remark: type text | enter save remark & next | ctrl+u clear | esc close (keeps draft)\n\
done: b back to store selection\n\
quit: q"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        InternalEvent, SessionRuntime, ViewData, export_timestamp, handle_key_event,
        help_overlay_text, process_internal_events, render_complete_text, render_review_text,
        render_store_list_text, status_text, sync_remark_draft,
    };
    use anyhow::{Result, anyhow};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::path::PathBuf;
    use std::sync::mpsc;
    use stockcheck_app::{Manifest, NewRow, Phase, Quantity, RowId, SessionState};
    use stockcheck_testkit::{product_row, sample_manifest};
    use time::macros::datetime;

    #[derive(Debug, Default)]
    struct TestRuntime {
        exported: Vec<Manifest>,
        fail_export: bool,
        export_path: Option<PathBuf>,
    }

    impl SessionRuntime for TestRuntime {
        fn export_manifest(&mut self, manifest: &Manifest) -> Result<PathBuf> {
            if self.fail_export {
                return Err(anyhow!("disk full"));
            }
            self.exported.push(manifest.clone());
            Ok(self
                .export_path
                .clone()
                .unwrap_or_else(|| PathBuf::from("/tmp/checked_products.xlsx")))
        }
    }

    struct Harness {
        state: SessionState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: mpsc::Sender<InternalEvent>,
        rx: mpsc::Receiver<InternalEvent>,
    }

    impl Harness {
        fn new() -> Self {
            let (tx, rx) = mpsc::channel();
            let state = SessionState::new(sample_manifest());
            let mut view_data = view_data_for_test();
            sync_remark_draft(&state, &mut view_data);
            Self {
                state,
                runtime: TestRuntime::default(),
                view_data,
                tx,
                rx,
            }
        }

        fn press(&mut self, code: KeyCode) -> bool {
            self.press_with(code, KeyModifiers::NONE)
        }

        fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, modifiers),
            )
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        fn remark_of(&self, id: usize) -> String {
            self.state
                .manifest()
                .row(RowId::new(id))
                .map(|row| row.remark.clone())
                .unwrap_or_default()
        }
    }

    fn view_data_for_test() -> ViewData {
        ViewData::default()
    }

    #[test]
    fn store_list_navigation_clamps_to_bounds() {
        let mut harness = Harness::new();
        harness.press(KeyCode::Char('k'));
        assert_eq!(harness.view_data.store_cursor, 0);

        harness.press(KeyCode::Down);
        harness.press(KeyCode::Char('j'));
        assert_eq!(harness.view_data.store_cursor, 1);

        harness.press(KeyCode::Char('g'));
        assert_eq!(harness.view_data.store_cursor, 0);
        harness.press(KeyCode::Char('G'));
        assert_eq!(harness.view_data.store_cursor, 1);
    }

    #[test]
    fn enter_on_store_list_starts_review() {
        let mut harness = Harness::new();
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Enter);

        assert_eq!(harness.state.selected_store(), Some("B"));
        assert_eq!(harness.state.phase(), Phase::Reviewing);
    }

    #[test]
    fn mark_correct_keeps_existing_remark() {
        let mut harness = Harness::new();
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('c'));

        assert_eq!(harness.view_data.remark.draft, "label torn");
        harness.press(KeyCode::Enter);

        assert_eq!(harness.remark_of(0), "");
        assert_eq!(harness.remark_of(1), "label torn");
        assert_eq!(harness.state.phase(), Phase::Complete);
    }

    #[test]
    fn remark_editor_saves_and_advances() {
        let mut harness = Harness::new();
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('r'));
        assert!(harness.view_data.remark.visible);

        harness.type_text("2 dented");
        harness.press(KeyCode::Backspace);
        harness.type_text("d");
        harness.press(KeyCode::Enter);

        assert!(!harness.view_data.remark.visible);
        assert_eq!(harness.remark_of(0), "2 dented");
        assert_eq!(harness.state.cursor(), 1);
        assert_eq!(harness.view_data.remark.draft, "label torn");
    }

    #[test]
    fn typing_q_in_editor_does_not_quit() {
        let mut harness = Harness::new();
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('r'));

        assert!(!harness.press(KeyCode::Char('q')));
        assert_eq!(harness.view_data.remark.draft, "q");
    }

    #[test]
    fn escape_closes_editor_and_keeps_draft() {
        let mut harness = Harness::new();
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('r'));
        harness.type_text("check later");
        harness.press(KeyCode::Esc);

        assert!(!harness.view_data.remark.visible);
        assert_eq!(harness.view_data.remark.draft, "check later");
        assert_eq!(harness.remark_of(0), "");

        harness.press(KeyCode::Enter);
        assert_eq!(harness.remark_of(0), "check later");
    }

    #[test]
    fn ctrl_u_clears_existing_remark() {
        let mut harness = Harness::new();
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('r'));
        harness.press_with(KeyCode::Char('u'), KeyModifiers::CONTROL);
        harness.press(KeyCode::Enter);

        assert_eq!(harness.remark_of(1), "");
    }

    #[test]
    fn completion_sets_status_and_back_returns_to_stores() {
        let mut harness = Harness::new();
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Enter);

        assert_eq!(harness.state.phase(), Phase::Complete);
        assert_eq!(
            harness.state.status_line.as_deref(),
            Some("all products checked for B")
        );

        harness.press(KeyCode::Char('b'));
        assert_eq!(harness.state.phase(), Phase::SelectingStore);
        assert_eq!(harness.view_data.store_cursor, 0);
    }

    #[test]
    fn back_key_is_ignored_while_reviewing() {
        let mut harness = Harness::new();
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('b'));
        assert_eq!(harness.state.phase(), Phase::Reviewing);
    }

    #[test]
    fn ctrl_s_exports_in_every_phase() {
        let mut harness = Harness::new();
        harness.press_with(KeyCode::Char('s'), KeyModifiers::CONTROL);
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('r'));
        harness.type_text("ok");
        harness.press_with(KeyCode::Char('s'), KeyModifiers::CONTROL);

        assert_eq!(harness.runtime.exported.len(), 2);
        assert!(harness.view_data.remark.visible);
        assert_eq!(
            harness.view_data.last_export,
            Some(PathBuf::from("/tmp/checked_products.xlsx"))
        );
        let status = harness.state.status_line.clone().unwrap_or_default();
        assert!(status.starts_with("exported 3 rows to /tmp/checked_products.xlsx"));
    }

    #[test]
    fn failed_export_reports_error() {
        let mut harness = Harness::new();
        harness.runtime.fail_export = true;
        harness.press_with(KeyCode::Char('s'), KeyModifiers::CONTROL);

        assert_eq!(
            harness.state.status_line.as_deref(),
            Some("export failed: disk full")
        );
        assert_eq!(harness.view_data.last_export, None);
    }

    #[test]
    fn quit_keys_end_the_session() {
        let mut harness = Harness::new();
        assert!(harness.press(KeyCode::Char('q')));
        assert!(harness.press_with(KeyCode::Char('q'), KeyModifiers::CONTROL));
    }

    #[test]
    fn help_overlay_swallows_keys_until_closed() {
        let mut harness = Harness::new();
        harness.press(KeyCode::Char('?'));
        assert!(harness.view_data.help_visible);

        assert!(!harness.press(KeyCode::Char('q')));
        harness.press(KeyCode::Enter);
        assert_eq!(harness.state.phase(), Phase::SelectingStore);

        harness.press(KeyCode::Esc);
        assert!(!harness.view_data.help_visible);
    }

    #[test]
    fn stale_clear_status_token_is_ignored() {
        let mut harness = Harness::new();
        harness.press_with(KeyCode::Char('s'), KeyModifiers::CONTROL);
        let token = harness.view_data.status_token;

        harness
            .tx
            .send(InternalEvent::ClearStatus { token: token - 1 })
            .ok();
        process_internal_events(&mut harness.state, &harness.view_data, &harness.rx);
        assert!(harness.state.status_line.is_some());

        harness.tx.send(InternalEvent::ClearStatus { token }).ok();
        process_internal_events(&mut harness.state, &harness.view_data, &harness.rx);
        assert!(harness.state.status_line.is_none());
    }

    #[test]
    fn review_text_shows_card_and_progress() {
        let mut harness = Harness::new();
        harness.press(KeyCode::Enter);
        let text = render_review_text(&harness.state, &harness.view_data);

        assert!(text.contains("Product: Rolled Oats 1kg"));
        assert!(text.contains("Planned Qty: 12"));
        assert!(text.contains("Rack Name: Dry-04"));
        assert!(text.contains("  • red\n  • blue\n  • green"));
        assert!(text.contains("Remark: (none)"));
        assert!(text.ends_with("1 of 2 products checked"));

        harness.press(KeyCode::Enter);
        let text = render_review_text(&harness.state, &harness.view_data);
        assert!(text.contains("Received Qty: 5 (short 1)"));
        assert!(text.contains("Remark: label torn"));
        assert!(text.ends_with("2 of 2 products checked"));
    }

    #[test]
    fn review_text_shows_dash_for_uncounted_quantity() {
        let mut harness = Harness::new();
        harness.state = SessionState::new(Manifest::from_rows([NewRow {
            received_qty: Quantity::Blank,
            ..product_row("C", "Flour 1kg", 5.0, 0.0)
        }]));
        harness.press(KeyCode::Enter);

        let text = render_review_text(&harness.state, &harness.view_data);
        assert!(text.contains("Planned Qty: 5\n"));
        assert!(text.contains("Received Qty: -\n"));
    }

    #[test]
    fn store_list_marks_cursor_and_counts() {
        let harness = Harness::new();
        let text = render_store_list_text(&harness.state, &harness.view_data);
        assert_eq!(text, "› A (2 products)\n  B (1 product)");
    }

    #[test]
    fn complete_text_names_store() {
        let mut harness = Harness::new();
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Enter);
        let text = render_complete_text(&harness.state, &harness.view_data);
        assert!(text.starts_with("All products checked for B!"));
        assert!(text.contains("not exported yet"));

        harness.runtime.export_path = Some(PathBuf::from("/srv/audit/week12.xlsx"));
        harness.press_with(KeyCode::Char('s'), KeyModifiers::CONTROL);
        let text = render_complete_text(&harness.state, &harness.view_data);
        assert!(text.contains("last export: /srv/audit/week12.xlsx"));
        assert!(!text.contains("not exported yet"));
    }

    #[test]
    fn status_text_follows_phase_and_overlays() {
        let mut harness = Harness::new();
        assert!(status_text(&harness.state, &harness.view_data).starts_with("SELECT STORE | "));

        harness.press(KeyCode::Enter);
        assert!(
            status_text(&harness.state, &harness.view_data).contains("mark as correct & next")
        );

        harness.press(KeyCode::Char('r'));
        assert!(status_text(&harness.state, &harness.view_data).contains("enter save & next"));
    }

    #[test]
    fn help_lists_remark_and_export_keys() {
        let help = help_overlay_text();
        assert!(help.contains("save remark & next"));
        assert!(help.contains("ctrl+s export"));
    }

    #[test]
    fn export_timestamp_is_clock_time() {
        assert_eq!(export_timestamp(datetime!(2026-03-01 14:05:09 UTC)), "14:05:09");
    }
}
