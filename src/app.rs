use std::collections::VecDeque;
use std::time::Instant;

use anyhow::Result;
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Alignment, Margin};
use ratatui::prelude::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{debug, info, warn};

use crate::config::{DOUBLE_CLICK_WINDOW, PANEL_MAX_PERCENT, PANEL_MIN_PERCENT, PANEL_STEP};
use crate::context_menu::{ContextMenu, MenuAction, MenuOutcome};
use crate::edit_form::{EditForm, FormOutcome};
use crate::entry::LauncherEntry;
use crate::file_chooser::{ChooserOutcome, FileChooser};
use crate::launch::{Launch, ProcessLauncher};
use crate::list::LauncherList;
use crate::row::{LaunchOutcome, LauncherRow, RowId};
use crate::settings::{Geometry, SettingsStore, ViewState, WindowSettings};
use crate::ui::{
    centered_rect, contains, fit_width, materialize_form_lines, popup_content_margin,
    screen_sections, shortcut_line, Theme,
};

const LAUNCH_LABEL: &str = "[ Launch ]";
const ADD_LABEL: &str = "[ + Add ]";
const UNNAMED: &str = "(unnamed)";

const MAIN_SHORTCUTS: &[(&str, &str)] = &[
    ("↵", "Launch"),
    ("a", "Add"),
    ("m", "Menu"),
    ("e", "Edit"),
    ("d", "Delete"),
    ("+/-", "Resize"),
    ("q", "Quit"),
];
const FORM_SHORTCUTS: &[(&str, &str)] = &[
    ("Tab", "Next"),
    ("↵", "Select / OK"),
    ("Del", "Clear"),
    ("Esc", "Cancel"),
];
const CHOOSER_SHORTCUTS: &[(&str, &str)] = &[
    ("↑/↓", "Move"),
    ("↵", "Open / Pick"),
    ("⌫", "Parent"),
    ("Esc", "Back"),
];

struct EditSession {
    row: RowId,
    mode_label: &'static str,
    form: EditForm,
}

enum PopupState {
    Message { title: String, body: String },
    ContextMenu(ContextMenu),
    EditForm(EditSession),
    Browse {
        session: EditSession,
        chooser: FileChooser,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Hit {
    Row { id: RowId, on_launch: bool },
    Add,
    Nothing,
}

impl Hit {
    fn row(self) -> Option<RowId> {
        match self {
            Hit::Row { id, .. } => Some(id),
            Hit::Add | Hit::Nothing => None,
        }
    }
}

pub struct App<L: Launch = ProcessLauncher> {
    list: LauncherList,
    launcher: L,
    store: SettingsStore,
    theme: Theme,
    title: String,
    geometry: Geometry,
    /// `0..=len`; `len` is the Add control.
    selected: usize,
    popup: Option<PopupState>,
    pending_setup: VecDeque<RowId>,
    hovered: Option<RowId>,
    last_click: Option<(RowId, Instant)>,
    viewport: Rect,
    status_message: Option<String>,
    pub should_quit: bool,
}

impl<L: Launch> App<L> {
    pub fn new(store: SettingsStore, launcher: L) -> Result<Self> {
        let settings = store.load()?;
        let mut app = Self {
            list: LauncherList::new(),
            launcher,
            store,
            theme: Theme::default(),
            title: "Program Launcher".to_string(),
            geometry: settings.window.geometry.unwrap_or_default(),
            selected: 0,
            popup: None,
            pending_setup: VecDeque::new(),
            hovered: None,
            last_click: None,
            viewport: Rect::new(0, 0, 80, 24),
            status_message: None,
            should_quit: false,
        };
        for entry in settings.entries {
            app.add_row(entry);
        }
        if let Some(state) = settings.window.state {
            app.selected = state.selected.min(app.list.len());
        }
        app.open_pending_setup();
        Ok(app)
    }

    pub fn set_viewport(&mut self, area: Rect) {
        self.viewport = area;
    }

    /// Housekeeping run once per event-loop iteration.
    pub fn tick(&self) {
        self.launcher.reap_finished();
    }

    pub fn window_settings(&self) -> WindowSettings {
        WindowSettings {
            geometry: Some(self.geometry),
            state: Some(ViewState {
                selected: self.selected,
            }),
        }
    }

    pub fn save_settings(&self) -> Result<()> {
        self.store
            .save(&self.list.entries(), &self.window_settings())
    }

    fn add_row(&mut self, entry: LauncherEntry) -> RowId {
        let needs_setup = entry.needs_setup();
        let id = self.list.add(entry);
        if needs_setup {
            self.pending_setup.push_back(id);
        }
        id
    }

    fn add_new_row(&mut self) {
        let id = self.add_row(LauncherEntry::default());
        if let Some(index) = self.list.position(id) {
            self.select(index);
        }
        self.set_status(Some("Item added".into()));
    }

    /// Opens the next queued form once nothing else is on screen.
    fn open_pending_setup(&mut self) {
        if self.popup.is_some() {
            return;
        }
        while let Some(id) = self.pending_setup.pop_front() {
            if let Some(popup) = self.edit_popup(id) {
                self.popup = Some(popup);
                return;
            }
        }
    }

    fn edit_popup(&self, id: RowId) -> Option<PopupState> {
        let row = self.list.row(id)?;
        let mode_label = if row.needs_setup() {
            "New Item"
        } else {
            "Edit Item"
        };
        Some(PopupState::EditForm(EditSession {
            row: id,
            mode_label,
            form: row.edit_form(),
        }))
    }

    fn selected_row_id(&self) -> Option<RowId> {
        self.list.get(self.selected).map(LauncherRow::id)
    }

    fn select(&mut self, index: usize) {
        let index = index.min(self.list.len());
        if index == self.selected {
            return;
        }
        if let Some(row) = self
            .selected_row_id()
            .and_then(|id| self.list.row_mut(id))
        {
            row.pointer_left();
        }
        self.selected = index;
    }

    fn select_row(&mut self, id: RowId) {
        if let Some(index) = self.list.position(id) {
            self.select(index);
        }
    }

    fn move_selection_up(&mut self) {
        let total = self.list.len() + 1;
        let index = if self.selected == 0 {
            total - 1
        } else {
            self.selected - 1
        };
        self.select(index);
    }

    fn move_selection_down(&mut self) {
        let total = self.list.len() + 1;
        self.select((self.selected + 1) % total);
    }

    fn activate_selected(&mut self) {
        match self.selected_row_id() {
            Some(id) => self.launch_row(id),
            None => self.add_new_row(),
        }
    }

    fn launch_row(&mut self, id: RowId) {
        let Some(row) = self.list.row_mut(id) else {
            return;
        };
        let alias = display_alias(row).to_string();
        match row.launch(&self.launcher) {
            LaunchOutcome::Ignored => {}
            LaunchOutcome::Started => self.set_status(Some(format!("Launched {alias}"))),
            LaunchOutcome::Failed(err) => {
                warn!(row = %id, %err, "launch failed");
                self.set_status(Some(format!("Could not launch {alias}")));
                self.popup = Some(PopupState::Message {
                    title: "Error".into(),
                    body: err.to_string(),
                });
            }
        }
    }

    fn apply_edit(&mut self, id: RowId, entry: LauncherEntry) {
        if let Some(row) = self.list.row_mut(id) {
            row.apply_edit(entry);
            self.set_status(Some("Item saved".into()));
        }
    }

    fn delete_row(&mut self, id: RowId) {
        let Some(row) = self.list.row_mut(id) else {
            return;
        };
        let alias = display_alias(row).to_string();
        row.request_delete();
        if self.list.process_deletions() > 0 {
            self.set_status(Some(format!("Deleted {alias}")));
        }
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        self.pending_setup.retain(|pending| *pending != id);
        self.selected = self.selected.min(self.list.len());
    }

    fn open_context_menu(&mut self, id: RowId, anchor: (u16, u16)) {
        self.select_row(id);
        self.last_click = None;
        self.popup = Some(PopupState::ContextMenu(ContextMenu::new(id, anchor)));
    }

    /// Below the selected row's label, for menus opened from the keyboard.
    fn keyboard_menu_anchor(&self) -> (u16, u16) {
        let area = self.list_region(self.viewport);
        let visible = self.selected - self.scroll_offset(area.height);
        let row_y = area.y.saturating_add(visible as u16);
        (area.x.saturating_add(2), row_y.saturating_add(1))
    }

    fn resize_panel(&mut self, grow: bool) {
        let step = |value: u16| {
            if grow {
                value.saturating_add(PANEL_STEP).min(PANEL_MAX_PERCENT)
            } else {
                value.saturating_sub(PANEL_STEP).max(PANEL_MIN_PERCENT)
            }
        };
        self.geometry = Geometry {
            width_percent: step(self.geometry.width_percent),
            height_percent: step(self.geometry.height_percent),
        };
        debug!(
            width = self.geometry.width_percent,
            height = self.geometry.height_percent,
            "panel resized"
        );
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if let Some(popup) = self.popup.take() {
            self.last_click = None;
            self.popup = self.handle_popup_key(popup, key);
            self.open_pending_setup();
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.move_selection_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection_down(),
            KeyCode::Enter => self.activate_selected(),
            KeyCode::Char('a') => self.add_new_row(),
            KeyCode::Char('m') => {
                if let Some(id) = self.selected_row_id() {
                    let anchor = self.keyboard_menu_anchor();
                    self.open_context_menu(id, anchor);
                }
            }
            KeyCode::Char('e') => {
                if let Some(id) = self.selected_row_id() {
                    self.popup = self.edit_popup(id);
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_row_id() {
                    self.delete_row(id);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.resize_panel(true),
            KeyCode::Char('-') => self.resize_panel(false),
            _ => {}
        }
        self.open_pending_setup();
    }

    fn handle_popup_key(&mut self, popup: PopupState, key: KeyEvent) -> Option<PopupState> {
        match popup {
            PopupState::Message { title, body } => match key.code {
                KeyCode::Esc | KeyCode::Enter => None,
                _ => Some(PopupState::Message { title, body }),
            },
            PopupState::ContextMenu(mut menu) => match menu.handle_key(key) {
                MenuOutcome::Continue => Some(PopupState::ContextMenu(menu)),
                MenuOutcome::Closed => None,
                MenuOutcome::Chosen(action) => self.apply_menu_action(menu.row(), action),
            },
            PopupState::EditForm(mut session) => match session.form.handle_key(key) {
                FormOutcome::Continue => Some(PopupState::EditForm(session)),
                FormOutcome::Browse(start) => {
                    let chooser = FileChooser::open(&start);
                    Some(PopupState::Browse { session, chooser })
                }
                FormOutcome::Confirmed(entry) => {
                    self.apply_edit(session.row, entry);
                    None
                }
                FormOutcome::Cancelled => {
                    self.set_status(Some("Edit cancelled".into()));
                    None
                }
            },
            PopupState::Browse {
                mut session,
                mut chooser,
            } => match chooser.handle_key(key) {
                ChooserOutcome::Continue => Some(PopupState::Browse { session, chooser }),
                ChooserOutcome::Picked(path) => {
                    session.form.set_executable(path.to_string_lossy());
                    Some(PopupState::EditForm(session))
                }
                ChooserOutcome::Cancelled => Some(PopupState::EditForm(session)),
            },
        }
    }

    fn apply_menu_action(&mut self, id: RowId, action: MenuAction) -> Option<PopupState> {
        match action {
            MenuAction::Edit => self.edit_popup(id),
            MenuAction::Delete => {
                self.delete_row(id);
                None
            }
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, terminal_area: Rect) {
        self.viewport = terminal_area;
        let hit = self.hit_test(mouse.column, mouse.row, terminal_area);
        self.track_pointer(hit.row());

        if let Some(popup) = self.popup.take() {
            self.last_click = None;
            self.popup = self.handle_popup_mouse(popup, mouse, terminal_area);
            self.open_pending_setup();
            return;
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.handle_primary_click(hit),
            MouseEventKind::Down(MouseButton::Right) => {
                if let Hit::Row { id, .. } = hit {
                    self.open_context_menu(id, (mouse.column, mouse.row));
                }
            }
            MouseEventKind::ScrollUp => self.move_selection_up(),
            MouseEventKind::ScrollDown => self.move_selection_down(),
            _ => {}
        }
        self.open_pending_setup();
    }

    /// Re-enables the row the pointer just left.
    fn track_pointer(&mut self, target: Option<RowId>) {
        if self.hovered == target {
            return;
        }
        if let Some(row) = self.hovered.and_then(|id| self.list.row_mut(id)) {
            row.pointer_left();
        }
        self.hovered = target;
    }

    fn handle_primary_click(&mut self, hit: Hit) {
        match hit {
            Hit::Row { id, on_launch: true } => {
                self.select_row(id);
                self.last_click = None;
                self.launch_row(id);
            }
            Hit::Row { id, .. } => {
                self.select_row(id);
                let now = Instant::now();
                let double = matches!(
                    self.last_click,
                    Some((last, at)) if last == id && now.duration_since(at) <= DOUBLE_CLICK_WINDOW
                );
                self.last_click = if double { None } else { Some((id, now)) };
                if double {
                    self.launch_row(id);
                }
            }
            Hit::Add => {
                self.last_click = None;
                self.add_new_row();
            }
            Hit::Nothing => self.last_click = None,
        }
    }

    fn handle_popup_mouse(
        &mut self,
        popup: PopupState,
        mouse: MouseEvent,
        terminal_area: Rect,
    ) -> Option<PopupState> {
        let MouseEventKind::Down(button) = mouse.kind else {
            return Some(popup);
        };
        match popup {
            PopupState::ContextMenu(menu) => {
                match menu.handle_click(mouse.column, mouse.row, terminal_area) {
                    MenuOutcome::Continue => Some(PopupState::ContextMenu(menu)),
                    MenuOutcome::Closed => None,
                    MenuOutcome::Chosen(action) => self.apply_menu_action(menu.row(), action),
                }
            }
            PopupState::Message { .. } if button == MouseButton::Left => None,
            other => Some(other),
        }
    }

    fn list_region(&self, terminal_area: Rect) -> Rect {
        let [_, _, content, _] = screen_sections(terminal_area);
        centered_rect(
            content,
            self.geometry.width_percent,
            self.geometry.height_percent,
        )
        .inner(&Margin {
            vertical: 1,
            horizontal: 1,
        })
    }

    /// First visible line, keeping the selection on screen.
    fn scroll_offset(&self, height: u16) -> usize {
        let height = usize::from(height.max(1));
        (self.selected + 1).saturating_sub(height)
    }

    /// Rows under a popup are out of reach.
    fn hit_test(&self, column: u16, row: u16, terminal_area: Rect) -> Hit {
        if self.popup.is_some() {
            return Hit::Nothing;
        }
        let area = self.list_region(terminal_area);
        if !contains(area, column, row) {
            return Hit::Nothing;
        }
        let index = self.scroll_offset(area.height) + usize::from(row - area.y);
        match self.list.get(index) {
            Some(launcher_row) => {
                let launch_x = area.x + area.width.saturating_sub(LAUNCH_LABEL.len() as u16);
                Hit::Row {
                    id: launcher_row.id(),
                    on_launch: column >= launch_x,
                }
            }
            None if index == self.list.len() => Hit::Add,
            None => Hit::Nothing,
        }
    }

    fn set_status(&mut self, message: Option<String>) {
        if let Some(msg) = &message {
            info!(status = %msg);
        }
        self.status_message = message;
    }

    fn status_text(&self) -> String {
        let total = self.list.len();
        let mut text = if self.list.is_empty() {
            "No items yet".to_string()
        } else if self.selected < total {
            format!("Item {}/{}", self.selected + 1, total)
        } else {
            format!("{total} items")
        };
        if let Some(msg) = &self.status_message {
            text.push_str(" | ");
            text.push_str(msg);
        }
        text
    }

    pub fn render(&self, frame: &mut Frame) {
        let size = frame.size();
        frame.render_widget(
            Block::default().style(Style::default().bg(self.theme.background)),
            size,
        );
        let [header_area, shortcuts_area, content_area, status_area] = screen_sections(size);

        let header = Paragraph::new(self.title.clone())
            .alignment(Alignment::Center)
            .style(self.theme.bar_style());
        frame.render_widget(header, header_area);

        let shortcuts = Paragraph::new(shortcut_line(MAIN_SHORTCUTS, &self.theme))
            .alignment(Alignment::Center)
            .style(Style::default().bg(self.theme.highlight));
        frame.render_widget(shortcuts, shortcuts_area);

        self.render_list(frame, content_area);

        let status = Paragraph::new(self.status_text())
            .alignment(Alignment::Center)
            .style(self.theme.bar_style());
        frame.render_widget(status, status_area);

        if let Some(popup) = &self.popup {
            self.render_popup(frame, popup);
        }
    }

    fn render_list(&self, frame: &mut Frame, content_area: Rect) {
        let panel = centered_rect(
            content_area,
            self.geometry.width_percent,
            self.geometry.height_percent,
        );
        frame.render_widget(
            Block::default()
                .title(" Launcher Items ")
                .borders(Borders::ALL)
                .style(Style::default().bg(self.theme.surface).fg(self.theme.text)),
            panel,
        );
        let area = self.list_region(frame.size());
        if area.width == 0 || area.height == 0 {
            return;
        }
        let width = usize::from(area.width);
        let mut lines: Vec<Line<'static>> = self
            .list
            .iter()
            .enumerate()
            .map(|(index, row)| self.row_line(row, index == self.selected, width))
            .collect();
        lines.push(self.add_line(self.selected == self.list.len(), width));

        let visible: Vec<Line<'static>> = lines
            .into_iter()
            .skip(self.scroll_offset(area.height))
            .take(usize::from(area.height))
            .collect();
        frame.render_widget(Paragraph::new(visible), area);
    }

    fn row_line(&self, row: &LauncherRow, selected: bool, width: usize) -> Line<'static> {
        let label_width = width.saturating_sub(LAUNCH_LABEL.len() + 1);
        let label = fit_width(&format!("➜ {}", display_alias(row)), label_width);
        let (label_style, launch_style) = if selected {
            (self.theme.highlight_style(), self.theme.highlight_style())
        } else if !row.is_enabled() {
            let dim = Style::default()
                .fg(self.theme.muted)
                .add_modifier(Modifier::DIM);
            (dim, dim)
        } else {
            (Style::default().fg(self.theme.text), self.theme.key_style())
        };
        Line::from(vec![
            Span::styled(label, label_style),
            Span::styled(" ", label_style),
            Span::styled(LAUNCH_LABEL, launch_style),
        ])
    }

    fn add_line(&self, selected: bool, width: usize) -> Line<'static> {
        let style = if selected {
            self.theme.highlight_style()
        } else {
            self.theme.key_style()
        };
        Line::from(vec![Span::styled(fit_width(ADD_LABEL, width), style)])
    }

    fn render_popup(&self, frame: &mut Frame, popup: &PopupState) {
        match popup {
            PopupState::Message { title, body } => {
                let area = centered_rect(frame.size(), 50, 30);
                frame.render_widget(Clear, area);
                let block = Paragraph::new(format!("{body}\n\nPress Enter or Esc to close."))
                    .wrap(Wrap { trim: true })
                    .style(Style::default().bg(self.theme.surface).fg(self.theme.text))
                    .block(
                        Block::default()
                            .title(format!(" {title} "))
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(self.theme.error))
                            .style(Style::default().bg(self.theme.surface)),
                    );
                frame.render_widget(block, area);
            }
            PopupState::ContextMenu(menu) => {
                let size = frame.size();
                menu.render(frame, size, &self.theme);
            }
            PopupState::EditForm(session) => {
                self.render_edit_form(frame, session, FORM_SHORTCUTS);
            }
            PopupState::Browse { session, chooser } => {
                self.render_edit_form(frame, session, CHOOSER_SHORTCUTS);
                let area = centered_rect(frame.size(), 70, 70);
                chooser.render(frame, area, &self.theme);
            }
        }
    }

    fn render_edit_form(
        &self,
        frame: &mut Frame,
        session: &EditSession,
        hints: &[(&str, &str)],
    ) {
        let area = frame.size();
        frame.render_widget(Clear, area);
        frame.render_widget(
            Block::default().style(Style::default().bg(self.theme.background)),
            area,
        );
        let [header_area, shortcuts_area, content_area, status_area] = screen_sections(area);

        let header = Paragraph::new(format!("{} - {}", self.title, session.mode_label))
            .alignment(Alignment::Center)
            .style(self.theme.bar_style());
        frame.render_widget(header, header_area);

        let shortcuts = Paragraph::new(shortcut_line(hints, &self.theme))
            .alignment(Alignment::Center)
            .style(
                Style::default()
                    .bg(self.theme.highlight)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(shortcuts, shortcuts_area);

        frame.render_widget(
            Block::default().style(Style::default().bg(self.theme.surface)),
            content_area,
        );
        let inner = content_area.inner(&popup_content_margin());
        let lines = session.form.render_lines(&self.theme);
        let rendered = materialize_form_lines(&lines, usize::from(inner.width), &self.theme);
        let paragraph = Paragraph::new(rendered)
            .wrap(Wrap { trim: false })
            .style(Style::default().bg(self.theme.surface).fg(self.theme.text));
        frame.render_widget(paragraph, inner);

        let status = Paragraph::new(self.status_text())
            .alignment(Alignment::Center)
            .style(self.theme.bar_style());
        frame.render_widget(status, status_area);
    }
}

fn display_alias(row: &LauncherRow) -> &str {
    if row.alias().is_empty() {
        UNNAMED
    } else {
        row.alias()
    }
}
