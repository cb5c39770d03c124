use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};
use ratatui::Frame;

use crate::row::RowId;
use crate::ui::{contains, Theme};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Edit,
    Delete,
}

const MENU_ITEMS: &[(&str, MenuAction)] = &[("Edit", MenuAction::Edit), ("Delete", MenuAction::Delete)];
const MENU_WIDTH: u16 = 12;

#[derive(Debug, PartialEq, Eq)]
pub enum MenuOutcome {
    Continue,
    Closed,
    Chosen(MenuAction),
}

pub struct ContextMenu {
    row: RowId,
    anchor: (u16, u16),
    selected: usize,
}

impl ContextMenu {
    pub fn new(row: RowId, anchor: (u16, u16)) -> Self {
        Self {
            row,
            anchor,
            selected: 0,
        }
    }

    pub fn row(&self) -> RowId {
        self.row
    }

    /// Box at the anchor, shifted left or up to stay on screen.
    pub fn area(&self, screen: Rect) -> Rect {
        let width = MENU_WIDTH.min(screen.width);
        let height = (MENU_ITEMS.len() as u16 + 2).min(screen.height);
        let max_x = screen.x + screen.width.saturating_sub(width);
        let max_y = screen.y + screen.height.saturating_sub(height);
        Rect::new(
            self.anchor.0.clamp(screen.x, max_x),
            self.anchor.1.clamp(screen.y, max_y),
            width,
            height,
        )
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> MenuOutcome {
        match key.code {
            KeyCode::Esc => MenuOutcome::Closed,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                MenuOutcome::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(MENU_ITEMS.len() - 1);
                MenuOutcome::Continue
            }
            KeyCode::Enter => MenuOutcome::Chosen(MENU_ITEMS[self.selected].1),
            KeyCode::Char('e') => MenuOutcome::Chosen(MenuAction::Edit),
            KeyCode::Char('d') => MenuOutcome::Chosen(MenuAction::Delete),
            _ => MenuOutcome::Continue,
        }
    }

    /// A click inside picks the item under it; anywhere else closes.
    pub fn handle_click(&self, column: u16, row: u16, screen: Rect) -> MenuOutcome {
        let area = self.area(screen);
        if !contains(area, column, row) {
            return MenuOutcome::Closed;
        }
        let line = row.saturating_sub(area.y);
        if line == 0 {
            return MenuOutcome::Continue;
        }
        match MENU_ITEMS.get(usize::from(line - 1)) {
            Some((_, action)) => MenuOutcome::Chosen(*action),
            None => MenuOutcome::Continue,
        }
    }

    pub fn render(&self, frame: &mut Frame, screen: Rect, theme: &Theme) {
        let area = self.area(screen);
        frame.render_widget(Clear, area);
        let items: Vec<ListItem> = MENU_ITEMS
            .iter()
            .map(|(label, _)| ListItem::new(format!(" {label}")))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .style(Style::default().bg(theme.surface).fg(theme.text)),
            )
            .highlight_style(theme.highlight_style());
        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::SequenceGenerator;
    use crossterm::event::KeyModifiers;

    fn menu_at(anchor: (u16, u16)) -> ContextMenu {
        ContextMenu::new(SequenceGenerator::default().next_id(), anchor)
    }

    #[test]
    fn keys_choose_actions() {
        let mut menu = menu_at((0, 0));
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(menu.handle_key(enter), MenuOutcome::Chosen(MenuAction::Edit));
        menu.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        assert_eq!(menu.handle_key(enter), MenuOutcome::Chosen(MenuAction::Delete));
    }

    #[test]
    fn clicks_map_to_items_or_close() {
        let screen = Rect::new(0, 0, 80, 24);
        let menu = menu_at((10, 5));
        assert_eq!(menu.handle_click(12, 6, screen), MenuOutcome::Chosen(MenuAction::Edit));
        assert_eq!(menu.handle_click(12, 7, screen), MenuOutcome::Chosen(MenuAction::Delete));
        assert_eq!(menu.handle_click(40, 20, screen), MenuOutcome::Closed);
    }

    #[test]
    fn menu_is_kept_on_screen() {
        let screen = Rect::new(0, 0, 80, 24);
        let area = menu_at((79, 23)).area(screen);
        assert_eq!(area, Rect::new(68, 20, 12, 4));
    }
}
