//! In-terminal stand-in for the native "pick executable" dialog.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};
use ratatui::Frame;

use crate::path_validator::Platform;
use crate::ui::Theme;

#[derive(Debug, Clone)]
struct FileEntry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutableFilter {
    Any,
    WindowsExe,
}

impl ExecutableFilter {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Windows => ExecutableFilter::WindowsExe,
            Platform::MacOs | Platform::Linux => ExecutableFilter::Any,
        }
    }

    fn accepts(self, path: &Path) -> bool {
        match self {
            ExecutableFilter::Any => true,
            ExecutableFilter::WindowsExe => path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("exe"))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ChooserOutcome {
    Continue,
    Picked(PathBuf),
    Cancelled,
}

pub struct FileChooser {
    current_dir: PathBuf,
    entries: Vec<FileEntry>,
    selected: usize,
    filter: ExecutableFilter,
}

impl FileChooser {
    pub fn open(start: &Path) -> Self {
        Self::with_filter(start, ExecutableFilter::for_platform(Platform::current()))
    }

    /// Opens at `start`, or its nearest existing ancestor.
    pub fn with_filter(start: &Path, filter: ExecutableFilter) -> Self {
        let current_dir = start
            .ancestors()
            .find(|dir| dir.is_dir())
            .map(Path::to_path_buf)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        let entries = Self::list_directory(&current_dir, filter);
        Self {
            current_dir,
            entries,
            selected: 0,
            filter,
        }
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    fn list_directory(path: &Path, filter: ExecutableFilter) -> Vec<FileEntry> {
        let mut entries = Vec::new();

        if let Some(parent) = path.parent() {
            entries.push(FileEntry {
                name: "..".to_string(),
                path: parent.to_path_buf(),
                is_dir: true,
            });
        }

        if let Ok(read_dir) = fs::read_dir(path) {
            let mut dirs = Vec::new();
            let mut files = Vec::new();

            for entry in read_dir.filter_map(|e| e.ok()) {
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().to_string();
                if path.is_dir() {
                    dirs.push(FileEntry {
                        name,
                        path,
                        is_dir: true,
                    });
                } else if filter.accepts(&path) {
                    files.push(FileEntry {
                        name,
                        path,
                        is_dir: false,
                    });
                }
            }

            dirs.sort_by(|a, b| a.name.cmp(&b.name));
            files.sort_by(|a, b| a.name.cmp(&b.name));

            entries.extend(dirs);
            entries.extend(files);
        }

        entries
    }

    pub fn navigate(&mut self, path: &Path) {
        self.current_dir = path.to_path_buf();
        self.entries = Self::list_directory(&self.current_dir, self.filter);
        self.selected = 0;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ChooserOutcome {
        match key.code {
            KeyCode::Esc => ChooserOutcome::Cancelled,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                ChooserOutcome::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.entries.len() {
                    self.selected += 1;
                }
                ChooserOutcome::Continue
            }
            KeyCode::Backspace | KeyCode::Left => {
                if let Some(parent) = self.current_dir.parent().map(Path::to_path_buf) {
                    self.navigate(&parent);
                }
                ChooserOutcome::Continue
            }
            KeyCode::Enter | KeyCode::Right => match self.entries.get(self.selected).cloned() {
                Some(entry) if entry.is_dir => {
                    self.navigate(&entry.path);
                    ChooserOutcome::Continue
                }
                Some(entry) => ChooserOutcome::Picked(entry.path),
                None => ChooserOutcome::Continue,
            },
            _ => ChooserOutcome::Continue,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        frame.render_widget(Clear, area);
        let block = Block::default()
            .title(format!(" Pick Executable: {} ", self.current_dir().display()))
            .borders(Borders::ALL)
            .style(Style::default().bg(theme.surface).fg(theme.text));

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|entry| {
                let marker = if entry.is_dir { "▸ " } else { "  " };
                let suffix = if entry.is_dir && entry.name != ".." { "/" } else { "" };
                ListItem::new(format!("{marker}{}{suffix}", entry.name))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(theme.highlight_style());

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }
}
