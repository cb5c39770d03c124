use std::env;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::Style;
use ratatui::text::{Line, Span};

use crate::entry::{join_arguments, split_arguments, LauncherEntry};
use crate::path_validator::{Indicator, PathField, PathState};
use crate::ui::{make_action_line, make_field_line, plain_line, FormLine, Theme};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    Alias,
    Executable,
    Browse,
    Arguments,
    Confirm,
    Cancel,
}

#[derive(Debug, PartialEq, Eq)]
pub enum FormOutcome {
    Continue,
    Browse(PathBuf),
    Confirmed(LauncherEntry),
    Cancelled,
}

pub struct EditForm {
    alias: String,
    executable: PathField,
    arguments: String,
    selected_field: FormField,
    confirm_enabled: bool,
    error: Option<String>,
}

impl EditForm {
    pub fn new(alias: &str, executable: &str, arguments: &[String]) -> Self {
        let executable = PathField::new(executable);
        let mut form = Self {
            alias: alias.to_string(),
            arguments: join_arguments(arguments),
            selected_field: FormField::Alias,
            confirm_enabled: false,
            error: None,
            executable,
        };
        let valid = form.executable.is_valid();
        form.refresh_gate(valid);
        form
    }

    pub fn confirm_enabled(&self) -> bool {
        self.confirm_enabled
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn executable(&self) -> &PathField {
        &self.executable
    }

    pub fn arguments_text(&self) -> &str {
        &self.arguments
    }

    pub fn selected_field(&self) -> FormField {
        self.selected_field
    }

    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = alias.into();
        let valid = self.executable.is_valid();
        self.refresh_gate(valid);
    }

    pub fn set_executable(&mut self, text: impl Into<String>) {
        let valid = self.executable.set_text(text);
        self.refresh_gate(valid);
    }

    pub fn set_arguments(&mut self, text: impl Into<String>) {
        self.arguments = text.into();
    }

    fn refresh_gate(&mut self, executable_valid: bool) {
        self.confirm_enabled = executable_valid && !self.alias.is_empty();
    }

    /// The entry this form would produce, if confirmation is allowed.
    pub fn confirm(&self) -> Option<LauncherEntry> {
        if !self.confirm_enabled {
            return None;
        }
        let PathState::Valid(path) = self.executable.state() else {
            return None;
        };
        Some(LauncherEntry::new(
            self.alias.clone(),
            path.to_string_lossy(),
            split_arguments(&self.arguments),
        ))
    }

    /// Where the file chooser opens: next to the current candidate, else the
    /// working directory.
    pub fn browse_start(&self) -> PathBuf {
        match self.executable.path() {
            Some(path) => path.parent().unwrap_or(path).to_path_buf(),
            None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        self.error = None;
        match key.code {
            KeyCode::Esc => FormOutcome::Cancelled,
            KeyCode::Tab | KeyCode::Down => {
                self.next_field();
                FormOutcome::Continue
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.previous_field();
                FormOutcome::Continue
            }
            KeyCode::Enter => match self.selected_field {
                FormField::Arguments => {
                    self.arguments.push('\n');
                    FormOutcome::Continue
                }
                FormField::Browse => FormOutcome::Browse(self.browse_start()),
                FormField::Cancel => FormOutcome::Cancelled,
                FormField::Alias | FormField::Executable | FormField::Confirm => {
                    self.try_confirm()
                }
            },
            KeyCode::Backspace => {
                self.edit_active(|value| {
                    value.pop();
                });
                FormOutcome::Continue
            }
            KeyCode::Delete => {
                self.edit_active(String::clear);
                FormOutcome::Continue
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.edit_active(|value| value.push(c));
                FormOutcome::Continue
            }
            _ => FormOutcome::Continue,
        }
    }

    fn try_confirm(&mut self) -> FormOutcome {
        match self.confirm() {
            Some(entry) => FormOutcome::Confirmed(entry),
            None => {
                self.error = Some(self.blocking_reason().to_string());
                FormOutcome::Continue
            }
        }
    }

    fn blocking_reason(&self) -> &'static str {
        if self.alias.is_empty() {
            "Alias is required"
        } else if matches!(self.executable.state(), PathState::Empty) {
            "Executable is required"
        } else {
            self.executable.state().describe()
        }
    }

    fn edit_active(&mut self, edit: impl FnOnce(&mut String)) {
        match self.selected_field {
            FormField::Alias => {
                let mut alias = self.alias.clone();
                edit(&mut alias);
                self.set_alias(alias);
            }
            FormField::Executable => {
                let mut text = self.executable.text().to_string();
                edit(&mut text);
                self.set_executable(text);
            }
            FormField::Arguments => {
                let mut arguments = self.arguments_text().to_string();
                edit(&mut arguments);
                self.set_arguments(arguments);
            }
            FormField::Browse | FormField::Confirm | FormField::Cancel => {}
        }
    }

    fn next_field(&mut self) {
        self.selected_field = match self.selected_field {
            FormField::Alias => FormField::Executable,
            FormField::Executable => FormField::Browse,
            FormField::Browse => FormField::Arguments,
            FormField::Arguments => FormField::Confirm,
            FormField::Confirm => FormField::Cancel,
            FormField::Cancel => FormField::Alias,
        };
    }

    fn previous_field(&mut self) {
        self.selected_field = match self.selected_field {
            FormField::Alias => FormField::Cancel,
            FormField::Executable => FormField::Alias,
            FormField::Browse => FormField::Executable,
            FormField::Arguments => FormField::Browse,
            FormField::Confirm => FormField::Arguments,
            FormField::Cancel => FormField::Confirm,
        };
    }

    pub fn render_lines(&self, theme: &Theme) -> Vec<FormLine> {
        let selected = self.selected_field();
        let mut lines: Vec<FormLine> = Vec::new();
        lines.push(plain_line(Line::from("Fill in the launcher item below.")));
        lines.push(plain_line(Line::from("")));
        lines.push(make_field_line(
            "Alias",
            &self.alias,
            selected == FormField::Alias,
            theme,
        ));
        lines.push(make_field_line(
            "Executable",
            self.executable.text(),
            selected == FormField::Executable,
            theme,
        ));
        if let Some(status) = self.status_line(theme) {
            lines.push(plain_line(status));
        }
        lines.push(make_action_line(
            "[ Browse… ]",
            selected == FormField::Browse,
            true,
            theme,
        ));
        lines.push(plain_line(Line::from("")));
        lines.push(make_field_line(
            "Arguments (one per line)",
            "",
            selected == FormField::Arguments,
            theme,
        ));
        let argument_style = Style::default().fg(theme.text);
        for line in self.arguments.split('\n') {
            lines.push(plain_line(Line::from(vec![
                Span::styled("  │ ", Style::default().fg(theme.muted)),
                Span::styled(line.to_string(), argument_style),
            ])));
        }
        lines.push(plain_line(Line::from("")));
        lines.push(make_action_line(
            "[ OK ]",
            selected == FormField::Confirm,
            self.confirm_enabled(),
            theme,
        ));
        lines.push(make_action_line(
            "[ Cancel ]",
            selected == FormField::Cancel,
            true,
            theme,
        ));
        if let Some(error) = &self.error {
            lines.push(plain_line(Line::from(vec![Span::styled(
                error.clone(),
                Style::default().fg(theme.error),
            )])));
        }
        lines
    }

    fn status_line(&self, theme: &Theme) -> Option<Line<'static>> {
        let state = self.executable.state();
        let (icon, color) = match state.indicator() {
            Indicator::None => return None,
            Indicator::Warning => ("⚠", theme.warning),
            Indicator::Error => ("✖", theme.error),
        };
        let mut text = format!("  {icon} {}", state.describe());
        if let Some(path) = state.candidate().map(Path::display) {
            text.push_str(&format!(" ({path})"));
        }
        Some(Line::from(vec![Span::styled(text, Style::default().fg(color))]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(form: &mut EditForm, text: &str) {
        for c in text.chars() {
            form.handle_key(press(KeyCode::Char(c)));
        }
    }

    fn program(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("program");
        fs::write(&path, b"").unwrap();
        fs::canonicalize(path).unwrap()
    }

    #[test]
    fn confirm_stays_disabled_until_alias_and_valid_executable() {
        let dir = TempDir::new().unwrap();
        let mut form = EditForm::new("", "", &[]);
        assert!(!form.confirm_enabled());

        type_text(&mut form, "A");
        assert_eq!(form.alias(), "A");
        assert!(!form.confirm_enabled());

        let missing = dir.path().join("missing.exe");
        form.set_executable(missing.to_string_lossy());
        assert!(matches!(form.executable().state(), PathState::DoesNotExist(_)));
        assert!(!form.confirm_enabled());

        let exe = program(&dir);
        form.set_executable(exe.to_string_lossy());
        assert!(form.confirm_enabled());

        form.set_alias("");
        assert!(!form.confirm_enabled());
    }

    #[test]
    fn confirm_splits_arguments_per_line() {
        let dir = TempDir::new().unwrap();
        let exe = program(&dir);
        let mut form = EditForm::new("Tool", &exe.to_string_lossy(), &[]);
        form.set_arguments("--flag\n\nvalue");
        let outcome = form.handle_key(press(KeyCode::Enter));
        assert_eq!(
            outcome,
            FormOutcome::Confirmed(LauncherEntry::new(
                "Tool",
                exe.to_string_lossy(),
                ["--flag", "", "value"]
            ))
        );
    }

    #[test]
    fn lone_blank_argument_line_confirms_as_no_arguments() {
        let dir = TempDir::new().unwrap();
        let exe = program(&dir);
        let mut form = EditForm::new("Tool", &exe.to_string_lossy(), &[]);
        for _ in 0..3 {
            form.handle_key(press(KeyCode::Tab));
        }
        form.handle_key(press(KeyCode::Enter));
        assert_eq!(form.arguments_text(), "\n");
        form.handle_key(press(KeyCode::Tab));
        assert_eq!(
            form.handle_key(press(KeyCode::Enter)),
            FormOutcome::Confirmed(LauncherEntry::new(
                "Tool",
                exe.to_string_lossy(),
                Vec::<String>::new()
            ))
        );
    }

    #[test]
    fn enter_in_arguments_adds_line() {
        let mut form = EditForm::new("Tool", "", &["one".to_string()]);
        for _ in 0..3 {
            form.handle_key(press(KeyCode::Tab));
        }
        assert_eq!(form.selected_field(), FormField::Arguments);
        form.handle_key(press(KeyCode::Enter));
        type_text(&mut form, "two");
        assert_eq!(form.arguments_text(), "one\ntwo");
    }

    #[test]
    fn enter_while_disabled_reports_reason() {
        let mut form = EditForm::new("", "", &[]);
        assert_eq!(form.handle_key(press(KeyCode::Enter)), FormOutcome::Continue);
        assert_eq!(form.error.as_deref(), Some("Alias is required"));
    }

    #[test]
    fn escape_cancels() {
        let mut form = EditForm::new("Tool", "/bin/sh", &[]);
        type_text(&mut form, "zzz");
        assert_eq!(form.handle_key(press(KeyCode::Esc)), FormOutcome::Cancelled);
    }

    #[test]
    fn typing_in_executable_revalidates() {
        let dir = TempDir::new().unwrap();
        let exe = program(&dir);
        let mut form = EditForm::new("Tool", "", &[]);
        form.handle_key(press(KeyCode::Tab));
        type_text(&mut form, &exe.to_string_lossy());
        assert!(form.confirm_enabled());
        form.handle_key(press(KeyCode::Backspace));
        assert!(!form.confirm_enabled());
        form.handle_key(press(KeyCode::Delete));
        assert_eq!(form.executable().state(), &PathState::Empty);
    }

    #[test]
    fn browse_starts_next_to_candidate() {
        let dir = TempDir::new().unwrap();
        let exe = program(&dir);
        let form = EditForm::new("Tool", &exe.to_string_lossy(), &[]);
        assert_eq!(form.browse_start(), exe.parent().unwrap());

        let blank = EditForm::new("", "", &[]);
        assert_eq!(blank.browse_start(), env::current_dir().unwrap());
    }
}
