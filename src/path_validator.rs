//! Classification of user-typed executable paths.
//!
//! Every keystroke in the executable field goes through [`PathField::set_text`],
//! which resolves the text against the filesystem and reports whether the
//! result may be confirmed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::NameViolation;

const WINDOWS_RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];
const MAX_COMPONENT_BYTES: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    fn max_path_len(self) -> usize {
        match self {
            Platform::Windows => 260,
            Platform::MacOs => 1024,
            Platform::Linux => 4096,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathState {
    Empty,
    Unresolvable,
    IsDirectory,
    /// Kept as a candidate, but never confirmable.
    DoesNotExist(PathBuf),
    Valid(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    None,
    Warning,
    Error,
}

impl PathState {
    pub fn is_acceptable(&self) -> bool {
        matches!(self, PathState::Valid(_))
    }

    pub fn candidate(&self) -> Option<&Path> {
        match self {
            PathState::DoesNotExist(path) | PathState::Valid(path) => Some(path),
            _ => None,
        }
    }

    pub fn indicator(&self) -> Indicator {
        match self {
            PathState::Empty | PathState::Valid(_) => Indicator::None,
            PathState::DoesNotExist(_) => Indicator::Warning,
            PathState::Unresolvable | PathState::IsDirectory => Indicator::Error,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            PathState::Empty | PathState::Valid(_) => "",
            PathState::Unresolvable => "Invalid path",
            PathState::IsDirectory => "Path is a directory",
            PathState::DoesNotExist(_) => "File does not exist",
        }
    }
}

pub fn classify_for(text: &str, platform: Platform) -> PathState {
    if text.is_empty() {
        return PathState::Empty;
    }

    let path = match resolve(text) {
        Ok(path) => path,
        Err(err) => {
            debug!(%err, text, "path cannot be resolved");
            return PathState::Unresolvable;
        }
    };

    match fs::metadata(&path) {
        Ok(meta) if meta.is_dir() => PathState::IsDirectory,
        Ok(_) => match validate_file_path(&path, platform) {
            Ok(()) => PathState::Valid(path),
            Err(violation) => {
                debug!(%violation, path = %path.display(), "path rejected by platform rules");
                PathState::Unresolvable
            }
        },
        Err(err) if is_missing(&err) => PathState::DoesNotExist(path),
        Err(err) => {
            debug!(%err, path = %path.display(), "path cannot be inspected");
            PathState::Unresolvable
        }
    }
}

fn resolve(text: &str) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(text)?;
    match fs::canonicalize(&absolute) {
        Ok(resolved) => Ok(strip_verbatim(resolved)),
        Err(err) if is_missing(&err) => Ok(absolute),
        Err(err) => Err(err),
    }
}

fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

#[cfg(windows)]
fn strip_verbatim(path: PathBuf) -> PathBuf {
    let stripped = path
        .to_str()
        .and_then(|text| text.strip_prefix(r"\\?\"))
        .filter(|rest| rest.as_bytes().get(1) == Some(&b':'))
        .map(PathBuf::from);
    stripped.unwrap_or(path)
}

#[cfg(not(windows))]
fn strip_verbatim(path: PathBuf) -> PathBuf {
    path
}

pub fn validate_file_path(path: &Path, platform: Platform) -> Result<(), NameViolation> {
    let text = path.to_string_lossy();
    if text.contains('\0') {
        return Err(NameViolation::NulByte);
    }
    let len = text.chars().count();
    let max = platform.max_path_len();
    if len > max {
        return Err(NameViolation::PathTooLong { len, max });
    }
    match platform {
        Platform::Windows => validate_windows(&text),
        Platform::MacOs => validate_posix(&text, &[':']),
        Platform::Linux => validate_posix(&text, &[]),
    }
}

fn validate_posix(text: &str, reserved: &[char]) -> Result<(), NameViolation> {
    for component in text.split('/').filter(|c| !c.is_empty()) {
        if component.len() > MAX_COMPONENT_BYTES {
            return Err(NameViolation::ComponentTooLong {
                component: component.to_string(),
                max: MAX_COMPONENT_BYTES,
            });
        }
        if let Some(ch) = component.chars().find(|c| reserved.contains(c)) {
            return Err(NameViolation::ReservedCharacter {
                component: component.to_string(),
                ch,
            });
        }
    }
    Ok(())
}

fn validate_windows(text: &str) -> Result<(), NameViolation> {
    let rest = text.strip_prefix(r"\\?\").unwrap_or(text);
    let rest = strip_drive(rest);
    for component in rest.split(['\\', '/']).filter(|c| !c.is_empty()) {
        if component == "." || component == ".." {
            continue;
        }
        if let Some(ch) = component
            .chars()
            .find(|c| WINDOWS_RESERVED_CHARS.contains(c) || (*c as u32) < 0x20)
        {
            return Err(NameViolation::ReservedCharacter {
                component: component.to_string(),
                ch,
            });
        }
        if component.ends_with([' ', '.']) {
            return Err(NameViolation::TrailingSpaceOrDot(component.to_string()));
        }
        let stem = component.split('.').next().unwrap_or(component);
        if is_reserved_device(stem) {
            return Err(NameViolation::ReservedName(component.to_string()));
        }
    }
    Ok(())
}

fn strip_drive(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        &text[2..]
    } else {
        text
    }
}

fn is_reserved_device(stem: &str) -> bool {
    let upper = stem.trim_end().to_ascii_uppercase();
    match upper.as_str() {
        "CON" | "PRN" | "AUX" | "NUL" => true,
        _ => {
            upper.len() == 4
                && (upper.starts_with("COM") || upper.starts_with("LPT"))
                && matches!(upper.as_bytes()[3], b'1'..=b'9')
        }
    }
}

/// Text input bound to a live [`PathState`].
#[derive(Debug, Clone)]
pub struct PathField {
    text: String,
    state: PathState,
    platform: Platform,
}

impl PathField {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_platform(text, Platform::current())
    }

    pub fn with_platform(text: impl Into<String>, platform: Platform) -> Self {
        let text = text.into();
        let state = classify_for(&text, platform);
        Self {
            text,
            state,
            platform,
        }
    }

    /// Reclassifies and returns whether the new state is acceptable.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        self.text = text.into();
        self.state = classify_for(&self.text, self.platform);
        self.is_valid()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> &PathState {
        &self.state
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_acceptable()
    }

    pub fn path(&self) -> Option<&Path> {
        self.state.candidate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn classify(text: &str) -> PathState {
        classify_for(text, Platform::current())
    }

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"#!/bin/sh\n").unwrap();
        path
    }

    #[test]
    fn empty_text_is_empty() {
        assert_eq!(classify(""), PathState::Empty);
        assert_eq!(PathState::Empty.indicator(), Indicator::None);
    }

    #[test]
    fn existing_file_is_valid_and_resolved() {
        let dir = TempDir::new().unwrap();
        let file = touch(&dir, "tool");
        let state = classify(&file.to_string_lossy());
        let expected = fs::canonicalize(&file).unwrap();
        assert_eq!(state, PathState::Valid(strip_verbatim(expected)));
        assert!(state.is_acceptable());
        assert_eq!(state.indicator(), Indicator::None);
    }

    #[test]
    fn directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let state = classify(&dir.path().to_string_lossy());
        assert_eq!(state, PathState::IsDirectory);
        assert_eq!(state.indicator(), Indicator::Error);
        assert!(state.candidate().is_none());
    }

    #[test]
    fn missing_file_keeps_candidate_but_is_not_acceptable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.exe");
        let state = classify(&missing.to_string_lossy());
        assert!(matches!(state, PathState::DoesNotExist(_)));
        assert_eq!(state.candidate(), Some(missing.as_path()));
        assert!(!state.is_acceptable());
        assert_eq!(state.indicator(), Indicator::Warning);
    }

    #[test]
    fn file_used_as_directory_does_not_exist() {
        let dir = TempDir::new().unwrap();
        let file = touch(&dir, "plain");
        let nested = file.join("child");
        assert!(matches!(
            classify(&nested.to_string_lossy()),
            PathState::DoesNotExist(_)
        ));
    }

    #[test]
    fn nul_byte_is_unresolvable() {
        assert_eq!(classify("bad\0name"), PathState::Unresolvable);
    }

    #[test]
    fn gate_matches_valid_state_for_all_inputs() {
        let dir = TempDir::new().unwrap();
        let file = touch(&dir, "run");
        let inputs = [
            String::new(),
            dir.path().to_string_lossy().into_owned(),
            dir.path().join("missing").to_string_lossy().into_owned(),
            file.to_string_lossy().into_owned(),
            "x\0y".to_string(),
        ];
        for input in inputs {
            let mut field = PathField::new("");
            let acceptable = field.set_text(input.clone());
            assert_eq!(
                acceptable,
                matches!(field.state(), PathState::Valid(_)),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn field_reclassifies_on_every_edit() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "ab");
        let base = format!("{}/a", dir.path().display());
        let mut field = PathField::new(base.clone());
        assert!(matches!(field.state(), PathState::DoesNotExist(_)));
        assert!(field.set_text(format!("{base}b")));
        assert!(!field.set_text(base));
        assert!(!field.set_text(""));
        assert_eq!(field.state(), &PathState::Empty);
    }

    #[test]
    fn windows_rules_reject_reserved_names_and_characters() {
        let win = Platform::Windows;
        assert!(validate_file_path(Path::new(r"C:\Windows\notepad.exe"), win).is_ok());
        assert!(validate_file_path(Path::new(r"\\?\C:\Tools\run.exe"), win).is_ok());
        assert_eq!(
            validate_file_path(Path::new(r"C:\dev\con.txt"), win),
            Err(NameViolation::ReservedName("con.txt".into()))
        );
        assert!(matches!(
            validate_file_path(Path::new(r"C:\dev\LPT3"), win),
            Err(NameViolation::ReservedName(_))
        ));
        assert!(validate_file_path(Path::new(r"C:\dev\COM0.exe"), win).is_ok());
        assert!(matches!(
            validate_file_path(Path::new(r"C:\what?\run.exe"), win),
            Err(NameViolation::ReservedCharacter { ch: '?', .. })
        ));
        assert!(matches!(
            validate_file_path(Path::new(r"C:\tools\run. "), win),
            Err(NameViolation::TrailingSpaceOrDot(_))
        ));
        let long = format!(r"C:\{}", "a".repeat(300));
        assert!(matches!(
            validate_file_path(Path::new(&long), win),
            Err(NameViolation::PathTooLong { max: 260, .. })
        ));
    }

    #[test]
    fn posix_rules_limit_component_length() {
        let long = format!("/opt/{}", "b".repeat(256));
        assert!(matches!(
            validate_file_path(Path::new(&long), Platform::Linux),
            Err(NameViolation::ComponentTooLong { max: 255, .. })
        ));
        assert!(validate_file_path(Path::new("/usr/bin/env"), Platform::Linux).is_ok());
        assert!(matches!(
            validate_file_path(Path::new("/Apps/a:b"), Platform::MacOs),
            Err(NameViolation::ReservedCharacter { ch: ':', .. })
        ));
    }
}
