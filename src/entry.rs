#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LauncherEntry {
    pub alias: String,
    pub executable: String,
    pub arguments: Vec<String>,
}

impl LauncherEntry {
    pub fn new(
        alias: impl Into<String>,
        executable: impl Into<String>,
        arguments: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            alias: alias.into(),
            executable: executable.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// Blank alias or executable means the entry was never configured.
    pub fn needs_setup(&self) -> bool {
        self.alias.is_empty() || self.executable.is_empty()
    }
}

/// One argument per line; interior blank lines stay as empty arguments.
/// Text holding only a line break is no arguments, matching how an empty
/// list is stored.
pub fn split_arguments(text: &str) -> Vec<String> {
    let arguments: Vec<String> = text.lines().map(str::to_string).collect();
    if arguments.len() == 1 && arguments[0].is_empty() {
        return Vec::new();
    }
    arguments
}

pub fn join_arguments(arguments: &[String]) -> String {
    arguments.join("\n")
}
