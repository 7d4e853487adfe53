use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder the host writes for a command without any bound key.
pub const NO_SHORTCUT: &str = "!NO SHORTCUT!";
/// Character joining multiple key combinations in the exchange string.
pub const DEFAULT_SEPARATOR: char = '#';

/// Binding of a single command to zero or more key combinations.
///
/// An entry without shortcuts always holds an empty list; the joined view
/// reports it as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShortcutEntry {
    pub command_name: String,
    #[serde(default)]
    pub command_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "de_shortcuts")]
    shortcuts: Vec<String>,
    #[serde(default)]
    pub paths: String,
}

impl ShortcutEntry {
    pub fn new(
        command_name: impl Into<String>,
        command_id: impl Into<String>,
        raw_shortcuts: Option<&str>,
        paths: impl Into<String>,
    ) -> Self {
        Self::with_separator(command_name, command_id, raw_shortcuts, paths, DEFAULT_SEPARATOR)
    }

    pub fn with_separator(
        command_name: impl Into<String>,
        command_id: impl Into<String>,
        raw_shortcuts: Option<&str>,
        paths: impl Into<String>,
        separator: char,
    ) -> Self {
        Self {
            command_name: command_name.into(),
            command_id: command_id.into(),
            shortcuts: raw_shortcuts
                .map(|raw| parse_shortcuts(raw, separator))
                .unwrap_or_default(),
            paths: paths.into(),
        }
    }

    /// Entry for `command_name` with no id, path or shortcuts.
    pub fn empty(command_name: impl Into<String>) -> Self {
        Self {
            command_name: command_name.into(),
            ..Self::default()
        }
    }

    /// Copy of this entry's identity carrying only `shortcut`.
    pub fn with_single_shortcut(&self, shortcut: &str) -> Self {
        let mut entry = Self {
            command_name: self.command_name.clone(),
            command_id: self.command_id.clone(),
            shortcuts: Vec::new(),
            paths: self.paths.clone(),
        };
        entry.merge_shortcut(shortcut);
        entry
    }

    pub fn shortcuts(&self) -> &[String] {
        &self.shortcuts
    }

    pub fn has_shortcuts(&self) -> bool {
        !self.shortcuts.is_empty()
    }

    pub fn shortcut_string(&self) -> Option<String> {
        self.shortcut_string_with(DEFAULT_SEPARATOR)
    }

    pub fn shortcut_string_with(&self, separator: char) -> Option<String> {
        if self.shortcuts.is_empty() {
            return None;
        }
        let mut buffer = [0u8; 4];
        let separator: &str = separator.encode_utf8(&mut buffer);
        Some(self.shortcuts.join(separator))
    }

    /// Append `value` unless it is blank, the placeholder, or already bound.
    ///
    /// Values that would not survive a write and re-read are refused too:
    /// padded with whitespace, or containing the default separator.
    pub fn add_shortcut(&mut self, value: &str) -> bool {
        self.add_shortcut_with(value, DEFAULT_SEPARATOR)
    }

    pub fn add_shortcut_with(&mut self, value: &str, separator: char) -> bool {
        if value.contains(separator) {
            return false;
        }
        self.merge_shortcut(value)
    }

    /// Append an already split key combination.
    pub(crate) fn merge_shortcut(&mut self, value: &str) -> bool {
        if !is_real_shortcut(value) || value.trim() != value || self.contains_shortcut(value) {
            return false;
        }
        self.shortcuts.push(value.to_string());
        true
    }

    pub fn remove_shortcut(&mut self, value: &str) -> bool {
        match self.shortcuts.iter().position(|existing| existing == value) {
            Some(index) => {
                self.shortcuts.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains_shortcut(&self, value: &str) -> bool {
        !value.is_empty() && self.shortcuts.iter().any(|existing| existing == value)
    }
}

impl fmt::Display for ShortcutEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(CommandName = {}, Shortcuts = {})",
            std::any::type_name::<Self>(),
            self.command_name,
            self.shortcut_string().as_deref().unwrap_or(NO_SHORTCUT)
        )
    }
}

fn is_real_shortcut(value: &str) -> bool {
    !value.is_empty() && value != NO_SHORTCUT
}

/// Split a joined shortcut string into distinct key combinations.
pub fn parse_shortcuts(raw: &str, separator: char) -> Vec<String> {
    distinct_shortcuts(raw.split(separator))
}

fn distinct_shortcuts<'a>(pieces: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut shortcuts: Vec<String> = Vec::new();
    for piece in pieces {
        let piece = piece.trim();
        if is_real_shortcut(piece) && !shortcuts.iter().any(|existing| existing == piece) {
            shortcuts.push(piece.to_string());
        }
    }
    shortcuts
}

fn de_shortcuts<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(distinct_shortcuts(raw.iter().map(String::as_str)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_separator() {
        let entry = ShortcutEntry::new("Cmd.A", "id1", Some("CTRL+A#CTRL+SHIFT+A"), "Edit");
        assert_eq!(entry.shortcuts(), ["CTRL+A", "CTRL+SHIFT+A"]);
        assert_eq!(entry.shortcut_string().as_deref(), Some("CTRL+A#CTRL+SHIFT+A"));
    }

    #[test]
    fn parse_drops_placeholder_and_duplicates() {
        let entry = ShortcutEntry::new("Cmd", "", Some("!NO SHORTCUT!#VG#VG# #"), "");
        assert_eq!(entry.shortcuts(), ["VG"]);
        assert!(!entry.shortcuts().iter().any(|value| value == NO_SHORTCUT));
    }

    #[test]
    fn blank_or_missing_input_has_no_shortcuts() {
        for raw in [None, Some(""), Some(NO_SHORTCUT), Some("##")] {
            let entry = ShortcutEntry::new("Cmd", "", raw, "");
            assert!(!entry.has_shortcuts(), "input {:?}", raw);
            assert_eq!(entry.shortcut_string(), None);
        }
    }

    #[test]
    fn custom_separator() {
        let entry = ShortcutEntry::with_separator("Cmd", "", Some("A|B"), "", '|');
        assert_eq!(entry.shortcuts(), ["A", "B"]);
        assert_eq!(entry.shortcut_string_with(';').as_deref(), Some("A;B"));
    }

    #[test]
    fn add_shortcut_rejects_second_copy() {
        let mut entry = ShortcutEntry::empty("Cmd.Save");
        assert!(entry.add_shortcut("CTRL+S"));
        assert!(!entry.add_shortcut("CTRL+S"));
        assert_eq!(entry.shortcuts(), ["CTRL+S"]);
    }

    #[test]
    fn add_shortcut_rejects_blank_and_placeholder() {
        let mut entry = ShortcutEntry::empty("Cmd");
        assert!(!entry.add_shortcut(""));
        assert!(!entry.add_shortcut(NO_SHORTCUT));
        assert!(!entry.has_shortcuts());
    }

    #[test]
    fn add_shortcut_rejects_values_that_would_split_on_reload() {
        let mut entry = ShortcutEntry::empty("Cmd");
        assert!(!entry.add_shortcut("A#B"));
        assert!(!entry.add_shortcut(" C "));
        assert!(!entry.add_shortcut("C\t"));
        assert!(!entry.add_shortcut_with("A;B", ';'));
        assert!(entry.add_shortcut_with("A#B", ';'));
        assert_eq!(entry.shortcuts(), ["A#B"]);

        let reloaded = ShortcutEntry::with_separator(
            "Cmd",
            "",
            entry.shortcut_string_with(';').as_deref(),
            "",
            ';',
        );
        assert_eq!(reloaded.shortcuts(), entry.shortcuts());
    }

    #[test]
    fn removing_last_shortcut_leaves_entry_unbound() {
        let mut entry = ShortcutEntry::new("Cmd", "", Some("A#B"), "");
        assert!(entry.remove_shortcut("A"));
        assert!(!entry.remove_shortcut("A"));
        assert!(entry.remove_shortcut("B"));
        assert!(!entry.has_shortcuts());
        assert_eq!(entry.shortcut_string(), None);
        assert!(!entry.remove_shortcut("B"));
    }

    #[test]
    fn contains_shortcut_on_unbound_entry_is_false() {
        let entry = ShortcutEntry::empty("Cmd");
        assert!(!entry.contains_shortcut("A"));
        assert!(!entry.contains_shortcut(""));
    }

    #[test]
    fn single_shortcut_copy_keeps_identity() {
        let entry = ShortcutEntry::new("Cmd", "ID_CMD", Some("A#B"), "Edit>Cmd");
        let copy = entry.with_single_shortcut("B");
        assert_eq!(copy.command_name, "Cmd");
        assert_eq!(copy.command_id, "ID_CMD");
        assert_eq!(copy.paths, "Edit>Cmd");
        assert_eq!(copy.shortcuts(), ["B"]);
    }

    #[test]
    fn display_includes_type_and_bindings() {
        let entry = ShortcutEntry::new("Cmd.Save", "", Some("CTRL+S"), "");
        let text = entry.to_string();
        assert!(text.contains("ShortcutEntry"));
        assert!(text.contains("Cmd.Save"));
        assert!(text.contains("CTRL+S"));

        let unbound = ShortcutEntry::empty("Cmd.Open").to_string();
        assert!(unbound.contains(NO_SHORTCUT));
    }
}
