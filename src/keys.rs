use serde::{Deserialize, Serialize};

/// The keys the grid editor reacts to, named as the DOM names them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    Enter,
    Tab,
    Escape,
    Delete,
    Char(char),
}

impl Key {
    /// Parse a DOM `KeyboardEvent.key` value. Anything that is neither a
    /// named key we handle nor a single printable character is `None`.
    pub fn from_dom(name: &str) -> Option<Key> {
        match name {
            "Enter" => Some(Key::Enter),
            "Tab" => Some(Key::Tab),
            "Escape" | "Esc" => Some(Key::Escape),
            "Delete" | "Del" => Some(Key::Delete),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_control() => Some(Key::Char(c)),
                    _ => None,
                }
            }
        }
    }
}

impl TryFrom<String> for Key {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Key::from_dom(&name).ok_or_else(|| format!("unsupported key: {:?}", name))
    }
}

impl From<Key> for String {
    fn from(key: Key) -> String {
        match key {
            Key::Enter => "Enter".to_string(),
            Key::Tab => "Tab".to_string(),
            Key::Escape => "Escape".to_string(),
            Key::Delete => "Delete".to_string(),
            Key::Char(c) => c.to_string(),
        }
    }
}

/// A key press with its modifier state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub shift: bool,
}

/// Editor commands bound to Ctrl (or Cmd on macOS) shortcuts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
    Copy,
    Paste,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        KeyEvent {
            key,
            ctrl: false,
            meta: false,
            shift: false,
        }
    }

    pub fn ctrl(key: Key) -> Self {
        KeyEvent {
            ctrl: true,
            ..KeyEvent::plain(key)
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Ctrl on Windows/Linux, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Resolve the event to an editor shortcut, if it is one.
    ///
    /// Browsers report Shift+Z as `"Z"`, so letters match in either case.
    pub fn shortcut(&self) -> Option<Shortcut> {
        if !self.command() {
            return None;
        }
        let Key::Char(c) = self.key else {
            return None;
        };

        match c.to_ascii_lowercase() {
            'z' if self.shift => Some(Shortcut::Redo),
            'z' => Some(Shortcut::Undo),
            'y' => Some(Shortcut::Redo),
            'c' => Some(Shortcut::Copy),
            'v' => Some(Shortcut::Paste),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_names_parse() {
        assert_eq!(Key::from_dom("Enter"), Some(Key::Enter));
        assert_eq!(Key::from_dom("Tab"), Some(Key::Tab));
        assert_eq!(Key::from_dom("Escape"), Some(Key::Escape));
        assert_eq!(Key::from_dom("Delete"), Some(Key::Delete));
        assert_eq!(Key::from_dom("a"), Some(Key::Char('a')));
        assert_eq!(Key::from_dom("₹"), Some(Key::Char('₹')));
        assert_eq!(Key::from_dom("ArrowUp"), None);
        assert_eq!(Key::from_dom(""), None);
    }

    #[test]
    fn shortcuts_resolve_with_either_modifier() {
        let undo = KeyEvent::ctrl(Key::Char('z'));
        assert_eq!(undo.shortcut(), Some(Shortcut::Undo));

        let cmd_undo = KeyEvent {
            meta: true,
            ..KeyEvent::plain(Key::Char('z'))
        };
        assert_eq!(cmd_undo.shortcut(), Some(Shortcut::Undo));

        assert_eq!(KeyEvent::ctrl(Key::Char('Z')).with_shift().shortcut(), Some(Shortcut::Redo));
        assert_eq!(KeyEvent::ctrl(Key::Char('y')).shortcut(), Some(Shortcut::Redo));
        assert_eq!(KeyEvent::ctrl(Key::Char('c')).shortcut(), Some(Shortcut::Copy));
        assert_eq!(KeyEvent::ctrl(Key::Char('v')).shortcut(), Some(Shortcut::Paste));
        assert_eq!(KeyEvent::plain(Key::Char('z')).shortcut(), None);
        assert_eq!(KeyEvent::ctrl(Key::Enter).shortcut(), None);
    }

    #[test]
    fn key_events_deserialize_from_json() {
        let event: KeyEvent = serde_json::from_str(r#"{"key":"v","ctrl":true}"#).unwrap();
        assert_eq!(event, KeyEvent::ctrl(Key::Char('v')));

        let event: KeyEvent = serde_json::from_str(r#"{"key":"Tab"}"#).unwrap();
        assert_eq!(event, KeyEvent::plain(Key::Tab));

        assert!(serde_json::from_str::<KeyEvent>(r#"{"key":"F5"}"#).is_err());
    }
}
