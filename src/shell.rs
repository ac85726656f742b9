use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long the splash screen stays up after the page loads.
pub const SPLASH_DURATION: Duration = Duration::from_millis(1800);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Page chrome state for one visitor: theme, splash screen and mobile menu.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellState {
    pub theme: Theme,
    pub splash_visible: bool,
    pub menu_open: bool,
}

impl Default for ShellState {
    fn default() -> Self {
        ShellState {
            theme: Theme::Light,
            splash_visible: true,
            menu_open: false,
        }
    }
}

impl ShellState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn finish_splash(&mut self) {
        self.splash_visible = false;
    }

    pub fn toggle_menu(&mut self) -> bool {
        self.menu_open = !self.menu_open;
        self.menu_open
    }
}
