//! Semantic coloring
//!
//! Output code asks for a [`Role`] ("this is a failure", "this is a stack
//! trace") and the [`Painter`] maps it onto a color from the active
//! [`Theme`]. The painter is built once from configuration and passed to
//! whoever writes output.

use colored::Colorize;

/// What a piece of output means, independent of how it is colored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Passed test line
    Pass,
    /// Failed test line and failure headers
    Fail,
    /// Warnings and the slow test list
    Warn,
    /// Error messages and not-found tests
    Error,
    /// Stack trace lines
    StackTrace,
    /// Skipped / no-outcome test line
    Disabled,
    /// Reason text for skipped tests
    DisabledReason,
    /// Slow duration highlight
    Slow,
    /// Debug output
    Debug,
}

/// A named palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Bright colors for dark terminals
    #[default]
    Default,
    /// Deeper colors for light backgrounds
    Darker,
}

impl Theme {
    /// Look a theme up by name; unknown names give [`Theme::Default`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("darker") {
            Self::Darker
        } else {
            Self::Default
        }
    }

    /// RGB triple for a role in this theme
    #[must_use]
    pub const fn rgb(self, role: Role) -> (u8, u8, u8) {
        const HI: u8 = 225;
        const LO: u8 = 110;
        const DEEP: u8 = 140;
        match self {
            Self::Default => match role {
                Role::Pass => (LO, HI, 0),
                Role::Fail => (HI, LO, LO),
                Role::Warn | Role::Slow => (HI, HI, LO),
                Role::Error => (HI, LO, HI),
                Role::StackTrace => (LO, HI, HI),
                Role::Disabled => (LO, LO, LO),
                Role::DisabledReason => (80, 80, 80),
                Role::Debug => (LO, LO, HI),
            },
            Self::Darker => match role {
                Role::Pass => (0, DEEP, 0),
                Role::Fail => (DEEP, 0, 0),
                Role::Warn | Role::Slow => (DEEP, DEEP, 0),
                Role::Error => (DEEP, 0, DEEP),
                Role::StackTrace => (0, DEEP, DEEP),
                Role::Disabled => (LO, LO, LO),
                Role::DisabledReason => (170, 170, 170),
                Role::Debug => (0, 0, DEEP),
            },
        }
    }
}

/// Paints roles onto strings, or passes them through when color is off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Painter {
    theme: Theme,
    enabled: bool,
}

impl Painter {
    /// A painter for `theme`; `enabled = false` disables all coloring
    #[must_use]
    pub const fn new(theme: Theme, enabled: bool) -> Self {
        Self { theme, enabled }
    }

    /// A painter that never colors
    #[must_use]
    pub const fn plain() -> Self {
        Self::new(Theme::Default, false)
    }

    /// The active theme
    #[must_use]
    pub const fn theme(&self) -> Theme {
        self.theme
    }

    /// Whether coloring is on
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Color `text` for `role`
    #[must_use]
    pub fn paint(&self, role: Role, text: &str) -> String {
        if !self.enabled || text.is_empty() {
            return text.to_string();
        }
        let (r, g, b) = self.theme.rgb(role);
        text.truecolor(r, g, b).to_string()
    }
}
