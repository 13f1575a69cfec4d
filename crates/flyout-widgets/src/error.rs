#![forbid(unsafe_code)]

//! Error types for panels and menu hierarchies.
//!
//! Configuration errors are caller contract violations reported before
//! anything is shown. Panel and menu errors surface inconsistent runtime
//! state (a panel destroyed out from under a hierarchy, a row that no longer
//! exists) and abort only the interaction that hit them.

use std::fmt;

use flyout_render::{NodeId, PanelId};

/// Index path of an option inside a (possibly nested) option list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OptionPath(pub Vec<usize>);

impl OptionPath {
    /// Path one level deeper.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }
}

impl fmt::Display for OptionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("root");
        }
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

/// A malformed option list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An option list (root or nested) has no entries.
    EmptyOptions { path: OptionPath },
    /// A leaf option has a label but no callback.
    LabelWithoutCallback { path: OptionPath },
    /// A leaf option has a callback but no label.
    CallbackWithoutLabel { path: OptionPath },
    /// A submenu option has neither nested options nor a callback.
    SubmenuWithoutContent { path: OptionPath },
    /// A submenu option has both nested options and a callback.
    SubmenuWithBoth { path: OptionPath },
    /// A text or markup option also carries submenu fields.
    InertWithSubmenu { path: OptionPath },
    /// An option mixes kinds (e.g. text and html) or carries nothing usable.
    AmbiguousOption { path: OptionPath },
}

impl ConfigError {
    /// Where in the option tree the violation was found.
    pub fn path(&self) -> &OptionPath {
        match self {
            Self::EmptyOptions { path }
            | Self::LabelWithoutCallback { path }
            | Self::CallbackWithoutLabel { path }
            | Self::SubmenuWithoutContent { path }
            | Self::SubmenuWithBoth { path }
            | Self::InertWithSubmenu { path }
            | Self::AmbiguousOption { path } => path,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyOptions { path } => write!(f, "option list at {path} is empty"),
            Self::LabelWithoutCallback { path } => {
                write!(f, "option {path}: label requires a callback")
            }
            Self::CallbackWithoutLabel { path } => {
                write!(f, "option {path}: callback requires a label")
            }
            Self::SubmenuWithoutContent { path } => {
                write!(f, "option {path}: submenu needs either options or a callback")
            }
            Self::SubmenuWithBoth { path } => {
                write!(f, "option {path}: submenu cannot have both options and a callback")
            }
            Self::InertWithSubmenu { path } => {
                write!(f, "option {path}: text/html options cannot open a submenu")
            }
            Self::AmbiguousOption { path } => write!(
                f,
                "option {path}: expected exactly one of label+callback, submenu, text, or html"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime failure operating on a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    /// No panel with this id was ever registered with the host.
    Unknown(PanelId),
    /// The panel was destroyed and must not be reused.
    Destroyed(PanelId),
    /// The panel's region can no longer be measured (detached from the surface).
    RegionUnavailable(PanelId),
    /// The element a panel was asked to show under no longer exists.
    AnchorUnavailable(NodeId),
}

impl fmt::Display for PanelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(id) => write!(f, "unknown panel {id}"),
            Self::Destroyed(id) => write!(f, "{id} was destroyed"),
            Self::RegionUnavailable(id) => write!(f, "content region of {id} is unavailable"),
            Self::AnchorUnavailable(node) => {
                write!(f, "anchor node {} is unavailable", node.id())
            }
        }
    }
}

impl std::error::Error for PanelError {}

/// Failure while building or driving a menu hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuError {
    Config(ConfigError),
    Panel(PanelError),
    /// No level is tracked at this depth.
    LevelMissing(usize),
    /// The node is not a row rendered by this hierarchy.
    UnknownRow(NodeId),
}

impl fmt::Display for MenuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid menu options: {err}"),
            Self::Panel(err) => write!(f, "menu panel error: {err}"),
            Self::LevelMissing(depth) => write!(f, "no menu level at depth {depth}"),
            Self::UnknownRow(node) => write!(f, "node {} is not a menu row", node.id()),
        }
    }
}

impl std::error::Error for MenuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Panel(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for MenuError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<PanelError> for MenuError {
    fn from(err: PanelError) -> Self {
        Self::Panel(err)
    }
}
