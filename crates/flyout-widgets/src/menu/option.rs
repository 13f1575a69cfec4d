#![forbid(unsafe_code)]

//! Declarative menu options and the contexts handed to their callbacks.

use std::fmt;

use flyout_render::{Content, NodeId, PanelId, Surface};

use crate::error::{ConfigError, OptionPath};

/// Leaf callback.
pub type ActionCallback = Box<dyn FnMut(&mut ActionContext)>;

/// Dynamic-submenu callback; populates the freshly shown panel.
pub type SubmenuCallback = Box<dyn FnMut(&mut SubmenuContext<'_>)>;

/// Label used for submenu rows that do not name themselves.
pub const DEFAULT_SUBMENU_LABEL: &str = "More";

/// One entry of a menu.
pub enum FlyoutMenuOption {
    /// Clickable leaf.
    LabeledAction {
        label: String,
        callback: ActionCallback,
    },
    /// Row opening a nested option list.
    SubmenuByList {
        label: String,
        options: Vec<FlyoutMenuOption>,
    },
    /// Row opening a panel the callback fills in.
    SubmenuByCallback {
        label: String,
        callback: SubmenuCallback,
    },
    /// Inert, dimmed label.
    SectionText { text: String },
    /// Inert caller-supplied markup.
    RawContent { html: String },
}

impl FlyoutMenuOption {
    pub fn action(label: impl Into<String>, callback: impl FnMut(&mut ActionContext) + 'static) -> Self {
        Self::LabeledAction {
            label: label.into(),
            callback: Box::new(callback),
        }
    }

    pub fn submenu(label: impl Into<String>, options: Vec<FlyoutMenuOption>) -> Self {
        Self::SubmenuByList {
            label: label.into(),
            options,
        }
    }

    pub fn submenu_with(
        label: impl Into<String>,
        callback: impl FnMut(&mut SubmenuContext<'_>) + 'static,
    ) -> Self {
        Self::SubmenuByCallback {
            label: label.into(),
            callback: Box::new(callback),
        }
    }

    pub fn section(text: impl Into<String>) -> Self {
        Self::SectionText { text: text.into() }
    }

    pub fn raw(html: impl Into<String>) -> Self {
        Self::RawContent { html: html.into() }
    }

    /// Row label, for clickable options.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::LabeledAction { label, .. }
            | Self::SubmenuByList { label, .. }
            | Self::SubmenuByCallback { label, .. } => Some(label),
            Self::SectionText { .. } | Self::RawContent { .. } => None,
        }
    }

    /// Whether the option renders as a focusable row.
    pub fn is_row(&self) -> bool {
        self.label().is_some()
    }

    /// Whether activating the option opens a submenu.
    pub fn opens_submenu(&self) -> bool {
        matches!(
            self,
            Self::SubmenuByList { .. } | Self::SubmenuByCallback { .. }
        )
    }
}

impl fmt::Debug for FlyoutMenuOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LabeledAction { label, .. } => f
                .debug_struct("LabeledAction")
                .field("label", label)
                .finish_non_exhaustive(),
            Self::SubmenuByList { label, options } => f
                .debug_struct("SubmenuByList")
                .field("label", label)
                .field("options", options)
                .finish(),
            Self::SubmenuByCallback { label, .. } => f
                .debug_struct("SubmenuByCallback")
                .field("label", label)
                .finish_non_exhaustive(),
            Self::SectionText { text } => f.debug_struct("SectionText").field("text", text).finish(),
            Self::RawContent { html } => f.debug_struct("RawContent").field("html", html).finish(),
        }
    }
}

/// Check an option list (and every nested list) for emptiness.
///
/// The tagged variants make the per-option rules unrepresentable, so only
/// list shape is left to check.
pub fn validate_options(options: &[FlyoutMenuOption]) -> Result<(), ConfigError> {
    validate_at(options, &OptionPath::default())
}

fn validate_at(options: &[FlyoutMenuOption], path: &OptionPath) -> Result<(), ConfigError> {
    if options.is_empty() {
        return Err(ConfigError::EmptyOptions { path: path.clone() });
    }
    for (i, option) in options.iter().enumerate() {
        if let FlyoutMenuOption::SubmenuByList { options, .. } = option {
            validate_at(options, &path.child(i))?;
        }
    }
    Ok(())
}

/// Loosely typed option, assembled field by field and validated into a
/// [`FlyoutMenuOption`].
///
/// Exactly one of label+callback, `submenu`, `text`, or `html` must be set.
/// A submenu carries exactly one of `options` or `submenu_callback`. An
/// action `callback` on a submenu is always rejected.
#[derive(Default)]
pub struct OptionSpec {
    pub label: Option<String>,
    pub callback: Option<ActionCallback>,
    pub is_submenu: bool,
    pub options: Option<Vec<OptionSpec>>,
    pub submenu_callback: Option<SubmenuCallback>,
    pub text: Option<String>,
    pub html: Option<String>,
}

impl fmt::Debug for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSpec")
            .field("label", &self.label)
            .field("callback", &self.callback.is_some())
            .field("is_submenu", &self.is_submenu)
            .field("options", &self.options)
            .field("submenu_callback", &self.submenu_callback.is_some())
            .field("text", &self.text)
            .field("html", &self.html)
            .finish()
    }
}

impl OptionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn callback(mut self, callback: impl FnMut(&mut ActionContext) + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn submenu(mut self) -> Self {
        self.is_submenu = true;
        self
    }

    #[must_use]
    pub fn options(mut self, options: Vec<OptionSpec>) -> Self {
        self.options = Some(options);
        self
    }

    #[must_use]
    pub fn submenu_callback(
        mut self,
        callback: impl FnMut(&mut SubmenuContext<'_>) + 'static,
    ) -> Self {
        self.submenu_callback = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Validate into the tagged form, reporting violations at `path`.
    pub fn into_option(self, path: &OptionPath) -> Result<FlyoutMenuOption, ConfigError> {
        let path = path.clone();
        let has_submenu_fields =
            self.is_submenu || self.options.is_some() || self.submenu_callback.is_some();
        if (self.text.is_some() || self.html.is_some()) && has_submenu_fields {
            return Err(ConfigError::InertWithSubmenu { path });
        }

        if self.is_submenu {
            let label = self
                .label
                .unwrap_or_else(|| DEFAULT_SUBMENU_LABEL.to_string());
            return match (self.options, self.submenu_callback, self.callback) {
                (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                    Err(ConfigError::SubmenuWithBoth { path })
                }
                (Some(specs), None, None) => Ok(FlyoutMenuOption::SubmenuByList {
                    label,
                    options: specs_into_options(specs, &path)?,
                }),
                (None, Some(callback), None) => {
                    Ok(FlyoutMenuOption::SubmenuByCallback { label, callback })
                }
                (None, None, None) => Err(ConfigError::SubmenuWithoutContent { path }),
                (None, _, Some(_)) => Err(ConfigError::AmbiguousOption { path }),
            };
        }
        if has_submenu_fields {
            return Err(ConfigError::AmbiguousOption { path });
        }

        let leaf = self.label.is_some() || self.callback.is_some();
        let kinds = [leaf, self.text.is_some(), self.html.is_some()]
            .into_iter()
            .filter(|&k| k)
            .count();
        if kinds != 1 {
            return Err(ConfigError::AmbiguousOption { path });
        }
        match (self.label, self.callback, self.text, self.html) {
            (Some(label), Some(callback), _, _) => {
                Ok(FlyoutMenuOption::LabeledAction { label, callback })
            }
            (Some(_), None, _, _) => Err(ConfigError::LabelWithoutCallback { path }),
            (None, Some(_), _, _) => Err(ConfigError::CallbackWithoutLabel { path }),
            (None, None, Some(text), _) => Ok(FlyoutMenuOption::SectionText { text }),
            (None, None, None, Some(html)) => Ok(FlyoutMenuOption::RawContent { html }),
            (None, None, None, None) => Err(ConfigError::AmbiguousOption { path }),
        }
    }
}

/// Validate a whole list of loose options.
pub fn specs_into_options(
    specs: Vec<OptionSpec>,
    path: &OptionPath,
) -> Result<Vec<FlyoutMenuOption>, ConfigError> {
    if specs.is_empty() {
        return Err(ConfigError::EmptyOptions { path: path.clone() });
    }
    specs
        .into_iter()
        .enumerate()
        .map(|(i, spec)| spec.into_option(&path.child(i)))
        .collect()
}

impl TryFrom<OptionSpec> for FlyoutMenuOption {
    type Error = ConfigError;

    fn try_from(spec: OptionSpec) -> Result<Self, Self::Error> {
        spec.into_option(&OptionPath(vec![0]))
    }
}

/// Context handed to leaf callbacks.
#[derive(Debug)]
pub struct ActionContext {
    label: String,
    depth: usize,
    row: NodeId,
    close_requested: bool,
}

impl ActionContext {
    pub(crate) fn new(label: String, depth: usize, row: NodeId) -> Self {
        Self {
            label,
            depth,
            row,
            close_requested: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Depth of the level the activated row lives in.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn row(&self) -> NodeId {
        self.row
    }

    /// Collapse the whole hierarchy once the callback returns.
    pub fn close_menus(&mut self) {
        self.close_requested = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }
}

/// Identifies one population of a submenu level.
///
/// A ticket goes stale as soon as its level is reused for another trigger or
/// closed; [`MenuHierarchy::populate`](super::MenuHierarchy::populate) then
/// refuses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PopulateTicket {
    pub depth: usize,
    pub generation: u64,
}

/// Context handed to dynamic-submenu callbacks.
pub struct SubmenuContext<'a> {
    surface: &'a mut dyn Surface,
    panel: PanelId,
    content: NodeId,
    ticket: PopulateTicket,
    pending: Option<Vec<FlyoutMenuOption>>,
}

impl<'a> SubmenuContext<'a> {
    pub(crate) fn new(
        surface: &'a mut dyn Surface,
        panel: PanelId,
        content: NodeId,
        ticket: PopulateTicket,
    ) -> Self {
        Self {
            surface,
            panel,
            content,
            ticket,
            pending: None,
        }
    }

    /// Panel serving the new level.
    pub fn panel(&self) -> PanelId {
        self.panel
    }

    /// Content region of the new level.
    pub fn content(&self) -> NodeId {
        self.content
    }

    pub fn depth(&self) -> usize {
        self.ticket.depth
    }

    /// Ticket for populating the level later.
    pub fn ticket(&self) -> PopulateTicket {
        self.ticket
    }

    pub fn surface(&mut self) -> &mut (dyn Surface + 'a) {
        &mut *self.surface
    }

    /// Append arbitrary content to the new level.
    pub fn append(&mut self, content: Content) -> Option<NodeId> {
        self.surface.append(self.content, content)
    }

    /// Render an option list into the new level as menu rows once the
    /// callback returns.
    pub fn render_options(&mut self, options: Vec<FlyoutMenuOption>) -> Result<(), ConfigError> {
        validate_options(&options)?;
        self.pending.get_or_insert_with(Vec::new).extend(options);
        Ok(())
    }

    pub(crate) fn take_pending(&mut self) -> Option<Vec<FlyoutMenuOption>> {
        self.pending.take()
    }
}

impl fmt::Debug for SubmenuContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmenuContext")
            .field("panel", &self.panel)
            .field("content", &self.content)
            .field("ticket", &self.ticket)
            .field("pending", &self.pending.as_ref().map(Vec::len))
            .finish()
    }
}
