#![forbid(unsafe_code)]

//! The rendering-surface contract consumed by panels and menus.
//!
//! A [`Surface`] owns one top-level overlay container. Panels ask it for a
//! single region each, append content into that region, position it with a
//! [`Placement`], and measure it. The surface also answers the questions the
//! outside-dismissal protocol needs: which node is under the pointer, which
//! overlay region contains a node, whether a node handles pointer input on
//! its own, and which panel a node declares as its parent.

use std::sync::atomic::{AtomicU64, Ordering};

use flyout_core::geometry::Rect;

/// Identifier of a node (region, row, text block, page element) in a surface.
///
/// Ids are never reused; a removed node's id simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a node ID from a raw value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u32 {
        self.0
    }
}

/// Opaque unique token identifying one panel.
///
/// Used to key per-panel listeners and to express parent/ancestor
/// back-references without ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(u64);

static NEXT_PANEL_ID: AtomicU64 = AtomicU64::new(1);

impl PanelId {
    /// Allocate a fresh, process-unique token.
    pub fn next() -> Self {
        Self(NEXT_PANEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw token value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PanelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "panel#{}", self.0)
    }
}

/// Current viewport dimensions and document scroll offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
}

impl Viewport {
    /// An unscrolled viewport of the given size.
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    /// Horizontal midpoint in viewport coordinates.
    #[inline]
    pub fn mid_x(&self) -> f32 {
        self.width / 2.0
    }

    /// The viewport as a rectangle in viewport coordinates.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Horizontal anchoring of a region, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HAnchor {
    /// Left edge at this x.
    Left(f32),
    /// Right edge at this distance from the container's right edge.
    Right(f32),
}

/// Vertical anchoring of a region, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VAnchor {
    /// Top edge at this y.
    Top(f32),
    /// Bottom edge at this distance from the container's bottom edge.
    Bottom(f32),
}

/// Where a region sits inside the overlay container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub horizontal: HAnchor,
    pub vertical: VAnchor,
}

impl Placement {
    /// Top-left anchored placement.
    pub const fn at(x: f32, y: f32) -> Self {
        Self {
            horizontal: HAnchor::Left(x),
            vertical: VAnchor::Top(y),
        }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::at(0.0, 0.0)
    }
}

/// Display state of a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visibility {
    /// Whether the region takes part in layout and hit testing.
    pub displayed: bool,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
}

impl Visibility {
    pub const SHOWN: Self = Self {
        displayed: true,
        opacity: 1.0,
    };
    pub const HIDDEN: Self = Self {
        displayed: false,
        opacity: 0.0,
    };
}

/// What a content node is.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentKind {
    /// Plain text, optionally dimmed (section headings, confirmations).
    Text { text: String, dimmed: bool },
    /// Caller-supplied markup, rendered inert.
    Markup(String),
    /// A focusable, clickable menu row.
    Row { label: String, has_submenu: bool },
    /// An interactive control with its own pointer handling (input, select, text area).
    Control { label: String },
    /// A container other content can be appended into.
    Group,
}

/// A node to append into a region or group.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub kind: ContentKind,
    /// Class tag, matched by panel clear selectors.
    pub class: Option<String>,
    /// Whether the node handles pointer input itself.
    pub instrumented: bool,
}

impl Content {
    fn of(kind: ContentKind) -> Self {
        Self {
            kind,
            class: None,
            instrumented: false,
        }
    }

    /// Plain text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::of(ContentKind::Text {
            text: text.into(),
            dimmed: false,
        })
    }

    /// Dimmed text block.
    pub fn dimmed_text(text: impl Into<String>) -> Self {
        Self::of(ContentKind::Text {
            text: text.into(),
            dimmed: true,
        })
    }

    /// Inert markup block.
    pub fn markup(html: impl Into<String>) -> Self {
        Self::of(ContentKind::Markup(html.into()))
    }

    /// Clickable row.
    pub fn row(label: impl Into<String>, has_submenu: bool) -> Self {
        Self::of(ContentKind::Row {
            label: label.into(),
            has_submenu,
        })
    }

    /// Interactive control; always instrumented.
    pub fn control(label: impl Into<String>) -> Self {
        Self {
            instrumented: true,
            ..Self::of(ContentKind::Control {
                label: label.into(),
            })
        }
    }

    /// Empty container.
    pub fn group() -> Self {
        Self::of(ContentKind::Group)
    }

    /// Tag the node with a class.
    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Mark the node as handling pointer input itself.
    #[must_use]
    pub fn instrumented(mut self, instrumented: bool) -> Self {
        self.instrumented = instrumented;
        self
    }
}

/// Text alignment of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Right,
}

/// Submenu indicator placement on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Glyph before the label, pointing left.
    Leading,
    /// Glyph after the label, pointing right.
    Trailing,
}

impl Indicator {
    /// Display glyph.
    pub const fn glyph(self) -> char {
        match self {
            Self::Leading => '\u{2039}',  // ‹
            Self::Trailing => '\u{203A}', // ›
        }
    }
}

/// Side-dependent presentation of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowStyle {
    pub align: TextAlign,
    pub indicator: Option<Indicator>,
    pub focused: bool,
}

/// A rendering surface hosting overlay regions.
pub trait Surface {
    /// Current viewport size and scroll offset.
    fn viewport(&self) -> Viewport;

    /// Create a new, hidden overlay region attached to the top-level container.
    fn create_region(&mut self) -> NodeId;

    /// Detach a region (and its content) permanently.
    fn detach(&mut self, region: NodeId);

    /// Whether `region` is still attached to the container.
    fn is_attached(&self, region: NodeId) -> bool;

    /// Re-attach `region` as the last child of the container so it stacks on top.
    fn raise(&mut self, region: NodeId);

    fn set_placement(&mut self, region: NodeId, placement: Placement);

    fn set_visibility(&mut self, region: NodeId, visibility: Visibility);

    fn visibility(&self, region: NodeId) -> Option<Visibility>;

    /// Append content under `parent` (a region or group). Returns `None` if
    /// the parent no longer exists.
    fn append(&mut self, parent: NodeId, content: Content) -> Option<NodeId>;

    /// Remove the content of `region`; with a selector, only nodes whose class
    /// matches (together with their subtrees).
    fn clear(&mut self, region: NodeId, selector: Option<&str>);

    /// Bounding rectangle of `node` in viewport coordinates. A region that is
    /// not displayed (or content inside one) measures as an empty rectangle.
    /// `None` when the node does not exist.
    fn bounding_rect(&self, node: NodeId) -> Option<Rect>;

    /// Nearest overlay region containing `node` (a region contains itself).
    fn region_of(&self, node: NodeId) -> Option<NodeId>;

    /// Whether `node` handles pointer input on its own.
    fn is_instrumented(&self, node: NodeId) -> bool;

    /// The panel `node` declares as its parent (e.g. the button that opens it).
    fn declared_parent(&self, node: NodeId) -> Option<PanelId>;

    fn set_declared_parent(&mut self, node: NodeId, panel: Option<PanelId>);

    fn set_row_style(&mut self, node: NodeId, style: RowStyle);

    /// Topmost displayed node under the viewport point `(x, y)`.
    fn hit_test(&self, x: f32, y: f32) -> Option<NodeId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_ids_are_unique() {
        let a = PanelId::next();
        let b = PanelId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn content_builders() {
        let c = Content::control("Name").class("field");
        assert!(c.instrumented);
        assert_eq!(c.class.as_deref(), Some("field"));
        let row = Content::row("Open", true);
        assert!(!row.instrumented);
        assert_eq!(
            row.kind,
            ContentKind::Row {
                label: "Open".into(),
                has_submenu: true
            }
        );
    }

    #[test]
    fn viewport_mid() {
        let vp = Viewport::new(1000.0, 800.0);
        assert_eq!(vp.mid_x(), 500.0);
        assert_eq!(vp.rect().right(), 1000.0);
    }
}
