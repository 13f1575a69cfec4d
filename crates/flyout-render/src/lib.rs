#![forbid(unsafe_code)]

//! Rendering-surface contract for Flyout overlays, plus [`scene::Scene`], a
//! headless surface used by tests and non-graphical hosts.

pub mod scene;
pub mod surface;

pub use scene::{Scene, SceneMetrics, row_display};
pub use surface::{
    Content, ContentKind, HAnchor, Indicator, NodeId, PanelId, Placement, RowStyle, Surface,
    TextAlign, VAnchor, Viewport, Visibility,
};
