#![forbid(unsafe_code)]

//! Flyout public facade crate.
//!
//! Re-exports the panel, overlay and menu types from the internal crates and
//! offers a prelude for day-to-day usage.
//!
//! ```
//! use flyout::prelude::*;
//!
//! let mut host = OverlayHost::new(Scene::new(1024.0, 768.0));
//! let mut menu = MenuHierarchy::new(
//!     &mut host,
//!     MenuConfig::new(vec![
//!         FlyoutMenuOption::action("Copy", |ctx| ctx.close_menus()),
//!         FlyoutMenuOption::submenu("Export", vec![FlyoutMenuOption::action("PNG", |_| {})]),
//!     ]),
//! )?;
//! host.panel_mut(menu.root())?.show(40.0, 40.0, ShowOptions::default());
//! let export = menu.rows(0)[1];
//! menu.activate(&mut host, export)?;
//! assert_eq!(menu.current_depth(), 1);
//! menu.close_menus(&mut host)?;
//! # Ok::<(), flyout::Error>(())
//! ```

// --- Core re-exports -------------------------------------------------------

pub use flyout_core::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, PointerButton, PointerEvent,
    PointerEventKind,
};
pub use flyout_core::geometry::{Point, Rect, Sides, Size};
#[cfg(feature = "tracing-json")]
pub use flyout_core::logging::init_json_logging;

// --- Render re-exports -----------------------------------------------------

pub use flyout_render::{
    Content, ContentKind, HAnchor, Indicator, NodeId, PanelId, Placement, RowStyle, Scene,
    SceneMetrics, Surface, TextAlign, VAnchor, Viewport, Visibility,
};

// --- Widget re-exports -----------------------------------------------------

pub use flyout_widgets::{
    ActionContext, Activation, ConfigError, DismissReport, FlyoutMenuOption, MenuConfig,
    MenuEvent, MenuHierarchy, MenuLevel, MenuPosition, OptionPath, OptionSpec, OverlayHost, Panel,
    PanelConfig, PanelError, PanelMut, PlacementConfig, PopulateTicket, ShowOptions,
    ShowUnderOptions, Side, SubmenuContext, SubmenuPlacement,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type; configuration and panel failures both convert into it.
pub type Error = flyout_widgets::MenuError;

/// Standard result type for flyout APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ActionContext, Content, Error, Event, FlyoutMenuOption, MenuConfig, MenuEvent,
        MenuHierarchy, OverlayHost, PanelConfig, PointerEvent, Result, Scene, ShowOptions,
        SubmenuContext, Surface,
    };

    pub use crate::{core, render, widgets};
}

pub use flyout_core as core;
pub use flyout_render as render;
pub use flyout_widgets as widgets;
