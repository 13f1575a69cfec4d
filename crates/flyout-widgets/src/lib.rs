#![forbid(unsafe_code)]

//! Floating panels and cascading menus for Flyout.
//!
//! - [`panel`]: one overlay region with show/hide/toggle/confirm and
//!   viewport clamping.
//! - [`overlay`]: the host owning the surface and every panel, running the
//!   ancestor-aware outside-dismissal protocol and fade timers.
//! - [`menu`]: [`MenuHierarchy`], which opens one panel per submenu depth
//!   and decides which side each submenu opens toward.

pub mod error;
pub mod menu;
pub mod overlay;
pub mod panel;

pub use error::{ConfigError, MenuError, OptionPath, PanelError};
pub use menu::{
    ActionContext, Activation, FlyoutMenuOption, MenuConfig, MenuEvent, MenuHierarchy, MenuLevel,
    MenuPosition, OptionSpec, PlacementConfig, PopulateTicket, Side, SubmenuContext,
    SubmenuPlacement,
};
pub use overlay::{DismissReport, OverlayHost, PanelMut};
pub use panel::{Panel, PanelConfig, ShowOptions, ShowUnderOptions};
