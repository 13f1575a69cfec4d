#![forbid(unsafe_code)]

//! Submenu side selection and placement.
//!
//! The side of a new submenu is decided before its content exists, so the
//! algorithm works from a fixed estimated size and the measured
//! [`MenuPosition`] of the parent level:
//!
//! - depth 1 opens toward the free side of the root (a root on the left
//!   half with room on its right opens right, and vice versa), falling back
//!   to whichever side has strictly more free space;
//! - deeper levels zig-zag: they open opposite to the parent's side when
//!   that side fits the estimated width, otherwise toward the larger free
//!   space.
//!
//! The result is clamped so the estimated box stays inside the viewport.

use flyout_core::geometry::Rect;
use flyout_render::Viewport;

/// Horizontal side of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Placement heuristics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementConfig {
    /// Assumed width of a submenu not yet rendered (default: 250).
    pub estimated_width: f32,
    /// Assumed height of a submenu not yet rendered (default: 300).
    pub estimated_height: f32,
    /// Free space a side needs to count as having room (default: 200).
    pub min_submenu_width: f32,
    /// Gap between the parent's right edge and a right-opening submenu (default: 10).
    pub right_gap: f32,
    /// Gap between the parent's left edge and a left-opening submenu (default: 2).
    pub left_gap: f32,
    /// Minimum distance from the viewport's left and right edges (default: 10).
    pub margin: f32,
    /// Vertical offset below the trigger row's top edge (default: 10).
    pub trigger_offset: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            estimated_width: 250.0,
            estimated_height: 300.0,
            min_submenu_width: 200.0,
            right_gap: 10.0,
            left_gap: 2.0,
            margin: 10.0,
            trigger_offset: 10.0,
        }
    }
}

impl PlacementConfig {
    #[must_use]
    pub fn estimated_size(mut self, width: f32, height: f32) -> Self {
        self.estimated_width = width;
        self.estimated_height = height;
        self
    }

    #[must_use]
    pub fn min_submenu_width(mut self, width: f32) -> Self {
        self.min_submenu_width = width;
        self
    }

    #[must_use]
    pub fn gaps(mut self, right: f32, left: f32) -> Self {
        self.right_gap = right;
        self.left_gap = left;
        self
    }

    #[must_use]
    pub fn margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    #[must_use]
    pub fn trigger_offset(mut self, offset: f32) -> Self {
        self.trigger_offset = offset;
        self
    }
}

/// Measured placement of one menu level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuPosition {
    /// Bounding box in viewport coordinates.
    pub rect: Rect,
    /// `Left` when the box's horizontal center lies left of the viewport midpoint.
    pub side: Side,
    /// Free viewport space left of the box.
    pub free_left: f32,
    /// Free viewport space right of the box.
    pub free_right: f32,
    pub space_on_left: bool,
    pub space_on_right: bool,
}

impl MenuPosition {
    pub fn from_rect(rect: Rect, viewport: Viewport, min_submenu_width: f32) -> Self {
        let side = if rect.center_x() < viewport.mid_x() {
            Side::Left
        } else {
            Side::Right
        };
        let free_left = rect.left();
        let free_right = viewport.width - rect.right();
        Self {
            rect,
            side,
            free_left,
            free_right,
            space_on_left: free_left >= min_submenu_width,
            space_on_right: free_right >= min_submenu_width,
        }
    }

    /// Side with strictly more free space; ties go left.
    pub fn roomier_side(&self) -> Side {
        if self.free_right > self.free_left {
            Side::Right
        } else {
            Side::Left
        }
    }

    fn free(&self, side: Side) -> f32 {
        match side {
            Side::Left => self.free_left,
            Side::Right => self.free_right,
        }
    }
}

/// Where to show a submenu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmenuPlacement {
    pub x: f32,
    pub y: f32,
    pub side: Side,
}

/// Side a submenu at `depth` opens toward, given its parent level.
pub fn choose_side(parent: &MenuPosition, depth: usize, config: &PlacementConfig) -> Side {
    if depth <= 1 {
        match parent.side {
            Side::Left if parent.space_on_right => Side::Right,
            Side::Right if parent.space_on_left => Side::Left,
            _ => parent.roomier_side(),
        }
    } else {
        let preferred = parent.side.opposite();
        if parent.free(preferred) >= config.estimated_width {
            preferred
        } else {
            parent.roomier_side()
        }
    }
}

/// Position of a submenu at `depth` opened from `trigger` inside `parent`.
pub fn place_submenu(
    parent: &MenuPosition,
    trigger: Rect,
    depth: usize,
    viewport: Viewport,
    config: &PlacementConfig,
) -> SubmenuPlacement {
    let side = choose_side(parent, depth, config);
    let x = match side {
        Side::Right => parent.rect.right() + config.right_gap,
        Side::Left => parent.rect.left() - config.estimated_width - config.left_gap,
    };
    let y = (trigger.top() + config.trigger_offset)
        .min(viewport.height - config.estimated_height)
        .max(0.0);
    let x = x
        .min(viewport.width - config.estimated_width - config.margin)
        .max(config.margin);
    flyout_core::trace!(depth, ?side, x, y, "submenu placed");
    SubmenuPlacement { x, y, side }
}
