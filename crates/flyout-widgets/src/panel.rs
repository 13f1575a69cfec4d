#![forbid(unsafe_code)]

//! Floating panel: one overlay region that can be shown, hidden, cleared and
//! faded out.
//!
//! A panel owns exactly one region of the surface's overlay container. The
//! region is created with the panel and reused for its whole lifetime:
//! showing re-raises it, clearing empties it, nothing recreates it.
//!
//! # Invariants
//!
//! 1. At most one region per panel, created at construction.
//! 2. While a fade-out timer is pending, `hide()` is a no-op.
//! 3. A hide triggered by a pointer event that moved less than both mute
//!    thresholds since the last `show` is ignored.
//! 4. The `hidden` flag is tracked independently of the region's styling, so
//!    `toggle()` alternates reliably.
//!
//! # Example
//!
//! ```ignore
//! let mut panel = Panel::new(&mut scene, PanelConfig::default().hide_mute(5.0, 5.0));
//! panel.clear(&mut scene).show(&mut scene, 100.0, 100.0, ShowOptions::default());
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use flyout_core::event::PointerEvent;
use flyout_core::geometry::{Point, Size};
use flyout_render::{Content, HAnchor, NodeId, PanelId, Placement, Surface, VAnchor, Visibility};

use crate::error::PanelError;

/// Hook invoked after a panel transitions from shown to hidden.
pub type HideHook = Box<dyn FnMut(PanelId)>;

/// Panel configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    /// Horizontal shift away from the anchor when showing with `shift` (default: 20).
    pub offset_x: f32,
    /// Vertical shift away from the anchor when showing with `shift` (default: 20).
    pub offset_y: f32,
    /// Pointer-driven hides moving less than this in x (and y) are ignored (default: 0).
    pub hide_x_mute: f32,
    /// Pointer-driven hides moving less than this in y (and x) are ignored (default: 0).
    pub hide_y_mute: f32,
    /// Restrict `clear()` to nodes with this class.
    pub clear_selector: Option<String>,
    /// The panel this one was opened from.
    pub parent_panel: Option<PanelId>,
    /// Every panel above this one, root first.
    pub ancestor_panels: Vec<PanelId>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            offset_x: 20.0,
            offset_y: 20.0,
            hide_x_mute: 0.0,
            hide_y_mute: 0.0,
            clear_selector: None,
            parent_panel: None,
            ancestor_panels: Vec::new(),
        }
    }
}

impl PanelConfig {
    /// Set the anchor offsets applied when shifting.
    #[must_use]
    pub fn offset(mut self, x: f32, y: f32) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    /// Set the pointer-movement mute thresholds for hides.
    #[must_use]
    pub fn hide_mute(mut self, x: f32, y: f32) -> Self {
        self.hide_x_mute = x;
        self.hide_y_mute = y;
        self
    }

    /// Restrict `clear()` to nodes carrying `class`.
    #[must_use]
    pub fn clear_selector(mut self, class: impl Into<String>) -> Self {
        self.clear_selector = Some(class.into());
        self
    }

    /// Declare the panel this one is opened from.
    #[must_use]
    pub fn parent(mut self, parent: PanelId) -> Self {
        self.parent_panel = Some(parent);
        self
    }

    /// Declare the full chain of panels above this one.
    #[must_use]
    pub fn ancestors(mut self, ancestors: Vec<PanelId>) -> Self {
        self.ancestor_panels = ancestors;
        self
    }
}

/// How `show()` turns an anchor point into a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowOptions {
    /// Apply `offset_x`/`offset_y` (default: true).
    pub shift: bool,
    /// Keep the panel below the anchor even without room (default: true).
    pub prefer_below: bool,
    /// Treat the anchor as viewport coordinates and add the scroll offset (default: true).
    pub add_scroll_offset: bool,
}

impl Default for ShowOptions {
    fn default() -> Self {
        Self {
            shift: true,
            prefer_below: true,
            add_scroll_offset: true,
        }
    }
}

impl ShowOptions {
    /// Exact placement at an already computed position.
    pub const fn exact() -> Self {
        Self {
            shift: false,
            prefer_below: true,
            add_scroll_offset: false,
        }
    }

    #[must_use]
    pub fn shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }

    #[must_use]
    pub fn prefer_below(mut self, prefer: bool) -> Self {
        self.prefer_below = prefer;
        self
    }

    #[must_use]
    pub fn add_scroll_offset(mut self, add: bool) -> Self {
        self.add_scroll_offset = add;
        self
    }
}

/// Options for [`Panel::show_under`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShowUnderOptions {
    /// Vertical gap between the anchor's bottom edge and the panel (default: 5).
    pub gap: f32,
    pub prefer_below: bool,
}

impl Default for ShowUnderOptions {
    fn default() -> Self {
        Self {
            gap: 5.0,
            prefer_below: true,
        }
    }
}

/// A floating overlay panel.
pub struct Panel {
    id: PanelId,
    region: NodeId,
    config: PanelConfig,
    hidden: bool,
    prev: Point,
    fade_deadline: Option<Instant>,
    on_hide: Option<HideHook>,
    destroyed: bool,
}

impl fmt::Debug for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Panel")
            .field("id", &self.id)
            .field("region", &self.region)
            .field("hidden", &self.hidden)
            .field("prev", &self.prev)
            .field("fade_deadline", &self.fade_deadline)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl Panel {
    /// Create a panel and its (hidden) overlay region.
    pub fn new<S: Surface + ?Sized>(surface: &mut S, config: PanelConfig) -> Self {
        let region = surface.create_region();
        let id = PanelId::next();
        flyout_core::trace!(panel = %id, region = region.id(), "panel created");
        Self {
            id,
            region,
            config,
            hidden: true,
            prev: Point::ORIGIN,
            fade_deadline: None,
            on_hide: None,
            destroyed: false,
        }
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    /// The panel's region; content is appended here.
    pub fn content(&self) -> NodeId {
        self.region
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn parent(&self) -> Option<PanelId> {
        self.config.parent_panel
    }

    pub fn ancestors(&self) -> &[PanelId] {
        &self.config.ancestor_panels
    }

    /// Re-declare where this panel sits in a chain of panels.
    pub fn set_lineage(&mut self, parent: Option<PanelId>, ancestors: Vec<PanelId>) {
        self.config.parent_panel = parent;
        self.config.ancestor_panels = ancestors;
    }

    /// Anchor passed to the last `show`.
    pub fn prev_anchor(&self) -> Point {
        self.prev
    }

    /// Whether a fade-out timer is pending.
    pub fn fade_pending(&self) -> bool {
        self.fade_deadline.is_some()
    }

    /// Install the hook called after each shown → hidden transition.
    pub fn set_on_hide(&mut self, hook: impl FnMut(PanelId) + 'static) {
        self.on_hide = Some(Box::new(hook));
    }

    /// Whether `node` lies inside this panel's region.
    pub fn contains<S: Surface + ?Sized>(&self, surface: &S, node: NodeId) -> bool {
        surface.region_of(node) == Some(self.region)
    }

    /// Show the panel at the anchor `(x, y)`.
    ///
    /// The region is raised to the top of the overlay container, displayed,
    /// and anchored from its left/top edges when it fits; otherwise from the
    /// right edge (no horizontal room) or bottom edge (no room below and
    /// `prefer_below` unset).
    pub fn show<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        x: f32,
        y: f32,
        options: ShowOptions,
    ) -> &mut Self {
        if self.destroyed {
            return self;
        }
        surface.raise(self.region);
        surface.set_visibility(self.region, Visibility::SHOWN);
        self.hidden = false;
        self.prev = Point::new(x, y);

        let vp = surface.viewport();
        let size = surface
            .bounding_rect(self.region)
            .map_or(Size::ZERO, |r| r.size());
        let (sx, sy) = if options.add_scroll_offset {
            (vp.scroll_x, vp.scroll_y)
        } else {
            (0.0, 0.0)
        };
        let (dx, dy) = if options.shift {
            (self.config.offset_x, self.config.offset_y)
        } else {
            (0.0, 0.0)
        };

        let horizontal = if x + dx + size.width <= vp.width {
            HAnchor::Left(x + dx + sx)
        } else {
            HAnchor::Right(vp.width - x + dx - sx)
        };
        let vertical = if y + dy + size.height <= vp.height || options.prefer_below {
            VAnchor::Top(y + dy + sy)
        } else {
            VAnchor::Bottom(vp.height - y + dy - sy)
        };
        surface.set_placement(
            self.region,
            Placement {
                horizontal,
                vertical,
            },
        );
        flyout_core::debug!(panel = %self.id, x, y, ?horizontal, ?vertical, "panel shown");
        self
    }

    /// Show the panel directly beneath `anchor`.
    pub fn show_under<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        anchor: NodeId,
        options: ShowUnderOptions,
    ) -> Result<&mut Self, PanelError> {
        let rect = surface
            .bounding_rect(anchor)
            .ok_or(PanelError::AnchorUnavailable(anchor))?;
        Ok(self.show(
            surface,
            rect.left(),
            rect.bottom() + options.gap,
            ShowOptions::default()
                .shift(false)
                .prefer_below(options.prefer_below),
        ))
    }

    /// Hide the panel.
    ///
    /// Ignored while a fade-out is pending, and (when `event` is given) when
    /// the pointer moved less than both mute thresholds since the last show.
    pub fn hide<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        event: Option<&PointerEvent>,
    ) -> &mut Self {
        if self.fade_deadline.is_some() {
            flyout_core::trace!(panel = %self.id, "hide ignored: fade pending");
            return self;
        }
        if let Some(ev) = event
            && self.is_muted(ev)
        {
            flyout_core::trace!(panel = %self.id, x = ev.x, y = ev.y, "hide muted");
            return self;
        }
        self.force_hide(surface);
        self
    }

    fn is_muted(&self, ev: &PointerEvent) -> bool {
        (ev.x - self.prev.x).abs() < self.config.hide_x_mute
            && (ev.y - self.prev.y).abs() < self.config.hide_y_mute
    }

    fn force_hide<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        surface.set_visibility(self.region, Visibility::HIDDEN);
        let was_shown = !self.hidden;
        self.hidden = true;
        if was_shown {
            flyout_core::debug!(panel = %self.id, "panel hidden");
            if let Some(hook) = self.on_hide.as_mut() {
                hook(self.id);
            }
        }
    }

    /// Show at the last anchor if hidden, hide if shown.
    pub fn toggle<S: Surface + ?Sized>(&mut self, surface: &mut S) -> &mut Self {
        if self.hidden {
            let Point { x, y } = self.prev;
            self.show(surface, x, y, ShowOptions::default())
        } else {
            self.hide(surface, None)
        }
    }

    /// Remove rendered content (only nodes matching the clear selector, if set).
    pub fn clear<S: Surface + ?Sized>(&mut self, surface: &mut S) -> &mut Self {
        surface.clear(self.region, self.config.clear_selector.as_deref());
        self
    }

    /// Replace the content with a transient message.
    ///
    /// With a timeout, the panel fades out and hides once [`tick`](Self::tick)
    /// observes the deadline; until then ordinary hides are suppressed.
    pub fn confirm<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        content: Content,
        timeout: Option<Duration>,
        now: Instant,
    ) -> &mut Self {
        surface.clear(self.region, None);
        surface.append(self.region, content);
        if let Some(timeout) = timeout {
            self.fade_deadline = Some(now + timeout);
        }
        self
    }

    /// Arm the fade-out timer without touching the content.
    pub fn fade_out(&mut self, after: Duration, now: Instant) -> &mut Self {
        self.fade_deadline = Some(now + after);
        self
    }

    /// Advance timers. Returns `true` if a pending fade-out completed.
    pub fn tick<S: Surface + ?Sized>(&mut self, surface: &mut S, now: Instant) -> bool {
        match self.fade_deadline {
            Some(deadline) if now >= deadline => {
                self.fade_deadline = None;
                surface.set_visibility(
                    self.region,
                    Visibility {
                        displayed: true,
                        opacity: 0.0,
                    },
                );
                self.force_hide(surface);
                true
            }
            _ => false,
        }
    }

    /// Detach the region permanently.
    pub fn destroy<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        if self.destroyed {
            return;
        }
        surface.detach(self.region);
        self.destroyed = true;
        self.hidden = true;
        self.fade_deadline = None;
        flyout_core::debug!(panel = %self.id, "panel destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flyout_core::geometry::Rect;
    use flyout_render::{Scene, SceneMetrics};
    use std::cell::Cell;
    use std::rc::Rc;

    fn scene() -> Scene {
        Scene::new(1000.0, 800.0)
    }

    #[test]
    fn new_panel_is_hidden_with_one_region() {
        let mut s = scene();
        let p = Panel::new(&mut s, PanelConfig::default());
        assert!(p.is_hidden());
        assert_eq!(s.stacking_order(), &[p.content()]);
        assert_eq!(s.bounding_rect(p.content()), Some(Rect::default()));
    }

    #[test]
    fn show_applies_offset_and_records_anchor() {
        let mut s = scene();
        let mut p = Panel::new(&mut s, PanelConfig::default());
        p.show(&mut s, 100.0, 100.0, ShowOptions::default());
        assert!(!p.is_hidden());
        assert_eq!(p.prev_anchor(), Point::new(100.0, 100.0));
        let r = s.bounding_rect(p.content()).unwrap();
        assert_eq!((r.x, r.y), (120.0, 120.0));
    }

    #[test]
    fn show_without_shift_is_exact() {
        let mut s = scene();
        let mut p = Panel::new(&mut s, PanelConfig::default());
        p.show(&mut s, 40.0, 50.0, ShowOptions::default().shift(false));
        let r = s.bounding_rect(p.content()).unwrap();
        assert_eq!((r.x, r.y), (40.0, 50.0));
    }

    #[test]
    fn show_adds_scroll_offset_to_document_position() {
        let mut s = scene();
        s.scroll_to(0.0, 300.0);
        let mut p = Panel::new(&mut s, PanelConfig::default());
        p.show(&mut s, 40.0, 50.0, ShowOptions::default().shift(false));
        assert_eq!(
            s.placement(p.content()).unwrap().vertical,
            VAnchor::Top(350.0)
        );
        // Still lands under the pointer in viewport coordinates.
        assert_eq!(s.bounding_rect(p.content()).unwrap().y, 50.0);
    }

    #[test]
    fn show_anchors_right_when_no_horizontal_room() {
        let mut s = scene().with_metrics(SceneMetrics::default().min_region_width(200.0));
        let mut p = Panel::new(&mut s, PanelConfig::default());
        p.show(&mut s, 900.0, 100.0, ShowOptions::default());
        let r = s.bounding_rect(p.content()).unwrap();
        // Right edge sits offset_x left of the anchor.
        assert_eq!(r.right(), 880.0);
        assert!(matches!(
            s.placement(p.content()).unwrap().horizontal,
            HAnchor::Right(_)
        ));
    }

    #[test]
    fn show_anchors_bottom_only_without_prefer_below() {
        let mut s = scene();
        let mut p = Panel::new(&mut s, PanelConfig::default());
        for _ in 0..10 {
            s.append(p.content(), Content::row("item", false));
        }
        p.show(&mut s, 100.0, 700.0, ShowOptions::default());
        assert!(matches!(
            s.placement(p.content()).unwrap().vertical,
            VAnchor::Top(_)
        ));
        p.show(&mut s, 100.0, 700.0, ShowOptions::default().prefer_below(false));
        let r = s.bounding_rect(p.content()).unwrap();
        assert_eq!(r.bottom(), 680.0);
    }

    #[test]
    fn hide_mute_suppresses_small_motion() {
        let mut s = scene();
        let mut p = Panel::new(&mut s, PanelConfig::default().hide_mute(5.0, 5.0));
        p.show(&mut s, 100.0, 100.0, ShowOptions::default());
        p.hide(&mut s, Some(&PointerEvent::moved(102.0, 101.0)));
        assert!(!p.is_hidden());
        p.hide(&mut s, Some(&PointerEvent::moved(120.0, 100.0)));
        assert!(p.is_hidden());
    }

    #[test]
    fn hide_without_event_ignores_mute() {
        let mut s = scene();
        let mut p = Panel::new(&mut s, PanelConfig::default().hide_mute(5.0, 5.0));
        p.show(&mut s, 100.0, 100.0, ShowOptions::default());
        p.hide(&mut s, None);
        assert!(p.is_hidden());
    }

    #[test]
    fn toggle_alternates() {
        let mut s = scene();
        let mut p = Panel::new(&mut s, PanelConfig::default());
        p.toggle(&mut s);
        assert!(!p.is_hidden());
        p.toggle(&mut s);
        assert!(p.is_hidden());
        p.toggle(&mut s);
        assert!(!p.is_hidden());
    }

    #[test]
    fn on_hide_runs_once_per_transition() {
        let mut s = scene();
        let count = Rc::new(Cell::new(0));
        let seen = count.clone();
        let mut p = Panel::new(&mut s, PanelConfig::default());
        p.set_on_hide(move |_| seen.set(seen.get() + 1));
        p.hide(&mut s, None);
        assert_eq!(count.get(), 0);
        p.show(&mut s, 0.0, 0.0, ShowOptions::default());
        p.hide(&mut s, None).hide(&mut s, None);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn clear_respects_selector() {
        let mut s = scene();
        let mut p = Panel::new(&mut s, PanelConfig::default().clear_selector("body"));
        let title = s.append(p.content(), Content::text("Title")).unwrap();
        s.append(p.content(), Content::text("x").class("body"));
        p.clear(&mut s);
        assert_eq!(s.children(p.content()), &[title]);
    }

    #[test]
    fn confirm_timeout_suppresses_hide_until_tick() {
        let mut s = scene();
        let mut p = Panel::new(&mut s, PanelConfig::default());
        let t0 = Instant::now();
        p.show(&mut s, 10.0, 10.0, ShowOptions::default());
        p.confirm(
            &mut s,
            Content::text("Saved"),
            Some(Duration::from_millis(300)),
            t0,
        );
        assert_eq!(s.texts(p.content()), vec!["Saved".to_string()]);
        p.hide(&mut s, None);
        assert!(!p.is_hidden());
        assert!(!p.tick(&mut s, t0 + Duration::from_millis(100)));
        assert!(p.tick(&mut s, t0 + Duration::from_millis(300)));
        assert!(p.is_hidden());
        assert!(!p.fade_pending());
    }

    #[test]
    fn show_under_places_below_anchor() {
        let mut s = scene();
        let button = s.add_page_node(Rect::new(50.0, 60.0, 80.0, 20.0), Content::text("Menu"));
        let mut p = Panel::new(&mut s, PanelConfig::default());
        p.show_under(&mut s, button, ShowUnderOptions::default())
            .unwrap();
        let r = s.bounding_rect(p.content()).unwrap();
        assert_eq!((r.x, r.y), (50.0, 85.0));
    }

    #[test]
    fn show_under_missing_anchor_errors() {
        let mut s = scene();
        let mut p = Panel::new(&mut s, PanelConfig::default());
        let err = p
            .show_under(&mut s, NodeId::new(999), ShowUnderOptions::default())
            .unwrap_err();
        assert_eq!(err, PanelError::AnchorUnavailable(NodeId::new(999)));
    }

    #[test]
    fn destroy_detaches_region() {
        let mut s = scene();
        let mut p = Panel::new(&mut s, PanelConfig::default());
        p.destroy(&mut s);
        assert!(p.is_destroyed());
        assert!(!s.is_attached(p.content()));
        p.show(&mut s, 0.0, 0.0, ShowOptions::default());
        assert!(p.is_hidden());
    }
}
