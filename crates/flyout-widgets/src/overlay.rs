#![forbid(unsafe_code)]

//! Overlay host: the shared container, its panels, and outside dismissal.
//!
//! The host owns the [`Surface`] and every [`Panel`] created through it. Each
//! panel behaves as if it had its own document-level pointer-down listener,
//! keyed by its [`PanelId`]; [`OverlayHost::pointer_down`] runs those
//! listeners for one event and reports what happened.
//!
//! # Dismissal
//!
//! For a pointer-down whose target is the topmost displayed node under the
//! pointer:
//!
//! 0. If the target sits inside a panel region and handles pointer input
//!    itself, propagation stops and no listener runs.
//! 1. A panel whose own region contains the target stays open.
//! 2. A panel the target declares as its parent stays open.
//! 3. A panel listed as parent or ancestor of the panel owning the target's
//!    region stays open.
//! 4. Every other panel hides.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Deref;
use std::time::{Duration, Instant};

use flyout_core::event::PointerEvent;
use flyout_render::{Content, NodeId, PanelId, Scene, Surface};

use crate::error::PanelError;
use crate::panel::{Panel, PanelConfig, ShowOptions, ShowUnderOptions};

/// Outcome of one pointer-down dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DismissReport {
    /// Topmost displayed node under the pointer.
    pub target: Option<NodeId>,
    /// Propagation stopped at an instrumented node inside a panel.
    pub suppressed: bool,
    /// Panels that transitioned to hidden.
    pub hidden: Vec<PanelId>,
    /// Visible panels whose listener decided to stay open.
    pub kept: Vec<PanelId>,
}

impl DismissReport {
    /// Whether `id` was hidden by this dispatch.
    pub fn hid(&self, id: PanelId) -> bool {
        self.hidden.contains(&id)
    }
}

/// Owner of the overlay surface and all panels attached to it.
#[derive(Debug)]
pub struct OverlayHost<S = Scene> {
    surface: S,
    panels: BTreeMap<PanelId, Panel>,
    regions: HashMap<NodeId, PanelId>,
    destroyed: HashSet<PanelId>,
}

impl<S: Surface> OverlayHost<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            panels: BTreeMap::new(),
            regions: HashMap::new(),
            destroyed: HashSet::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Create a panel (and its hidden region).
    pub fn create_panel(&mut self, config: PanelConfig) -> PanelId {
        let panel = Panel::new(&mut self.surface, config);
        let id = panel.id();
        self.regions.insert(panel.content(), id);
        self.panels.insert(id, panel);
        id
    }

    pub fn panel(&self, id: PanelId) -> Result<&Panel, PanelError> {
        match self.panels.get(&id) {
            Some(panel) => Ok(panel),
            None => Err(self.missing(id)),
        }
    }

    /// Chainable mutable handle to a panel.
    pub fn panel_mut(&mut self, id: PanelId) -> Result<PanelMut<'_, S>, PanelError> {
        let missing = self.missing(id);
        let panel = self.panels.get_mut(&id).ok_or(missing)?;
        Ok(PanelMut {
            panel,
            surface: &mut self.surface,
        })
    }

    fn missing(&self, id: PanelId) -> PanelError {
        if self.destroyed.contains(&id) {
            PanelError::Destroyed(id)
        } else {
            PanelError::Unknown(id)
        }
    }

    /// Live panel ids in creation order.
    pub fn panel_ids(&self) -> impl Iterator<Item = PanelId> + '_ {
        self.panels.keys().copied()
    }

    /// Panel owning the overlay region that contains `node`.
    pub fn panel_at(&self, node: NodeId) -> Option<PanelId> {
        let region = self.surface.region_of(node)?;
        self.regions.get(&region).copied()
    }

    /// Whether the panel exists and is currently hidden.
    pub fn is_hidden(&self, id: PanelId) -> Result<bool, PanelError> {
        self.panel(id).map(Panel::is_hidden)
    }

    /// Detach a panel's region. The id then reports [`PanelError::Destroyed`].
    pub fn destroy_panel(&mut self, id: PanelId) -> Result<(), PanelError> {
        let missing = self.missing(id);
        let mut panel = self.panels.remove(&id).ok_or(missing)?;
        self.regions.remove(&panel.content());
        panel.destroy(&mut self.surface);
        self.destroyed.insert(id);
        Ok(())
    }

    /// Run every panel's dismissal listener for a pointer-down.
    pub fn pointer_down(&mut self, event: &PointerEvent) -> DismissReport {
        let target = self.surface.hit_test(event.x, event.y);
        let mut report = DismissReport {
            target,
            ..DismissReport::default()
        };
        let owner = target.and_then(|t| self.panel_at(t));

        if let Some(t) = target
            && owner.is_some()
            && self.surface.is_instrumented(t)
        {
            flyout_core::trace!(panel = ?owner, node = t.id(), "dismissal suppressed");
            report.suppressed = true;
            return report;
        }

        let declared = target.and_then(|t| self.surface.declared_parent(t));
        let (owner_parent, owner_ancestors) = owner
            .and_then(|o| self.panels.get(&o))
            .map_or((None, Vec::new()), |p| (p.parent(), p.ancestors().to_vec()));

        for (&id, panel) in &mut self.panels {
            let keep = owner == Some(id)
                || declared == Some(id)
                || owner_parent == Some(id)
                || owner_ancestors.contains(&id);
            let was_hidden = panel.is_hidden();
            if keep {
                if !was_hidden {
                    report.kept.push(id);
                }
                continue;
            }
            panel.hide(&mut self.surface, Some(event));
            if !was_hidden && panel.is_hidden() {
                report.hidden.push(id);
            }
        }
        if !report.hidden.is_empty() {
            flyout_core::debug!(hidden = report.hidden.len(), kept = report.kept.len(), "outside pointer-down");
        }
        report
    }

    /// Advance fade timers. Returns the panels whose fade completed.
    pub fn tick(&mut self, now: Instant) -> Vec<PanelId> {
        self.panels
            .iter_mut()
            .filter_map(|(&id, panel)| panel.tick(&mut self.surface, now).then_some(id))
            .collect()
    }
}

/// Mutable panel handle bundled with the surface it draws on.
pub struct PanelMut<'a, S> {
    panel: &'a mut Panel,
    surface: &'a mut S,
}

impl<S> Deref for PanelMut<'_, S> {
    type Target = Panel;

    fn deref(&self) -> &Panel {
        self.panel
    }
}

impl<S: Surface> PanelMut<'_, S> {
    pub fn show(&mut self, x: f32, y: f32, options: ShowOptions) -> &mut Self {
        self.panel.show(self.surface, x, y, options);
        self
    }

    pub fn show_under(
        &mut self,
        anchor: NodeId,
        options: ShowUnderOptions,
    ) -> Result<&mut Self, PanelError> {
        self.panel.show_under(self.surface, anchor, options)?;
        Ok(self)
    }

    pub fn hide(&mut self, event: Option<&PointerEvent>) -> &mut Self {
        self.panel.hide(self.surface, event);
        self
    }

    pub fn toggle(&mut self) -> &mut Self {
        self.panel.toggle(self.surface);
        self
    }

    pub fn clear(&mut self) -> &mut Self {
        self.panel.clear(self.surface);
        self
    }

    pub fn confirm(&mut self, content: Content, timeout: Option<Duration>, now: Instant) -> &mut Self {
        self.panel.confirm(self.surface, content, timeout, now);
        self
    }

    pub fn fade_out(&mut self, after: Duration, now: Instant) -> &mut Self {
        self.panel.fade_out(after, now);
        self
    }

    /// Append content to the panel's region.
    pub fn append(&mut self, content: Content) -> Option<NodeId> {
        self.surface.append(self.panel.content(), content)
    }

    pub fn set_lineage(&mut self, parent: Option<PanelId>, ancestors: Vec<PanelId>) -> &mut Self {
        self.panel.set_lineage(parent, ancestors);
        self
    }

    pub fn set_on_hide(&mut self, hook: impl FnMut(PanelId) + 'static) -> &mut Self {
        self.panel.set_on_hide(hook);
        self
    }
}
