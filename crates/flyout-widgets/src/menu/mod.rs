#![forbid(unsafe_code)]

//! Cascading menus built from panels.
//!
//! A [`MenuHierarchy`] renders a declarative option list into a root panel
//! and opens one panel per depth as submenu rows are activated. Levels are
//! tracked in an ordered map seeded with the root at depth 0; activating a
//! sibling trigger reuses the panel already serving that depth instead of
//! stacking a new one.
//!
//! # Invariants
//!
//! 1. Depth 0 always maps to the root panel and is never removed.
//! 2. A level's cached [`MenuPosition`] is only taken from a displayed
//!    panel, and is dropped whenever the level's content is replaced.
//! 3. Each submenu panel declares the triggering panel as its parent and the
//!    whole chain above it as ancestors, so outside dismissal treats it as a
//!    descendant of every open level.
//! 4. `close_menus` leaves exactly one tracked level and is idempotent.
//!
//! # State machine
//!
//! ```text
//!   Closed (depth 0) --activate submenu row at d-1--> Open(d)
//!   Open(d) --sibling row at d-1--> Open(d)   (panel reused)
//!   Open(d) --submenu row at d--> Open(d+1)
//!   Open(_) --close_menus / Escape--> Closed
//! ```

mod option;
mod position;

pub use option::{
    ActionCallback, ActionContext, DEFAULT_SUBMENU_LABEL, FlyoutMenuOption, OptionSpec,
    PopulateTicket, SubmenuCallback, SubmenuContext, specs_into_options, validate_options,
};
pub use position::{
    MenuPosition, PlacementConfig, Side, SubmenuPlacement, choose_side, place_submenu,
};

use std::collections::{BTreeMap, BTreeSet, HashMap};

use flyout_core::event::{Event, KeyCode, KeyEvent, KeyEventKind, PointerButton, PointerEvent, PointerEventKind};
use flyout_render::{Content, Indicator, NodeId, PanelId, RowStyle, Surface, TextAlign};

use crate::error::{ConfigError, MenuError, OptionPath, PanelError};
use crate::overlay::{DismissReport, OverlayHost};
use crate::panel::{PanelConfig, ShowOptions};

/// Class of the header block rendered above the root options.
pub const HEADER_CLASS: &str = "flyout-menu-header";
/// Class of every rendered option block.
pub const OPTION_CLASS: &str = "flyout-menu-option";

/// Construction parameters for a [`MenuHierarchy`].
#[derive(Debug)]
pub struct MenuConfig {
    /// Render into this panel instead of creating a root panel.
    pub existing_panel: Option<PanelId>,
    /// Optional block rendered above the root options.
    pub header_text: Option<String>,
    pub options: Vec<FlyoutMenuOption>,
    pub placement: PlacementConfig,
    /// Template for panels the hierarchy creates.
    pub panel: PanelConfig,
}

impl MenuConfig {
    pub fn new(options: Vec<FlyoutMenuOption>) -> Self {
        Self {
            existing_panel: None,
            header_text: None,
            options,
            placement: PlacementConfig::default(),
            panel: PanelConfig::default(),
        }
    }

    /// Build from loosely typed options, validating every entry.
    pub fn from_specs(specs: Vec<OptionSpec>) -> Result<Self, ConfigError> {
        Ok(Self::new(specs_into_options(specs, &OptionPath::default())?))
    }

    #[must_use]
    pub fn existing_panel(mut self, panel: PanelId) -> Self {
        self.existing_panel = Some(panel);
        self
    }

    #[must_use]
    pub fn header(mut self, text: impl Into<String>) -> Self {
        self.header_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    #[must_use]
    pub fn panel(mut self, panel: PanelConfig) -> Self {
        self.panel = panel;
        self
    }
}

/// One open depth of the hierarchy.
#[derive(Debug, Clone)]
pub struct MenuLevel {
    panel: PanelId,
    position: Option<MenuPosition>,
    generation: u64,
    placed_side: Option<Side>,
    rows: Vec<NodeId>,
}

impl MenuLevel {
    fn new(panel: PanelId, generation: u64) -> Self {
        Self {
            panel,
            position: None,
            generation,
            placed_side: None,
            rows: Vec::new(),
        }
    }

    pub fn panel(&self) -> PanelId {
        self.panel
    }

    /// Cached measurement, if any.
    pub fn position(&self) -> Option<MenuPosition> {
        self.position
    }

    /// Side this level was opened toward (`None` for the root).
    pub fn placed_side(&self) -> Option<Side> {
        self.placed_side
    }

    /// Focusable rows in display order.
    pub fn rows(&self) -> &[NodeId] {
        &self.rows
    }
}

/// What activating a row did.
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    /// A leaf callback ran.
    Invoked {
        label: String,
        depth: usize,
        /// The callback asked for the hierarchy to collapse.
        closed: bool,
    },
    /// A submenu was shown.
    Opened {
        depth: usize,
        panel: PanelId,
        placement: SubmenuPlacement,
        /// The panel already served this depth (or was kept from an earlier close).
        reused: bool,
    },
}

/// Result of routing one input event.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuEvent {
    Ignored,
    PointerDown(DismissReport),
    Focused(NodeId),
    Activated(Activation),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListSource {
    Root,
    Dynamic(u64),
}

#[derive(Debug, Clone)]
struct RowBinding {
    depth: usize,
    source: ListSource,
    path: Vec<usize>,
    has_submenu: bool,
}

/// Options rendered by a dynamic-submenu callback.
#[derive(Debug)]
struct DynamicList {
    depth: usize,
    options: Vec<FlyoutMenuOption>,
}

/// Cascading submenu manager.
#[derive(Debug)]
pub struct MenuHierarchy {
    root: PanelId,
    root_content: NodeId,
    owns_root: bool,
    current_depth: usize,
    levels: BTreeMap<usize, MenuLevel>,
    /// Hidden submenu panels kept from the last close, by depth.
    spare: BTreeMap<usize, PanelId>,
    root_options: Vec<FlyoutMenuOption>,
    dynamic: BTreeMap<u64, DynamicList>,
    next_list: u64,
    rows: HashMap<NodeId, RowBinding>,
    pending_remeasure: BTreeSet<usize>,
    focused: Option<NodeId>,
    pressed: Option<NodeId>,
    next_generation: u64,
    placement: PlacementConfig,
    panel_config: PanelConfig,
}

impl MenuHierarchy {
    /// Validate the options and render them into the root panel.
    ///
    /// The root panel is not shown; callers place it (e.g. with
    /// [`PanelMut::show`](crate::overlay::PanelMut::show)) and its measurement
    /// is taken on the next [`on_frame`](Self::on_frame).
    pub fn new<S: Surface>(host: &mut OverlayHost<S>, config: MenuConfig) -> Result<Self, MenuError> {
        validate_options(&config.options)?;
        let (root, owns_root) = match config.existing_panel {
            Some(id) => {
                host.panel(id)?;
                (id, false)
            }
            None => (host.create_panel(config.panel.clone()), true),
        };
        let root_content = {
            let mut panel = host.panel_mut(root)?;
            panel.clear();
            panel.content()
        };
        if let Some(header) = config.header_text {
            host.surface_mut()
                .append(root_content, Content::text(header).class(HEADER_CLASS))
                .ok_or(PanelError::RegionUnavailable(root))?;
        }

        let mut levels = BTreeMap::new();
        levels.insert(0, MenuLevel::new(root, 0));
        let mut menu = Self {
            root,
            root_content,
            owns_root,
            current_depth: 0,
            levels,
            spare: BTreeMap::new(),
            root_options: config.options,
            dynamic: BTreeMap::new(),
            next_list: 0,
            rows: HashMap::new(),
            pending_remeasure: BTreeSet::new(),
            focused: None,
            pressed: None,
            next_generation: 1,
            placement: config.placement,
            panel_config: config.panel,
        };
        menu.render_level(host, 0, ListSource::Root, &[])?;
        menu.pending_remeasure.insert(0);
        flyout_core::debug!(root = %root, owns_root, rows = menu.rows.len(), "menu created");
        Ok(menu)
    }

    pub fn root(&self) -> PanelId {
        self.root
    }

    /// Root panel's content region.
    pub fn root_content(&self) -> NodeId {
        self.root_content
    }

    pub fn current_depth(&self) -> usize {
        self.current_depth
    }

    pub fn level(&self, depth: usize) -> Option<&MenuLevel> {
        self.levels.get(&depth)
    }

    /// Tracked depths in ascending order.
    pub fn depths(&self) -> impl Iterator<Item = usize> + '_ {
        self.levels.keys().copied()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Focusable rows at `depth` (empty if the depth is not tracked).
    pub fn rows(&self, depth: usize) -> &[NodeId] {
        self.levels.get(&depth).map_or(&[], |l| l.rows.as_slice())
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn placement_config(&self) -> &PlacementConfig {
        &self.placement
    }

    /// Ticket for the current population of `depth`.
    pub fn ticket(&self, depth: usize) -> Option<PopulateTicket> {
        self.levels.get(&depth).map(|l| PopulateTicket {
            depth,
            generation: l.generation,
        })
    }

    fn level_or_err(&self, depth: usize) -> Result<&MenuLevel, MenuError> {
        self.levels.get(&depth).ok_or(MenuError::LevelMissing(depth))
    }

    fn bump_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    fn list(&self, source: ListSource, path: &[usize]) -> Option<&[FlyoutMenuOption]> {
        let mut list: &[FlyoutMenuOption] = match source {
            ListSource::Root => &self.root_options,
            ListSource::Dynamic(id) => &self.dynamic.get(&id)?.options,
        };
        for &i in path {
            match list.get(i)? {
                FlyoutMenuOption::SubmenuByList { options, .. } => list = options,
                _ => return None,
            }
        }
        Some(list)
    }

    fn option_mut(&mut self, source: ListSource, path: &[usize]) -> Option<&mut FlyoutMenuOption> {
        let (last, parents) = path.split_last()?;
        let mut list: &mut Vec<FlyoutMenuOption> = match source {
            ListSource::Root => &mut self.root_options,
            ListSource::Dynamic(id) => &mut self.dynamic.get_mut(&id)?.options,
        };
        for &i in parents {
            match list.get_mut(i)? {
                FlyoutMenuOption::SubmenuByList { options, .. } => list = options,
                _ => return None,
            }
        }
        list.get_mut(*last)
    }

    /// Render the option list at `source`/`base` into the panel at `depth`.
    fn render_level<S: Surface>(
        &mut self,
        host: &mut OverlayHost<S>,
        depth: usize,
        source: ListSource,
        base: &[usize],
    ) -> Result<(), MenuError> {
        let panel = self.level_or_err(depth)?.panel;
        let content = host.panel(panel)?.content();
        let list = self
            .list(source, base)
            .ok_or(MenuError::LevelMissing(depth))?;

        let mut rendered = Vec::new();
        for (i, option) in list.iter().enumerate() {
            let block = match option {
                FlyoutMenuOption::SectionText { text } => Content::dimmed_text(text.as_str()),
                FlyoutMenuOption::RawContent { html } => Content::markup(html.as_str()),
                FlyoutMenuOption::LabeledAction { label, .. } => Content::row(label.as_str(), false),
                FlyoutMenuOption::SubmenuByList { label, .. }
                | FlyoutMenuOption::SubmenuByCallback { label, .. } => {
                    Content::row(label.as_str(), true)
                }
            };
            let node = host
                .surface_mut()
                .append(content, block.class(OPTION_CLASS))
                .ok_or(PanelError::RegionUnavailable(panel))?;
            if option.is_row() {
                rendered.push((node, i, option.opens_submenu()));
            }
        }

        for (node, i, has_submenu) in rendered {
            let mut path = base.to_vec();
            path.push(i);
            self.rows.insert(
                node,
                RowBinding {
                    depth,
                    source,
                    path,
                    has_submenu,
                },
            );
            if let Some(level) = self.levels.get_mut(&depth) {
                level.rows.push(node);
            }
        }

        // Side-dependent presentation needs the measurement first.
        if self.levels.get(&depth).is_some_and(|l| l.position.is_none()) {
            self.measure(host, depth)?;
        }
        self.apply_presentation(host, depth);
        Ok(())
    }

    /// Measure the panel at `depth`, caching the result if it is displayed.
    fn measure<S: Surface>(
        &mut self,
        host: &OverlayHost<S>,
        depth: usize,
    ) -> Result<MenuPosition, MenuError> {
        let panel = self.level_or_err(depth)?.panel;
        let content = host.panel(panel)?.content();
        let surface = host.surface();
        let rect = surface
            .bounding_rect(content)
            .ok_or(PanelError::RegionUnavailable(panel))?;
        let position =
            MenuPosition::from_rect(rect, surface.viewport(), self.placement.min_submenu_width);
        let displayed = surface.visibility(content).is_some_and(|v| v.displayed);
        if displayed && let Some(level) = self.levels.get_mut(&depth) {
            level.position = Some(position);
            flyout_core::trace!(depth, side = ?position.side, "level measured");
        }
        Ok(position)
    }

    fn apply_presentation<S: Surface>(&self, host: &mut OverlayHost<S>, depth: usize) {
        let Some(level) = self.levels.get(&depth) else {
            return;
        };
        let next_side = level
            .position
            .map(|p| choose_side(&p, depth + 1, &self.placement));
        let (align, indicator) = match next_side {
            Some(Side::Left) => (TextAlign::Right, Indicator::Leading),
            _ => (TextAlign::Left, Indicator::Trailing),
        };
        for &row in &level.rows {
            let has_submenu = self.rows.get(&row).is_some_and(|b| b.has_submenu);
            host.surface_mut().set_row_style(
                row,
                RowStyle {
                    align,
                    indicator: has_submenu.then_some(indicator),
                    focused: self.focused == Some(row),
                },
            );
        }
    }

    /// Where a submenu opened from `trigger` (a row at `parent_depth`) goes.
    pub fn calculate_position<S: Surface>(
        &mut self,
        host: &OverlayHost<S>,
        trigger: NodeId,
        parent_depth: usize,
    ) -> Result<SubmenuPlacement, MenuError> {
        let cached = self.level_or_err(parent_depth)?.position;
        let parent = match cached {
            Some(position) => position,
            None => self.measure(host, parent_depth)?,
        };
        let trigger_rect = host
            .surface()
            .bounding_rect(trigger)
            .ok_or(MenuError::UnknownRow(trigger))?;
        Ok(place_submenu(
            &parent,
            trigger_rect,
            parent_depth + 1,
            host.surface().viewport(),
            &self.placement,
        ))
    }

    /// Activate a row: run its callback or open its submenu.
    pub fn activate<S: Surface>(
        &mut self,
        host: &mut OverlayHost<S>,
        row: NodeId,
    ) -> Result<Activation, MenuError> {
        let binding = self
            .rows
            .get(&row)
            .cloned()
            .ok_or(MenuError::UnknownRow(row))?;
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "menu_activate",
            depth = binding.depth,
            row = row.id(),
            submenu = binding.has_submenu
        )
        .entered();

        self.set_focus(host, Some(row));
        if binding.has_submenu {
            self.open_submenu(host, row, &binding)
        } else {
            self.invoke(host, row, &binding)
        }
    }

    fn invoke<S: Surface>(
        &mut self,
        host: &mut OverlayHost<S>,
        row: NodeId,
        binding: &RowBinding,
    ) -> Result<Activation, MenuError> {
        let Some(FlyoutMenuOption::LabeledAction { label, callback }) =
            self.option_mut(binding.source, &binding.path)
        else {
            return Err(MenuError::UnknownRow(row));
        };
        let mut ctx = ActionContext::new(label.clone(), binding.depth, row);
        callback(&mut ctx);
        let closed = ctx.close_requested();
        flyout_core::debug!(label = ctx.label(), depth = binding.depth, closed, "menu action");
        if closed {
            self.close_menus(host)?;
        }
        Ok(Activation::Invoked {
            label: ctx.label().to_string(),
            depth: binding.depth,
            closed,
        })
    }

    fn open_submenu<S: Surface>(
        &mut self,
        host: &mut OverlayHost<S>,
        row: NodeId,
        binding: &RowBinding,
    ) -> Result<Activation, MenuError> {
        let trigger_depth = binding.depth;
        let depth = trigger_depth + 1;
        let placement = self.calculate_position(host, row, trigger_depth)?;

        self.reset_levels_from(host, depth)?;
        let (panel, reused) = self.panel_for_depth(host, depth, trigger_depth)?;
        self.current_depth = depth;
        host.panel_mut(panel)?
            .show(placement.x, placement.y, ShowOptions::exact());
        if let Some(level) = self.levels.get_mut(&depth) {
            level.placed_side = Some(placement.side);
        }
        self.pending_remeasure.insert(depth);
        flyout_core::debug!(depth, panel = %panel, reused, side = ?placement.side, "submenu opened");

        let dynamic = matches!(
            self.option_mut(binding.source, &binding.path),
            Some(FlyoutMenuOption::SubmenuByCallback { .. })
        );
        if dynamic {
            self.run_submenu_callback(host, row, binding, depth, panel)?;
        } else {
            self.render_level(host, depth, binding.source, &binding.path)?;
        }
        Ok(Activation::Opened {
            depth,
            panel,
            placement,
            reused,
        })
    }

    fn run_submenu_callback<S: Surface>(
        &mut self,
        host: &mut OverlayHost<S>,
        row: NodeId,
        binding: &RowBinding,
        depth: usize,
        panel: PanelId,
    ) -> Result<(), MenuError> {
        let content = host.panel(panel)?.content();
        let ticket = self.ticket(depth).ok_or(MenuError::LevelMissing(depth))?;
        let Some(FlyoutMenuOption::SubmenuByCallback { callback, .. }) =
            self.option_mut(binding.source, &binding.path)
        else {
            return Err(MenuError::UnknownRow(row));
        };
        let pending = {
            let mut ctx = SubmenuContext::new(host.surface_mut(), panel, content, ticket);
            callback(&mut ctx);
            ctx.take_pending()
        };
        match pending {
            Some(options) => self.render_dynamic(host, depth, options),
            None => Ok(()),
        }
    }

    fn render_dynamic<S: Surface>(
        &mut self,
        host: &mut OverlayHost<S>,
        depth: usize,
        options: Vec<FlyoutMenuOption>,
    ) -> Result<(), MenuError> {
        let id = self.next_list;
        self.next_list += 1;
        self.dynamic.insert(id, DynamicList { depth, options });
        self.render_level(host, depth, ListSource::Dynamic(id), &[])
    }

    /// Drop content and bindings of every level at or below `depth`.
    ///
    /// The level at `depth` is about to be refilled; deeper levels are
    /// hidden but keep their panels for later reuse.
    fn reset_levels_from<S: Surface>(
        &mut self,
        host: &mut OverlayHost<S>,
        depth: usize,
    ) -> Result<(), MenuError> {
        self.rows.retain(|_, b| b.depth < depth);
        self.dynamic.retain(|_, list| list.depth < depth);
        if self.focused.is_some_and(|f| !self.rows.contains_key(&f)) {
            self.focused = None;
        }
        if self.pressed.is_some_and(|p| !self.rows.contains_key(&p)) {
            self.pressed = None;
        }
        self.pending_remeasure.retain(|&d| d < depth);

        let mut generation = self.next_generation;
        for (&d, level) in self.levels.range_mut(depth..) {
            level.position = None;
            level.placed_side = None;
            level.rows.clear();
            level.generation = generation;
            generation += 1;
            let mut panel = host.panel_mut(level.panel)?;
            panel.clear();
            if d > depth {
                panel.hide(None);
            }
        }
        self.next_generation = generation;
        Ok(())
    }

    /// Panel for a new level at `depth`, opened from `trigger_depth`.
    fn panel_for_depth<S: Surface>(
        &mut self,
        host: &mut OverlayHost<S>,
        depth: usize,
        trigger_depth: usize,
    ) -> Result<(PanelId, bool), MenuError> {
        if let Some(level) = self.levels.get(&depth) {
            return Ok((level.panel, true));
        }
        let parent = self.level_or_err(trigger_depth)?.panel;
        let ancestors: Vec<PanelId> = self
            .levels
            .range(..=trigger_depth)
            .map(|(_, l)| l.panel)
            .collect();

        let (panel, reused) = match self.spare.remove(&depth) {
            Some(panel) => {
                host.panel_mut(panel)?
                    .set_lineage(Some(parent), ancestors);
                (panel, true)
            }
            None => {
                let config = self
                    .panel_config
                    .clone()
                    .parent(parent)
                    .ancestors(ancestors);
                (host.create_panel(config), false)
            }
        };
        let generation = self.bump_generation();
        self.levels.insert(depth, MenuLevel::new(panel, generation));
        Ok((panel, reused))
    }

    /// Hide every tracked panel and collapse to the root level.
    pub fn close_menus<S: Surface>(&mut self, host: &mut OverlayHost<S>) -> Result<(), MenuError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("menu_close", levels = self.levels.len()).entered();

        // Every reachable panel is hidden even if another one fails.
        let mut first_err: Option<MenuError> = None;
        let deeper = self.levels.split_off(&1);
        for (depth, level) in deeper {
            match host.panel_mut(level.panel) {
                Ok(mut panel) => {
                    panel.hide(None).clear();
                    self.spare.insert(depth, level.panel);
                }
                Err(err) => {
                    flyout_core::warn!(depth, panel = %level.panel, "level panel lost on close");
                    first_err.get_or_insert(err.into());
                }
            }
        }
        match host.panel_mut(self.root) {
            Ok(mut root) => {
                root.hide(None);
            }
            Err(err) => {
                first_err.get_or_insert(err.into());
            }
        }

        self.rows.retain(|_, b| b.depth == 0);
        self.dynamic.retain(|_, list| list.depth == 0);
        if self.focused.is_some_and(|f| !self.rows.contains_key(&f)) {
            self.focused = None;
        }
        self.pressed = None;
        if let Some(root) = self.levels.get_mut(&0) {
            // The root may be shown somewhere else next time.
            root.position = None;
        }
        self.pending_remeasure.clear();
        self.pending_remeasure.insert(0);
        self.current_depth = 0;
        flyout_core::debug!(root = %self.root, "menus closed");
        first_err.map_or(Ok(()), Err)
    }

    /// Re-measure levels shown since the last frame.
    ///
    /// Levels whose panel is not displayed yet stay queued.
    pub fn on_frame<S: Surface>(&mut self, host: &mut OverlayHost<S>) -> Result<(), MenuError> {
        let pending = std::mem::take(&mut self.pending_remeasure);
        for depth in pending {
            let Some(level) = self.levels.get(&depth) else {
                continue;
            };
            let content = host.panel(level.panel)?.content();
            let displayed = host
                .surface()
                .visibility(content)
                .is_some_and(|v| v.displayed);
            if !displayed {
                self.pending_remeasure.insert(depth);
                continue;
            }
            self.measure(host, depth)?;
            self.apply_presentation(host, depth);
        }
        Ok(())
    }

    /// Append content to a level populated asynchronously.
    ///
    /// Returns `Ok(false)` without touching anything when the ticket is
    /// stale: the level was reused for another trigger or closed.
    pub fn populate<S: Surface>(
        &mut self,
        host: &mut OverlayHost<S>,
        ticket: PopulateTicket,
        content: Content,
    ) -> Result<bool, MenuError> {
        if self.ticket(ticket.depth) != Some(ticket) {
            flyout_core::trace!(depth = ticket.depth, "stale populate ignored");
            return Ok(false);
        }
        let panel = self.level_or_err(ticket.depth)?.panel;
        host.panel_mut(panel)?
            .append(content)
            .ok_or(PanelError::RegionUnavailable(panel))?;
        self.invalidate(ticket.depth);
        Ok(true)
    }

    /// Render menu rows into a level populated asynchronously.
    pub fn populate_options<S: Surface>(
        &mut self,
        host: &mut OverlayHost<S>,
        ticket: PopulateTicket,
        options: Vec<FlyoutMenuOption>,
    ) -> Result<bool, MenuError> {
        validate_options(&options)?;
        if self.ticket(ticket.depth) != Some(ticket) {
            return Ok(false);
        }
        self.invalidate(ticket.depth);
        self.render_dynamic(host, ticket.depth, options)?;
        Ok(true)
    }

    fn invalidate(&mut self, depth: usize) {
        if let Some(level) = self.levels.get_mut(&depth) {
            level.position = None;
        }
        self.pending_remeasure.insert(depth);
    }

    fn set_focus<S: Surface>(&mut self, host: &mut OverlayHost<S>, row: Option<NodeId>) {
        let previous = std::mem::replace(&mut self.focused, row);
        if previous == row {
            return;
        }
        let depths: BTreeSet<usize> = [previous, row]
            .into_iter()
            .flatten()
            .filter_map(|node| self.rows.get(&node).map(|b| b.depth))
            .collect();
        for depth in depths {
            self.apply_presentation(host, depth);
        }
    }

    /// Route one input event.
    pub fn handle_event<S: Surface>(
        &mut self,
        host: &mut OverlayHost<S>,
        event: &Event,
    ) -> Result<MenuEvent, MenuError> {
        match event {
            Event::Pointer(pointer) => self.handle_pointer(host, pointer),
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(host, key),
            Event::Key(_) => Ok(MenuEvent::Ignored),
            Event::Tick => {
                self.on_frame(host)?;
                Ok(MenuEvent::Ignored)
            }
            // Cached positions are viewport-relative.
            Event::Resize { .. } | Event::Scroll { .. } => {
                let depths: Vec<usize> = self.levels.keys().copied().collect();
                for depth in depths {
                    self.invalidate(depth);
                }
                Ok(MenuEvent::Ignored)
            }
        }
    }

    fn handle_pointer<S: Surface>(
        &mut self,
        host: &mut OverlayHost<S>,
        pointer: &PointerEvent,
    ) -> Result<MenuEvent, MenuError> {
        match pointer.kind {
            PointerEventKind::Down(_) => {
                let report = host.pointer_down(pointer);
                self.pressed = report.target.filter(|t| self.rows.contains_key(t));
                if !report.hidden.is_empty() {
                    self.sync_depth(host);
                }
                Ok(MenuEvent::PointerDown(report))
            }
            PointerEventKind::Up(PointerButton::Primary) => {
                let pressed = self.pressed.take();
                let target = host.surface().hit_test(pointer.x, pointer.y);
                match (pressed, target) {
                    (Some(p), Some(t)) if p == t => {
                        Ok(MenuEvent::Activated(self.activate(host, t)?))
                    }
                    _ => Ok(MenuEvent::Ignored),
                }
            }
            PointerEventKind::Up(_) => {
                self.pressed = None;
                Ok(MenuEvent::Ignored)
            }
            PointerEventKind::Moved => {
                let row = host
                    .surface()
                    .hit_test(pointer.x, pointer.y)
                    .filter(|t| self.rows.contains_key(t));
                match row {
                    Some(row) if self.focused != Some(row) => {
                        self.set_focus(host, Some(row));
                        Ok(MenuEvent::Focused(row))
                    }
                    _ => Ok(MenuEvent::Ignored),
                }
            }
        }
    }

    fn handle_key<S: Surface>(
        &mut self,
        host: &mut OverlayHost<S>,
        key: &KeyEvent,
    ) -> Result<MenuEvent, MenuError> {
        if key.is_activation() {
            return match self.focused {
                Some(row) if self.row_visible(host, row) => {
                    Ok(MenuEvent::Activated(self.activate(host, row)?))
                }
                _ => Ok(MenuEvent::Ignored),
            };
        }
        match key.code {
            KeyCode::Down => Ok(self.move_focus(host, true)),
            KeyCode::Up => Ok(self.move_focus(host, false)),
            KeyCode::Escape => {
                self.close_menus(host)?;
                Ok(MenuEvent::Closed)
            }
            _ => Ok(MenuEvent::Ignored),
        }
    }

    fn move_focus<S: Surface>(&mut self, host: &mut OverlayHost<S>, forward: bool) -> MenuEvent {
        let Some(level) = self.levels.get(&self.current_depth) else {
            return MenuEvent::Ignored;
        };
        let len = level.rows.len();
        if len == 0 {
            return MenuEvent::Ignored;
        }
        let current = self
            .focused
            .and_then(|f| level.rows.iter().position(|&r| r == f));
        let next = match (current, forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        let row = level.rows[next];
        self.set_focus(host, Some(row));
        MenuEvent::Focused(row)
    }

    /// Follow panels hidden by outside dismissal.
    fn sync_depth<S: Surface>(&mut self, host: &mut OverlayHost<S>) {
        self.current_depth = self
            .levels
            .iter()
            .rev()
            .find(|(_, l)| host.is_hidden(l.panel) == Ok(false))
            .map_or(0, |(&d, _)| d);
        let depth = self.current_depth;
        let below = |row: &Option<NodeId>, rows: &HashMap<NodeId, RowBinding>| {
            row.and_then(|r| rows.get(&r)).is_some_and(|b| b.depth > depth)
        };
        if below(&self.pressed, &self.rows) {
            self.pressed = None;
        }
        if below(&self.focused, &self.rows) {
            self.set_focus(host, None);
        }
    }

    /// Whether `row` sits in a level whose panel is currently shown.
    fn row_visible<S: Surface>(&self, host: &OverlayHost<S>, row: NodeId) -> bool {
        self.rows
            .get(&row)
            .and_then(|b| self.levels.get(&b.depth))
            .is_some_and(|l| host.is_hidden(l.panel) == Ok(false))
    }

    /// Close everything and detach the panels this hierarchy created.
    pub fn destroy<S: Surface>(mut self, host: &mut OverlayHost<S>) -> Result<(), MenuError> {
        let closed = self.close_menus(host);
        for (_, panel) in std::mem::take(&mut self.spare) {
            host.destroy_panel(panel)?;
        }
        if self.owns_root {
            host.destroy_panel(self.root)?;
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flyout_render::Scene;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn host() -> OverlayHost {
        OverlayHost::new(Scene::new(1000.0, 800.0))
    }

    fn noop(_: &mut ActionContext) {}

    #[test]
    fn empty_options_rejected() {
        let mut host = host();
        let err = MenuHierarchy::new(&mut host, MenuConfig::new(Vec::new())).unwrap_err();
        assert!(matches!(err, MenuError::Config(ConfigError::EmptyOptions { .. })));
    }

    #[test]
    fn renders_header_and_rows() {
        let mut host = host();
        let menu = MenuHierarchy::new(
            &mut host,
            MenuConfig::new(vec![
                FlyoutMenuOption::section("Actions"),
                FlyoutMenuOption::action("Edit", noop),
                FlyoutMenuOption::submenu("More", vec![FlyoutMenuOption::action("A", noop)]),
                FlyoutMenuOption::raw("<i>note</i>"),
            ])
            .header("Sample 12"),
        )
        .unwrap();
        let texts = host.surface().texts(menu.root_content());
        assert_eq!(texts, vec!["Sample 12", "Actions", "Edit", "More", "note"]);
        assert_eq!(menu.rows(0).len(), 2);
        assert_eq!(menu.level_count(), 1);
        let more = menu.rows(0)[1];
        let style = host.surface().row_style(more).unwrap();
        assert_eq!(style.indicator, Some(Indicator::Trailing));
    }

    #[test]
    fn existing_panel_is_reused_as_root() {
        let mut host = host();
        let panel = host.create_panel(PanelConfig::default());
        host.panel_mut(panel).unwrap().append(Content::text("stale"));
        let menu = MenuHierarchy::new(
            &mut host,
            MenuConfig::new(vec![FlyoutMenuOption::action("Edit", noop)]).existing_panel(panel),
        )
        .unwrap();
        assert_eq!(menu.root(), panel);
        assert_eq!(host.surface().texts(menu.root_content()), vec!["Edit"]);
        menu.destroy(&mut host).unwrap();
        assert!(host.panel(panel).is_ok());
    }

    #[test]
    fn dynamic_submenu_renders_options() {
        let mut host = host();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let mut menu = MenuHierarchy::new(
            &mut host,
            MenuConfig::new(vec![FlyoutMenuOption::submenu_with("Genes", move |ctx| {
                ctx.append(Content::dimmed_text("Pick one"));
                let log = log.clone();
                ctx.render_options(vec![FlyoutMenuOption::action("TP53", move |a| {
                    log.borrow_mut().push(a.label().to_string());
                    a.close_menus();
                })])
                .unwrap();
            })]),
        )
        .unwrap();
        host.panel_mut(menu.root())
            .unwrap()
            .show(100.0, 100.0, ShowOptions::exact());
        let trigger = menu.rows(0)[0];
        let opened = menu.activate(&mut host, trigger).unwrap();
        let Activation::Opened { depth, panel, .. } = opened else {
            panic!("expected submenu");
        };
        assert_eq!(depth, 1);
        let content = host.panel(panel).unwrap().content();
        assert_eq!(host.surface().texts(content), vec!["Pick one", "TP53"]);

        let leaf = menu.rows(1)[0];
        let done = menu.activate(&mut host, leaf).unwrap();
        assert!(matches!(done, Activation::Invoked { closed: true, .. }));
        assert_eq!(seen.borrow().as_slice(), ["TP53"]);
        assert_eq!(menu.current_depth(), 0);
    }

    #[test]
    fn stale_ticket_is_refused() {
        let mut host = host();
        let tickets = Rc::new(RefCell::new(Vec::new()));
        let sink = tickets.clone();
        let mut menu = MenuHierarchy::new(
            &mut host,
            MenuConfig::new(vec![
                FlyoutMenuOption::submenu_with("Async", move |ctx| sink.borrow_mut().push(ctx.ticket())),
                FlyoutMenuOption::submenu("Other", vec![FlyoutMenuOption::action("x", noop)]),
            ]),
        )
        .unwrap();
        host.panel_mut(menu.root())
            .unwrap()
            .show(100.0, 100.0, ShowOptions::exact());
        let rows = menu.rows(0).to_vec();
        menu.activate(&mut host, rows[0]).unwrap();
        let ticket = tickets.borrow()[0];

        assert!(menu.populate(&mut host, ticket, Content::text("loaded")).unwrap());
        // Switching to the sibling reuses the panel and invalidates the ticket.
        menu.activate(&mut host, rows[1]).unwrap();
        assert!(!menu.populate(&mut host, ticket, Content::text("late")).unwrap());
        let panel = menu.level(1).unwrap().panel();
        let content = host.panel(panel).unwrap().content();
        assert_eq!(host.surface().texts(content), vec!["x"]);
    }

    #[test]
    fn keyboard_focus_and_activation() {
        let mut host = host();
        let hits = Rc::new(RefCell::new(0));
        let counter = hits.clone();
        let mut menu = MenuHierarchy::new(
            &mut host,
            MenuConfig::new(vec![
                FlyoutMenuOption::action("One", noop),
                FlyoutMenuOption::action("Two", move |_| *counter.borrow_mut() += 1),
            ]),
        )
        .unwrap();
        host.panel_mut(menu.root()).unwrap().show(100.0, 100.0, ShowOptions::exact());
        let rows = menu.rows(0).to_vec();
        let down = Event::Key(KeyEvent::new(KeyCode::Down));
        assert_eq!(menu.handle_event(&mut host, &down).unwrap(), MenuEvent::Focused(rows[0]));
        assert_eq!(menu.handle_event(&mut host, &down).unwrap(), MenuEvent::Focused(rows[1]));
        assert!(host.surface().row_style(rows[1]).unwrap().focused);
        assert!(!host.surface().row_style(rows[0]).unwrap().focused);

        let enter = Event::Key(KeyEvent::new(KeyCode::Enter));
        let out = menu.handle_event(&mut host, &enter).unwrap();
        assert!(matches!(out, MenuEvent::Activated(Activation::Invoked { closed: false, .. })));
        assert_eq!(*hits.borrow(), 1);
        let released = Event::Key(KeyEvent::new(KeyCode::Enter).with_kind(KeyEventKind::Release));
        assert_eq!(menu.handle_event(&mut host, &released).unwrap(), MenuEvent::Ignored);
        assert_eq!(*hits.borrow(), 1);

        let up = Event::Key(KeyEvent::new(KeyCode::Up));
        assert_eq!(menu.handle_event(&mut host, &up).unwrap(), MenuEvent::Focused(rows[0]));
        let esc = Event::Key(KeyEvent::new(KeyCode::Escape));
        assert_eq!(menu.handle_event(&mut host, &esc).unwrap(), MenuEvent::Closed);
    }

    #[test]
    fn tick_measures_and_scroll_invalidates() {
        let mut host = host();
        let mut menu =
            MenuHierarchy::new(&mut host, MenuConfig::new(vec![FlyoutMenuOption::action("x", noop)]))
                .unwrap();
        menu.handle_event(&mut host, &Event::Tick).unwrap();
        assert!(menu.level(0).unwrap().position().is_none());

        host.panel_mut(menu.root())
            .unwrap()
            .show(100.0, 100.0, ShowOptions::exact());
        menu.handle_event(&mut host, &Event::Tick).unwrap();
        let before = menu.level(0).unwrap().position().unwrap();
        assert_eq!(before.rect.x, 100.0);

        host.surface_mut().scroll_to(0.0, 40.0);
        menu.handle_event(&mut host, &Event::Scroll { x: 0.0, y: 40.0 })
            .unwrap();
        assert!(menu.level(0).unwrap().position().is_none());
        menu.handle_event(&mut host, &Event::Tick).unwrap();
        assert_eq!(menu.level(0).unwrap().position().unwrap().rect.y, 60.0);
    }

    #[test]
    fn unknown_row_is_an_error() {
        let mut host = host();
        let mut menu =
            MenuHierarchy::new(&mut host, MenuConfig::new(vec![FlyoutMenuOption::action("x", noop)]))
                .unwrap();
        let bogus = NodeId::new(4242);
        assert_eq!(menu.activate(&mut host, bogus), Err(MenuError::UnknownRow(bogus)));
    }
}
