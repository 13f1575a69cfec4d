#![forbid(unsafe_code)]

//! Headless in-memory [`Surface`].
//!
//! A `Scene` models a document with a viewport, a scroll offset, static page
//! elements, and one top-level overlay container whose regions stack in
//! attach order. Content is laid out as a vertical stack of blocks measured
//! with fixed text metrics, which is enough for placement decisions, hit
//! testing, and deterministic tests.
//!
//! # Invariants
//!
//! 1. Node ids are never reused.
//! 2. A region that is not displayed measures as an empty rectangle and is
//!    invisible to hit testing.
//! 3. Later entries in the stacking order are hit first.

use flyout_core::geometry::{Rect, Sides, Size};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::surface::{
    Content, ContentKind, HAnchor, Indicator, NodeId, PanelId, Placement, RowStyle, Surface,
    VAnchor, Viewport, Visibility,
};

/// Text metrics used to measure content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneMetrics {
    /// Advance width of one display column.
    pub char_width: f32,
    /// Height of one line of text.
    pub line_height: f32,
    /// Padding inside each region.
    pub region_padding: Sides,
    /// Horizontal padding inside each row.
    pub row_padding: f32,
    /// Regions never measure narrower than this.
    pub min_region_width: f32,
}

impl Default for SceneMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 20.0,
            region_padding: Sides::all(5.0),
            row_padding: 10.0,
            min_region_width: 60.0,
        }
    }
}

impl SceneMetrics {
    /// Set the advance width of one display column.
    #[must_use]
    pub fn char_width(mut self, width: f32) -> Self {
        self.char_width = width;
        self
    }

    /// Set the line height.
    #[must_use]
    pub fn line_height(mut self, height: f32) -> Self {
        self.line_height = height;
        self
    }

    /// Set the minimum region width.
    #[must_use]
    pub fn min_region_width(mut self, width: f32) -> Self {
        self.min_region_width = width;
        self
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Region {
        placement: Placement,
        visibility: Visibility,
    },
    /// Static page element positioned in document coordinates.
    Page { rect: Rect },
    Content(ContentKind),
}

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
    class: Option<String>,
    instrumented: bool,
    declared_parent: Option<PanelId>,
    row_style: RowStyle,
}

impl NodeData {
    fn new(parent: Option<NodeId>, kind: NodeKind) -> Self {
        Self {
            parent,
            children: Vec::new(),
            kind,
            class: None,
            instrumented: false,
            declared_parent: None,
            row_style: RowStyle::default(),
        }
    }
}

/// In-memory document with an overlay container.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<Option<NodeData>>,
    /// Attached regions, bottom to top.
    stack: Vec<NodeId>,
    /// Page elements, bottom to top.
    page: Vec<NodeId>,
    viewport: Viewport,
    metrics: SceneMetrics,
}

impl Scene {
    /// Create an empty scene with an unscrolled viewport.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            nodes: Vec::new(),
            stack: Vec::new(),
            page: Vec::new(),
            viewport: Viewport::new(width, height),
            metrics: SceneMetrics::default(),
        }
    }

    /// Replace the text metrics.
    #[must_use]
    pub fn with_metrics(mut self, metrics: SceneMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> SceneMetrics {
        self.metrics
    }

    /// Resize the viewport.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    /// Scroll the document.
    pub fn scroll_to(&mut self, x: f32, y: f32) {
        self.viewport.scroll_x = x;
        self.viewport.scroll_y = y;
    }

    /// Add a static page element at `rect` (document coordinates).
    pub fn add_page_node(&mut self, rect: Rect, content: Content) -> NodeId {
        let id = self.insert(None, NodeKind::Page { rect });
        if let Some(node) = self.node_mut(id) {
            node.class = content.class;
            node.instrumented = content.instrumented;
        }
        self.page.push(id);
        id
    }

    /// Regions in stacking order, bottom to top.
    pub fn stacking_order(&self) -> &[NodeId] {
        &self.stack
    }

    /// Children of `node` in document order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map_or(&[], |n| n.children.as_slice())
    }

    /// Content of a non-region node.
    pub fn content(&self, node: NodeId) -> Option<&ContentKind> {
        match &self.node(node)?.kind {
            NodeKind::Content(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn class(&self, node: NodeId) -> Option<&str> {
        self.node(node)?.class.as_deref()
    }

    pub fn row_style(&self, node: NodeId) -> Option<RowStyle> {
        self.node(node).map(|n| n.row_style)
    }

    pub fn placement(&self, region: NodeId) -> Option<Placement> {
        match self.node(region)?.kind {
            NodeKind::Region { placement, .. } => Some(placement),
            _ => None,
        }
    }

    /// Whether `node` still exists.
    pub fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    /// All visible text under `node`, one entry per text-bearing descendant.
    pub fn texts(&self, node: NodeId) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_texts(node, &mut out);
        out
    }

    fn collect_texts(&self, node: NodeId, out: &mut Vec<String>) {
        if let Some(kind) = self.content(node) {
            match kind {
                ContentKind::Text { text, .. } => out.push(text.clone()),
                ContentKind::Markup(html) => out.push(strip_tags(html)),
                ContentKind::Row { label, .. } | ContentKind::Control { label } => {
                    out.push(label.clone());
                }
                ContentKind::Group => {}
            }
        }
        for &child in self.children(node) {
            self.collect_texts(child, out);
        }
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    fn insert(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(Some(NodeData::new(parent, kind)));
        id
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let children = match self.nodes.get_mut(id.0 as usize).and_then(Option::take) {
            Some(node) => node.children,
            None => return,
        };
        for child in children {
            self.remove_subtree(child);
        }
    }

    fn text_width(&self, text: &str) -> f32 {
        let columns: usize = text
            .graphemes(true)
            .map(UnicodeWidthStr::width)
            .sum();
        columns as f32 * self.metrics.char_width
    }

    /// Natural size of a node's content, excluding region padding.
    fn content_size(&self, id: NodeId) -> Size {
        let Some(node) = self.node(id) else {
            return Size::ZERO;
        };
        let m = self.metrics;
        match &node.kind {
            NodeKind::Content(ContentKind::Text { text, .. }) => {
                Size::new(self.text_width(text) + m.row_padding, m.line_height)
            }
            NodeKind::Content(ContentKind::Control { label }) => {
                Size::new(self.text_width(label) + m.row_padding, m.line_height)
            }
            NodeKind::Content(ContentKind::Row { label, has_submenu }) => {
                let indicator = if *has_submenu {
                    2.0 * m.char_width
                } else {
                    0.0
                };
                Size::new(
                    self.text_width(label) + indicator + m.row_padding,
                    m.line_height,
                )
            }
            NodeKind::Content(ContentKind::Markup(html)) => {
                let plain = strip_tags(html);
                let lines: Vec<&str> = plain.lines().collect();
                let width = lines
                    .iter()
                    .map(|l| self.text_width(l))
                    .fold(0.0_f32, f32::max);
                Size::new(
                    width + m.row_padding,
                    lines.len().max(1) as f32 * m.line_height,
                )
            }
            NodeKind::Content(ContentKind::Group) | NodeKind::Region { .. } => {
                self.stack_size(&node.children)
            }
            NodeKind::Page { rect } => rect.size(),
        }
    }

    fn stack_size(&self, children: &[NodeId]) -> Size {
        children.iter().fold(Size::ZERO, |acc, &c| {
            let s = self.content_size(c);
            Size::new(acc.width.max(s.width), acc.height + s.height)
        })
    }

    fn region_size(&self, region: NodeId) -> Size {
        let inner = self.content_size(region);
        let pad = self.metrics.region_padding;
        Size::new(
            (inner.width + pad.horizontal_sum()).max(self.metrics.min_region_width),
            inner.height + pad.vertical_sum(),
        )
    }

    /// Region rectangle in viewport coordinates, or empty when not displayed.
    fn region_rect(&self, region: NodeId) -> Option<Rect> {
        let NodeKind::Region {
            placement,
            visibility,
        } = self.node(region)?.kind
        else {
            return None;
        };
        if !visibility.displayed {
            return Some(Rect::default());
        }
        let size = self.region_size(region);
        let vp = self.viewport;
        let x = match placement.horizontal {
            HAnchor::Left(left) => left,
            HAnchor::Right(right) => vp.width - right - size.width,
        };
        let y = match placement.vertical {
            VAnchor::Top(top) => top,
            VAnchor::Bottom(bottom) => vp.height - bottom - size.height,
        };
        Some(Rect::new(
            x - vp.scroll_x,
            y - vp.scroll_y,
            size.width,
            size.height,
        ))
    }

    fn layout_rect(&self, id: NodeId) -> Option<Rect> {
        let node = self.node(id)?;
        match &node.kind {
            NodeKind::Region { .. } => self.region_rect(id),
            NodeKind::Page { rect } => Some(rect.translate(
                -self.viewport.scroll_x,
                -self.viewport.scroll_y,
            )),
            NodeKind::Content(_) => {
                let parent_id = node.parent?;
                let parent = self.node(parent_id)?;
                let parent_rect = self.layout_rect(parent_id)?;
                if parent_rect.is_empty() {
                    return Some(Rect::default());
                }
                let inner = match parent.kind {
                    NodeKind::Region { .. } => parent_rect.inner(self.metrics.region_padding),
                    _ => parent_rect,
                };
                let mut y = inner.y;
                for &sibling in &parent.children {
                    let h = self.content_size(sibling).height;
                    if sibling == id {
                        return Some(Rect::new(inner.x, y, inner.width, h));
                    }
                    y += h;
                }
                None
            }
        }
    }

    fn deepest_at(&self, id: NodeId, x: f32, y: f32) -> NodeId {
        for &child in self.children(id).iter().rev() {
            if self.layout_rect(child).is_some_and(|r| r.contains(x, y)) {
                return self.deepest_at(child, x, y);
            }
        }
        id
    }

    fn is_displayed(&self, region: NodeId) -> bool {
        matches!(
            self.node(region).map(|n| &n.kind),
            Some(NodeKind::Region { visibility, .. }) if visibility.displayed
        )
    }
}

impl Surface for Scene {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn create_region(&mut self) -> NodeId {
        let id = self.insert(
            None,
            NodeKind::Region {
                placement: Placement::default(),
                visibility: Visibility::HIDDEN,
            },
        );
        self.stack.push(id);
        flyout_core::trace!(region = id.id(), depth = self.stack.len(), "region created");
        id
    }

    fn detach(&mut self, region: NodeId) {
        self.stack.retain(|&r| r != region);
        self.remove_subtree(region);
        flyout_core::trace!(region = region.id(), "region detached");
    }

    fn is_attached(&self, region: NodeId) -> bool {
        self.stack.contains(&region)
    }

    fn raise(&mut self, region: NodeId) {
        if let Some(pos) = self.stack.iter().position(|&r| r == region) {
            let id = self.stack.remove(pos);
            self.stack.push(id);
            flyout_core::trace!(region = id.id(), from = pos, "region raised");
        }
    }

    fn set_placement(&mut self, region: NodeId, new: Placement) {
        if let Some(NodeData {
            kind: NodeKind::Region { placement, .. },
            ..
        }) = self.node_mut(region)
        {
            *placement = new;
        }
    }

    fn set_visibility(&mut self, region: NodeId, new: Visibility) {
        if let Some(NodeData {
            kind: NodeKind::Region { visibility, .. },
            ..
        }) = self.node_mut(region)
        {
            *visibility = new;
        }
    }

    fn visibility(&self, region: NodeId) -> Option<Visibility> {
        match self.node(region)?.kind {
            NodeKind::Region { visibility, .. } => Some(visibility),
            _ => None,
        }
    }

    fn append(&mut self, parent: NodeId, content: Content) -> Option<NodeId> {
        match self.node(parent)?.kind {
            NodeKind::Region { .. } | NodeKind::Content(ContentKind::Group) => {}
            _ => return None,
        }
        let Content {
            kind,
            class,
            instrumented,
        } = content;
        let id = self.insert(Some(parent), NodeKind::Content(kind));
        if let Some(node) = self.node_mut(id) {
            node.class = class;
            node.instrumented = instrumented;
        }
        self.node_mut(parent)?.children.push(id);
        Some(id)
    }

    fn clear(&mut self, region: NodeId, selector: Option<&str>) {
        let Some(node) = self.node(region) else {
            return;
        };
        match selector {
            None => {
                let children = node.children.clone();
                for child in children {
                    self.remove_subtree(child);
                }
                if let Some(node) = self.node_mut(region) {
                    node.children.clear();
                }
            }
            Some(selector) => {
                let class = selector.trim_start_matches('.');
                let mut pending = vec![region];
                while let Some(parent) = pending.pop() {
                    let children = self.children(parent).to_vec();
                    let (matched, kept): (Vec<NodeId>, Vec<NodeId>) = children
                        .into_iter()
                        .partition(|&c| self.class(c) == Some(class));
                    for m in matched {
                        self.remove_subtree(m);
                    }
                    pending.extend(kept.iter().copied());
                    if let Some(node) = self.node_mut(parent) {
                        node.children = kept;
                    }
                }
            }
        }
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        self.layout_rect(node)
    }

    fn region_of(&self, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            let data = self.node(current)?;
            if matches!(data.kind, NodeKind::Region { .. }) {
                return Some(current);
            }
            current = data.parent?;
        }
    }

    fn is_instrumented(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.instrumented)
    }

    fn declared_parent(&self, node: NodeId) -> Option<PanelId> {
        self.node(node)?.declared_parent
    }

    fn set_declared_parent(&mut self, node: NodeId, panel: Option<PanelId>) {
        if let Some(n) = self.node_mut(node) {
            n.declared_parent = panel;
        }
    }

    fn set_row_style(&mut self, node: NodeId, style: RowStyle) {
        if let Some(n) = self.node_mut(node) {
            n.row_style = style;
        }
    }

    fn hit_test(&self, x: f32, y: f32) -> Option<NodeId> {
        for &region in self.stack.iter().rev() {
            if !self.is_displayed(region) {
                continue;
            }
            if self.region_rect(region).is_some_and(|r| r.contains(x, y)) {
                let hit = self.deepest_at(region, x, y);
                flyout_core::trace!(x, y, region = region.id(), node = hit.id(), "hit");
                return Some(hit);
            }
        }
        self.page
            .iter()
            .rev()
            .copied()
            .find(|&p| self.layout_rect(p).is_some_and(|r| r.contains(x, y)))
    }
}

/// Row label as displayed, including any indicator glyph.
pub fn row_display(label: &str, style: RowStyle) -> String {
    match style.indicator {
        Some(Indicator::Leading) => format!("{} {label}", Indicator::Leading.glyph()),
        Some(Indicator::Trailing) => format!("{label} {}", Indicator::Trailing.glyph()),
        None => label.to_string(),
    }
}

/// Drop markup tags, turning `<br>` variants into newlines.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;
    for c in html.chars() {
        match (in_tag, c) {
            (false, '<') => {
                in_tag = true;
                tag.clear();
            }
            (true, '>') => {
                in_tag = false;
                let name = tag.trim().trim_end_matches('/').trim().to_ascii_lowercase();
                if name == "br" {
                    out.push('\n');
                }
            }
            (true, c) => tag.push(c),
            (false, c) => out.push(c),
        }
    }
    out
}
