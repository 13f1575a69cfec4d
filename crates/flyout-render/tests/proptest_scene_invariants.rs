#![forbid(unsafe_code)]

//! Property tests for `Scene` layout and hit testing.
//!
//! Labels are ASCII so widths are exact multiples of the column width.

use flyout_core::geometry::Rect;
use flyout_render::{Content, NodeId, Placement, Scene, SceneMetrics, Surface, Visibility};
use proptest::prelude::*;

fn labels() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,16}", 1..8)
}

fn coord(max: u16) -> impl Strategy<Value = f32> {
    (0..max).prop_map(f32::from)
}

fn region_with_rows(scene: &mut Scene, x: f32, y: f32, labels: &[String]) -> (NodeId, Vec<NodeId>) {
    let region = scene.create_region();
    scene.set_placement(region, Placement::at(x, y));
    scene.set_visibility(region, Visibility::SHOWN);
    let rows = labels
        .iter()
        .filter_map(|l| scene.append(region, Content::row(l.clone(), false)))
        .collect();
    (region, rows)
}

proptest! {
    #[test]
    fn region_size_follows_widest_row(labels in labels(), x in coord(500), y in coord(400)) {
        let mut scene = Scene::new(1000.0, 800.0);
        let m = SceneMetrics::default();
        let (region, _) = region_with_rows(&mut scene, x, y, &labels);
        let rect = scene.bounding_rect(region).unwrap();

        let widest = labels.iter().map(String::len).max().unwrap_or(0) as f32;
        let natural = widest * m.char_width + m.row_padding + m.region_padding.horizontal_sum();
        prop_assert!(rect.width >= m.min_region_width);
        prop_assert_eq!(rect.width, natural.max(m.min_region_width));
        prop_assert_eq!(
            rect.height,
            labels.len() as f32 * m.line_height + m.region_padding.vertical_sum()
        );
        prop_assert_eq!((rect.x, rect.y), (x, y));
    }

    #[test]
    fn rows_stack_without_gaps(labels in labels(), x in coord(500), y in coord(400)) {
        let mut scene = Scene::new(1000.0, 800.0);
        let m = SceneMetrics::default();
        let (region, rows) = region_with_rows(&mut scene, x, y, &labels);
        let outer = scene.bounding_rect(region).unwrap();

        let mut expected_y = y + m.region_padding.top;
        for row in rows {
            let rect = scene.bounding_rect(row).unwrap();
            prop_assert_eq!(rect.y, expected_y);
            prop_assert_eq!(rect.height, m.line_height);
            prop_assert_eq!(rect.x, x + m.region_padding.left);
            prop_assert_eq!(rect.width, outer.width - m.region_padding.horizontal_sum());
            expected_y += m.line_height;
        }
    }

    #[test]
    fn hit_inside_row_resolves_to_row_and_region(
        labels in labels(),
        x in coord(500),
        y in coord(400),
        pick in any::<prop::sample::Index>(),
        dx in 0u16..50,
        dy in 0u16..20,
    ) {
        let mut scene = Scene::new(1000.0, 800.0);
        let (region, rows) = region_with_rows(&mut scene, x, y, &labels);
        let row = rows[pick.index(rows.len())];
        let rect = scene.bounding_rect(row).unwrap();

        let hit = scene.hit_test(rect.x + f32::from(dx), rect.y + f32::from(dy));
        prop_assert_eq!(hit, Some(row));
        prop_assert_eq!(scene.region_of(row), Some(region));
    }

    #[test]
    fn hidden_region_is_empty_and_unhittable(labels in labels(), x in coord(500), y in coord(400)) {
        let mut scene = Scene::new(1000.0, 800.0);
        let (region, rows) = region_with_rows(&mut scene, x, y, &labels);
        scene.set_visibility(region, Visibility::HIDDEN);

        prop_assert_eq!(scene.bounding_rect(region), Some(Rect::default()));
        for row in rows {
            prop_assert_eq!(scene.bounding_rect(row), Some(Rect::default()));
        }
        prop_assert_eq!(scene.hit_test(x + 1.0, y + 1.0), None);
    }

    #[test]
    fn scroll_offsets_every_region(
        x in coord(500),
        y in coord(400),
        sx in coord(300),
        sy in coord(300),
    ) {
        let mut scene = Scene::new(1000.0, 800.0);
        let (region, _) = region_with_rows(&mut scene, x, y, &["row".to_string()]);
        let before = scene.bounding_rect(region).unwrap();
        scene.scroll_to(sx, sy);
        let after = scene.bounding_rect(region).unwrap();
        prop_assert_eq!(after, before.translate(-sx, -sy));
    }

    #[test]
    fn raised_region_wins_overlapping_hits(count in 2usize..6, pick in any::<prop::sample::Index>()) {
        let mut scene = Scene::new(1000.0, 800.0);
        let regions: Vec<NodeId> = (0..count)
            .map(|_| region_with_rows(&mut scene, 100.0, 100.0, &["row".to_string()]).0)
            .collect();
        prop_assert_eq!(scene.hit_test(101.0, 101.0), regions.last().copied());

        let raised = regions[pick.index(count)];
        scene.raise(raised);
        prop_assert_eq!(scene.stacking_order().last().copied(), Some(raised));
        // Region padding, not a row.
        prop_assert_eq!(scene.hit_test(101.0, 101.0), Some(raised));
    }
}
