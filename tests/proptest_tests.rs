//! Property-based tests for svg3d
//!
//! These tests use proptest to generate random path data, colors and
//! documents and verify invariants hold across a wide range of inputs.

mod common;

use common::svg;
use proptest::prelude::*;
use svg3d::model::to_path_data;
use svg3d::{Rgba, convert, hex_to_rgba, parse_path};

// ============================================================================
// Generators
// ============================================================================

/// A coordinate with a short decimal representation
fn coord() -> impl Strategy<Value = f64> {
    (-1000i32..1000).prop_map(|v| f64::from(v) / 4.0)
}

/// One path command with its arguments
fn command() -> impl Strategy<Value = String> {
    prop_oneof![
        (coord(), coord()).prop_map(|(x, y)| format!("L{} {}", x, y)),
        (coord(), coord()).prop_map(|(x, y)| format!("l{},{}", x, y)),
        coord().prop_map(|x| format!("H{}", x)),
        coord().prop_map(|y| format!("v{}", y)),
        (coord(), coord(), coord(), coord(), coord(), coord())
            .prop_map(|(a, b, c, d, e, f)| format!("C{} {} {} {} {} {}", a, b, c, d, e, f)),
        (coord(), coord(), coord(), coord())
            .prop_map(|(a, b, c, d)| format!("s{} {} {} {}", a, b, c, d)),
        (coord(), coord(), coord(), coord())
            .prop_map(|(a, b, c, d)| format!("Q{} {} {} {}", a, b, c, d)),
        (coord(), coord()).prop_map(|(x, y)| format!("T{} {}", x, y)),
        (
            1i32..50,
            1i32..50,
            0i32..360,
            any::<bool>(),
            any::<bool>(),
            coord(),
            coord()
        )
            .prop_map(|(rx, ry, rot, large, sweep, x, y)| format!(
                "A{} {} {} {} {} {} {}",
                rx,
                ry,
                rot,
                u8::from(large),
                u8::from(sweep),
                x,
                y
            )),
        Just("Z".to_string()),
    ]
}

/// Path data starting with a move
fn path_data() -> impl Strategy<Value = String> {
    (coord(), coord(), prop::collection::vec(command(), 0..12))
        .prop_map(|(x, y, commands)| format!("M{} {} {}", x, y, commands.join(" ")))
}

/// A `<rect>` with possibly degenerate size and optional paint
fn rect_markup() -> impl Strategy<Value = String> {
    (
        coord(),
        coord(),
        -5i32..50,
        -5i32..50,
        prop::option::of(any::<[u8; 3]>()),
        prop::option::of(any::<[u8; 3]>()),
    )
        .prop_map(|(x, y, w, h, fill, stroke)| {
            let paint = |c: Option<[u8; 3]>| match c {
                Some([r, g, b]) => format!("#{:02x}{:02x}{:02x}", r, g, b),
                None => "none".to_string(),
            };
            format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="{}"/>"#,
                x,
                y,
                w,
                h,
                paint(fill),
                paint(stroke)
            )
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn hex_round_trips_channels(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
        let hex = format!("#{:02x}{:02x}{:02x}", r, g, b);
        let rgba = hex_to_rgba(&hex).unwrap();
        prop_assert_eq!(rgba.to_rgb8(), [r, g, b]);
        prop_assert!((rgba.r - f64::from(r) / 255.0).abs() < 1e-9);
        prop_assert_eq!(rgba.to_hex(), hex);
    }

    #[test]
    fn color_constructor_clamps(r in -2.0f64..2.0, g in -2.0f64..2.0, b in -2.0f64..2.0, a in -2.0f64..2.0) {
        let c = Rgba::new(r, g, b, a);
        for channel in [c.r, c.g, c.b, c.a] {
            prop_assert!((0.0..=1.0).contains(&channel));
        }
    }

    #[test]
    fn serialized_paths_reparse(d in path_data()) {
        let original = parse_path(&d).unwrap();
        let data = to_path_data(&original);
        let reparsed = parse_path(&data).unwrap();
        prop_assert_eq!(original.len(), reparsed.len());
        for (a, b) in original.iter().zip(&reparsed) {
            prop_assert!(a.approx_eq(b, 1e-6), "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn path_parser_never_panics(d in "[MmLlHhVvCcSsQqTtAaZz0-9 ,.eE+-]{0,40}") {
        let _ = parse_path(&d);
    }

    #[test]
    fn conversion_accounts_for_every_element(rects in prop::collection::vec(rect_markup(), 0..12)) {
        let scene = convert(&svg(&rects.concat())).unwrap();
        let summary = &scene.summary;
        prop_assert_eq!(summary.elements_total, rects.len());
        prop_assert_eq!(summary.objects_created + summary.elements_skipped, summary.elements_total);
        prop_assert_eq!(summary.objects_created, scene.objects.len());

        for object in &scene.objects {
            prop_assert!(object.fill_material.is_some() || object.stroke_material.is_some());
            for m in object.fill_material.iter().chain(&object.stroke_material) {
                prop_assert!(std::sync::Arc::ptr_eq(m, &scene.materials[m.id.0]));
            }
        }

        let mut names: Vec<_> = scene.objects.iter().map(|o| o.name.clone()).collect();
        names.sort();
        names.dedup();
        prop_assert_eq!(names.len(), scene.objects.len());
    }

    #[test]
    fn flattened_outlines_are_finite(d in path_data()) {
        let scene = convert(&svg(&format!(r##"<path d="{}" fill="#000" stroke="#fff"/>"##, d))).unwrap();
        for object in &scene.objects {
            for contour in &object.outline {
                prop_assert!(contour.points.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
                prop_assert!(contour.points.len() >= 2);
            }
        }
    }
}
