//! Shared helpers for integration tests

#![allow(dead_code)]

use svg3d::{Rgba, Scene};

/// Wrap element markup in a 100x100 root
pub fn svg(body: &str) -> String {
    format!(r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">{body}</svg>"#)
}

/// Route `tracing` output to the test harness (set `RUST_LOG` to see it)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Compare colors channel by channel
pub fn assert_rgba_near(actual: &Rgba, expected: (f64, f64, f64, f64)) {
    let (r, g, b, a) = expected;
    for (got, want) in [(actual.r, r), (actual.g, g), (actual.b, b), (actual.a, a)] {
        assert!(
            (got - want).abs() < 1e-6,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }
}

/// Warning codes of a scene in order
pub fn warning_codes(scene: &Scene) -> Vec<&str> {
    scene
        .summary
        .warnings
        .iter()
        .map(|w| w.code.as_str())
        .collect()
}

/// A moderately busy document: groups, every shape kind, curves and arcs
pub fn sample_document(repeat: usize) -> String {
    let mut body = String::new();
    for i in 0..repeat {
        let offset = (i % 10) as f64 * 8.0;
        body.push_str(&format!(
            r##"<g transform="translate({offset},{offset}) rotate(15)" fill="#3366cc" stroke="#000" stroke-width="0.5">
                <rect x="1" y="1" width="6" height="4" rx="1"/>
                <circle cx="4" cy="10" r="2.5" fill="#cc3333"/>
                <ellipse cx="4" cy="15" rx="3" ry="1.5"/>
                <path d="M0 20 C2 18 4 22 6 20 S10 18 12 20 Q14 24 16 20 T20 20 A3 2 30 0 1 26 20 Z"/>
                <polygon points="0,25 4,29 8,25"/>
                <polyline points="0,30 3,32 6,30 9,32" fill="none"/>
                <line x1="0" y1="35" x2="10" y2="35"/>
                <text x="0" y="40" font-size="4">Item {i}</text>
            </g>"##
        ));
    }
    svg(&body)
}
