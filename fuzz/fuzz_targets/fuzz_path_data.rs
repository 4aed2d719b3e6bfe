#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Path data either parses or reports a positioned error, never panics
    if let Ok(segments) = svg3d::parse_path(data) {
        let options = svg3d::FlattenOptions::default();
        let _ = svg3d::tessellate::path_contours(&segments, &options);
    }
});
