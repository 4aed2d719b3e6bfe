#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Whole pipeline: markup -> document -> scene
    let Ok(markup) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(scene) = svg3d::convert(markup) {
        assert_eq!(
            scene.summary.elements_total,
            scene.summary.objects_created + scene.summary.elements_skipped
        );
    }
});
