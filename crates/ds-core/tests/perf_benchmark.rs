use ds_core::*;
use std::time::Instant;

#[test]
#[ignore] // Run manually with `cargo test --test perf_benchmark -- --nocapture --ignored`
fn benchmark_structural_sharing() {
    let mut doc = create_document(&DocumentConfig::default());
    let mut ids = Vec::with_capacity(5_000);
    for i in 0..5_000 {
        let layer = Layer::shape(ShapeKind::Rect, 10.0, 10.0)
            .at(i as f32, 0.0)
            .tagged([format!("cell-{}", i % 100)]);
        ids.push(layer.id);
        doc = add_layer(&doc, layer, None);
    }

    let start = Instant::now();
    let mut versions = Vec::with_capacity(1_000);
    for (n, id) in ids.iter().take(1_000).enumerate() {
        let patch = LayerPatch {
            opacity: Some((n % 10) as f32 / 10.0),
            ..Default::default()
        };
        let next = update_layer(versions.last().unwrap_or(&doc), *id, &patch);
        versions.push(next);
    }
    println!("1,000 updates over 5,000 layers in {:?}", start.elapsed());

    let start = Instant::now();
    let tagged = layers_with_tag(&doc, "cell-7").len();
    println!("tag lookup ({tagged} hits) in {:?}", start.elapsed());
}
