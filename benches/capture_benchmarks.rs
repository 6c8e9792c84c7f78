use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use vdom_capture::capture::fingerprint::fingerprint;
use vdom_capture::capture::reconcile::{Discovered, OrderReconciler};
use vdom_capture::capture::{CaptureEngine, DocumentIdentity};
use vdom_capture::config::{CaptureConfig, FingerprintConfig};
use vdom_capture::snapshot::{DocumentSnapshot, SnapshotBlock};
use vdom_capture::tree::BlockMarker;

fn bench_fingerprint(c: &mut Criterion) {
    let config = FingerprintConfig::default();
    let text = "Virtualized lists recreate their rows while scrolling, so identity is derived.";

    c.bench_function("fingerprint_paragraph", |b| {
        b.iter(|| black_box(fingerprint(black_box(text), black_box(1024.3), &config)));
    });
}

fn bench_merge(c: &mut Criterion) {
    let config = FingerprintConfig::default();
    let discovered: Vec<Discovered> = (0..2_000)
        .map(|i| {
            let position = i as f64 * 32.0;
            Discovered::new(fingerprint(&format!("row {}", i), position, &config), position)
        })
        .collect();
    let store = vdom_capture::capture::BlockStore::new();

    c.bench_function("merge_40_windows_of_50", |b| {
        b.iter(|| {
            let mut order = Vec::new();
            for window in discovered.chunks(50) {
                order = OrderReconciler::merge(&order, window, &store);
            }
            black_box(order);
        });
    });
}

fn bench_full_capture(c: &mut Criterion) {
    let mut snapshot = DocumentSnapshot::new("bench", 800.0).with_overscan(200.0);
    for i in 0..1_000 {
        snapshot = snapshot.with_block(
            SnapshotBlock::new(i as f64 * 32.0, vec![BlockMarker::Text])
                .with_text(format!("Paragraph number {} with a little text", i)),
        );
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");

    c.bench_function("capture_1000_paragraphs", |b| {
        b.iter_batched(
            || snapshot.clone().into_document(),
            |mut document| {
                let engine =
                    CaptureEngine::new(DocumentIdentity::new("bench"), CaptureConfig::fast())
                        .expect("valid config");
                let report = runtime
                    .block_on(engine.start_capture(&mut document))
                    .expect("capture succeeds");
                black_box(report.text);
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_fingerprint, bench_merge, bench_full_capture);
criterion_main!(benches);
