use criterion::{Criterion, criterion_group, criterion_main};
use livemark_engine::{Editor, MarkdownRenderer, RenderMode};
mod common;

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    group.sample_size(10);

    let content = common::generate_markdown_content(20);

    group.bench_function("full_pass", |b| {
        let mut editor = Editor::new(
            &content,
            MarkdownRenderer::source_faithful(),
            RenderMode::Segmented,
        )
        .unwrap();
        editor.set_caret(10);
        b.iter(|| {
            editor.notify_input().unwrap();
            std::hint::black_box(editor.version());
        });
    });

    group.bench_function("keystroke", |b| {
        let mut editor = Editor::new(
            &content,
            MarkdownRenderer::source_faithful(),
            RenderMode::Segmented,
        )
        .unwrap();
        editor.set_caret(10);
        b.iter(|| {
            editor.insert_text("x").unwrap();
            editor.delete_backward().unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_reconcile);
criterion_main!(benches);
