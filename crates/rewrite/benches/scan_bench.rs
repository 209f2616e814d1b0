use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use dom::{Document, DocumentHandle, Node};
use rewrite::{Coordinator, Target, Watcher, WatcherOptions};
use std::sync::Arc;

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 5_000;

fn elem(name: &str, attributes: &[(&str, &str)], children: Vec<Node>) -> Node {
    Node::Element {
        name: Arc::from(name),
        attributes: attributes
            .iter()
            .map(|(k, v)| (Arc::from(*k), v.to_string()))
            .collect(),
        shadow: None,
        children,
    }
}

fn text(value: &str) -> Node {
    Node::Text {
        text: value.to_string(),
    }
}

/// `<div class=box title=tip><span>hello</span><input placeholder=search></div>`
/// repeated, with every eighth block hosting a shadow root.
fn make_page(blocks: usize) -> Node {
    let body = (0..blocks)
        .map(|i| {
            let children = vec![
                elem("span", &[], vec![text("hello world")]),
                elem("input", &[("placeholder", "search")], vec![]),
            ];
            let mut block = elem("div", &[("class", "box"), ("title", "tip")], children);
            if i % 8 == 0
                && let Node::Element { shadow, .. } = &mut block
            {
                *shadow = Some(vec![elem("b", &[], vec![text("shadowed")])]);
            }
            block
        })
        .collect();
    Node::Document {
        children: vec![elem(
            "html",
            &[],
            vec![
                elem("head", &[], vec![elem("title", &[], vec![text("bench")])]),
                elem("body", &[], body),
            ],
        )],
    }
}

fn cold_scan(c: &mut Criterion, name: &str, blocks: usize, options: WatcherOptions) {
    let tree = make_page(blocks);
    c.bench_function(name, |b| {
        b.iter_batched(
            || Coordinator::new(DocumentHandle::new(Document::from_tree(&tree))),
            |coordinator| {
                let watcher = Watcher::new(
                    &coordinator,
                    |s: &str| s.replace("world", "earth"),
                    Target::Document,
                    options.clone(),
                )
                .expect("identity-like transform cannot fail");
                black_box(watcher.targets().len());
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_cold_scan_small(c: &mut Criterion) {
    cold_scan(c, "bench_cold_scan_small", SMALL_BLOCKS, WatcherOptions::default());
}

fn bench_cold_scan_large(c: &mut Criterion) {
    cold_scan(c, "bench_cold_scan_large", LARGE_BLOCKS, WatcherOptions::default());
}

fn bench_cold_scan_large_styled(c: &mut Criterion) {
    let options = WatcherOptions {
        icon_fonts: true,
        css_generated_content: true,
        ..WatcherOptions::default()
    };
    cold_scan(c, "bench_cold_scan_large_styled", LARGE_BLOCKS, options);
}

criterion_group!(
    benches,
    bench_cold_scan_small,
    bench_cold_scan_large,
    bench_cold_scan_large_styled
);
criterion_main!(benches);
