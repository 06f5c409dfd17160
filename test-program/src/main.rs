use std::hint::black_box;

use fastwind::{Capture, StackTrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn print(label: &str, frames: &[usize]) {
    println!("{label}: {} frames", frames.len());
    for pc in frames {
        println!("  {pc:#x}");
    }
}

#[inline(never)]
fn func2() {
    let mut trace = StackTrace::new();
    print("default", trace.unwind());

    let mut fast = [0usize; 255];
    let count = Capture::new(&mut fast).unwind_fast(0);
    print("fast", &fast[..count]);

    let mut slow = [0usize; 255];
    let count = Capture::new(&mut slow).unwind_slow(0);
    print("slow", &slow[..count]);
}

#[inline(never)]
fn func1() {
    func2();
    black_box(());
}

fn main() {
    let registry = tracing_subscriber::Registry::default().with(
        EnvFilter::builder()
            .with_default_directive(tracing::Level::TRACE.into())
            .from_env()
            .unwrap(),
    );

    let tree_layer = tracing_tree::HierarchicalLayer::new(2)
        .with_targets(true)
        .with_bracketed_fields(true);

    registry.with(tree_layer).init();

    func1();
    black_box(());
}
