use crate::trace::{Tag, Trace};

#[test]
fn locate_pc_picks_closest_entry() {
    let frames = [0x1000, 0x5000, 0x3000, 0x5010];
    let trace = Trace::new(&frames, Tag::Unknown);
    assert_eq!(trace.locate_pc(0x1001), 0);
    assert_eq!(trace.locate_pc(0x3100), 2);
    assert_eq!(trace.locate_pc(0x5008), 1);
    assert_eq!(trace.locate_pc(0x6000), 3);
}

#[test]
fn locate_pc_on_empty_trace() {
    let trace = Trace::new(&[], Tag::Unknown);
    assert_eq!(trace.locate_pc(0x1234), 0);
    assert!(trace.is_empty());
}

#[test]
fn tags_map_to_raw_values() {
    assert_eq!(Tag::default(), Tag::Unknown);
    assert_eq!(Tag::Unknown.as_raw(), 0);
    assert_eq!(Tag::Alloc.as_raw(), 1);
    assert_eq!(Tag::Dealloc.as_raw(), 2);
    assert_eq!(Tag::Custom(3).as_raw(), 103);
}

#[test]
fn trace_iterates_innermost_first() {
    let frames = [3, 2, 1];
    let trace = Trace::new(&frames[..2], Tag::Dealloc);
    assert_eq!(trace.into_iter().copied().collect::<Vec<_>>(), [3, 2]);
    assert_eq!(trace.frames(), &[3, 2]);
    assert_eq!(trace.tag(), Tag::Dealloc);
}
