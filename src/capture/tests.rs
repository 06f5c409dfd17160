use std::hint::black_box;

use crate::capture::{Capture, StackTrace, Strategy, MAX_FRAMES};
use crate::limits::{self, StackLimits};
use crate::trace::Tag;
use crate::walk::Termination;

/// Return addresses of the same function never end up further apart.
const SAME_FUNCTION: usize = 0x1000;

#[inline(never)]
fn capture_both(fast: &mut [usize], slow: &mut [usize]) -> (usize, usize) {
    let fast = Capture::new(fast).unwind_fast(0);
    let slow = Capture::new(slow).unwind_slow(0);
    black_box((fast, slow))
}

#[inline(never)]
fn middle(fast: &mut [usize], slow: &mut [usize]) -> (usize, usize) {
    black_box(capture_both(fast, slow))
}

#[inline(never)]
fn outer(fast: &mut [usize], slow: &mut [usize]) -> (usize, usize) {
    black_box(middle(fast, slow))
}

#[test]
fn fast_and_slow_agree_on_callers() {
    let mut fast = [0usize; 255];
    let mut slow = [0usize; 255];
    let (fast_count, slow_count) = outer(&mut fast, &mut slow);

    assert!(fast_count >= 3, "fast: {:x?}", &fast[..fast_count]);
    assert!(slow_count >= 3, "slow: {:x?}", &slow[..slow_count]);
    assert!(fast_count <= 255 && slow_count <= 255);

    // both start inside `capture_both`, at their own call sites
    assert!(fast[0].abs_diff(slow[0]) < SAME_FUNCTION);
    // then return into `middle` and `outer` through the same calls
    assert_eq!(fast[1..3], slow[1..3]);

    assert!(inside(fast[0], capture_both as *const ()), "{:x?}", &fast[..3]);
    assert!(inside(fast[1], middle as *const ()), "{:x?}", &fast[..3]);
    assert!(inside(fast[2], outer as *const ()), "{:x?}", &fast[..3]);
}

/// Whether `pc` is a plausible return address into the function at `start`.
fn inside(pc: usize, start: *const ()) -> bool {
    let start = start.addr();
    start < pc && pc < start + SAME_FUNCTION
}

#[inline(never)]
fn skip_one() -> (Vec<usize>, Vec<usize>) {
    let mut all = [0usize; 32];
    let mut skipped = [0usize; 32];
    let all_count = Capture::new(&mut all).unwind_fast(0);
    let skipped_count = Capture::new(&mut skipped).unwind_fast(1);
    black_box((all[..all_count].to_vec(), skipped[..skipped_count].to_vec()))
}

#[test]
fn skip_drops_innermost_frames() {
    let (all, skipped) = skip_one();
    assert!(all.len() >= 2, "{all:x?}");
    assert_eq!(skipped[0], all[1]);
}

#[test]
fn unwind_runs_once() {
    let mut frames = [0usize; 64];
    let mut capture = Capture::new(&mut frames).with_tag(Tag::Alloc);
    assert!(capture.termination().is_none());

    let first = capture.unwind().to_vec();
    assert!(!first.is_empty());
    let termination = capture.termination();
    assert!(termination.is_some());

    let second = black_box(nested_unwind(&mut capture));
    assert_eq!(first, second);
    assert_eq!(capture.termination(), termination);
    assert_eq!(capture.trace().tag(), Tag::Alloc);
    assert_eq!(capture.unwind_fast(0), first.len());
    assert_eq!(capture.unwind_slow(0), first.len());
}

#[inline(never)]
fn nested_unwind(capture: &mut Capture<'_>) -> Vec<usize> {
    capture.unwind().to_vec()
}

#[test]
fn count_never_exceeds_capacity() {
    for capacity in [0, 1, 2, 3, 4, 16] {
        let mut frames = vec![0usize; capacity];
        let mut capture = Capture::new(&mut frames).with_strategy(Strategy::Slow);
        assert!(capture.unwind().len() <= capacity);

        let mut frames = vec![0usize; capacity];
        let mut capture = Capture::new(&mut frames).with_strategy(Strategy::Fast);
        assert!(capture.unwind().len() <= capacity);
        assert_eq!(capture.capacity(), capacity);
    }
}

#[test]
fn fast_capture_into_tiny_buffer_is_rejected() {
    let mut frames = [0usize; 2];
    let mut capture = Capture::new(&mut frames);
    assert_eq!(capture.unwind_fast(0), 0);
    assert_eq!(capture.termination(), Some(Termination::Rejected));
}

#[test]
fn pop_frames_shifts_to_front() {
    let mut frames = [0usize; 32];
    let mut capture = Capture::new(&mut frames);
    let count = capture.unwind_fast(0);
    assert!(count >= 2);
    let before = capture.trace().to_vec();

    capture.pop_frames(1);
    assert_eq!(capture.len(), count - 1);
    assert_eq!(&*capture.trace(), &before[1..]);

    capture.pop_frames(capture.len());
    assert!(capture.is_empty());
}

#[test]
fn stack_trace_is_memoized() {
    let mut trace = StackTrace::new();
    let first = trace.unwind().to_vec();
    assert!(!first.is_empty());
    assert!(first.len() <= MAX_FRAMES);
    assert_eq!(black_box(trace.unwind()), &first[..]);
}

#[test]
fn strategy_follows_target_support() {
    if Strategy::CAN_FAST_UNWIND && Strategy::CAN_SLOW_UNWIND {
        assert_eq!(Strategy::select(true), Strategy::Fast);
        assert_eq!(Strategy::select(false), Strategy::Slow);
    }
    if !Strategy::CAN_SLOW_UNWIND {
        assert_eq!(Strategy::select(false), Strategy::Fast);
    }
    if !Strategy::CAN_FAST_UNWIND {
        assert_eq!(Strategy::select(true), Strategy::Slow);
    }
    assert_eq!(Strategy::default(), Strategy::select(true));
}

#[inline(never)]
fn capture_without_limits(frames: &mut [usize]) -> (usize, Option<Termination>) {
    let mut capture = Capture::new(frames);
    let count = capture.unwind_fast(0);
    black_box((count, capture.termination()))
}

#[test]
fn unknown_limits_still_capture_the_call_site() {
    let handle = std::thread::spawn(|| {
        limits::fail_discovery_on_this_thread();
        assert!(!StackLimits::current().is_known());

        let mut frames = [0usize; 64];
        let (count, termination) = capture_without_limits(&mut frames);
        assert_eq!(count, 1, "{:x?}", &frames[..count]);
        assert_eq!(termination, Some(Termination::UnknownBounds));
        assert!(
            inside(frames[0], capture_without_limits as *const ()),
            "{:#x}",
            frames[0]
        );

        // a non-empty capture is kept
        let mut capture = Capture::new(&mut frames);
        assert_eq!(capture.unwind_fast(0), 1);
        let first = capture.trace().to_vec();
        assert_eq!(black_box(capture.unwind_fast(0)), 1);
        assert_eq!(&*capture.trace(), &first[..]);

        if Strategy::default() == Strategy::Fast {
            let mut trace = StackTrace::new();
            assert_eq!(trace.unwind().len(), 1);
            assert_eq!(black_box(trace.unwind()).len(), 1);
        }
    });
    handle.join().unwrap();
}

#[test]
fn captures_on_spawned_threads() {
    let handle = std::thread::spawn(|| {
        let mut frames = [0usize; 64];
        Capture::new(&mut frames).unwind_fast(0)
    });
    let count = handle.join().unwrap();
    assert!(count >= 1);
}
