//! Frame pointer walker.
//!
//! Follows the chain of saved frame pointers from the starting frame up the
//! stack, reading one return address per frame record. Only correct for code
//! built with frame pointers, but costs a couple of loads per frame.

use core::mem::size_of;

use super::{FrameSink, Termination};
use crate::arch::{self, FrameLayout, Native};
use crate::frame::{is_aligned, page_size, StackBounds};
use crate::limits::StackLimits;

/// Walks the frame chain starting at `bp`, writing `pc` followed by one
/// return address per frame into `frames`. Returns the number of entries
/// written, at most `min(max_depth, frames.len())`.
///
/// Returns 0 when `max_depth` is 2 or less. Returns 1 when `stack_top` is
/// below a page, which is what unknown stack limits look like.
///
/// # Safety
/// Every address strictly between `stack_bottom` and `stack_top` that is
/// reachable through the chain must be readable.
pub unsafe fn unwind_fast(
    frames: &mut [usize],
    pc: usize,
    bp: usize,
    stack_top: usize,
    stack_bottom: usize,
    max_depth: usize,
) -> usize {
    unwind_fast_with::<Native>(frames, pc, bp, stack_top, stack_bottom, max_depth)
}

/// [`unwind_fast`] with an explicit frame layout.
///
/// # Safety
/// See [`unwind_fast`].
pub unsafe fn unwind_fast_with<L: FrameLayout>(
    frames: &mut [usize],
    pc: usize,
    bp: usize,
    stack_top: usize,
    stack_bottom: usize,
    max_depth: usize,
) -> usize {
    let mut sink = FrameSink::new(frames, max_depth, 0);
    walk::<L>(&mut sink, pc, bp, StackBounds::new(stack_top, stack_bottom));
    sink.len()
}

/// How far above a local of [`capture`] its callers' frame records may sit
/// when the thread's stack limits are unknown.
const CALLER_WINDOW: usize = 64 * 1024;
/// How far below that local our own frame record may sit.
const OWN_FRAME_SLACK: usize = 1024;

/// Captures the calling thread's stack with this thread's stack limits.
/// With `skip = 0` the first entry is the return address into the caller of
/// `capture`.
///
/// Without known limits only that first entry is captured. It is read from
/// the live frames between `capture` and its caller, inside a small window
/// around `capture`'s own locals.
#[inline(never)]
pub fn capture(frames: &mut [usize], max_depth: usize, skip: usize) -> (usize, Termination) {
    let bp = arch::frame_pointer();
    let limits = StackLimits::current();
    let bounds = limits.bounds();

    if !limits.is_known() {
        let anchor = 0u8;
        let low = core::ptr::addr_of!(anchor).addr();
        let window = StackBounds::new(
            low.saturating_add(CALLER_WINDOW),
            low.saturating_sub(OWN_FRAME_SLACK),
        );
        // SAFETY: the first `skip + 1` frames of our chain are live, and the
        // window only admits records next to our own locals.
        let pc = match unsafe { return_address_at::<Native>(bp, window, skip) } {
            Some(pc) => pc,
            None => arch::program_counter(),
        };
        let mut sink = FrameSink::new(frames, max_depth, 0);
        // SAFETY: unknown bounds end the walk after `pc`.
        let termination = unsafe { walk::<Native>(&mut sink, pc, bp, bounds) };
        return (sink.len(), termination);
    }

    // SAFETY: `bp` is our own frame, and the stack limits cover the chain.
    unsafe {
        let pc = match return_address_at::<Native>(bp, bounds, 0) {
            Some(pc) => pc,
            None => arch::program_counter(),
        };
        let mut sink = FrameSink::new(frames, max_depth, skip);
        let termination = walk::<Native>(&mut sink, pc, bp, bounds);
        (sink.len(), termination)
    }
}

/// The return address stored in the `depth`th frame record of the chain
/// starting at `bp`, `bp` itself being record 0. `None` as soon as a record
/// falls outside `bounds` or the address lands in the zero page.
#[inline(always)]
unsafe fn return_address_at<L: FrameLayout>(
    bp: usize,
    mut bounds: StackBounds,
    depth: usize,
) -> Option<usize> {
    let mut frame = L::canonical_frame(bp, bounds)?;
    for level in 0..=depth {
        let addr = frame.addr();
        if !bounds.is_valid_frame(addr) || !is_aligned(addr, size_of::<usize>()) {
            return None;
        }
        if level == depth {
            break;
        }
        bounds = bounds.above(addr);
        frame = L::canonical_frame(L::saved_frame_pointer(frame), bounds)?;
    }
    L::return_address(frame, bounds).filter(|&pc| pc >= page_size())
}

pub(crate) unsafe fn walk<L: FrameLayout>(
    sink: &mut FrameSink<'_>,
    pc: usize,
    bp: usize,
    mut bounds: StackBounds,
) -> Termination {
    if sink.limit() <= 2 {
        trace!(limit = sink.limit(), "fast unwind rejected");
        return Termination::Rejected;
    }

    sink.push(pc);

    let page = page_size();
    if bounds.top < page {
        trace!(top = bounds.top, "stack limits unknown, stopping after the first frame");
        return Termination::UnknownBounds;
    }

    let mut frame = L::canonical_frame(bp, bounds);
    let termination = loop {
        let Some(current) = frame else {
            break Termination::InvalidFrame;
        };
        let addr = current.addr();
        // `bounds.bottom` is the previous frame, so a frame that points at
        // itself or further down the stack ends the walk here.
        if !bounds.is_valid_frame(addr) || !is_aligned(addr, size_of::<usize>()) {
            break Termination::InvalidFrame;
        }
        if sink.is_full() {
            break Termination::DepthReached;
        }

        let Some(return_address) = L::return_address(current, bounds) else {
            break Termination::InvalidFrame;
        };
        // nothing lives in the zero page
        if return_address < page {
            break Termination::LowPc;
        }
        if sink.last() != Some(return_address) {
            sink.push(return_address);
        }

        bounds = bounds.above(addr);
        frame = L::canonical_frame(L::saved_frame_pointer(current), bounds);
    };

    trace!(frames = sink.len(), ?termination, "fast unwind finished");
    termination
}
