//! Unwind table walker.
//!
//! Hands the walk to the platform unwinder (`_Unwind_Backtrace`), which
//! recovers each caller from the `.eh_frame` data the compiler emits for
//! exception propagation. Works without frame pointers, but every step
//! interprets CFI, so it is much slower than [`super::fp`].

use core::ffi;

use super::{FrameSink, Termination};
use crate::frame::page_size;
use crate::uw;

/// Frames belonging to [`unwind_slow`] itself: [`walk`] and `unwind_slow`.
const OWN_FRAMES: usize = 2;

struct State<'s, 'a> {
    sink: &'s mut FrameSink<'a>,
    page: usize,
    termination: Termination,
}

extern "C" fn trace_frame(
    ctx: *mut uw::_Unwind_Context,
    arg: *mut ffi::c_void,
) -> uw::_Unwind_Reason_Code {
    // SAFETY: `arg` is the `State` passed to `_Unwind_Backtrace` in `walk`,
    // which outlives the walk.
    let state = unsafe { &mut *arg.cast::<State<'_, '_>>() };
    // SAFETY: `ctx` comes straight from the unwinder.
    let pc = unsafe { uw::_Unwind_GetIP(ctx) };

    if pc < state.page {
        state.termination = Termination::LowPc;
        return uw::_Unwind_Reason_Code::_URC_END_OF_STACK;
    }
    if state.sink.is_full() {
        state.termination = Termination::DepthReached;
        return uw::_Unwind_Reason_Code::_URC_END_OF_STACK;
    }
    state.sink.push(pc);
    uw::_Unwind_Reason_Code::_URC_NO_REASON
}

/// Captures the calling thread's stack from the unwind tables into `frames`,
/// at most `min(max_depth, frames.len())` entries. With `skip = 0` the first
/// entry is the return address into the caller of `unwind_slow`.
#[inline(never)]
pub fn unwind_slow(frames: &mut [usize], max_depth: usize, skip: usize) -> (usize, Termination) {
    let mut sink = FrameSink::new(frames, max_depth, skip.saturating_add(OWN_FRAMES));
    let termination = walk(&mut sink);
    (sink.len(), termination)
}

/// The unwinder reports the caller of `_Unwind_Backtrace` first, so this
/// function is always the first frame pushed.
#[inline(never)]
pub(crate) fn walk(sink: &mut FrameSink<'_>) -> Termination {
    if sink.limit() == 0 {
        trace!("slow unwind rejected, no room for frames");
        return Termination::Rejected;
    }

    let mut state = State {
        sink,
        page: page_size(),
        termination: Termination::EndOfStack,
    };
    // SAFETY: `trace_frame` only touches `state`, which lives across the call.
    let code = unsafe {
        uw::_Unwind_Backtrace(trace_frame, (&mut state as *mut State<'_, '_>).cast())
    };

    trace!(
        frames = state.sink.len(),
        termination = ?state.termination,
        ?code,
        "slow unwind finished"
    );
    state.termination
}
