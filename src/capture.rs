//! The capture entry points.
//!
//! Every public capture method is `#[inline(never)]` and hides its own frame,
//! so with `skip = 0` the first entry is the return address into the code
//! that asked for the trace.

#[cfg(all(
    test,
    any(target_os = "linux", target_os = "android", target_vendor = "apple")
))]
mod tests;

use crate::trace::{Tag, Trace};
use crate::walk::{eh, fp, Termination};

/// Frames kept by a [`StackTrace`].
pub const MAX_FRAMES: usize = 255;

/// Which walker a capture uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Frame pointer chain, see [`crate::walk::fp`].
    Fast,
    /// Unwind tables, see [`crate::walk::eh`].
    Slow,
}

impl Strategy {
    /// MIPS code does not keep a usable frame pointer chain.
    pub const CAN_FAST_UNWIND: bool = !cfg!(any(target_arch = "mips", target_arch = "mips64"));
    /// `_Unwind_Backtrace` is not reliable on Apple targets.
    pub const CAN_SLOW_UNWIND: bool = !cfg!(target_vendor = "apple");

    /// The walker to use when the caller would prefer `request_fast`, given
    /// what the target supports.
    pub const fn select(request_fast: bool) -> Self {
        if !Self::CAN_FAST_UNWIND {
            Strategy::Slow
        } else if !Self::CAN_SLOW_UNWIND || request_fast {
            Strategy::Fast
        } else {
            Strategy::Slow
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::select(true)
    }
}

/// One capture into a caller-owned buffer.
///
/// The walk runs at most once: later calls return the frames from the first
/// call that found any, even if the stack has changed since. Not meant to be
/// shared between threads, it describes the stack of the thread that called
/// [`Capture::unwind`].
#[derive(Debug)]
pub struct Capture<'a> {
    frames: &'a mut [usize],
    count: usize,
    tag: Tag,
    strategy: Strategy,
    termination: Option<Termination>,
}

impl<'a> Capture<'a> {
    pub fn new(frames: &'a mut [usize]) -> Self {
        Self {
            frames,
            count: 0,
            tag: Tag::Unknown,
            strategy: Strategy::default(),
            termination: None,
        }
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }

    /// Overrides the walker used by [`Capture::unwind`]. A request the target
    /// can't honor falls back to the other walker.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Strategy::select(strategy == Strategy::Fast);
        self
    }

    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Why the walk that produced the current frames stopped, `None` before
    /// the first walk.
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// The frames captured so far, without walking.
    pub fn trace(&self) -> Trace<'_> {
        Trace::new(&self.frames[..self.count], self.tag)
    }

    /// Captures the calling thread's stack with the configured strategy.
    #[inline(never)]
    pub fn unwind(&mut self) -> Trace<'_> {
        if self.count == 0 {
            let depth = self.frames.len();
            let (count, termination) = match self.strategy {
                Strategy::Fast => fp::capture(self.frames, depth, 1),
                Strategy::Slow => eh::unwind_slow(self.frames, depth, 1),
            };
            self.record(count, termination);
        }
        self.trace()
    }

    /// Captures with the frame pointer walker, dropping the `skip` innermost
    /// frames. Returns the number of frames in the buffer.
    #[inline(never)]
    pub fn unwind_fast(&mut self, skip: usize) -> usize {
        if self.count == 0 {
            let depth = self.frames.len();
            let (count, termination) = fp::capture(self.frames, depth, skip.saturating_add(1));
            self.record(count, termination);
        }
        self.count
    }

    /// Captures with the unwind table walker, dropping the `skip` innermost
    /// frames. Returns the number of frames in the buffer.
    #[inline(never)]
    pub fn unwind_slow(&mut self, skip: usize) -> usize {
        if self.count == 0 {
            let depth = self.frames.len();
            let (count, termination) =
                eh::unwind_slow(self.frames, depth, skip.saturating_add(1));
            self.record(count, termination);
        }
        self.count
    }

    /// Drops the `count` innermost frames, moving the rest to the front.
    /// Dropping all of them leaves an empty capture that will walk again.
    pub fn pop_frames(&mut self, count: usize) {
        if count >= self.count {
            self.count = 0;
            return;
        }
        self.frames.copy_within(count..self.count, 0);
        self.count -= count;
    }

    fn record(&mut self, count: usize, termination: Termination) {
        self.count = count;
        self.termination = Some(termination);
    }
}

/// A trace with its own fixed buffer of [`MAX_FRAMES`] entries, captured with
/// the default strategy.
#[derive(Debug, Clone)]
pub struct StackTrace {
    frames: [usize; MAX_FRAMES],
    count: usize,
}

impl Default for StackTrace {
    fn default() -> Self {
        Self {
            frames: [0; MAX_FRAMES],
            count: 0,
        }
    }
}

impl StackTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks on the first call, returns the same frames afterwards.
    #[inline(never)]
    pub fn unwind(&mut self) -> &[usize] {
        if self.count == 0 {
            self.count = match Strategy::default() {
                Strategy::Fast => fp::capture(&mut self.frames, MAX_FRAMES, 1).0,
                Strategy::Slow => eh::unwind_slow(&mut self.frames, MAX_FRAMES, 1).0,
            };
        }
        &self.frames[..self.count]
    }
}
