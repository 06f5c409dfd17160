//! The frame validator.
//!
//! Every address read off the stack goes through [`StackBounds::is_valid_frame`]
//! before it is dereferenced.


use core::mem::size_of;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Smallest plausible frame record: saved frame pointer plus return address.
pub const FRAME_SIZE: usize = 2 * size_of::<usize>();

const FALLBACK_PAGE_SIZE: usize = 4096;

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(0);

/// The OS page size, queried once per process.
pub fn page_size() -> usize {
    let cached = PAGE_SIZE.load(Ordering::Relaxed);
    if cached != 0 {
        return cached;
    }
    // SAFETY: sysconf has no preconditions.
    let size = match unsafe { libc::sysconf(libc::_SC_PAGESIZE) } {
        n if n > 0 => n as usize,
        _ => FALLBACK_PAGE_SIZE,
    };
    PAGE_SIZE.store(size, Ordering::Relaxed);
    size
}

#[inline(always)]
pub fn is_aligned(addr: usize, alignment: usize) -> bool {
    addr & (alignment - 1) == 0
}

/// `bottom < candidate < top - FRAME_SIZE`.
#[inline(always)]
pub fn is_valid_frame(candidate: usize, stack_top: usize, stack_bottom: usize) -> bool {
    candidate > stack_bottom && candidate < stack_top.saturating_sub(FRAME_SIZE)
}

/// The address range a frame candidate has to fall into.
///
/// During a walk `bottom` is raised to the last frame visited, so it doubles
/// as the monotonicity watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackBounds {
    pub top: usize,
    pub bottom: usize,
}

impl StackBounds {
    pub const fn new(top: usize, bottom: usize) -> Self {
        Self { top, bottom }
    }

    #[inline(always)]
    pub fn is_valid_frame(&self, candidate: usize) -> bool {
        is_valid_frame(candidate, self.top, self.bottom)
    }

    /// Same top, bottom raised to `frame`.
    #[inline(always)]
    pub(crate) fn above(self, frame: usize) -> Self {
        Self {
            top: self.top,
            bottom: frame,
        }
    }
}
