//! The two stack walkers and the buffer they write into.

pub mod eh;
pub mod fp;


/// Why a walk stopped. None of these are errors, the frames collected up to
/// that point are always the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Nothing was walked: max depth of 2 or less, or no room in the buffer.
    Rejected,
    /// The stack top was below a page, so only the starting pc is known.
    UnknownBounds,
    /// The buffer or the requested depth is full.
    DepthReached,
    /// The next frame was out of bounds, misaligned or not above the last one.
    InvalidFrame,
    /// A return address pointed into the zero page.
    LowPc,
    /// The platform unwinder ran out of frames.
    EndOfStack,
}

/// Front-to-back writer over a caller-owned frame buffer.
///
/// The first `skip` produced addresses are dropped without taking up space.
/// `last` is the most recently produced address, kept or not, for catching
/// frames that point at themselves.
#[derive(Debug)]
pub(crate) struct FrameSink<'a> {
    frames: &'a mut [usize],
    len: usize,
    limit: usize,
    skip: usize,
    last: Option<usize>,
}

impl<'a> FrameSink<'a> {
    pub(crate) fn new(frames: &'a mut [usize], max_depth: usize, skip: usize) -> Self {
        let limit = max_depth.min(frames.len());
        Self {
            frames,
            len: 0,
            limit,
            skip,
            last: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn limit(&self) -> usize {
        self.limit
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len >= self.limit
    }

    pub(crate) fn last(&self) -> Option<usize> {
        self.last
    }

    #[inline(always)]
    pub(crate) fn push(&mut self, pc: usize) {
        self.last = Some(pc);
        if self.skip > 0 {
            self.skip -= 1;
            return;
        }
        if self.len < self.limit {
            self.frames[self.len] = pc;
            self.len += 1;
        }
    }
}
