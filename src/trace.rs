#[cfg(test)]
mod tests;

use core::ops::Deref;

/// What a trace was captured for. Allocation trackers keep alloc and dealloc
/// traces apart, tools pick their own tags above [`Tag::CUSTOM_BASE`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tag {
    #[default]
    Unknown,
    Alloc,
    Dealloc,
    Custom(u32),
}

impl Tag {
    pub const CUSTOM_BASE: u32 = 100;

    pub fn as_raw(self) -> u32 {
        match self {
            Tag::Unknown => 0,
            Tag::Alloc => 1,
            Tag::Dealloc => 2,
            Tag::Custom(n) => Self::CUSTOM_BASE.saturating_add(n),
        }
    }
}

/// Read-only view of the captured prefix of a frame buffer, innermost frame
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trace<'a> {
    frames: &'a [usize],
    tag: Tag,
}

impl<'a> Trace<'a> {
    pub fn new(frames: &'a [usize], tag: Tag) -> Self {
        Self { frames, tag }
    }

    pub fn frames(&self) -> &'a [usize] {
        self.frames
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Index of the entry closest to `pc`, the first one on ties. Used to find
    /// where a known caller shows up when the number of frames above it is
    /// not known exactly. 0 for an empty trace.
    pub fn locate_pc(&self, pc: usize) -> usize {
        let mut best = 0;
        for (i, &frame) in self.frames.iter().enumerate().skip(1) {
            if frame.abs_diff(pc) < self.frames[best].abs_diff(pc) {
                best = i;
            }
        }
        best
    }
}

impl Deref for Trace<'_> {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        self.frames
    }
}

impl<'a> IntoIterator for Trace<'a> {
    type Item = &'a usize;
    type IntoIter = core::slice::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
