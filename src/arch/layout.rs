use core::mem::size_of;
use core::ptr;

use crate::frame::{is_aligned, StackBounds};

/// Where a frame record keeps the caller's frame pointer and return address.
///
/// The `frame` pointers handed to these functions have already passed the
/// frame validator for the bounds in use, so reading the two words at
/// `frame[0]` and `frame[1]` is allowed. Anything further away must be
/// validated by the implementation before it is read.
pub trait FrameLayout {
    /// Maps the raw frame pointer register value to the slot holding the
    /// saved frame pointer. `None` ends the walk.
    ///
    /// # Safety
    /// `bp`, if it passes `bounds`, must point into readable stack memory.
    #[inline(always)]
    unsafe fn canonical_frame(bp: usize, _bounds: StackBounds) -> Option<*const usize> {
        Some(ptr::with_exposed_provenance(bp))
    }

    /// The return address saved for `frame`. `None` ends the walk.
    ///
    /// # Safety
    /// `frame` must be a validated, aligned frame inside `bounds`.
    unsafe fn return_address(frame: *const usize, bounds: StackBounds) -> Option<usize>;

    /// The caller's frame pointer saved in `frame`.
    ///
    /// # Safety
    /// `frame` must be a validated, aligned frame.
    unsafe fn saved_frame_pointer(frame: *const usize) -> usize;

    fn previous_instruction_pc(pc: usize) -> usize {
        pc.wrapping_sub(1)
    }

    fn next_instruction_pc(pc: usize) -> usize {
        pc.wrapping_add(1)
    }
}

/// `[fp, ra]` records, the frame pointer pointing at the saved fp.
/// x86, x86_64, aarch64, loongarch64 and most others.
#[derive(Debug, Clone, Copy)]
pub struct Standard;

impl FrameLayout for Standard {
    #[inline(always)]
    unsafe fn return_address(frame: *const usize, _bounds: StackBounds) -> Option<usize> {
        Some(frame.add(1).read())
    }

    #[inline(always)]
    unsafe fn saved_frame_pointer(frame: *const usize) -> usize {
        frame.read()
    }
}

/// RISC-V: the frame pointer points just past the record, `ra` at `fp[-1]`
/// and the caller's fp at `fp[-2]`.
#[derive(Debug, Clone, Copy)]
pub struct RiscV;

impl FrameLayout for RiscV {
    #[inline(always)]
    unsafe fn return_address(frame: *const usize, _bounds: StackBounds) -> Option<usize> {
        Some(frame.sub(1).read())
    }

    #[inline(always)]
    unsafe fn saved_frame_pointer(frame: *const usize) -> usize {
        frame.sub(2).read()
    }
}

/// PowerPC: `frame[0]` is the back chain, and the return address lives in the
/// *caller's* frame, two words in.
#[derive(Debug, Clone, Copy)]
pub struct PowerPc;

impl FrameLayout for PowerPc {
    unsafe fn return_address(frame: *const usize, bounds: StackBounds) -> Option<usize> {
        let caller = frame.read();
        if !bounds.is_valid_frame(caller) || !is_aligned(caller, size_of::<usize>()) {
            return None;
        }
        let caller: *const usize = ptr::with_exposed_provenance(caller);
        // SVR4 uses one word here, every other ABI two.
        Some(caller.add(2).read())
    }

    #[inline(always)]
    unsafe fn saved_frame_pointer(frame: *const usize) -> usize {
        frame.read()
    }
}

/// s390x keeps `r14` in the register save area of the frame.
#[derive(Debug, Clone, Copy)]
pub struct S390x;

impl FrameLayout for S390x {
    unsafe fn return_address(frame: *const usize, bounds: StackBounds) -> Option<usize> {
        let slot = frame.wrapping_add(14);
        if !bounds.is_valid_frame(slot.addr()) {
            return None;
        }
        Some(slot.read())
    }

    #[inline(always)]
    unsafe fn saved_frame_pointer(frame: *const usize) -> usize {
        frame.read()
    }
}

/// 32-bit ARM. LLVM points `r11` at the saved fp, GCC points it at the saved
/// `lr` one word above, so the canonical frame has to be guessed from what
/// the neighbouring words look like.
#[derive(Debug, Clone, Copy)]
pub struct ArmGcc;

impl FrameLayout for ArmGcc {
    unsafe fn canonical_frame(bp: usize, bounds: StackBounds) -> Option<*const usize> {
        if !bounds.is_valid_frame(bp) {
            return None;
        }
        let bp: *const usize = ptr::with_exposed_provenance(bp);
        if bounds.is_valid_frame(bp.read()) {
            return Some(bp);
        }
        // GCC layout: step back one word and look again.
        let gcc = bp.wrapping_sub(1);
        if bounds.is_valid_frame(gcc.read()) {
            return Some(gcc);
        }
        // No way to tell the layouts apart from here. Assume GCC.
        Some(gcc)
    }

    #[inline(always)]
    unsafe fn return_address(frame: *const usize, _bounds: StackBounds) -> Option<usize> {
        Some(frame.add(1).read())
    }

    #[inline(always)]
    unsafe fn saved_frame_pointer(frame: *const usize) -> usize {
        frame.read()
    }

    fn previous_instruction_pc(pc: usize) -> usize {
        // Thumb branches are 2 or 4 bytes, A32 always 4.
        pc.wrapping_sub(3) & !1
    }

    fn next_instruction_pc(pc: usize) -> usize {
        pc.wrapping_add(4)
    }
}

/// MIPS and SPARC: `[fp, ra]` records, but the return address skips a delay
/// slot so the call is two instructions back.
#[derive(Debug, Clone, Copy)]
pub struct DelaySlot;

impl FrameLayout for DelaySlot {
    #[inline(always)]
    unsafe fn return_address(frame: *const usize, _bounds: StackBounds) -> Option<usize> {
        Some(frame.add(1).read())
    }

    #[inline(always)]
    unsafe fn saved_frame_pointer(frame: *const usize) -> usize {
        frame.read()
    }

    fn previous_instruction_pc(pc: usize) -> usize {
        pc.wrapping_sub(8)
    }

    fn next_instruction_pc(pc: usize) -> usize {
        pc.wrapping_add(8)
    }
}
