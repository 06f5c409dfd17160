//! Register access and per-architecture frame layouts.
//!
//! Everything that differs between instruction-set families lives behind
//! [`FrameLayout`]. The walk loops are generic over it and [`Native`] picks the
//! layout of the target at compile time.

mod layout;

#[cfg(test)]
mod tests;

use core::arch::asm;

pub use layout::{ArmGcc, DelaySlot, FrameLayout, PowerPc, RiscV, S390x, Standard};

#[cfg(all(target_arch = "arm", not(target_vendor = "apple")))]
pub type Native = ArmGcc;
#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub type Native = RiscV;
#[cfg(any(target_arch = "powerpc", target_arch = "powerpc64"))]
pub type Native = PowerPc;
#[cfg(target_arch = "s390x")]
pub type Native = S390x;
#[cfg(any(
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "sparc",
    target_arch = "sparc64"
))]
pub type Native = DelaySlot;
#[cfg(not(any(
    all(target_arch = "arm", not(target_vendor = "apple")),
    target_arch = "riscv32",
    target_arch = "riscv64",
    target_arch = "powerpc",
    target_arch = "powerpc64",
    target_arch = "s390x",
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "sparc",
    target_arch = "sparc64",
)))]
pub type Native = Standard;

/// Address of the instruction preceding the one at `pc` on this target,
/// i.e. the call instruction when `pc` is a return address.
#[inline(always)]
pub fn previous_instruction_pc(pc: usize) -> usize {
    Native::previous_instruction_pc(pc)
}

/// Address of the instruction following the one at `pc` on this target.
pub fn next_instruction_pc(pc: usize) -> usize {
    Native::next_instruction_pc(pc)
}

/// Value of the frame pointer register in the calling function.
///
/// Returns 0 on targets where it can't be read, which every walker treats as
/// an invalid frame.
#[inline(always)]
pub(crate) fn frame_pointer() -> usize {
    let out: usize;
    unsafe {
        #[cfg(target_arch = "x86_64")]
        asm!("mov {out}, rbp", out = out(reg) out, options(nomem, nostack, preserves_flags));
        #[cfg(target_arch = "x86")]
        asm!("mov {out}, ebp", out = out(reg) out, options(nomem, nostack, preserves_flags));
        #[cfg(target_arch = "aarch64")]
        asm!("mov {out}, x29", out = out(reg) out, options(nomem, nostack, preserves_flags));
        // Thumb code keeps its frame pointer in r7, ARM code in r11.
        #[cfg(all(target_arch = "arm", target_feature = "thumb-mode"))]
        asm!("mov {out}, r7", out = out(reg) out, options(nomem, nostack, preserves_flags));
        #[cfg(all(target_arch = "arm", not(target_feature = "thumb-mode")))]
        asm!("mov {out}, r11", out = out(reg) out, options(nomem, nostack, preserves_flags));
        #[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
        asm!("mv {out}, s0", out = out(reg) out, options(nomem, nostack, preserves_flags));
        #[cfg(target_arch = "loongarch64")]
        asm!("move {out}, $fp", out = out(reg) out, options(nomem, nostack, preserves_flags));
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        target_arch = "x86",
        target_arch = "aarch64",
        target_arch = "arm",
        target_arch = "riscv32",
        target_arch = "riscv64",
        target_arch = "loongarch64",
    )))]
    {
        out = 0;
    }
    out
}

/// Address of the current instruction in the calling function, or 0 where it
/// can't be read.
#[inline(always)]
pub(crate) fn program_counter() -> usize {
    let out: usize;
    unsafe {
        #[cfg(target_arch = "x86_64")]
        asm!("lea {out}, [rip]", out = out(reg) out, options(nomem, nostack, preserves_flags));
        #[cfg(target_arch = "x86")]
        asm!("call 2f", "2:", "pop {out}", out = out(reg) out, options(nomem, preserves_flags));
        #[cfg(target_arch = "aarch64")]
        asm!("adr {out}, .", out = out(reg) out, options(nomem, nostack, preserves_flags));
        #[cfg(target_arch = "arm")]
        asm!("mov {out}, pc", out = out(reg) out, options(nomem, nostack, preserves_flags));
        #[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
        asm!("auipc {out}, 0", out = out(reg) out, options(nomem, nostack, preserves_flags));
        #[cfg(target_arch = "loongarch64")]
        asm!("pcaddi {out}, 0", out = out(reg) out, options(nomem, nostack, preserves_flags));
    }
    #[cfg(not(any(
        target_arch = "x86_64",
        target_arch = "x86",
        target_arch = "aarch64",
        target_arch = "arm",
        target_arch = "riscv32",
        target_arch = "riscv64",
        target_arch = "loongarch64",
    )))]
    {
        out = 0;
    }
    out
}
