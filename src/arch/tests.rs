use crate::arch::{self, ArmGcc, DelaySlot, FrameLayout, RiscV, Standard};

#[test]
fn instruction_pc_adjustments() {
    assert_eq!(Standard::previous_instruction_pc(0x1000), 0xfff);
    assert_eq!(Standard::next_instruction_pc(0x1000), 0x1001);
    assert_eq!(RiscV::previous_instruction_pc(0x1000), 0xfff);

    // thumb return addresses are odd
    assert_eq!(ArmGcc::previous_instruction_pc(0x1001), 0xffe);
    assert_eq!(ArmGcc::previous_instruction_pc(0x1004), 0x1000);
    assert_eq!(ArmGcc::next_instruction_pc(0x1000), 0x1004);

    assert_eq!(DelaySlot::previous_instruction_pc(0x1008), 0x1000);
    assert_eq!(DelaySlot::next_instruction_pc(0x1000), 0x1008);
}

#[test]
fn adjustments_wrap_instead_of_panicking() {
    assert_eq!(Standard::previous_instruction_pc(0), usize::MAX);
    assert_eq!(DelaySlot::next_instruction_pc(usize::MAX), 7);
}

#[test]
fn native_adjustment_round_trips_one_instruction() {
    let pc = 0x4000_1000;
    assert!(arch::previous_instruction_pc(pc) < pc);
    assert!(arch::next_instruction_pc(pc) > pc);
}

#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
#[test]
fn reads_registers() {
    let local = 0u64;
    let sp = core::ptr::addr_of!(local).addr();
    let fp = arch::frame_pointer();
    // our own frame record sits above our locals
    assert!(fp > sp);
    assert!(fp - sp < 0x10000);
    assert_ne!(arch::program_counter(), 0);
}

/// ARM and Thumb keep the frame pointer in different registers. Reading the
/// wrong one gives a value nowhere near our locals.
#[cfg(target_arch = "arm")]
#[test]
fn reads_frame_pointer_register_of_instruction_set() {
    let local = 0u32;
    let sp = core::ptr::addr_of!(local).addr();
    let fp = arch::frame_pointer();
    assert!(fp.abs_diff(sp) < 0x10000, "fp {fp:#x}, local {sp:#x}");
}
