#![allow(nonstandard_style)] // Itanium C++ ABI names, level 1 unwinding interface

use core::ffi;

/// Status codes exchanged between the platform unwinder and a trace callback.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum _Unwind_Reason_Code {
    /// Keep walking.
    _URC_NO_REASON = 0,
    _URC_FOREIGN_EXCEPTION_CAUGHT = 1,
    _URC_FATAL_PHASE2_ERROR = 2,
    _URC_FATAL_PHASE1_ERROR = 3,
    _URC_NORMAL_STOP = 4,
    /// Returned by the unwinder when it runs out of frames, and by a trace
    /// callback to stop the walk early.
    _URC_END_OF_STACK = 5,
    _URC_HANDLER_FOUND = 6,
    _URC_INSTALL_CONTEXT = 7,
    _URC_CONTINUE_UNWIND = 8,
    /// ARM EHABI only.
    _URC_FAILURE = 9,
}

/// Opaque per-frame state owned by the unwinder. Only ever seen behind a
/// pointer handed to the trace callback.
#[repr(C)]
pub struct _Unwind_Context {
    _private: [u8; 0],
}

pub type _Unwind_Trace_Fn =
    extern "C" fn(ctx: *mut _Unwind_Context, arg: *mut ffi::c_void) -> _Unwind_Reason_Code;

extern "C-unwind" {
    /// Walks the calling thread's stack using the unwind tables, calling
    /// `trace` once per frame starting with the caller of `_Unwind_Backtrace`.
    pub fn _Unwind_Backtrace(trace: _Unwind_Trace_Fn, arg: *mut ffi::c_void)
        -> _Unwind_Reason_Code;
}

#[cfg(not(all(target_arch = "arm", not(target_vendor = "apple"))))]
extern "C" {
    pub fn _Unwind_GetIP(ctx: *mut _Unwind_Context) -> usize;
}

/// On ARM EHABI `_Unwind_GetIP` is a header macro over the virtual register
/// set, so it has to be spelled out here.
#[cfg(all(target_arch = "arm", not(target_vendor = "apple")))]
pub unsafe fn _Unwind_GetIP(ctx: *mut _Unwind_Context) -> usize {
    #[repr(C)]
    enum _Unwind_VRS_RegClass {
        _UVRSC_CORE = 0,
    }

    #[repr(C)]
    enum _Unwind_VRS_DataRepresentation {
        _UVRSD_UINT32 = 0,
    }

    extern "C" {
        fn _Unwind_VRS_Get(
            ctx: *mut _Unwind_Context,
            regclass: _Unwind_VRS_RegClass,
            regno: u32,
            repr: _Unwind_VRS_DataRepresentation,
            data: *mut ffi::c_void,
        ) -> ffi::c_int;
    }

    const UNWIND_IP_REG: u32 = 15;

    let mut val: u32 = 0;
    _Unwind_VRS_Get(
        ctx,
        _Unwind_VRS_RegClass::_UVRSC_CORE,
        UNWIND_IP_REG,
        _Unwind_VRS_DataRepresentation::_UVRSD_UINT32,
        (&mut val as *mut u32).cast(),
    );
    // the low bit is the thumb state
    (val & !1) as usize
}
