//! Per-thread stack limits, asked from the threading library once per thread.

#[cfg(test)]
mod tests;

use std::cell::Cell;

use tracing::instrument;

use crate::frame::StackBounds;

/// The memory range of one thread's stack. `base` is the lowest address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackLimits {
    pub base: usize,
    pub size: usize,
}

thread_local! {
    static LIMITS: Cell<StackLimits> = const { Cell::new(StackLimits::UNKNOWN) };
}

#[cfg(test)]
thread_local! {
    static FAIL_DISCOVERY: Cell<bool> = const { Cell::new(false) };
}

/// Makes every later discovery on the calling thread fail, as it does on
/// targets the threading library can't describe.
#[cfg(test)]
pub(crate) fn fail_discovery_on_this_thread() {
    FAIL_DISCOVERY.with(|fail| fail.set(true));
    LIMITS.with(|limits| limits.set(StackLimits::UNKNOWN));
}

impl StackLimits {
    /// Not discovered yet, or the threading library wouldn't tell.
    pub const UNKNOWN: Self = Self { base: 0, size: 0 };

    pub fn is_known(&self) -> bool {
        self.base != 0
    }

    /// The stack grows down from `base + size` towards `base`.
    pub fn bounds(&self) -> StackBounds {
        StackBounds::new(self.base.saturating_add(self.size), self.base)
    }

    /// Limits of the calling thread, discovered on first use.
    ///
    /// A failed discovery is retried on the next call. During thread-local
    /// teardown this returns [`StackLimits::UNKNOWN`].
    pub fn current() -> Self {
        LIMITS
            .try_with(|limits| {
                let cached = limits.get();
                if cached.is_known() {
                    return cached;
                }
                #[cfg(test)]
                if FAIL_DISCOVERY.with(Cell::get) {
                    return Self::UNKNOWN;
                }
                let found = Self::discover();
                limits.set(found);
                found
            })
            .unwrap_or(Self::UNKNOWN)
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[instrument(level = "debug")]
    fn discover() -> Self {
        use core::{mem, ptr};

        unsafe {
            let mut attr: libc::pthread_attr_t = mem::zeroed();
            let ret = libc::pthread_getattr_np(libc::pthread_self(), &mut attr);
            if ret != 0 {
                debug!(ret, "pthread_getattr_np failed");
                return Self::UNKNOWN;
            }

            let mut stackaddr: *mut libc::c_void = ptr::null_mut();
            let mut stacksize: libc::size_t = 0;
            let ret = libc::pthread_attr_getstack(&attr, &mut stackaddr, &mut stacksize);
            libc::pthread_attr_destroy(&mut attr);
            if ret != 0 {
                debug!(ret, "pthread_attr_getstack failed");
                return Self::UNKNOWN;
            }

            let limits = Self {
                base: stackaddr.addr(),
                size: stacksize,
            };
            debug!(base = limits.base, size = limits.size, "discovered stack limits");
            limits
        }
    }

    #[cfg(target_vendor = "apple")]
    #[instrument(level = "debug")]
    fn discover() -> Self {
        unsafe {
            let thread = libc::pthread_self();
            // this is the highest address of the stack
            let top = libc::pthread_get_stackaddr_np(thread).addr();
            let size = libc::pthread_get_stacksize_np(thread);
            if top == 0 || size > top {
                debug!(top, size, "pthread_get_stackaddr_np returned nonsense");
                return Self::UNKNOWN;
            }
            let limits = Self {
                base: top - size,
                size,
            };
            debug!(base = limits.base, size = limits.size, "discovered stack limits");
            limits
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "android", target_vendor = "apple")))]
    #[instrument(level = "debug")]
    fn discover() -> Self {
        debug!("no way to discover stack limits on this target");
        Self::UNKNOWN
    }
}
