use crate::limits::StackLimits;

#[test]
fn unknown_limits_have_empty_bounds() {
    assert!(!StackLimits::UNKNOWN.is_known());
    let bounds = StackLimits::UNKNOWN.bounds();
    assert_eq!((bounds.top, bounds.bottom), (0, 0));
    assert_eq!(StackLimits::default(), StackLimits::UNKNOWN);
}

#[test]
fn bounds_span_the_stack() {
    let limits = StackLimits {
        base: 0x7000_0000,
        size: 0x10_0000,
    };
    let bounds = limits.bounds();
    assert_eq!(bounds.bottom, 0x7000_0000);
    assert_eq!(bounds.top, 0x7010_0000);
}

#[cfg(any(target_os = "linux", target_os = "android", target_vendor = "apple"))]
#[test]
fn current_thread_stack_contains_locals() {
    let local = 0u64;
    let addr = core::ptr::addr_of!(local).addr();
    let limits = StackLimits::current();
    assert!(limits.is_known());
    assert!(limits.base < addr && addr < limits.base + limits.size);
    // cached after the first call
    assert_eq!(StackLimits::current(), limits);
}

#[cfg(any(target_os = "linux", target_os = "android", target_vendor = "apple"))]
#[test]
fn every_thread_has_its_own_limits() {
    let main = StackLimits::current();
    let spawned = std::thread::spawn(StackLimits::current).join().unwrap();
    assert!(spawned.is_known());
    assert_ne!(main, spawned);
}

#[test]
fn failed_discovery_stays_unknown() {
    std::thread::spawn(|| {
        crate::limits::fail_discovery_on_this_thread();
        assert_eq!(StackLimits::current(), StackLimits::UNKNOWN);
        assert_eq!(StackLimits::current(), StackLimits::UNKNOWN);
    })
    .join()
    .unwrap();
}
