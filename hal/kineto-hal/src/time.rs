//! Time source

/// Monotonic millisecond clock
///
/// Sleeping is not part of this trait; the scheduler waits through an
/// `embedded_hal::delay::DelayNs` so boards can reuse their delay provider.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin (usually boot)
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
