use std::fmt::Debug;
use std::thread::sleep;
use std::time::Duration;

/// Blocking delay used for bus timing.
///
/// Drivers take this as a parameter instead of calling [std::thread::sleep] themselves, so tests
/// can swap in a delay that only records what was requested (see [crate::mock::MockDelay]).
pub trait Delay: Debug {
    /// Blocks the calling thread for at least `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// [Delay] backed by [std::thread::sleep].
#[derive(Copy, Clone, Debug, Default)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            sleep(duration);
        }
    }
}

impl<T: Delay + ?Sized> Delay for &mut T {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration)
    }
}
