// ============================================================================
// TIMERS - Puerto de temporizadores (gloo-timers en navegador)
// ============================================================================
// El temporizador se cancela al hacer drop del `TimerGuard`, igual que
// `gloo_timers::callback::{Timeout, Interval}`.
// ============================================================================

use std::any::Any;

#[must_use = "al soltar el TimerGuard el temporizador se cancela"]
pub struct TimerGuard {
    _inner: Box<dyn Any>,
}

impl TimerGuard {
    pub fn new<T: Any>(inner: T) -> Self {
        Self {
            _inner: Box::new(inner),
        }
    }
}

pub trait Timers {
    fn timeout(&self, millis: u32, callback: Box<dyn FnOnce()>) -> TimerGuard;
    fn interval(&self, millis: u32, callback: Box<dyn FnMut()>) -> TimerGuard;
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserTimers;

#[cfg(target_arch = "wasm32")]
mod browser {
    use gloo_timers::callback::{Interval, Timeout};

    use super::{TimerGuard, Timers};

    #[derive(Clone, Copy, Default)]
    pub struct BrowserTimers;

    impl Timers for BrowserTimers {
        fn timeout(&self, millis: u32, callback: Box<dyn FnOnce()>) -> TimerGuard {
            TimerGuard::new(Timeout::new(millis, callback))
        }

        fn interval(&self, millis: u32, callback: Box<dyn FnMut()>) -> TimerGuard {
            TimerGuard::new(Interval::new(millis, callback))
        }
    }
}
