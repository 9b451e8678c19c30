//! Time source and timer port.
//!
//! The engine never calls `setInterval` directly. Everything that needs a
//! timer goes through [`Clock`], so tests can swap in a virtual clock and step
//! time deterministically. Timers are RAII handles: dropping one cancels it.

use wasm_bindgen::prelude::*;

/// Source of time and one-shot / repeating timers.
pub trait Clock: Clone + 'static {
	/// Live timer handle. Dropping it cancels the timer.
	type Timer: 'static;

	/// Monotonic milliseconds.
	fn now_ms(&self) -> f64;

	/// Run `tick` every `period_ms` until the returned handle is dropped.
	fn interval(&self, period_ms: u32, tick: impl FnMut() + 'static) -> Self::Timer;

	/// Run `fire` once after `delay_ms` unless the handle is dropped first.
	fn timeout(&self, delay_ms: u32, fire: impl FnOnce() + 'static) -> Self::Timer;
}

/// [`Clock`] backed by `window.setInterval` / `window.setTimeout`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserClock;

/// A browser timer. Holds the JS closure alive and clears the timer on drop.
pub struct BrowserTimer {
	handle: Option<i32>,
	repeating: bool,
	_closure: Closure<dyn FnMut()>,
}

impl Drop for BrowserTimer {
	fn drop(&mut self) {
		let (Some(handle), Some(window)) = (self.handle, web_sys::window()) else {
			return;
		};
		if self.repeating {
			window.clear_interval_with_handle(handle);
		} else {
			window.clear_timeout_with_handle(handle);
		}
	}
}

impl Clock for BrowserClock {
	type Timer = BrowserTimer;

	fn now_ms(&self) -> f64 {
		web_sys::window()
			.and_then(|w| w.performance())
			.map(|p| p.now())
			.unwrap_or_else(js_sys::Date::now)
	}

	fn interval(&self, period_ms: u32, tick: impl FnMut() + 'static) -> BrowserTimer {
		let closure = Closure::<dyn FnMut()>::new(tick);
		let handle = web_sys::window().and_then(|w| {
			w.set_interval_with_callback_and_timeout_and_arguments_0(
				closure.as_ref().unchecked_ref(),
				period_ms as i32,
			)
			.map_err(|err| log::warn!("setInterval failed: {:?}", err))
			.ok()
		});
		BrowserTimer {
			handle,
			repeating: true,
			_closure: closure,
		}
	}

	fn timeout(&self, delay_ms: u32, fire: impl FnOnce() + 'static) -> BrowserTimer {
		let mut fire = Some(fire);
		let closure = Closure::<dyn FnMut()>::new(move || {
			if let Some(f) = fire.take() {
				f();
			}
		});
		let handle = web_sys::window().and_then(|w| {
			w.set_timeout_with_callback_and_timeout_and_arguments_0(
				closure.as_ref().unchecked_ref(),
				delay_ms as i32,
			)
			.map_err(|err| log::warn!("setTimeout failed: {:?}", err))
			.ok()
		});
		BrowserTimer {
			handle,
			repeating: false,
			_closure: closure,
		}
	}
}

#[cfg(test)]
pub use virtual_time::{VirtualClock, VirtualTimer};
