//! Timer that advances a [`FlowController`] on a fixed cadence.
//!
//! At most one timer is live per scheduler. Every start/stop bumps a
//! generation counter, and a tick carrying an older generation is a no-op, so
//! a callback that was already queued when playback stopped cannot move the
//! step. Dropping the last handle drops the timer, which cancels it.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::flow::{FlowController, FlowStore, TickOutcome};
use crate::clock::Clock;

/// Default delay between autoplay steps.
pub const AUTOPLAY_CADENCE_MS: u32 = 2000;

struct Shared<C: Clock, S> {
	clock: C,
	flow: FlowController<S>,
	cadence_ms: u32,
	generation: Cell<u64>,
	timer: RefCell<Option<C::Timer>>,
}

impl<C: Clock, S: FlowStore> Shared<C, S> {
	fn cancel(&self) {
		self.generation.set(self.generation.get() + 1);
		let timer = self.timer.borrow_mut().take();
		if timer.is_some() {
			log::debug!("autoplay stopped (generation {})", self.generation.get());
		}
		drop(timer);
	}

	fn on_tick(&self, generation: u64) {
		if generation != self.generation.get() {
			log::debug!("stale autoplay tick {} ignored", generation);
			return;
		}
		match self.flow.tick() {
			TickOutcome::Advanced => {}
			TickOutcome::Finished => {
				log::debug!("autoplay reached terminal step {}", self.flow.terminal_step());
				self.cancel();
			}
			// Paused through the flow handle since the last tick.
			TickOutcome::Idle => self.cancel(),
		}
	}
}

/// Autoplay scheduler bound to one diagram instance.
pub struct Autoplay<C: Clock, S> {
	shared: Rc<Shared<C, S>>,
}

impl<C: Clock, S> Clone for Autoplay<C, S> {
	fn clone(&self) -> Self {
		Self {
			shared: Rc::clone(&self.shared),
		}
	}
}

impl<C: Clock, S: FlowStore> Autoplay<C, S> {
	pub fn new(clock: C, flow: FlowController<S>) -> Self {
		Self::with_cadence(clock, flow, AUTOPLAY_CADENCE_MS)
	}

	pub fn with_cadence(clock: C, flow: FlowController<S>, cadence_ms: u32) -> Self {
		Self {
			shared: Rc::new(Shared {
				clock,
				flow,
				cadence_ms,
				generation: Cell::new(0),
				timer: RefCell::new(None),
			}),
		}
	}

	pub fn flow(&self) -> &FlowController<S> {
		&self.shared.flow
	}

	pub fn is_running(&self) -> bool {
		self.shared.timer.borrow().is_some()
	}

	#[cfg(test)]
	pub fn generation(&self) -> u64 {
		self.shared.generation.get()
	}

	/// Start playing unless already at the terminal step. Idempotent.
	pub fn play(&self) {
		self.shared.flow.play();
		self.sync();
	}

	/// Stop the timer; the step is left where it is.
	pub fn pause(&self) {
		self.shared.flow.pause();
		self.shared.cancel();
	}

	/// Stop the timer and rewind to step 0.
	pub fn reset(&self) {
		self.shared.flow.reset();
		self.shared.cancel();
	}

	pub fn toggle(&self) {
		if self.shared.flow.state_untracked().is_playing {
			self.pause();
		} else {
			self.play();
		}
	}

	/// Bring the timer in line with the flow's `is_playing` flag. Called
	/// whenever the flag may have been changed through the flow handle.
	pub fn sync(&self) {
		if self.shared.flow.state_untracked().is_playing {
			self.start();
		} else {
			self.shared.cancel();
		}
	}

	/// Cancel any live timer without touching the flow state (unmount).
	pub fn cancel(&self) {
		self.shared.cancel();
	}

	fn start(&self) {
		if self.is_running() {
			return;
		}
		let generation = self.shared.generation.get() + 1;
		self.shared.generation.set(generation);

		let weak: Weak<Shared<C, S>> = Rc::downgrade(&self.shared);
		let timer = self.shared.clock.interval(self.shared.cadence_ms, move || {
			if let Some(shared) = weak.upgrade() {
				shared.on_tick(generation);
			}
		});
		*self.shared.timer.borrow_mut() = Some(timer);
		log::debug!(
			"autoplay started at step {} (generation {})",
			self.shared.flow.state_untracked().step,
			generation
		);
	}
}
