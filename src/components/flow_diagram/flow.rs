//! Current step and autoplay flag, with the only operations allowed to change them.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlowState {
	pub step: usize,
	pub is_playing: bool,
}

/// Result of one autoplay tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
	/// Not playing; nothing changed.
	Idle,
	/// Moved one step forward and keeps playing.
	Advanced,
	/// Reached (or was already at) the terminal step and stopped.
	Finished,
}

impl FlowState {
	pub fn next(&mut self, terminal: usize) -> bool {
		if self.step >= terminal {
			log::debug!("next: already at terminal step {}", terminal);
			self.step = terminal;
			return false;
		}
		self.step += 1;
		true
	}

	pub fn prev(&mut self) -> bool {
		if self.step == 0 {
			return false;
		}
		self.step -= 1;
		true
	}

	pub fn set_step(&mut self, step: isize, terminal: usize) -> bool {
		let clamped = if step <= 0 { 0 } else { (step as usize).min(terminal) };
		if clamped as isize != step {
			log::debug!("goto {} clamped to {}", step, clamped);
		}
		let changed = clamped != self.step;
		self.step = clamped;
		changed
	}

	/// Start playing unless already at the terminal step.
	pub fn play(&mut self, terminal: usize) -> bool {
		if self.step >= terminal {
			return false;
		}
		let changed = !self.is_playing;
		self.is_playing = true;
		changed
	}

	pub fn pause(&mut self) -> bool {
		std::mem::replace(&mut self.is_playing, false)
	}

	pub fn reset(&mut self) -> bool {
		let changed = self.step != 0 || self.is_playing;
		self.step = 0;
		self.is_playing = false;
		changed
	}

	/// One autoplay tick. Playback stops on the tick that lands on the
	/// terminal step, and on any tick that finds the step already past it.
	pub fn tick(&mut self, terminal: usize) -> TickOutcome {
		if !self.is_playing {
			return TickOutcome::Idle;
		}
		if self.step >= terminal {
			self.step = terminal;
			self.is_playing = false;
			return TickOutcome::Finished;
		}
		self.step += 1;
		if self.step >= terminal {
			self.is_playing = false;
			TickOutcome::Finished
		} else {
			TickOutcome::Advanced
		}
	}
}

/// Backing cell for a [`FlowState`]: a reactive signal in the app, a plain
/// `RefCell` in tests.
pub trait FlowStore: Clone + 'static {
	/// Read, subscribing the current reactive scope where that applies.
	fn snapshot(&self) -> FlowState;
	fn snapshot_untracked(&self) -> FlowState;
	/// Mutate in place; `f` returns whether anything changed so subscribers
	/// are only notified on real transitions.
	fn modify(&self, f: impl FnOnce(&mut FlowState) -> bool) -> bool;
}

impl FlowStore for RwSignal<FlowState> {
	// A disposed signal reads as paused, so a timer that outlives its
	// diagram winds down instead of panicking.
	fn snapshot(&self) -> FlowState {
		Get::try_get(self).unwrap_or_default()
	}

	fn snapshot_untracked(&self) -> FlowState {
		GetUntracked::try_get_untracked(self).unwrap_or_default()
	}

	fn modify(&self, f: impl FnOnce(&mut FlowState) -> bool) -> bool {
		let mut changed = false;
		self.maybe_update(|state| {
			changed = f(state);
			changed
		});
		changed
	}
}

impl FlowStore for Rc<RefCell<FlowState>> {
	fn snapshot(&self) -> FlowState {
		*self.borrow()
	}

	fn snapshot_untracked(&self) -> FlowState {
		*self.borrow()
	}

	fn modify(&self, f: impl FnOnce(&mut FlowState) -> bool) -> bool {
		f(&mut *self.borrow_mut())
	}
}

/// Navigation handle handed to a diagram by the surrounding page.
#[derive(Clone, Copy, Debug)]
pub struct FlowController<S> {
	store: S,
	terminal: usize,
}

/// The reactive handle used by the app.
pub type FlowHandle = FlowController<RwSignal<FlowState>>;

impl FlowHandle {
	/// Fresh state at step 0, paused.
	pub fn create(terminal: usize) -> Self {
		Self::new(RwSignal::new(FlowState::default()), terminal)
	}
}

impl<S: FlowStore> FlowController<S> {
	pub fn new(store: S, terminal: usize) -> Self {
		Self { store, terminal }
	}

	pub fn terminal_step(&self) -> usize {
		self.terminal
	}

	pub fn step(&self) -> usize {
		self.store.snapshot().step
	}

	pub fn is_playing(&self) -> bool {
		self.store.snapshot().is_playing
	}

	pub fn state_untracked(&self) -> FlowState {
		self.store.snapshot_untracked()
	}

	pub fn set_step(&self, step: isize) {
		let terminal = self.terminal;
		self.store.modify(|s| s.set_step(step, terminal));
	}

	pub fn next_step(&self) {
		let terminal = self.terminal;
		self.store.modify(|s| s.next(terminal));
	}

	pub fn prev_step(&self) {
		self.store.modify(FlowState::prev);
	}

	pub fn play(&self) -> bool {
		let terminal = self.terminal;
		self.store.modify(|s| s.play(terminal));
		self.store.snapshot_untracked().is_playing
	}

	pub fn pause(&self) {
		self.store.modify(FlowState::pause);
	}

	pub fn reset(&self) {
		self.store.modify(FlowState::reset);
	}

	pub fn toggle_play(&self) {
		if self.store.snapshot_untracked().is_playing {
			self.pause();
		} else {
			self.play();
		}
	}

	pub(crate) fn tick(&self) -> TickOutcome {
		let terminal = self.terminal;
		let mut outcome = TickOutcome::Idle;
		self.store.modify(|s| {
			outcome = s.tick(terminal);
			outcome != TickOutcome::Idle
		});
		outcome
	}
}

#[cfg(test)]
pub(crate) fn local_flow(terminal: usize) -> FlowController<Rc<RefCell<FlowState>>> {
	FlowController::new(Rc::new(RefCell::new(FlowState::default())), terminal)
}
