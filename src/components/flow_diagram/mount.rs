//! Resources owned by one mounted diagram and released together on unmount.

use std::cell::RefCell;
use std::rc::Rc;

use super::autoplay::Autoplay;
use super::flow::FlowStore;
use super::state::DiagramState;
use crate::clock::Clock;

pub type SharedState = Rc<RefCell<Option<DiagramState>>>;

/// Handles shared by a diagram's effects, event handlers and render loop.
///
/// `L` is the render loop. It usually holds a closure that keeps a clone of
/// this handle, so the loop only goes away when [`MountedDiagram::unmount`]
/// takes it out.
pub struct MountedDiagram<C: Clock, S, L> {
	autoplay: Autoplay<C, S>,
	state: SharedState,
	settle_timer: Rc<RefCell<Option<C::Timer>>>,
	frame_loop: Rc<RefCell<Option<L>>>,
}

impl<C: Clock, S, L> Clone for MountedDiagram<C, S, L> {
	fn clone(&self) -> Self {
		Self {
			autoplay: self.autoplay.clone(),
			state: Rc::clone(&self.state),
			settle_timer: Rc::clone(&self.settle_timer),
			frame_loop: Rc::clone(&self.frame_loop),
		}
	}
}

impl<C: Clock, S: FlowStore, L> MountedDiagram<C, S, L> {
	pub fn new(autoplay: Autoplay<C, S>) -> Self {
		Self {
			autoplay,
			state: Rc::new(RefCell::new(None)),
			settle_timer: Rc::new(RefCell::new(None)),
			frame_loop: Rc::new(RefCell::new(None)),
		}
	}

	pub fn autoplay(&self) -> &Autoplay<C, S> {
		&self.autoplay
	}

	pub fn state(&self) -> &SharedState {
		&self.state
	}

	pub fn frame_loop(&self) -> &Rc<RefCell<Option<L>>> {
		&self.frame_loop
	}

	/// Install the pending settle timer, cancelling the one it replaces.
	pub fn replace_settle_timer(&self, timer: C::Timer) {
		let previous = self.settle_timer.borrow_mut().replace(timer);
		drop(previous);
	}

	/// Cancel every timer and drop the render loop and diagram state.
	pub fn unmount(&self) {
		self.autoplay.cancel();
		let settle = self.settle_timer.borrow_mut().take();
		let frame_loop = self.frame_loop.borrow_mut().take();
		let state = self.state.borrow_mut().take();
		drop((settle, frame_loop, state));
		log::debug!("diagram unmounted");
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;
	use crate::clock::VirtualClock;
	use crate::components::flow_diagram::autoplay::AUTOPLAY_CADENCE_MS;
	use crate::components::flow_diagram::flow::local_flow;
	use crate::components::flow_diagram::primitives::Palette;
	use crate::components::flow_diagram::viewport::{FRAME_SETTLE_MS, ViewportProfile};
	use crate::config::ThemeMode;
	use crate::scenarios::dex;

	#[test]
	fn unmount_cancels_timers_without_another_frame() {
		let clock = VirtualClock::new();
		let flow = local_flow(10);
		let autoplay = Autoplay::new(clock.clone(), flow.clone());
		let mounted: MountedDiagram<_, _, Rc<()>> = MountedDiagram::new(autoplay);

		let frame_loop = Rc::new(());
		*mounted.frame_loop().borrow_mut() = Some(Rc::clone(&frame_loop));
		*mounted.state().borrow_mut() = Some(DiagramState::new(
			Rc::new(dex::scenario().unwrap()),
			0,
			Palette::for_theme(ThemeMode::Dark),
			ViewportProfile::SPACIOUS,
			800.0,
			600.0,
		));

		mounted.autoplay().play();
		let settled = Rc::new(Cell::new(false));
		let flag = Rc::clone(&settled);
		mounted.replace_settle_timer(clock.timeout(FRAME_SETTLE_MS, move || flag.set(true)));
		assert_eq!(clock.live_timers(), 2);

		mounted.unmount();
		assert_eq!(clock.live_timers(), 0);
		assert_eq!(Rc::strong_count(&frame_loop), 1);
		assert!(mounted.state().borrow().is_none());

		clock.advance(AUTOPLAY_CADENCE_MS as f64 * 5.0);
		assert_eq!(flow.step(), 0);
		assert!(!settled.get());
	}

	#[test]
	fn replacing_the_settle_timer_cancels_the_old_one() {
		let clock = VirtualClock::new();
		let autoplay = Autoplay::new(clock.clone(), local_flow(3));
		let mounted: MountedDiagram<_, _, ()> = MountedDiagram::new(autoplay);
		let fired = Rc::new(Cell::new(0));

		let first = Rc::clone(&fired);
		let timer = clock.timeout(FRAME_SETTLE_MS, move || first.set(first.get() + 1));
		mounted.replace_settle_timer(timer);
		let second = Rc::clone(&fired);
		let timer = clock.timeout(FRAME_SETTLE_MS, move || second.set(second.get() + 10));
		mounted.replace_settle_timer(timer);
		assert_eq!(clock.live_timers(), 1);

		clock.advance(FRAME_SETTLE_MS as f64);
		assert_eq!(fired.get(), 10);
	}
}
