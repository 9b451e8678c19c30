//! Keyboard stepping.

use super::autoplay::Autoplay;
use super::flow::FlowStore;
use crate::clock::Clock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
	Next,
	Previous,
	Reset,
	Pause,
	TogglePlay,
}

impl KeyCommand {
	/// Map a `KeyboardEvent.key` value.
	pub fn from_key(key: &str) -> Option<Self> {
		match key {
			"ArrowRight" | "Right" => Some(KeyCommand::Next),
			"ArrowLeft" | "Left" => Some(KeyCommand::Previous),
			"Home" => Some(KeyCommand::Reset),
			"Escape" | "Esc" => Some(KeyCommand::Pause),
			" " | "Spacebar" => Some(KeyCommand::TogglePlay),
			_ => None,
		}
	}

	/// Map a key pressed while `target_tag` (an uppercase element tag name)
	/// has focus. Controls keep their own keys, so a focused button still
	/// activates on Space.
	pub fn from_key_on(key: &str, target_tag: Option<&str>) -> Option<Self> {
		match target_tag {
			Some("BUTTON" | "INPUT" | "SELECT" | "TEXTAREA") => None,
			_ => Self::from_key(key),
		}
	}

	/// Run the command. Next/previous are no-ops at the ends; pause and
	/// reset cancel the autoplay timer before returning.
	pub fn apply<C: Clock, S: FlowStore>(self, autoplay: &Autoplay<C, S>) {
		match self {
			KeyCommand::Next => autoplay.flow().next_step(),
			KeyCommand::Previous => autoplay.flow().prev_step(),
			KeyCommand::Reset => autoplay.reset(),
			KeyCommand::Pause => autoplay.pause(),
			KeyCommand::TogglePlay => autoplay.toggle(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::VirtualClock;
	use crate::components::flow_diagram::autoplay::AUTOPLAY_CADENCE_MS;
	use crate::components::flow_diagram::flow::local_flow;

	#[test]
	fn key_names() {
		assert_eq!(KeyCommand::from_key("ArrowRight"), Some(KeyCommand::Next));
		assert_eq!(KeyCommand::from_key("ArrowLeft"), Some(KeyCommand::Previous));
		assert_eq!(KeyCommand::from_key("Home"), Some(KeyCommand::Reset));
		assert_eq!(KeyCommand::from_key("Escape"), Some(KeyCommand::Pause));
		assert_eq!(KeyCommand::from_key(" "), Some(KeyCommand::TogglePlay));
		assert_eq!(KeyCommand::from_key("Spacebar"), Some(KeyCommand::TogglePlay));
		assert_eq!(KeyCommand::from_key("Enter"), None);
	}

	#[test]
	fn focused_controls_keep_their_keys() {
		assert_eq!(KeyCommand::from_key_on(" ", Some("BUTTON")), None);
		assert_eq!(KeyCommand::from_key_on("ArrowRight", Some("BUTTON")), None);
		assert_eq!(KeyCommand::from_key_on("ArrowLeft", Some("SELECT")), None);
		assert_eq!(KeyCommand::from_key_on(" ", Some("DIV")), Some(KeyCommand::TogglePlay));
		assert_eq!(KeyCommand::from_key_on("ArrowRight", Some("CANVAS")), Some(KeyCommand::Next));
		assert_eq!(KeyCommand::from_key_on("Home", None), Some(KeyCommand::Reset));
	}

	#[test]
	fn stepping_stops_at_both_ends() {
		let flow = local_flow(2);
		let autoplay = Autoplay::new(VirtualClock::new(), flow.clone());
		KeyCommand::Previous.apply(&autoplay);
		assert_eq!(flow.step(), 0);
		for _ in 0..5 {
			KeyCommand::Next.apply(&autoplay);
		}
		assert_eq!(flow.step(), 2);
		KeyCommand::Reset.apply(&autoplay);
		assert_eq!(flow.step(), 0);
	}

	#[test]
	fn space_toggles_and_escape_pauses() {
		let clock = VirtualClock::new();
		let flow = local_flow(5);
		let autoplay = Autoplay::new(clock.clone(), flow.clone());
		KeyCommand::TogglePlay.apply(&autoplay);
		assert!(flow.is_playing());
		assert_eq!(clock.live_timers(), 1);

		KeyCommand::Pause.apply(&autoplay);
		assert!(!flow.is_playing());
		assert_eq!(clock.live_timers(), 0);
		KeyCommand::Pause.apply(&autoplay);
		assert!(!flow.is_playing());

		clock.advance(AUTOPLAY_CADENCE_MS as f64 * 3.0);
		assert_eq!(flow.step(), 0);
	}
}
