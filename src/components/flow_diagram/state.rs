use std::collections::HashSet;
use std::rc::Rc;

use super::primitives::{self, Palette};
use super::reconcile::{NodeChange, Reconciler};
use super::resolve::{RenderNode, ResolvedFrame, resolve, resolve_against};
use super::timeline::Scenario;
use super::types::{NodeId, Point, Rect, Size};
use super::viewport::{FrameTarget, ViewportController, ViewportProfile};

/// Screen distance a press must travel before it counts as a drag.
pub const DRAG_THRESHOLD_PX: f64 = 3.0;
/// Wheel zoom factor per notch.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<NodeId>,
	pub start: Point,
	pub node_start: Point,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub last: Point,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<NodeId>,
	pub screen: Point,
	/// Tooltip fade, 0 to 1.
	pub highlight_t: f64,
	delay_t: f64,
}

/// Everything one mounted diagram needs between frames.
pub struct DiagramState {
	scenario: Rc<Scenario>,
	frame: ResolvedFrame,
	pub reconciler: Reconciler,
	pub viewport: ViewportController,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub palette: Palette,
	pub width: f64,
	pub height: f64,
	/// Seconds of animation time, drives edge dashes.
	pub flow_time: f64,
	last_tick_ms: Option<f64>,
}

impl DiagramState {
	/// Resolve `step` and frame the whole graph without animating.
	pub fn new(
		scenario: Rc<Scenario>,
		step: usize,
		palette: Palette,
		profile: ViewportProfile,
		width: f64,
		height: f64,
	) -> Self {
		let frame = resolve(step, &scenario.graph, &scenario.timeline);
		let mut reconciler = Reconciler::new();
		reconciler.commit(&frame);
		let mut state = Self {
			scenario,
			frame,
			reconciler,
			viewport: ViewportController::new(profile, Size::new(width, height)),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			palette,
			width,
			height,
			flow_time: 0.0,
			last_tick_ms: None,
		};
		let all = state.all_footprints();
		state.viewport.fit_all_immediate(&all);
		state
	}

	pub fn scenario(&self) -> &Scenario {
		&self.scenario
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.viewport.resize(Size::new(width, height));
	}

	/// Whether anything is lit at the current step.
	pub fn step_has_activity(&self) -> bool {
		!self.reconciler.active_nodes().is_empty()
			|| self.reconciler.edges().iter().any(|e| e.animated())
	}

	/// Resolve and commit `step`. Returns the frame generation to pass to
	/// [`DiagramState::settle`] after the settle delay, or `None` when the
	/// step did not change.
	pub fn apply_step(&mut self, step: usize) -> Option<u64> {
		let step = step.min(self.scenario.terminal_step());
		if step == self.frame.step {
			return None;
		}
		let scenario = &self.scenario;
		self.frame = resolve_against(step, &scenario.graph, &scenario.timeline, &self.frame);
		if self.reconciler.commit(&self.frame) {
			log::debug!("step {} committed (revision {})", step, self.reconciler.revision());
		}
		Some(self.viewport.step_changed())
	}

	/// Frame the active nodes if `generation` is still current.
	pub fn settle(&mut self, generation: u64, now_ms: f64) -> Option<FrameTarget> {
		let active = self.active_footprints();
		let all = self.all_footprints();
		self.viewport.settle(generation, now_ms, &active, &all)
	}

	/// Rendered size: measured when the painter has reported one.
	pub fn node_size(&self, node: &RenderNode) -> Size {
		self.reconciler.measured_size(&node.id).unwrap_or_else(|| {
			primitives::estimate_node_size(node.kind, &node.data.label, node.data.status.as_deref())
		})
	}

	pub fn footprint(&self, node: &RenderNode) -> Rect {
		primitives::footprint(node.position, self.node_size(node))
	}

	pub fn all_footprints(&self) -> Vec<Rect> {
		self.reconciler.nodes().iter().map(|n| self.footprint(n)).collect()
	}

	/// Footprints of the entry's nodes plus any node resolved as current.
	pub fn active_footprints(&self) -> Vec<Rect> {
		let listed: HashSet<&str> =
			self.reconciler.active_nodes().iter().map(String::as_str).collect();
		self.reconciler
			.nodes()
			.iter()
			.filter(|n| n.data.is_current || listed.contains(n.id.as_str()))
			.map(|n| self.footprint(n))
			.collect()
	}

	/// Topmost node under a screen point.
	pub fn node_at_position(&self, screen: Point) -> Option<NodeId> {
		let p = self.viewport.camera().screen_to_graph(screen);
		self.reconciler
			.nodes()
			.iter()
			.rev()
			.find(|n| self.footprint(n).contains(p))
			.map(|n| n.id.clone())
	}

	pub fn hovered_node(&self) -> Option<&RenderNode> {
		self.hover.node.as_deref().and_then(|id| self.reconciler.node(id))
	}

	pub fn set_hover(&mut self, node: Option<NodeId>, screen: Point) {
		self.hover.screen = screen;
		if self.hover.node == node {
			return;
		}
		if node.is_some() && self.hover.node.is_none() {
			self.hover.delay_t = 0.0;
		}
		self.hover.node = node;
	}

	pub fn record_measurement(&mut self, id: &str, size: Size) {
		if self.reconciler.measured_size(id) != Some(size) {
			self.reconciler.apply_changes([NodeChange::Dimensions {
				id: id.to_string(),
				size,
			}]);
		}
	}

	pub fn pointer_down(&mut self, screen: Point) {
		match self.node_at_position(screen) {
			Some(id) => {
				let node_start = self.reconciler.node(&id).map(|n| n.position).unwrap_or_default();
				self.drag = DragState {
					node: Some(id),
					start: screen,
					node_start,
					moved: false,
				};
			}
			None => {
				self.pan = PanState {
					active: true,
					last: screen,
					moved: false,
				};
			}
		}
	}

	pub fn pointer_move(&mut self, screen: Point) {
		if let Some(id) = self.drag.node.clone() {
			let (dx, dy) = (screen.x - self.drag.start.x, screen.y - self.drag.start.y);
			if !self.drag.moved && dx.hypot(dy) < DRAG_THRESHOLD_PX {
				return;
			}
			self.drag.moved = true;
			let k = self.viewport.camera().k;
			let start = self.drag.node_start;
			let position = Point::new(start.x + dx / k, start.y + dy / k);
			self.reconciler.apply_changes([NodeChange::Position {
				id,
				position,
				dragging: true,
			}]);
		} else if self.pan.active {
			let (dx, dy) = (screen.x - self.pan.last.x, screen.y - self.pan.last.y);
			if dx != 0.0 || dy != 0.0 {
				self.pan.moved = true;
				self.viewport.pan_by(dx, dy);
			}
			self.pan.last = screen;
		} else {
			let hovered = self.node_at_position(screen);
			self.set_hover(hovered, screen);
		}
	}

	/// Finish a press. A press that never moved is a click: it toggles the
	/// node's selection, or clears every selection on the background.
	pub fn pointer_up(&mut self) {
		let drag = std::mem::take(&mut self.drag);
		let pan = std::mem::take(&mut self.pan);
		match drag.node {
			Some(id) if drag.moved => {
				if let Some(position) = self.reconciler.node(&id).map(|n| n.position) {
					self.reconciler.apply_changes([NodeChange::Position {
						id,
						position,
						dragging: false,
					}]);
				}
			}
			Some(id) => {
				let selected = self.reconciler.node(&id).is_some_and(|n| n.selected);
				self.reconciler.apply_changes([NodeChange::Select { id, selected: !selected }]);
			}
			None if pan.active && !pan.moved => {
				self.reconciler.clear_selection();
			}
			None => {}
		}
	}

	pub fn pointer_leave(&mut self) {
		if self.drag.node.is_some() {
			self.pointer_up();
		}
		self.pan = PanState::default();
		self.set_hover(None, self.hover.screen);
	}

	/// Zoom around the cursor; positive `delta_y` zooms out.
	pub fn wheel(&mut self, screen: Point, delta_y: f64) {
		let factor = if delta_y > 0.0 { 1.0 / WHEEL_ZOOM_STEP } else { WHEEL_ZOOM_STEP };
		self.viewport.zoom_at(screen, factor);
	}

	pub fn zoom_in(&mut self, now_ms: f64) {
		self.viewport.zoom_in(now_ms);
	}

	pub fn zoom_out(&mut self, now_ms: f64) {
		self.viewport.zoom_out(now_ms);
	}

	pub fn reset_view(&mut self, now_ms: f64) {
		let all = self.all_footprints();
		self.viewport.reset_view(now_ms, &all);
	}

	/// Advance animation clocks to `now_ms`.
	pub fn tick(&mut self, now_ms: f64) {
		let dt = self
			.last_tick_ms
			.map_or(0.0, |last| ((now_ms - last) / 1000.0).clamp(0.0, 0.1));
		self.last_tick_ms = Some(now_ms);
		self.flow_time += dt;
		self.viewport.update(now_ms);

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.25, 6.0)
		} else {
			(0.0, 0.0, 8.0)
		};
		self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
		if self.hover.delay_t >= delay {
			self.hover.highlight_t += (target - self.hover.highlight_t) * (speed * dt).min(1.0);
		}
		if self.hover.node.is_none() && self.hover.highlight_t < 0.01 {
			self.hover.highlight_t = 0.0;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_diagram::viewport::FRAME_DURATION_MS;
	use crate::config::ThemeMode;
	use crate::scenarios::{dex, multisig};

	fn state(scenario: Scenario) -> DiagramState {
		DiagramState::new(
			Rc::new(scenario),
			0,
			Palette::for_theme(ThemeMode::Dark),
			ViewportProfile::SPACIOUS,
			1200.0,
			800.0,
		)
	}

	fn screen_of(s: &DiagramState, id: &str) -> Point {
		let node = s.reconciler.node(id).unwrap();
		s.viewport.camera().graph_to_screen(s.footprint(node).center())
	}

	#[test]
	fn mount_fits_the_whole_graph() {
		let s = state(dex::scenario().unwrap());
		assert_eq!(s.viewport.last_target(), Some(FrameTarget::FitAll));
		assert!(!s.viewport.is_animating());
		for rect in s.all_footprints() {
			let min = s.viewport.camera().graph_to_screen(rect.min);
			let max = s.viewport.camera().graph_to_screen(rect.max);
			assert!(min.x >= 0.0 && min.y >= 0.0 && max.x <= 1200.0 && max.y <= 800.0);
		}
	}

	#[test]
	fn step_change_frames_active_nodes_after_settle() {
		let mut s = state(dex::scenario().unwrap());
		let generation = s.apply_step(3).unwrap();
		assert_eq!(s.apply_step(3), None);
		let target = s.settle(generation, 0.0).unwrap();
		let FrameTarget::Focus { count, .. } = target else {
			panic!("expected focus framing, got {target:?}");
		};
		assert_eq!(count, 3);
	}

	#[test]
	fn rapid_steps_only_frame_the_last() {
		let mut s = state(dex::scenario().unwrap());
		let first = s.apply_step(1).unwrap();
		let second = s.apply_step(2).unwrap();
		assert_eq!(s.settle(first, 0.0), None);
		assert!(s.settle(second, 0.0).is_some());
	}

	#[test]
	fn empty_entry_falls_back_to_fit_all() {
		let scenario = multisig::scenario().unwrap();
		let terminal = scenario.terminal_step();
		let mut s = state(scenario);
		let generation = s.apply_step(terminal).unwrap();
		assert!(s.active_footprints().is_empty());
		assert_eq!(s.settle(generation, 0.0), Some(FrameTarget::FitAll));
	}

	#[test]
	fn drag_survives_step_changes() {
		let mut s = state(dex::scenario().unwrap());
		let start = screen_of(&s, "router");
		let before = s.reconciler.node("router").unwrap().position;

		s.pointer_down(start);
		s.pointer_move(Point::new(start.x + 40.0, start.y + 20.0));
		assert!(s.reconciler.node("router").unwrap().dragging);
		s.pointer_up();

		let dragged = s.reconciler.node("router").unwrap().position;
		assert_ne!(dragged, before);
		assert!(!s.reconciler.node("router").unwrap().dragging);

		s.apply_step(2);
		s.apply_step(8);
		let router = s.reconciler.node("router").unwrap();
		assert_eq!(router.position, dragged);
		assert_eq!(router.data.status.as_deref(), Some("PROCESSING_WITHDRAWAL"));
	}

	#[test]
	fn click_toggles_selection_and_background_clears_it() {
		let mut s = state(dex::scenario().unwrap());
		let pool = screen_of(&s, "pool");
		s.pointer_down(pool);
		s.pointer_up();
		assert!(s.reconciler.node("pool").unwrap().selected);

		s.apply_step(5);
		assert!(s.reconciler.node("pool").unwrap().selected);

		s.pointer_down(Point::new(1.0, 1.0));
		s.pointer_up();
		assert!(!s.reconciler.node("pool").unwrap().selected);
	}

	#[test]
	fn background_drag_pans_and_cancels_camera_motion() {
		let mut s = state(dex::scenario().unwrap());
		let generation = s.apply_step(1).unwrap();
		s.settle(generation, 0.0);
		assert!(s.viewport.is_animating());

		let before = s.viewport.camera();
		s.pointer_down(Point::new(2.0, 2.0));
		s.pointer_move(Point::new(32.0, 12.0));
		s.pointer_up();
		assert!(!s.viewport.is_animating());
		assert_eq!(s.viewport.camera().x, before.x + 30.0);
		assert_eq!(s.viewport.camera().y, before.y + 10.0);
	}

	#[test]
	fn measured_sizes_replace_estimates() {
		let mut s = state(dex::scenario().unwrap());
		let measured = Size::new(300.0, 90.0);
		s.record_measurement("user", measured);
		let user = s.reconciler.node("user").unwrap().clone();
		assert_eq!(s.node_size(&user), measured);
	}

	#[test]
	fn hover_fades_in_after_delay() {
		let mut s = state(dex::scenario().unwrap());
		let wallet = screen_of(&s, "wallet");
		s.pointer_move(wallet);
		assert_eq!(s.hovered_node().map(|n| n.id.as_str()), Some("wallet"));

		s.tick(0.0);
		for i in 1..=30 {
			s.tick(i as f64 * 50.0);
		}
		assert!(s.hover.highlight_t > 0.9);

		s.pointer_leave();
		for i in 31..=60 {
			s.tick(i as f64 * 50.0);
		}
		assert_eq!(s.hover.highlight_t, 0.0);
	}

	#[test]
	fn tick_advances_camera_transition() {
		let mut s = state(dex::scenario().unwrap());
		let generation = s.apply_step(6).unwrap();
		s.settle(generation, 1000.0);
		s.tick(1000.0);
		s.tick(1000.0 + FRAME_DURATION_MS);
		assert!(!s.viewport.is_animating());
	}
}
