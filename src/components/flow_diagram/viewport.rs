//! Camera framing: where to look after each step, and how to get there.
//!
//! Framing is split in two. `step_changed` only records a pending frame
//! request with a fresh generation; the caller fires `settle` after
//! [`FRAME_SETTLE_MS`] so highlight updates land before the active geometry is
//! measured. A `settle` carrying an outdated generation is dropped. Camera
//! transitions are sampled from the render loop and a new request always
//! replaces the one in flight, starting from wherever the camera is now.

use super::types::{Point, Rect, Size};

/// Delay between a step change and measuring the active nodes.
pub const FRAME_SETTLE_MS: u32 = 120;
/// Duration of a step-driven camera move.
pub const FRAME_DURATION_MS: f64 = 800.0;
/// Duration of a zoom-button camera move.
pub const ZOOM_BUTTON_DURATION_MS: f64 = 250.0;
/// Manual zoom bounds (wheel and buttons).
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 4.0;
/// Factor applied by one zoom-button press.
pub const ZOOM_STEP: f64 = 1.2;

/// Pan/zoom transform: `screen = graph * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for Camera {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl Camera {
	/// Camera showing `center` in the middle of `viewport` at `zoom`.
	pub fn centered_on(center: Point, zoom: f64, viewport: Size) -> Self {
		Self {
			x: viewport.width / 2.0 - center.x * zoom,
			y: viewport.height / 2.0 - center.y * zoom,
			k: zoom,
		}
	}

	pub fn screen_to_graph(&self, p: Point) -> Point {
		Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
	}

	#[cfg(test)]
	pub fn graph_to_screen(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	/// Graph-space point currently under the viewport center.
	pub fn focus(&self, viewport: Size) -> Point {
		self.screen_to_graph(Point::new(viewport.width / 2.0, viewport.height / 2.0))
	}

	/// Same camera rescaled by `factor` around the screen point `anchor`.
	pub fn zoomed_at(&self, anchor: Point, factor: f64) -> Self {
		let k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = k / self.k;
		Self {
			x: anchor.x - (anchor.x - self.x) * ratio,
			y: anchor.y - (anchor.y - self.y) * ratio,
			k,
		}
	}

	/// Interpolates the graph-space focus and the zoom (geometrically), so
	/// the move reads as a straight glide rather than a swoop.
	fn interpolate(from: Camera, to: Camera, t: f64, viewport: Size) -> Camera {
		let (a, b) = (from.focus(viewport), to.focus(viewport));
		let center = Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
		let k = from.k * (to.k / from.k).powf(t);
		Camera::centered_on(center, k, viewport)
	}
}

fn ease_in_out_cubic(t: f64) -> f64 {
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

/// Coarse device split used to pick a [`ViewportProfile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceClass {
	/// Large touch-capable screen.
	Compact,
	/// Standard desktop pointer.
	Spacious,
}

impl DeviceClass {
	pub fn detect(width: f64, height: f64, max_touch_points: i32, coarse_pointer: bool) -> Self {
		let touch = max_touch_points > 0 || coarse_pointer;
		if touch && width.max(height) >= 1024.0 {
			DeviceClass::Compact
		} else {
			DeviceClass::Spacious
		}
	}

	pub fn profile(self) -> ViewportProfile {
		match self {
			DeviceClass::Compact => ViewportProfile::COMPACT,
			DeviceClass::Spacious => ViewportProfile::SPACIOUS,
		}
	}
}

/// Padding fractions and zoom clamps for auto-framing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportProfile {
	/// Padding fraction (per side) for a single focused node.
	pub padding: f64,
	/// Lower bound the padding shrinks to as the focus set grows.
	pub min_padding: f64,
	pub min_zoom: f64,
	pub max_zoom: f64,
	/// Padding fraction for fit-all framing.
	pub fit_all_padding: f64,
}

impl ViewportProfile {
	pub const COMPACT: ViewportProfile = ViewportProfile {
		padding: 0.15,
		min_padding: 0.06,
		min_zoom: 0.6,
		max_zoom: 1.8,
		fit_all_padding: 0.18,
	};

	pub const SPACIOUS: ViewportProfile = ViewportProfile {
		padding: 0.35,
		min_padding: 0.15,
		min_zoom: 0.35,
		max_zoom: 1.4,
		fit_all_padding: 0.3,
	};

	/// Padding for `count` focused nodes; more nodes need relatively less.
	pub fn padding_for(&self, count: usize) -> f64 {
		let extra = count.saturating_sub(1) as f64;
		(self.padding / (1.0 + 0.15 * extra)).max(self.min_padding)
	}
}

/// What a settled step decided to show.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameTarget {
	FitAll,
	Focus { bounds: Rect, count: usize },
}

impl FrameTarget {
	/// Bounding box of the active footprints, or fit-all when there are none.
	pub fn plan(active: &[Rect]) -> Self {
		match Rect::enclose(active.iter().copied()) {
			Some(bounds) => FrameTarget::Focus {
				bounds,
				count: active.len(),
			},
			None => FrameTarget::FitAll,
		}
	}
}

/// Camera that fits `bounds` grown by `padding` (fraction per side) into
/// `viewport`, with the zoom clamped to `[min_zoom, max_zoom]`.
pub fn camera_for_bounds(
	bounds: Rect,
	viewport: Size,
	padding: f64,
	min_zoom: f64,
	max_zoom: f64,
) -> Camera {
	let padded_w = (bounds.width() * (1.0 + 2.0 * padding)).max(1.0);
	let padded_h = (bounds.height() * (1.0 + 2.0 * padding)).max(1.0);
	let zoom = (viewport.width / padded_w)
		.min(viewport.height / padded_h)
		.clamp(min_zoom, max_zoom);
	Camera::centered_on(bounds.center(), zoom, viewport)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Transition {
	from: Camera,
	to: Camera,
	started_ms: f64,
	duration_ms: f64,
	token: u64,
}

impl Transition {
	fn progress(&self, now_ms: f64) -> f64 {
		if self.duration_ms <= 0.0 {
			return 1.0;
		}
		((now_ms - self.started_ms) / self.duration_ms).clamp(0.0, 1.0)
	}
}

#[derive(Clone, Debug)]
pub struct ViewportController {
	profile: ViewportProfile,
	viewport: Size,
	camera: Camera,
	transition: Option<Transition>,
	next_token: u64,
	settle_generation: u64,
	pending_settle: Option<u64>,
	last_target: Option<FrameTarget>,
}

impl ViewportController {
	pub fn new(profile: ViewportProfile, viewport: Size) -> Self {
		Self {
			profile,
			viewport,
			camera: Camera::default(),
			transition: None,
			next_token: 0,
			settle_generation: 0,
			pending_settle: None,
			last_target: None,
		}
	}

	pub fn resize(&mut self, viewport: Size) {
		self.viewport = viewport;
	}

	/// Camera as of the last [`ViewportController::update`].
	pub fn camera(&self) -> Camera {
		self.camera
	}

	#[cfg(test)]
	pub fn is_animating(&self) -> bool {
		self.transition.is_some()
	}

	#[cfg(test)]
	pub fn last_target(&self) -> Option<FrameTarget> {
		self.last_target
	}

	/// Advance any in-flight transition to `now_ms`. Returns the token of a
	/// transition that completed during this call.
	pub fn update(&mut self, now_ms: f64) -> Option<u64> {
		let transition = self.transition?;
		let t = transition.progress(now_ms);
		if t >= 1.0 {
			self.camera = transition.to;
			self.transition = None;
			return Some(transition.token);
		}
		let eased = ease_in_out_cubic(t);
		self.camera = Camera::interpolate(transition.from, transition.to, eased, self.viewport);
		None
	}

	/// Jump straight to `camera`, dropping any transition. Used for user
	/// pan/zoom so direct manipulation never fights an animation.
	pub fn set_camera(&mut self, camera: Camera) {
		self.transition = None;
		self.camera = camera;
	}

	/// Start a transition to `target`, replacing any in flight. Returns its token.
	pub fn animate_to(&mut self, target: Camera, now_ms: f64, duration_ms: f64) -> u64 {
		self.update(now_ms);
		self.next_token += 1;
		if self.transition.is_some() {
			log::debug!("camera transition replaced by #{}", self.next_token);
		}
		self.transition = Some(Transition {
			from: self.camera,
			to: target,
			started_ms: now_ms,
			duration_ms,
			token: self.next_token,
		});
		self.next_token
	}

	pub fn fit_all_camera(&self, all: &[Rect]) -> Option<Camera> {
		let bounds = Rect::enclose(all.iter().copied())?;
		Some(camera_for_bounds(
			bounds,
			self.viewport,
			self.profile.fit_all_padding,
			MIN_ZOOM,
			self.profile.max_zoom,
		))
	}

	pub fn focus_camera(&self, bounds: Rect, count: usize) -> Camera {
		camera_for_bounds(
			bounds,
			self.viewport,
			self.profile.padding_for(count),
			self.profile.min_zoom,
			self.profile.max_zoom,
		)
	}

	/// Initial-mount framing: fit everything, no animation.
	pub fn fit_all_immediate(&mut self, all: &[Rect]) {
		if let Some(camera) = self.fit_all_camera(all) {
			self.set_camera(camera);
			self.last_target = Some(FrameTarget::FitAll);
		}
	}

	/// Record a step change. The returned generation must be handed back to
	/// [`ViewportController::settle`] once the settle delay has elapsed.
	pub fn step_changed(&mut self) -> u64 {
		self.settle_generation += 1;
		self.pending_settle = Some(self.settle_generation);
		self.settle_generation
	}

	/// Drop any pending settle without framing.
	pub fn cancel_pending(&mut self) {
		self.settle_generation += 1;
		self.pending_settle = None;
	}

	/// Frame the active footprints if `generation` is still the latest
	/// request. `all` is used for the fit-all fallback.
	pub fn settle(
		&mut self,
		generation: u64,
		now_ms: f64,
		active: &[Rect],
		all: &[Rect],
	) -> Option<FrameTarget> {
		if self.pending_settle != Some(generation) {
			log::debug!("stale frame request {} ignored", generation);
			return None;
		}
		self.pending_settle = None;

		let target = FrameTarget::plan(active);
		let camera = match target {
			FrameTarget::FitAll => self.fit_all_camera(all)?,
			FrameTarget::Focus { bounds, count } => self.focus_camera(bounds, count),
		};
		self.animate_to(camera, now_ms, FRAME_DURATION_MS);
		self.last_target = Some(target);
		Some(target)
	}

	pub fn zoom_in(&mut self, now_ms: f64) {
		self.zoom_by(ZOOM_STEP, now_ms);
	}

	pub fn zoom_out(&mut self, now_ms: f64) {
		self.zoom_by(1.0 / ZOOM_STEP, now_ms);
	}

	/// Animated fit-all, bypassing step framing.
	pub fn reset_view(&mut self, now_ms: f64, all: &[Rect]) {
		self.cancel_pending();
		if let Some(camera) = self.fit_all_camera(all) {
			self.animate_to(camera, now_ms, FRAME_DURATION_MS / 2.0);
			self.last_target = Some(FrameTarget::FitAll);
		}
	}

	/// Immediate zoom around a screen point (mouse wheel).
	pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
		self.update_for_input();
		self.set_camera(self.camera.zoomed_at(anchor, factor));
	}

	/// Immediate pan by a screen-space delta.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.update_for_input();
		self.set_camera(Camera {
			x: self.camera.x + dx,
			y: self.camera.y + dy,
			k: self.camera.k,
		});
	}

	fn zoom_by(&mut self, factor: f64, now_ms: f64) {
		self.update(now_ms);
		let base = self.transition.map(|t| t.to).unwrap_or(self.camera);
		let center = Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
		let target = base.zoomed_at(center, factor);
		self.animate_to(target, now_ms, ZOOM_BUTTON_DURATION_MS);
	}

	/// User input wins: a pending auto-frame must not yank the camera away.
	fn update_for_input(&mut self) {
		self.pending_settle = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const VIEW: Size = Size::new(1000.0, 500.0);

	fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
		Rect::from_origin_size(Point::new(x, y), Size::new(w, h))
	}

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-9
	}

	#[test]
	fn empty_active_set_plans_fit_all() {
		assert_eq!(FrameTarget::plan(&[]), FrameTarget::FitAll);
		let mut vc = ViewportController::new(ViewportProfile::SPACIOUS, VIEW);
		let all = [rect(0.0, 0.0, 100.0, 50.0), rect(900.0, 400.0, 100.0, 50.0)];
		let generation = vc.step_changed();
		assert_eq!(vc.settle(generation, 0.0, &[], &all), Some(FrameTarget::FitAll));
	}

	#[test]
	fn focus_zoom_is_min_of_axes_and_centered() {
		let bounds = rect(0.0, 0.0, 400.0, 100.0);
		let cam = camera_for_bounds(bounds, VIEW, 0.0, 0.1, 10.0);
		assert!(close(cam.k, 2.5));
		let center = cam.graph_to_screen(bounds.center());
		assert!(close(center.x, 500.0) && close(center.y, 250.0));
	}

	#[test]
	fn zoom_is_clamped_by_profile() {
		let tiny = rect(10.0, 10.0, 20.0, 10.0);
		let vc = ViewportController::new(ViewportProfile::SPACIOUS, VIEW);
		assert_eq!(vc.focus_camera(tiny, 1).k, ViewportProfile::SPACIOUS.max_zoom);

		let huge = rect(0.0, 0.0, 100_000.0, 100_000.0);
		assert_eq!(vc.focus_camera(huge, 1).k, ViewportProfile::SPACIOUS.min_zoom);
	}

	#[test]
	fn padding_shrinks_with_count_but_not_below_floor() {
		let p = ViewportProfile::SPACIOUS;
		assert!(p.padding_for(1) > p.padding_for(3));
		assert!(p.padding_for(3) > p.padding_for(6));
		assert_eq!(p.padding_for(500), p.min_padding);
		assert_eq!(p.padding_for(0), p.padding);
	}

	#[test]
	fn profiles_differ_as_documented() {
		let (c, s) = (ViewportProfile::COMPACT, ViewportProfile::SPACIOUS);
		assert!(c.padding < s.padding);
		assert!(c.min_zoom > s.min_zoom);
		assert!(c.max_zoom > s.max_zoom);
	}

	#[test]
	fn device_detection() {
		assert_eq!(DeviceClass::detect(1366.0, 1024.0, 5, true), DeviceClass::Compact);
		assert_eq!(DeviceClass::detect(1920.0, 1080.0, 0, false), DeviceClass::Spacious);
		assert_eq!(DeviceClass::detect(390.0, 844.0, 5, true), DeviceClass::Spacious);
	}

	#[test]
	fn stale_settle_is_ignored() {
		let mut vc = ViewportController::new(ViewportProfile::SPACIOUS, VIEW);
		let active = [rect(0.0, 0.0, 100.0, 50.0)];
		let first = vc.step_changed();
		let second = vc.step_changed();
		assert_eq!(vc.settle(first, 0.0, &active, &active), None);
		assert!(vc.settle(second, 0.0, &active, &active).is_some());
		assert_eq!(vc.settle(second, 10.0, &active, &active), None, "consumed");
	}

	#[test]
	fn new_transition_replaces_in_flight_without_jump() {
		let mut vc = ViewportController::new(ViewportProfile::SPACIOUS, VIEW);
		let a = Camera { x: 100.0, y: 0.0, k: 1.0 };
		let b = Camera { x: -300.0, y: 50.0, k: 2.0 };
		vc.animate_to(a, 0.0, FRAME_DURATION_MS);
		vc.update(400.0);
		let midway = vc.camera();

		let token = vc.animate_to(b, 400.0, FRAME_DURATION_MS);
		vc.update(400.0);
		assert_eq!(vc.camera(), midway);

		assert_eq!(vc.update(400.0 + FRAME_DURATION_MS), Some(token));
		assert_eq!(vc.camera(), b);
		assert!(!vc.is_animating());
	}

	#[test]
	fn direct_manipulation_cancels_animation_and_pending_frame() {
		let mut vc = ViewportController::new(ViewportProfile::SPACIOUS, VIEW);
		vc.animate_to(Camera { x: 10.0, y: 10.0, k: 2.0 }, 0.0, FRAME_DURATION_MS);
		let generation = vc.step_changed();
		vc.pan_by(5.0, 5.0);
		assert!(!vc.is_animating());
		let r = [rect(0.0, 0.0, 1.0, 1.0)];
		assert_eq!(vc.settle(generation, 0.0, &r, &r), None);
	}

	#[test]
	fn wheel_zoom_keeps_anchor_fixed() {
		let mut vc = ViewportController::new(ViewportProfile::SPACIOUS, VIEW);
		let anchor = Point::new(300.0, 120.0);
		let before = vc.camera().screen_to_graph(anchor);
		vc.zoom_at(anchor, 1.5);
		let after = vc.camera().screen_to_graph(anchor);
		assert!(close(before.x, after.x) && close(before.y, after.y));
		assert!(close(vc.camera().k, 1.5));
	}

	#[test]
	fn zoom_buttons_compound_on_target() {
		let mut vc = ViewportController::new(ViewportProfile::SPACIOUS, VIEW);
		vc.zoom_in(0.0);
		vc.zoom_in(10.0);
		vc.update(10.0 + ZOOM_BUTTON_DURATION_MS);
		assert!(close(vc.camera().k, ZOOM_STEP * ZOOM_STEP));
		vc.zoom_out(1000.0);
		vc.update(2000.0);
		assert!(close(vc.camera().k, ZOOM_STEP));
	}

	#[test]
	fn fit_all_immediate_frames_whole_graph() {
		let mut vc = ViewportController::new(ViewportProfile::SPACIOUS, VIEW);
		let all = [rect(0.0, 0.0, 100.0, 100.0), rect(500.0, 200.0, 100.0, 100.0)];
		vc.fit_all_immediate(&all);
		assert!(!vc.is_animating());
		let c = vc.camera().graph_to_screen(Point::new(300.0, 150.0));
		assert!(close(c.x, 500.0) && close(c.y, 250.0));
		assert_eq!(vc.last_target(), Some(FrameTarget::FitAll));
	}
}
