//! Node and edge visual primitives: sizing, palettes, anchors, edge paths.
//!
//! Everything here is plain geometry and colour lookup so it can be tested
//! without a canvas. `render.rs` is the only consumer that touches pixels.

use super::resolve::{RenderEdge, RenderNode};
use super::types::{EdgeKind, Handle, Point, Rect, Size, VisualKind};
use crate::config::ThemeMode;

pub const LABEL_FONT_PX: f64 = 13.0;
pub const BADGE_FONT_PX: f64 = 10.0;
pub const NODE_MIN_WIDTH: f64 = 132.0;
pub const NODE_MAX_WIDTH: f64 = 260.0;
pub const NODE_PADDING_X: f64 = 14.0;
pub const GLYPH_WIDTH: f64 = 18.0;
pub const STATUS_ROW_HEIGHT: f64 = 20.0;
pub const ARROW_SIZE: f64 = 9.0;
pub const CORNER_RADIUS: f64 = 8.0;
/// Background dot spacing in graph units at normal zoom.
pub const GRID_SPACING: f64 = 40.0;
/// Dots never sit closer than this on screen.
const MIN_GRID_SCREEN_PX: f64 = 16.0;

/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH_EM: f64 = 0.58;

pub fn estimate_text_width(text: &str, font_px: f64) -> f64 {
	text.chars().count() as f64 * font_px * CHAR_WIDTH_EM
}

fn body_height(kind: VisualKind) -> f64 {
	match kind {
		VisualKind::Actor => 44.0,
		VisualKind::Process => 62.0,
		VisualKind::Store => 58.0,
		VisualKind::Gate => 62.0,
	}
}

/// Node box for a label of `label_width` pixels.
pub fn node_size(kind: VisualKind, label_width: f64, has_status: bool) -> Size {
	let width =
		(label_width + GLYPH_WIDTH + 2.0 * NODE_PADDING_X).clamp(NODE_MIN_WIDTH, NODE_MAX_WIDTH);
	let status = if has_status { STATUS_ROW_HEIGHT } else { 0.0 };
	Size::new(width, body_height(kind) + status)
}

/// Size used before the painter has measured the node.
pub fn estimate_node_size(kind: VisualKind, label: &str, status: Option<&str>) -> Size {
	let label_width = estimate_text_width(label, LABEL_FONT_PX);
	let status_width = status.map_or(0.0, |s| estimate_text_width(s, BADGE_FONT_PX) + 16.0);
	node_size(kind, label_width.max(status_width), status.is_some())
}

/// Graph-space box of a node whose authored position is its top-left corner.
pub fn footprint(position: Point, size: Size) -> Rect {
	Rect::from_origin_size(position, size)
}

/// Graph-space dot spacing at zoom `k`: the base spacing, doubled until the
/// dots are at least [`MIN_GRID_SCREEN_PX`] apart on screen.
pub fn grid_spacing(k: f64) -> f64 {
	let mut spacing = GRID_SPACING;
	if !(k.is_finite() && k > 0.0) {
		return spacing;
	}
	while spacing * k < MIN_GRID_SCREEN_PX {
		spacing *= 2.0;
	}
	spacing
}

/// Coarse meaning of a free-form status string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusTone {
	Pending,
	Active,
	Success,
	Failure,
	Neutral,
}

const FAILURE_WORDS: &[&str] = &[
	"FAIL", "REJECT", "REVERT", "ERROR", "LIQUIDAT", "SLASH", "CANCEL", "EXPIRED", "DENIED",
];
const PENDING_WORDS: &[&str] = &["PENDING", "WAIT", "QUEUE", "IDLE", "READY"];
const ACTIVE_WORDS: &[&str] = &[
	"PROGRESS", "VOTING", "SIGNING", "ACTIVE", "PROCESSING", "SWAPPING", "LOCK", "TRANSFER",
];
const SUCCESS_WORDS: &[&str] = &[
	"DONE", "COMPLETE", "CONFIRM", "SUCCESS", "EXECUTED", "APPROVED", "SETTLED", "MINTED", "BURNED",
	"RECEIVED", "FINAL", "PASSED", "SIGNED",
];

impl StatusTone {
	/// Failure words win over everything, then waiting, then in-flight, then done.
	pub fn classify(status: &str) -> Self {
		let upper = status.to_ascii_uppercase();
		let has = |words: &[&str]| words.iter().any(|w| upper.contains(w));
		if has(FAILURE_WORDS) {
			StatusTone::Failure
		} else if has(PENDING_WORDS) {
			StatusTone::Pending
		} else if has(ACTIVE_WORDS) {
			StatusTone::Active
		} else if has(SUCCESS_WORDS) {
			StatusTone::Success
		} else {
			StatusTone::Neutral
		}
	}
}

/// Canvas colours for one theme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
	pub background: &'static str,
	pub grid: &'static str,
	pub node_fill: &'static str,
	pub node_fill_current: &'static str,
	pub node_border: &'static str,
	pub node_border_current: &'static str,
	pub selected_ring: &'static str,
	pub text: &'static str,
	pub text_muted: &'static str,
	pub edge_label_bg: &'static str,
}

impl Palette {
	pub fn for_theme(theme: ThemeMode) -> Self {
		match theme {
			ThemeMode::Dark => Palette {
				background: "#1a1a2e",
				grid: "rgba(255, 255, 255, 0.05)",
				node_fill: "#23233a",
				node_fill_current: "#2c3458",
				node_border: "#3b3b5c",
				node_border_current: "#64b4ff",
				selected_ring: "#ffd166",
				text: "#f0f0f8",
				text_muted: "rgba(240, 240, 248, 0.55)",
				edge_label_bg: "rgba(26, 26, 46, 0.85)",
			},
			ThemeMode::Light => Palette {
				background: "#f7f8fc",
				grid: "rgba(0, 0, 0, 0.05)",
				node_fill: "#ffffff",
				node_fill_current: "#eaf3ff",
				node_border: "#c9ccd8",
				node_border_current: "#1f77b4",
				selected_ring: "#e09f00",
				text: "#1b1d29",
				text_muted: "rgba(27, 29, 41, 0.55)",
				edge_label_bg: "rgba(247, 248, 252, 0.9)",
			},
		}
	}

	pub fn tone_color(&self, tone: StatusTone) -> &'static str {
		match tone {
			StatusTone::Pending => "#9e9e9e",
			StatusTone::Active => "#ff7f0e",
			StatusTone::Success => "#2ca02c",
			StatusTone::Failure => "#d62728",
			StatusTone::Neutral => "#17becf",
		}
	}

	pub fn kind_accent(&self, kind: VisualKind) -> &'static str {
		match kind {
			VisualKind::Actor => "#9467bd",
			VisualKind::Process => "#1f77b4",
			VisualKind::Store => "#2ca02c",
			VisualKind::Gate => "#e377c2",
		}
	}
}

/// Which side of a node box a handle sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
	Top,
	Bottom,
	Left,
	Right,
}

impl Side {
	/// Outward unit normal.
	pub fn normal(self) -> Point {
		match self {
			Side::Top => Point::new(0.0, -1.0),
			Side::Bottom => Point::new(0.0, 1.0),
			Side::Left => Point::new(-1.0, 0.0),
			Side::Right => Point::new(1.0, 0.0),
		}
	}

	fn is_horizontal(self) -> bool {
		matches!(self, Side::Left | Side::Right)
	}
}

/// Point on `rect` where a handle on `side` sits.
pub fn side_anchor(rect: Rect, side: Side) -> Point {
	let c = rect.center();
	match side {
		Side::Top => Point::new(c.x, rect.min.y),
		Side::Bottom => Point::new(c.x, rect.max.y),
		Side::Left => Point::new(rect.min.x, c.y),
		Side::Right => Point::new(rect.max.x, c.y),
	}
}

/// Outgoing handle: right edge for side handles, bottom otherwise.
pub fn source_anchor(rect: Rect, handle: Handle) -> (Point, Side) {
	let side = if handle.side { Side::Right } else { Side::Bottom };
	(side_anchor(rect, side), side)
}

/// Incoming handle: left edge for side handles, top otherwise.
pub fn target_anchor(rect: Rect, handle: Handle) -> (Point, Side) {
	let side = if handle.side { Side::Left } else { Side::Top };
	(side_anchor(rect, side), side)
}

/// Routed geometry of one edge.
#[derive(Clone, Debug, PartialEq)]
pub enum EdgePath {
	Line { from: Point, to: Point },
	Cubic { from: Point, c1: Point, c2: Point, to: Point },
	Polyline(Vec<Point>),
}

fn offset(p: Point, dir: Point, by: f64) -> Point {
	Point::new(p.x + dir.x * by, p.y + dir.y * by)
}

fn distance(a: Point, b: Point) -> f64 {
	((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
	Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Route an edge between two anchors. The path ends `ARROW_SIZE` short of
/// the target so the arrowhead tip lands on the handle.
pub fn edge_path(kind: EdgeKind, from: (Point, Side), to: (Point, Side)) -> EdgePath {
	let (start, from_side) = from;
	let (tip, to_side) = to;
	let end = offset(tip, to_side.normal(), ARROW_SIZE);

	match kind {
		EdgeKind::Straight => EdgePath::Line { from: start, to: end },
		EdgeKind::Bezier => {
			let reach = (distance(start, end) * 0.5).max(25.0);
			EdgePath::Cubic {
				from: start,
				c1: offset(start, from_side.normal(), reach),
				c2: offset(end, to_side.normal(), reach),
				to: end,
			}
		}
		EdgeKind::Step => {
			let points = if from_side.is_horizontal() {
				let mid_x = (start.x + end.x) / 2.0;
				vec![start, Point::new(mid_x, start.y), Point::new(mid_x, end.y), end]
			} else {
				let mid_y = (start.y + end.y) / 2.0;
				vec![start, Point::new(start.x, mid_y), Point::new(end.x, mid_y), end]
			};
			EdgePath::Polyline(points)
		}
	}
}

impl EdgePath {
	pub fn start(&self) -> Point {
		match self {
			EdgePath::Line { from, .. } | EdgePath::Cubic { from, .. } => *from,
			EdgePath::Polyline(points) => points.first().copied().unwrap_or_default(),
		}
	}

	pub fn end(&self) -> Point {
		match self {
			EdgePath::Line { to, .. } | EdgePath::Cubic { to, .. } => *to,
			EdgePath::Polyline(points) => points.last().copied().unwrap_or_default(),
		}
	}

	/// Point at parameter `t` in `[0, 1]`. Polylines are parameterised by length.
	pub fn point_at(&self, t: f64) -> Point {
		let t = t.clamp(0.0, 1.0);
		match self {
			EdgePath::Line { from, to } => lerp(*from, *to, t),
			EdgePath::Cubic { from, c1, c2, to } => {
				let u = 1.0 - t;
				let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
				Point::new(
					a * from.x + b * c1.x + c * c2.x + d * to.x,
					a * from.y + b * c1.y + c * c2.y + d * to.y,
				)
			}
			EdgePath::Polyline(points) => {
				let total: f64 = points.windows(2).map(|w| distance(w[0], w[1])).sum();
				if total <= f64::EPSILON {
					return self.start();
				}
				let mut remaining = total * t;
				for w in points.windows(2) {
					let len = distance(w[0], w[1]);
					if remaining <= len && len > 0.0 {
						return lerp(w[0], w[1], remaining / len);
					}
					remaining -= len;
				}
				self.end()
			}
		}
	}

	pub fn midpoint(&self) -> Point {
		self.point_at(0.5)
	}
}

/// Arrowhead triangle `[tip, left, right]` pointing along `dir`.
pub fn arrowhead(tip: Point, dir: Point, size: f64) -> [Point; 3] {
	let len = (dir.x * dir.x + dir.y * dir.y).sqrt();
	let (ux, uy) = if len < 1e-9 { (0.0, 1.0) } else { (dir.x / len, dir.y / len) };
	let back = Point::new(tip.x - ux * size, tip.y - uy * size);
	let (px, py) = (-uy * size * 0.5, ux * size * 0.5);
	[
		tip,
		Point::new(back.x + px, back.y + py),
		Point::new(back.x - px, back.y - py),
	]
}

/// Stroke parameters of one edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
	pub alpha: f64,
	pub width: f64,
	/// `[dash, gap]` for animated edges.
	pub dash: Option<[f64; 2]>,
	/// Dash travel in px per second.
	pub dash_speed: f64,
}

/// Current edges are opaque and animated; the rest fade back, more so when
/// the step has anything lit.
pub fn edge_style(edge: &RenderEdge, step_has_activity: bool) -> EdgeStyle {
	if edge.animated() {
		EdgeStyle {
			alpha: 1.0,
			width: 2.5,
			dash: Some([8.0, 4.0]),
			dash_speed: if edge.data.force_animated { 45.0 } else { 30.0 },
		}
	} else {
		EdgeStyle {
			alpha: if step_has_activity { 0.25 } else { 0.6 },
			width: 1.5,
			dash: None,
			dash_speed: 0.0,
		}
	}
}

/// Fill and outline of one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
	pub alpha: f64,
	pub fill: &'static str,
	pub border: &'static str,
	pub border_width: f64,
	pub glow: bool,
	pub ring: Option<&'static str>,
	pub badge: Option<&'static str>,
}

pub fn node_style(node: &RenderNode, palette: &Palette, step_has_activity: bool) -> NodeStyle {
	let current = node.data.is_current;
	let dimmed = step_has_activity && !current && !node.selected;
	NodeStyle {
		alpha: if dimmed { 0.45 } else { 1.0 },
		fill: if current { palette.node_fill_current } else { palette.node_fill },
		border: if current { palette.node_border_current } else { palette.node_border },
		border_width: if current { 2.0 } else { 1.0 },
		glow: current,
		ring: node.selected.then_some(palette.selected_ring),
		badge: node
			.data
			.status
			.as_deref()
			.map(|s| palette.tone_color(StatusTone::classify(s))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_diagram::resolve::{RenderEdgeData, RenderNodeData};
	use crate::components::flow_diagram::types::SemanticType;

	fn close(a: Point, b: Point) -> bool {
		(a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
	}

	#[test]
	fn tones() {
		assert_eq!(StatusTone::classify("VOTING_IN_PROGRESS"), StatusTone::Active);
		assert_eq!(StatusTone::classify("PENDING"), StatusTone::Pending);
		assert_eq!(StatusTone::classify("awaiting confirmation"), StatusTone::Pending);
		assert_eq!(StatusTone::classify("Executed"), StatusTone::Success);
		assert_eq!(StatusTone::classify("TX_REVERTED"), StatusTone::Failure);
		assert_eq!(StatusTone::classify("3 of 5"), StatusTone::Neutral);
	}

	#[test]
	fn grid_thins_out_when_zoomed_out() {
		assert_eq!(grid_spacing(1.0), GRID_SPACING);
		assert_eq!(grid_spacing(4.0), GRID_SPACING);
		for k in [0.1, 0.25, 0.35, 0.6] {
			let spacing = grid_spacing(k);
			assert!(spacing * k >= MIN_GRID_SCREEN_PX);
			assert!(spacing * k < 2.0 * MIN_GRID_SCREEN_PX);
		}
		// A 1920x1080 canvas at the minimum zoom stays within a few thousand dots.
		let step = grid_spacing(0.1) * 0.1;
		assert!((1920.0 / step + 1.0) * (1080.0 / step + 1.0) < 10_000.0);
	}

	#[test]
	fn node_sizes_clamp_and_grow_with_status() {
		let short = estimate_node_size(VisualKind::Process, "A", None);
		assert_eq!(short.width, NODE_MIN_WIDTH);
		let long = estimate_node_size(VisualKind::Process, &"x".repeat(200), None);
		assert_eq!(long.width, NODE_MAX_WIDTH);
		let with_status = estimate_node_size(VisualKind::Process, "A", Some("DONE"));
		assert_eq!(with_status.height, short.height + STATUS_ROW_HEIGHT);
		assert!(
			estimate_node_size(VisualKind::Actor, "A", None).height
				< estimate_node_size(VisualKind::Gate, "A", None).height
		);
	}

	#[test]
	fn anchors_follow_handle_side() {
		let rect = Rect::from_origin_size(Point::new(0.0, 0.0), Size::new(100.0, 40.0));
		assert_eq!(
			source_anchor(rect, Handle { side: false }),
			(Point::new(50.0, 40.0), Side::Bottom)
		);
		assert_eq!(target_anchor(rect, Handle { side: false }), (Point::new(50.0, 0.0), Side::Top));
		assert_eq!(
			source_anchor(rect, Handle { side: true }),
			(Point::new(100.0, 20.0), Side::Right)
		);
		assert_eq!(target_anchor(rect, Handle { side: true }), (Point::new(0.0, 20.0), Side::Left));
	}

	#[test]
	fn paths_stop_short_of_the_target_for_the_arrow() {
		let from = (Point::new(0.0, 0.0), Side::Bottom);
		let to = (Point::new(0.0, 200.0), Side::Top);
		for kind in [EdgeKind::Straight, EdgeKind::Bezier, EdgeKind::Step] {
			let path = edge_path(kind, from, to);
			assert!(close(path.start(), Point::new(0.0, 0.0)));
			assert!(close(path.end(), Point::new(0.0, 200.0 - ARROW_SIZE)), "{kind:?}");
		}
	}

	#[test]
	fn step_path_elbows_at_the_midline() {
		let path = edge_path(
			EdgeKind::Step,
			(Point::new(0.0, 0.0), Side::Right),
			(Point::new(100.0, 60.0), Side::Left),
		);
		let EdgePath::Polyline(points) = &path else {
			panic!("expected polyline");
		};
		let mid_x = (0.0 + 100.0 - ARROW_SIZE) / 2.0;
		assert_eq!(points[1], Point::new(mid_x, 0.0));
		assert_eq!(points[2], Point::new(mid_x, 60.0));
	}

	#[test]
	fn bezier_controls_leave_along_handle_normals() {
		let path = edge_path(
			EdgeKind::Bezier,
			(Point::new(0.0, 0.0), Side::Bottom),
			(Point::new(300.0, 300.0), Side::Top),
		);
		let EdgePath::Cubic { from, c1, c2, to } = path else {
			panic!("expected cubic");
		};
		assert_eq!(c1.x, from.x);
		assert!(c1.y > from.y);
		assert_eq!(c2.x, to.x);
		assert!(c2.y < to.y);
	}

	#[test]
	fn polyline_midpoint_is_by_length() {
		let path = EdgePath::Polyline(vec![
			Point::new(0.0, 0.0),
			Point::new(10.0, 0.0),
			Point::new(10.0, 30.0),
		]);
		assert!(close(path.midpoint(), Point::new(10.0, 10.0)));
	}

	#[test]
	fn arrowhead_is_symmetric_about_direction() {
		let [tip, left, right] = arrowhead(Point::new(10.0, 10.0), Point::new(0.0, 5.0), 8.0);
		assert_eq!(tip, Point::new(10.0, 10.0));
		assert!(close(left, Point::new(6.0, 2.0)));
		assert!(close(right, Point::new(14.0, 2.0)));
	}

	#[test]
	fn current_edges_animate_and_the_rest_fade() {
		let mut edge = RenderEdge {
			id: "e".into(),
			source: "a".into(),
			target: "b".into(),
			kind: EdgeKind::Bezier,
			data: RenderEdgeData {
				label: None,
				color: "#fff".into(),
				is_current: true,
				force_animated: false,
			},
		};
		assert!(edge_style(&edge, true).dash.is_some());
		edge.data.is_current = false;
		let quiet = edge_style(&edge, true);
		assert!(quiet.dash.is_none());
		assert!(quiet.alpha < edge_style(&edge, false).alpha);
	}

	#[test]
	fn node_style_reflects_state() {
		let palette = Palette::for_theme(ThemeMode::Dark);
		let mut node = RenderNode {
			id: "n".into(),
			position: Point::default(),
			kind: VisualKind::Process,
			data: RenderNodeData {
				label: "N".into(),
				semantic_type: SemanticType::Contract,
				status: Some("FAILED".into()),
				tooltip: None,
				timestamp: None,
				is_current: false,
			},
			selected: true,
			dragging: false,
		};
		let style = node_style(&node, &palette, true);
		assert_eq!(style.alpha, 1.0, "selection keeps a node lit");
		assert_eq!(style.ring, Some(palette.selected_ring));
		assert_eq!(style.badge, Some(palette.tone_color(StatusTone::Failure)));

		node.selected = false;
		assert!(node_style(&node, &palette, true).alpha < 1.0);
		node.data.is_current = true;
		assert!(node_style(&node, &palette, true).glow);
	}

	#[test]
	fn themes_have_distinct_backgrounds() {
		assert_ne!(
			Palette::for_theme(ThemeMode::Dark).background,
			Palette::for_theme(ThemeMode::Light).background
		);
	}
}
