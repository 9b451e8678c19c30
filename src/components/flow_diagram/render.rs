use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::primitives::{
	self, ARROW_SIZE, BADGE_FONT_PX, CORNER_RADIUS, EdgePath, GLYPH_WIDTH, LABEL_FONT_PX,
	NODE_PADDING_X, STATUS_ROW_HEIGHT,
};
use super::resolve::{RenderEdge, RenderNode};
use super::state::DiagramState;
use super::types::{NodeId, Point, Rect, Size, VisualKind};

const FONT_FAMILY: &str = "Inter, system-ui, sans-serif";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn label_font() -> String {
	format!("600 {}px {}", LABEL_FONT_PX, FONT_FAMILY)
}

fn badge_font() -> String {
	format!("600 {}px {}", BADGE_FONT_PX, FONT_FAMILY)
}

/// Measure every node with the canvas font metrics. Only sizes that differ
/// from what the state already holds are returned.
pub fn measure_nodes(state: &DiagramState, ctx: &CanvasRenderingContext2d) -> Vec<(NodeId, Size)> {
	let mut out = Vec::new();
	for node in state.reconciler.nodes() {
		ctx.set_font(&label_font());
		let label = ctx.measure_text(&node.data.label).map(|m| m.width()).unwrap_or(0.0);
		ctx.set_font(&badge_font());
		let status = node
			.data
			.status
			.as_deref()
			.and_then(|s| ctx.measure_text(s).ok())
			.map_or(0.0, |m| m.width() + 16.0);
		let size = primitives::node_size(node.kind, label.max(status), node.data.status.is_some());
		if state.reconciler.measured_size(&node.id) != Some(size) {
			out.push((node.id.clone(), size));
		}
	}
	out
}

pub fn render(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(state.palette.background);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	let camera = state.viewport.camera();
	ctx.save();
	let _ = ctx.translate(camera.x, camera.y);
	let _ = ctx.scale(camera.k, camera.k);
	draw_grid(state, ctx);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();

	draw_tooltip(state, ctx);
}

fn draw_grid(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	let camera = state.viewport.camera();
	let top_left = camera.screen_to_graph(Point::new(0.0, 0.0));
	let bottom_right = camera.screen_to_graph(Point::new(state.width, state.height));
	let dot = 1.2 / camera.k;
	let spacing = primitives::grid_spacing(camera.k);

	ctx.set_fill_style_str(state.palette.grid);
	let mut x = (top_left.x / spacing).floor() * spacing;
	while x <= bottom_right.x {
		let mut y = (top_left.y / spacing).floor() * spacing;
		while y <= bottom_right.y {
			ctx.fill_rect(x - dot / 2.0, y - dot / 2.0, dot, dot);
			y += spacing;
		}
		x += spacing;
	}
}

fn trace_path(ctx: &CanvasRenderingContext2d, path: &EdgePath) {
	ctx.begin_path();
	match path {
		EdgePath::Line { from, to } => {
			ctx.move_to(from.x, from.y);
			ctx.line_to(to.x, to.y);
		}
		EdgePath::Cubic { from, c1, c2, to } => {
			ctx.move_to(from.x, from.y);
			ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, to.x, to.y);
		}
		EdgePath::Polyline(points) => {
			let mut iter = points.iter();
			if let Some(first) = iter.next() {
				ctx.move_to(first.x, first.y);
			}
			for p in iter {
				ctx.line_to(p.x, p.y);
			}
		}
	}
}

fn draw_edges(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	let graph = &state.scenario().graph;
	let busy = state.step_has_activity();

	for edge in state.reconciler.edges() {
		let endpoints = (state.reconciler.node(&edge.source), state.reconciler.node(&edge.target));
		let (Some(source), Some(target)) = endpoints else {
			continue;
		};
		let from = primitives::source_anchor(state.footprint(source), graph.handle(&source.id));
		let to = primitives::target_anchor(state.footprint(target), graph.handle(&target.id));
		let path = primitives::edge_path(edge.kind, from, to);
		let style = primitives::edge_style(edge, busy);

		ctx.set_global_alpha(style.alpha);
		ctx.set_stroke_style_str(&edge.data.color);
		ctx.set_line_width(style.width);
		match style.dash {
			Some([dash, gap]) => {
				let pattern = js_sys::Array::of2(&JsValue::from_f64(dash), &JsValue::from_f64(gap));
				let _ = ctx.set_line_dash(&pattern);
				ctx.set_line_dash_offset(-(state.flow_time * style.dash_speed) % (dash + gap));
			}
			None => {
				let _ = ctx.set_line_dash(&js_sys::Array::new());
			}
		}
		trace_path(ctx, &path);
		ctx.stroke();

		let _ = ctx.set_line_dash(&js_sys::Array::new());
		let inward = to.1.normal();
		let direction = Point::new(-inward.x, -inward.y);
		let [tip, left, right] = primitives::arrowhead(to.0, direction, ARROW_SIZE);
		ctx.set_fill_style_str(&edge.data.color);
		ctx.begin_path();
		ctx.move_to(tip.x, tip.y);
		ctx.line_to(left.x, left.y);
		ctx.line_to(right.x, right.y);
		ctx.close_path();
		ctx.fill();

		draw_edge_label(state, ctx, edge, &path);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_edge_label(
	state: &DiagramState,
	ctx: &CanvasRenderingContext2d,
	edge: &RenderEdge,
	path: &EdgePath,
) {
	let Some(label) = &edge.data.label else {
		return;
	};
	if !edge.data.is_current && state.viewport.camera().k < 0.6 {
		return;
	}
	let mid = path.midpoint();
	ctx.set_font(&badge_font());
	let width = ctx.measure_text(label).map(|m| m.width()).unwrap_or(0.0) + 10.0;
	let height = BADGE_FONT_PX + 8.0;
	ctx.set_fill_style_str(state.palette.edge_label_bg);
	ctx.fill_rect(mid.x - width / 2.0, mid.y - height / 2.0, width, height);
	let color = if edge.data.is_current { state.palette.text } else { state.palette.text_muted };
	ctx.set_fill_style_str(color);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(label, mid.x, mid.y);
}

/// Rounded rectangle path; radius is clamped to half the shorter side.
fn rounded_rect(ctx: &CanvasRenderingContext2d, r: Rect, radius: f64) {
	let radius = radius.min(r.width() / 2.0).min(r.height() / 2.0);
	ctx.begin_path();
	ctx.move_to(r.min.x + radius, r.min.y);
	let _ = ctx.arc_to(r.max.x, r.min.y, r.max.x, r.max.y, radius);
	let _ = ctx.arc_to(r.max.x, r.max.y, r.min.x, r.max.y, radius);
	let _ = ctx.arc_to(r.min.x, r.max.y, r.min.x, r.min.y, radius);
	let _ = ctx.arc_to(r.min.x, r.min.y, r.max.x, r.min.y, radius);
	ctx.close_path();
}

fn chamfered_rect(ctx: &CanvasRenderingContext2d, r: Rect, cut: f64) {
	ctx.begin_path();
	ctx.move_to(r.min.x + cut, r.min.y);
	ctx.line_to(r.max.x - cut, r.min.y);
	ctx.line_to(r.max.x, r.min.y + cut);
	ctx.line_to(r.max.x, r.max.y - cut);
	ctx.line_to(r.max.x - cut, r.max.y);
	ctx.line_to(r.min.x + cut, r.max.y);
	ctx.line_to(r.min.x, r.max.y - cut);
	ctx.line_to(r.min.x, r.min.y + cut);
	ctx.close_path();
}

fn node_outline(ctx: &CanvasRenderingContext2d, kind: VisualKind, r: Rect) {
	match kind {
		VisualKind::Actor => rounded_rect(ctx, r, r.height() / 2.0),
		VisualKind::Process => rounded_rect(ctx, r, CORNER_RADIUS),
		VisualKind::Store => rounded_rect(ctx, r, CORNER_RADIUS / 2.0),
		VisualKind::Gate => chamfered_rect(ctx, r, 12.0),
	}
}

fn draw_nodes(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	let busy = state.step_has_activity();
	// Lit nodes last so their glow sits on top.
	let (dark, lit): (Vec<_>, Vec<_>) =
		state.reconciler.nodes().iter().partition(|n| !n.data.is_current);
	for node in dark.into_iter().chain(lit) {
		draw_node(state, ctx, node, busy);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_node(state: &DiagramState, ctx: &CanvasRenderingContext2d, node: &RenderNode, busy: bool) {
	let palette = &state.palette;
	let style = primitives::node_style(node, palette, busy);
	let r = state.footprint(node);
	let accent = palette.kind_accent(node.kind);

	ctx.set_global_alpha(style.alpha);
	if style.glow {
		ctx.set_shadow_color(style.border);
		ctx.set_shadow_blur(18.0);
	}
	node_outline(ctx, node.kind, r);
	ctx.set_fill_style_str(style.fill);
	ctx.fill();
	ctx.set_shadow_blur(0.0);
	ctx.set_line_width(style.border_width);
	ctx.set_stroke_style_str(style.border);
	ctx.stroke();

	match node.kind {
		VisualKind::Process => {
			ctx.set_fill_style_str(accent);
			ctx.fill_rect(r.min.x + 1.0, r.min.y + 1.0, r.width() - 2.0, 4.0);
		}
		VisualKind::Store => {
			ctx.set_stroke_style_str(accent);
			ctx.set_line_width(1.0);
			ctx.begin_path();
			for inset in [4.0, 7.0] {
				ctx.move_to(r.min.x + 8.0, r.max.y - inset);
				ctx.line_to(r.max.x - 8.0, r.max.y - inset);
			}
			ctx.stroke();
		}
		VisualKind::Actor | VisualKind::Gate => {}
	}

	if let Some(ring) = style.ring {
		let grown = Rect {
			min: Point::new(r.min.x - 4.0, r.min.y - 4.0),
			max: Point::new(r.max.x + 4.0, r.max.y + 4.0),
		};
		node_outline(ctx, node.kind, grown);
		ctx.set_line_width(2.0);
		ctx.set_stroke_style_str(ring);
		ctx.stroke();
	}

	let body_bottom = r.max.y - if node.data.status.is_some() { STATUS_ROW_HEIGHT } else { 0.0 };
	let text_y = (r.min.y + body_bottom) / 2.0;
	ctx.set_text_baseline("middle");
	ctx.set_text_align("left");

	ctx.set_font(&label_font());
	ctx.set_fill_style_str(accent);
	let _ = ctx.fill_text(node.data.semantic_type.glyph(), r.min.x + NODE_PADDING_X, text_y);
	ctx.set_fill_style_str(palette.text);
	let _ = ctx.fill_text(&node.data.label, r.min.x + NODE_PADDING_X + GLYPH_WIDTH, text_y - 6.0);
	ctx.set_font(&badge_font());
	ctx.set_fill_style_str(palette.text_muted);
	let _ = ctx.fill_text(
		node.data.semantic_type.label(),
		r.min.x + NODE_PADDING_X + GLYPH_WIDTH,
		text_y + 9.0,
	);

	if let (Some(status), Some(color)) = (&node.data.status, style.badge) {
		let width = ctx.measure_text(status).map(|m| m.width()).unwrap_or(0.0) + 12.0;
		let badge = Rect::from_origin_size(
			Point::new(r.center().x - width / 2.0, body_bottom),
			Size::new(width, STATUS_ROW_HEIGHT - 4.0),
		);
		rounded_rect(ctx, badge, badge.height() / 2.0);
		ctx.set_fill_style_str(color);
		ctx.fill();
		ctx.set_fill_style_str("#ffffff");
		ctx.set_text_align("center");
		let _ = ctx.fill_text(status, badge.center().x, badge.center().y);
	}
}

fn draw_tooltip(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	let t = ease_out_cubic(state.hover.highlight_t);
	if t < 0.01 {
		return;
	}
	let Some(node) = state.hovered_node() else {
		return;
	};

	let mut lines = vec![
		node.data.label.clone(),
		node.data.semantic_type.description().to_string(),
	];
	lines.extend(node.data.tooltip.clone());
	lines.extend(node.data.timestamp.as_ref().map(|ts| format!("at {ts}")));

	ctx.set_font(&badge_font());
	let width = lines
		.iter()
		.filter_map(|l| ctx.measure_text(l).ok())
		.map(|m| m.width())
		.fold(0.0, f64::max)
		+ 16.0;
	let line_height = BADGE_FONT_PX + 6.0;
	let height = lines.len() as f64 * line_height + 10.0;
	let x = (state.hover.screen.x + 14.0).min(state.width - width - 4.0).max(4.0);
	let y = (state.hover.screen.y + 14.0).min(state.height - height - 4.0).max(4.0);

	ctx.set_global_alpha(0.95 * t);
	rounded_rect(ctx, Rect::from_origin_size(Point::new(x, y), Size::new(width, height)), 6.0);
	ctx.set_fill_style_str(state.palette.edge_label_bg);
	ctx.fill();
	ctx.set_stroke_style_str(state.palette.node_border);
	ctx.set_line_width(1.0);
	ctx.stroke();

	ctx.set_text_align("left");
	ctx.set_text_baseline("top");
	for (i, line) in lines.iter().enumerate() {
		ctx.set_fill_style_str(if i == 0 { state.palette.text } else { state.palette.text_muted });
		let _ = ctx.fill_text(line, x + 8.0, y + 5.0 + i as f64 * line_height);
	}
	ctx.set_global_alpha(1.0);
}
