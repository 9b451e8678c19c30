//! Turns a step index into render-ready nodes and edges.
//!
//! Resolution is a pure fold over steps `0..=step`, so the result depends only
//! on the scenario and the step, never on how the user navigated there.
//!
//! Node status precedence at step `s`:
//! 1. `updateNode.data.status` when the entry at `s` targets the node
//! 2. `statusByStep[s]` (after merging every `updateNode.statusByStep` up to `s`)
//! 3. the sticky status retained from earlier steps
//! 4. `"PENDING"` when the node is active and has no status at all
//! 5. the authored default status
//!
//! Rules 4 and 5 never compete: a node with an authored default has a status.
//!
//! The sticky track is fed by rule 2 first, then rule 1, so a
//! `statusByStep` value outlives a same-step `updateNode` override.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::timeline::{NodeUpdate, Timeline};
use super::types::{EdgeId, EdgeKind, GraphModel, NodeData, NodeId, Point, SemanticType, VisualKind};

/// Status shown on an active node that has nothing better to display.
pub const PENDING: &str = "PENDING";

#[derive(Clone, Debug, PartialEq)]
pub struct RenderNodeData {
	pub label: String,
	pub semantic_type: SemanticType,
	pub status: Option<String>,
	pub tooltip: Option<String>,
	pub timestamp: Option<String>,
	pub is_current: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderNode {
	pub id: NodeId,
	pub position: Point,
	pub kind: VisualKind,
	pub data: RenderNodeData,
	pub selected: bool,
	pub dragging: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderEdgeData {
	pub label: Option<String>,
	pub color: String,
	pub is_current: bool,
	/// Set when both endpoints of a current edge are active, so the flow
	/// animation runs for a fully lit hop.
	pub force_animated: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderEdge {
	pub id: EdgeId,
	pub source: NodeId,
	pub target: NodeId,
	pub kind: EdgeKind,
	pub data: RenderEdgeData,
}

impl RenderEdge {
	pub fn animated(&self) -> bool {
		self.data.is_current || self.data.force_animated
	}
}

/// Everything the diagram needs to draw one step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedFrame {
	pub step: usize,
	pub nodes: Vec<Rc<RenderNode>>,
	pub edges: Vec<Rc<RenderEdge>>,
	/// Ids from the entry's `nodes` list that exist in the graph.
	pub active_nodes: Vec<NodeId>,
}

impl ResolvedFrame {
	#[cfg(test)]
	pub fn node(&self, id: &str) -> Option<&RenderNode> {
		self.nodes.iter().find(|n| n.id == id).map(|n| n.as_ref())
	}

	#[cfg(test)]
	pub fn edge(&self, id: &str) -> Option<&RenderEdge> {
		self.edges.iter().find(|e| e.id == id).map(|e| e.as_ref())
	}

	#[cfg(test)]
	pub fn current_edge_ids(&self) -> impl Iterator<Item = &str> {
		self.edges.iter().filter(|e| e.data.is_current).map(|e| e.id.as_str())
	}
}

/// Resolve `step` (clamped to the timeline) with fresh allocations.
pub fn resolve(step: usize, graph: &GraphModel, timeline: &Timeline) -> ResolvedFrame {
	resolve_against(step, graph, timeline, &ResolvedFrame::default())
}

/// Resolve `step`, reusing the `Rc` of every node/edge in `previous` whose
/// computed value is unchanged, so callers can short-circuit on `Rc::ptr_eq`.
pub fn resolve_against(
	step: usize,
	graph: &GraphModel,
	timeline: &Timeline,
	previous: &ResolvedFrame,
) -> ResolvedFrame {
	let step = step.min(timeline.terminal_step());
	let entry = timeline.entry(step);

	let mut active_nodes = Vec::with_capacity(entry.nodes.len());
	for id in &entry.nodes {
		if graph.contains_node(id) {
			active_nodes.push(id.clone());
		} else {
			log::debug!("step {}: active node `{}` not in graph", step, id);
		}
	}
	let active: HashSet<&str> = active_nodes.iter().map(String::as_str).collect();

	let statuses = fold_statuses(step, graph, timeline);
	let prev_nodes: HashMap<&str, &Rc<RenderNode>> =
		previous.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

	let nodes = graph
		.nodes()
		.iter()
		.zip(statuses)
		.map(|(node, (data, shown))| {
			let is_current = active.contains(node.id.as_str());
			let status = shown
				.or(data.status)
				.or_else(|| is_current.then(|| PENDING.to_string()));
			let candidate = RenderNode {
				id: node.id.clone(),
				position: node.position,
				kind: node.kind,
				data: RenderNodeData {
					label: data.label,
					semantic_type: data.semantic_type,
					status,
					tooltip: data.tooltip,
					timestamp: data.timestamp,
					is_current,
				},
				selected: false,
				dragging: false,
			};
			reuse(prev_nodes.get(node.id.as_str()).copied(), candidate)
		})
		.collect();

	let visible = visible_edges(step, graph, &entry.edges, &active_nodes);
	let prev_edges: HashMap<&str, &Rc<RenderEdge>> =
		previous.edges.iter().map(|e| (e.id.as_str(), e)).collect();

	let edges = graph
		.edges()
		.iter()
		.map(|edge| {
			let is_current = visible.contains(edge.id.as_str());
			let force_animated = is_current
				&& active.contains(edge.source.as_str())
				&& active.contains(edge.target.as_str());
			let candidate = RenderEdge {
				id: edge.id.clone(),
				source: edge.source.clone(),
				target: edge.target.clone(),
				kind: edge.kind,
				data: RenderEdgeData {
					label: edge.data.label.clone(),
					color: edge.data.color.clone(),
					is_current,
					force_animated,
				},
			};
			reuse(prev_edges.get(edge.id.as_str()).copied(), candidate)
		})
		.collect();

	ResolvedFrame {
		step,
		nodes,
		edges,
		active_nodes,
	}
}

fn reuse<T: PartialEq>(previous: Option<&Rc<T>>, candidate: T) -> Rc<T> {
	match previous {
		Some(prev) if **prev == candidate => Rc::clone(prev),
		_ => Rc::new(candidate),
	}
}

/// Edge ids listed by the entry, unioned with entry-listed edges adjacent to
/// each active node. The entry stays the authority; the adjacency pass only
/// picks up edges a partially written entry reaches through its nodes.
fn visible_edges<'a>(
	step: usize,
	graph: &'a GraphModel,
	listed: &'a [EdgeId],
	active_nodes: &[NodeId],
) -> HashSet<&'a str> {
	let listed_set: HashSet<&str> = listed.iter().map(String::as_str).collect();
	let mut visible = HashSet::with_capacity(listed.len());
	for id in listed {
		if graph.contains_edge(id) {
			visible.insert(id.as_str());
		} else {
			log::debug!("step {}: highlighted edge `{}` not in graph", step, id);
		}
	}
	for node in active_nodes {
		for edge in graph.adjacent_edges(node) {
			if listed_set.contains(edge.id.as_str()) {
				visible.insert(edge.id.as_str());
			}
		}
	}
	visible
}

/// For every node (in graph order): its data after all `updateNode` merges up
/// to `step`, and the status chosen by rules 1-3 (`None` when none applied).
fn fold_statuses(
	step: usize,
	graph: &GraphModel,
	timeline: &Timeline,
) -> Vec<(NodeData, Option<String>)> {
	let mut data: Vec<NodeData> = graph.nodes().iter().map(|n| n.data.clone()).collect();
	let mut retained: Vec<Option<String>> = vec![None; data.len()];
	let mut shown: Vec<Option<String>> = vec![None; data.len()];

	for s in 0..=step {
		let update = timeline.entry(s).update_node.as_ref().and_then(|update| {
			let target = graph.index_of(&update.id);
			if target.is_none() {
				log::debug!("step {}: updateNode target `{}` not in graph", s, update.id);
			}
			target.map(|i| (i, update))
		});
		if let Some((i, update)) = update {
			merge_patch(&mut data[i], update);
		}

		for (i, node) in data.iter().enumerate() {
			let forced = update
				.filter(|(target, _)| *target == i)
				.and_then(|(_, u)| u.data.status.clone());
			let by_step = node.status_by_step.get(&s).cloned();
			if s == step {
				shown[i] = forced
					.clone()
					.or_else(|| by_step.clone())
					.or_else(|| retained[i].clone());
			}
			if let Some(status) = by_step.or(forced) {
				retained[i] = Some(status);
			}
		}
	}

	data.into_iter().zip(shown).collect()
}

/// `statusByStep` merges key by key; other present fields overwrite.
fn merge_patch(data: &mut NodeData, update: &NodeUpdate) {
	let patch = &update.data;
	data.status_by_step
		.extend(patch.status_by_step.iter().map(|(k, v)| (*k, v.clone())));
	if let Some(label) = &patch.label {
		data.label = label.clone();
	}
	if let Some(tooltip) = &patch.tooltip {
		data.tooltip = Some(tooltip.clone());
	}
	if let Some(timestamp) = &patch.timestamp {
		data.timestamp = Some(timestamp.clone());
	}
}

#[cfg(test)]
mod tests {
	use std::collections::{BTreeMap, HashMap};

	use super::*;
	use crate::components::flow_diagram::timeline::{HighlightEntry, NodePatch, Scenario, Step};
	use crate::components::flow_diagram::types::{Edge, Node};

	fn scenario(nodes: Vec<Node>, edges: Vec<Edge>, highlights: Vec<HighlightEntry>) -> Scenario {
		let graph = GraphModel::new(nodes, edges, HashMap::new()).unwrap();
		let steps = (1..highlights.len()).map(|i| Step::new(format!("{i}"), "")).collect();
		Scenario::new("test", "Test", "", graph, steps, highlights).unwrap()
	}

	fn node(id: &str) -> Node {
		Node::new(id, VisualKind::Process, SemanticType::Contract, id.to_uppercase(), 0.0, 0.0)
	}

	fn line() -> Scenario {
		scenario(
			vec![node("a"), node("b"), node("c")],
			vec![Edge::new("ab", "a", "b"), Edge::new("bc", "b", "c"), Edge::new("ca", "c", "a")],
			vec![
				HighlightEntry::default(),
				HighlightEntry::new(&["a"], &["ab"]),
				HighlightEntry::new(&["a", "b"], &["ab"]),
				HighlightEntry::new(&["b", "c"], &["bc"]),
			],
		)
	}

	fn status(frame: &ResolvedFrame, id: &str) -> Option<String> {
		frame.node(id).and_then(|n| n.data.status.clone())
	}

	#[test]
	fn resolution_is_idempotent() {
		let s = line();
		for step in 0..=3 {
			assert_eq!(
				resolve(step, &s.graph, &s.timeline),
				resolve(step, &s.graph, &s.timeline)
			);
		}
	}

	#[test]
	fn out_of_range_steps_clamp() {
		let s = line();
		let last = resolve(3, &s.graph, &s.timeline);
		assert_eq!(resolve(17, &s.graph, &s.timeline), last);
		let first = resolve(s.timeline.clamp(-4), &s.graph, &s.timeline);
		assert_eq!(first, resolve(0, &s.graph, &s.timeline));
		assert!(first.current_edge_ids().next().is_none());
	}

	#[test]
	fn only_listed_edges_are_current() {
		let s = line();
		for step in 0..=3 {
			let frame = resolve(step, &s.graph, &s.timeline);
			let listed: HashSet<&str> =
				s.timeline.entry(step).edges.iter().map(String::as_str).collect();
			let current: HashSet<&str> = frame.current_edge_ids().collect();
			assert_eq!(current, listed, "step {step}");
			assert_eq!(frame.edges.len(), 3, "non-current edges still render");
		}
	}

	#[test]
	fn force_animated_needs_both_endpoints_active() {
		let s = line();
		let one_end = resolve(1, &s.graph, &s.timeline);
		let ab = one_end.edge("ab").unwrap();
		assert!(ab.data.is_current && !ab.data.force_animated);
		let both = resolve(2, &s.graph, &s.timeline);
		assert!(both.edge("ab").unwrap().data.force_animated);
	}

	#[test]
	fn update_beats_status_by_step_then_by_step_sticks() {
		let s = scenario(
			vec![node("x").status_at(2, "A")],
			vec![],
			vec![
				HighlightEntry::default(),
				HighlightEntry::new(&["x"], &[]),
				HighlightEntry::new(&["x"], &[]).update_status("x", "B"),
				HighlightEntry::new(&[], &[]),
			],
		);
		assert_eq!(status(&resolve(2, &s.graph, &s.timeline), "x").as_deref(), Some("B"));
		assert_eq!(status(&resolve(3, &s.graph, &s.timeline), "x").as_deref(), Some("A"));
	}

	#[test]
	fn update_status_is_sticky_without_status_by_step() {
		let s = scenario(
			vec![node("x")],
			vec![],
			vec![
				HighlightEntry::default(),
				HighlightEntry::new(&["x"], &[]).update_status("x", "VOTING"),
				HighlightEntry::new(&[], &[]),
				HighlightEntry::new(&[], &[]).update_status("x", "DONE"),
			],
		);
		let at = |step| status(&resolve(step, &s.graph, &s.timeline), "x");
		assert_eq!(at(1).as_deref(), Some("VOTING"));
		assert_eq!(at(2).as_deref(), Some("VOTING"));
		assert_eq!(at(3).as_deref(), Some("DONE"));
	}

	#[test]
	fn pending_and_authored_defaults() {
		let s = scenario(
			vec![node("bare"), node("authored").status("IDLE")],
			vec![],
			vec![HighlightEntry::default(), HighlightEntry::new(&["bare", "authored"], &[])],
		);
		let idle = resolve(0, &s.graph, &s.timeline);
		assert_eq!(status(&idle, "bare"), None);
		assert_eq!(status(&idle, "authored").as_deref(), Some("IDLE"));

		let active = resolve(1, &s.graph, &s.timeline);
		assert_eq!(status(&active, "bare").as_deref(), Some(PENDING));
		assert_eq!(status(&active, "authored").as_deref(), Some("IDLE"));
	}

	#[test]
	fn update_merges_status_by_step_for_later_steps() {
		let mut future = BTreeMap::new();
		future.insert(3, "SETTLED".to_string());
		let s = scenario(
			vec![node("x").status_at(1, "OPEN")],
			vec![],
			vec![
				HighlightEntry::default(),
				HighlightEntry::new(&["x"], &[]),
				HighlightEntry::new(&["x"], &[]).update(
					"x",
					NodePatch {
						status_by_step: future,
						tooltip: Some("patched".into()),
						..NodePatch::default()
					},
				),
				HighlightEntry::new(&[], &[]),
			],
		);
		let two = resolve(2, &s.graph, &s.timeline);
		assert_eq!(status(&two, "x").as_deref(), Some("OPEN"));
		assert_eq!(two.node("x").unwrap().data.tooltip.as_deref(), Some("patched"));

		let three = resolve(3, &s.graph, &s.timeline);
		assert_eq!(status(&three, "x").as_deref(), Some("SETTLED"));
		// Original key survives the merge.
		assert_eq!(status(&resolve(1, &s.graph, &s.timeline), "x").as_deref(), Some("OPEN"));
	}

	#[test]
	fn unknown_references_are_ignored() {
		let s = scenario(
			vec![node("a")],
			vec![],
			vec![
				HighlightEntry::default(),
				HighlightEntry::new(&["a", "ghost"], &["nope"]).update_status("ghost", "X"),
			],
		);
		let frame = resolve(1, &s.graph, &s.timeline);
		assert_eq!(frame.active_nodes, ["a"]);
		assert_eq!(frame.nodes.len(), 1);
		assert_eq!(status(&frame, "a").as_deref(), Some(PENDING));
	}

	#[test]
	fn unchanged_items_keep_identity() {
		let s = line();
		let two = resolve(2, &s.graph, &s.timeline);
		let three = resolve_against(3, &s.graph, &s.timeline, &two);

		// `ca` is dark at both steps; `a` is dropped from the active set.
		assert!(Rc::ptr_eq(&two.edges[2], &three.edges[2]));
		assert!(!Rc::ptr_eq(&two.nodes[0], &three.nodes[0]));

		let again = resolve_against(3, &s.graph, &s.timeline, &three);
		assert!(again.nodes.iter().zip(&three.nodes).all(|(a, b)| Rc::ptr_eq(a, b)));
		assert!(again.edges.iter().zip(&three.edges).all(|(a, b)| Rc::ptr_eq(a, b)));
	}
}
