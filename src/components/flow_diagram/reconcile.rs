//! Owns the committed render snapshot.
//!
//! Two writers feed it: step-driven frames from the resolver (`commit`) and
//! user-driven transient changes (`apply_changes`). Transient state lives in
//! its own table and is laid over every later commit, so a step change never
//! discards a dragged position or a selection.

use std::collections::HashMap;
use std::rc::Rc;

use super::resolve::{RenderEdge, RenderNode, ResolvedFrame};
use super::types::{NodeId, Point, Size};

/// A user-driven change to one node.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeChange {
	Position {
		id: NodeId,
		position: Point,
		dragging: bool,
	},
	Select {
		id: NodeId,
		selected: bool,
	},
	/// Rendered size reported by the painter.
	Dimensions {
		id: NodeId,
		size: Size,
	},
}

impl NodeChange {
	pub fn id(&self) -> &str {
		match self {
			NodeChange::Position { id, .. }
			| NodeChange::Select { id, .. }
			| NodeChange::Dimensions { id, .. } => id,
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Transient {
	position: Option<Point>,
	selected: bool,
	dragging: bool,
	measured: Option<Size>,
}

impl Transient {
	fn touches_node(&self) -> bool {
		self.position.is_some() || self.selected || self.dragging
	}

	fn apply(&self, node: &mut RenderNode) {
		if let Some(position) = self.position {
			node.position = position;
		}
		node.selected = self.selected;
		node.dragging = self.dragging;
	}
}

#[derive(Debug, Default)]
pub struct Reconciler {
	nodes: Vec<Rc<RenderNode>>,
	edges: Vec<Rc<RenderEdge>>,
	active: Vec<NodeId>,
	transient: HashMap<NodeId, Transient>,
	revision: u64,
}

impl Reconciler {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn nodes(&self) -> &[Rc<RenderNode>] {
		&self.nodes
	}

	pub fn edges(&self) -> &[Rc<RenderEdge>] {
		&self.edges
	}

	pub fn node(&self, id: &str) -> Option<&RenderNode> {
		self.nodes.iter().find(|n| n.id == id).map(|n| n.as_ref())
	}

	/// Active ids of the last committed step.
	pub fn active_nodes(&self) -> &[NodeId] {
		&self.active
	}

	/// Bumped on every real change to the snapshot.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	pub fn measured_size(&self, id: &str) -> Option<Size> {
		self.transient.get(id).and_then(|t| t.measured)
	}

	/// Commit a resolved frame with transient state laid over it. Returns
	/// `false` (and keeps the old snapshot) when nothing visible differs.
	pub fn commit(&mut self, frame: &ResolvedFrame) -> bool {
		self.active.clone_from(&frame.active_nodes);

		let nodes: Vec<Rc<RenderNode>> = frame.nodes.iter().map(|n| self.overlay(n)).collect();
		let nodes_same = same_items(&self.nodes, &nodes);
		let edges_same = same_items(&self.edges, &frame.edges);
		if nodes_same && edges_same {
			return false;
		}

		if !nodes_same {
			self.nodes = keep_identity(&self.nodes, nodes);
		}
		if !edges_same {
			self.edges = keep_identity(&self.edges, frame.edges.clone());
		}
		self.revision += 1;
		true
	}

	/// Apply user-driven changes. Changes naming unknown nodes are ignored.
	/// Returns whether the visible snapshot changed.
	pub fn apply_changes(&mut self, changes: impl IntoIterator<Item = NodeChange>) -> bool {
		let mut changed = false;
		for change in changes {
			let Some(index) = self.nodes.iter().position(|n| n.id == change.id()) else {
				log::debug!("ignoring change for unknown node `{}`", change.id());
				continue;
			};
			let transient = self.transient.entry(change.id().to_string()).or_default();
			match change {
				NodeChange::Position { position, dragging, .. } => {
					transient.position = Some(position);
					transient.dragging = dragging;
				}
				NodeChange::Select { selected, .. } => transient.selected = selected,
				NodeChange::Dimensions { size, .. } => {
					transient.measured = Some(size);
					continue;
				}
			}

			let mut node = (*self.nodes[index]).clone();
			transient.apply(&mut node);
			if node != *self.nodes[index] {
				self.nodes[index] = Rc::new(node);
				changed = true;
			}
		}
		if changed {
			self.revision += 1;
		}
		changed
	}

	/// Clear every selection; returns whether any node was selected.
	pub fn clear_selection(&mut self) -> bool {
		let selected: Vec<NodeId> = self
			.nodes
			.iter()
			.filter(|n| n.selected)
			.map(|n| n.id.clone())
			.collect();
		self.apply_changes(
			selected
				.into_iter()
				.map(|id| NodeChange::Select { id, selected: false }),
		)
	}

	fn overlay(&self, node: &Rc<RenderNode>) -> Rc<RenderNode> {
		match self.transient.get(&node.id) {
			Some(t) if t.touches_node() => {
				let mut patched = (**node).clone();
				t.apply(&mut patched);
				Rc::new(patched)
			}
			_ => Rc::clone(node),
		}
	}
}

/// Cheap identity check first, deep equality second.
fn same_items<T: PartialEq>(old: &[Rc<T>], new: &[Rc<T>]) -> bool {
	old.len() == new.len() && old.iter().zip(new).all(|(a, b)| Rc::ptr_eq(a, b) || a == b)
}

/// Prefer the already committed `Rc` for every item that did not change.
fn keep_identity<T: PartialEq>(old: &[Rc<T>], new: Vec<Rc<T>>) -> Vec<Rc<T>> {
	new.into_iter()
		.enumerate()
		.map(|(i, item)| match old.get(i) {
			Some(prev) if Rc::ptr_eq(prev, &item) || **prev == *item => Rc::clone(prev),
			_ => item,
		})
		.collect()
}
