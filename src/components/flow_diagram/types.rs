use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::ScenarioError;

/// Node identifier, unique within one scenario.
pub type NodeId = String;
/// Edge identifier, unique within one scenario.
pub type EdgeId = String;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}
}

/// Axis-aligned rectangle in graph space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
	pub min: Point,
	pub max: Point,
}

impl Rect {
	pub fn from_origin_size(origin: Point, size: Size) -> Self {
		Self {
			min: origin,
			max: Point::new(origin.x + size.width, origin.y + size.height),
		}
	}

	pub fn union(self, other: Rect) -> Rect {
		Rect {
			min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
			max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
		}
	}

	pub fn width(&self) -> f64 {
		self.max.x - self.min.x
	}

	pub fn height(&self) -> f64 {
		self.max.y - self.min.y
	}

	pub fn center(&self) -> Point {
		Point::new((self.min.x + self.max.x) / 2.0, (self.min.y + self.max.y) / 2.0)
	}

	pub fn contains(&self, p: Point) -> bool {
		p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
	}

	/// Bounding box of an iterator of rects, `None` when empty.
	pub fn enclose(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
		rects.into_iter().reduce(Rect::union)
	}
}

/// Shape family a node is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisualKind {
	/// Rounded pill, used for people and wallets.
	Actor,
	/// Card with a header strip, used for contracts and routers.
	Process,
	/// Card with a double bottom rule, used for pools, vaults and tokens.
	Store,
	/// Chamfered card, used for voting/approval gates.
	Gate,
}

/// What a node stands for in the narrated process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SemanticType {
	User,
	Wallet,
	Contract,
	Token,
	Pool,
	Oracle,
	Validator,
	Governance,
	Signer,
	Treasury,
}

impl SemanticType {
	pub const ALL: [SemanticType; 10] = [
		SemanticType::User,
		SemanticType::Wallet,
		SemanticType::Contract,
		SemanticType::Token,
		SemanticType::Pool,
		SemanticType::Oracle,
		SemanticType::Validator,
		SemanticType::Governance,
		SemanticType::Signer,
		SemanticType::Treasury,
	];

	/// Short badge text drawn in the node header.
	pub fn label(self) -> &'static str {
		match self {
			SemanticType::User => "user",
			SemanticType::Wallet => "wallet",
			SemanticType::Contract => "contract",
			SemanticType::Token => "token",
			SemanticType::Pool => "pool",
			SemanticType::Oracle => "oracle",
			SemanticType::Validator => "validator",
			SemanticType::Governance => "governance",
			SemanticType::Signer => "signer",
			SemanticType::Treasury => "treasury",
		}
	}

	/// Single-glyph icon drawn before the label.
	pub fn glyph(self) -> &'static str {
		match self {
			SemanticType::User => "\u{25C9}",
			SemanticType::Wallet => "\u{25C8}",
			SemanticType::Contract => "\u{25A3}",
			SemanticType::Token => "\u{25CE}",
			SemanticType::Pool => "\u{224B}",
			SemanticType::Oracle => "\u{25EC}",
			SemanticType::Validator => "\u{25C6}",
			SemanticType::Governance => "\u{2696}",
			SemanticType::Signer => "\u{270E}",
			SemanticType::Treasury => "\u{25A4}",
		}
	}

	/// One-line description used in the hover tooltip.
	pub fn description(self) -> &'static str {
		match self {
			SemanticType::User => "An end user initiating actions",
			SemanticType::Wallet => "Holds keys and signs transactions",
			SemanticType::Contract => "On-chain program executing the logic",
			SemanticType::Token => "Fungible token ledger",
			SemanticType::Pool => "Liquidity reserves priced by a curve",
			SemanticType::Oracle => "Feeds external prices on-chain",
			SemanticType::Validator => "Produces and attests blocks",
			SemanticType::Governance => "Collects and tallies votes",
			SemanticType::Signer => "One key of a multi-signature set",
			SemanticType::Treasury => "Custodies funds under shared control",
		}
	}
}

/// Authored node payload. `is_current` is deliberately absent: it is derived
/// per step by the resolver and lives on the render node only.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeData {
	pub label: String,
	pub semantic_type: SemanticType,
	pub status: Option<String>,
	pub status_by_step: BTreeMap<usize, String>,
	pub tooltip: Option<String>,
	pub timestamp: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: NodeId,
	pub position: Point,
	pub kind: VisualKind,
	pub data: NodeData,
}

impl Node {
	pub fn new(
		id: impl Into<NodeId>,
		kind: VisualKind,
		semantic_type: SemanticType,
		label: impl Into<String>,
		x: f64,
		y: f64,
	) -> Self {
		Self {
			id: id.into(),
			position: Point::new(x, y),
			kind,
			data: NodeData {
				label: label.into(),
				semantic_type,
				status: None,
				status_by_step: BTreeMap::new(),
				tooltip: None,
				timestamp: None,
			},
		}
	}

	pub fn status(mut self, status: impl Into<String>) -> Self {
		self.data.status = Some(status.into());
		self
	}

	pub fn status_at(mut self, step: usize, status: impl Into<String>) -> Self {
		self.data.status_by_step.insert(step, status.into());
		self
	}

	pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
		self.data.tooltip = Some(tooltip.into());
		self
	}

	pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
		self.data.timestamp = Some(timestamp.into());
		self
	}
}

/// How an edge path is routed between its two handles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeKind {
	Straight,
	#[default]
	Bezier,
	/// Orthogonal path with a single elbow at the midpoint.
	Step,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeData {
	pub label: Option<String>,
	pub color: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub id: EdgeId,
	pub source: NodeId,
	pub target: NodeId,
	pub kind: EdgeKind,
	pub data: EdgeData,
}

pub const DEFAULT_EDGE_COLOR: &str = "#64b4ff";

impl Edge {
	pub fn new(
		id: impl Into<EdgeId>,
		source: impl Into<NodeId>,
		target: impl Into<NodeId>,
	) -> Self {
		Self {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			kind: EdgeKind::default(),
			data: EdgeData {
				label: None,
				color: DEFAULT_EDGE_COLOR.into(),
			},
		}
	}

	pub fn label(mut self, label: impl Into<String>) -> Self {
		self.data.label = Some(label.into());
		self
	}

	pub fn color(mut self, color: impl Into<String>) -> Self {
		self.data.color = color.into();
		self
	}

	pub fn kind(mut self, kind: EdgeKind) -> Self {
		self.kind = kind;
		self
	}
}

/// Connection-point placement for one node. `side == true` puts the handles
/// on the left (in) and right (out) edges, otherwise on top (in) and bottom (out).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Handle {
	pub side: bool,
}

/// Immutable graph of one scenario plus its adjacency index.
#[derive(Clone, Debug)]
pub struct GraphModel {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	handles: HashMap<NodeId, Handle>,
	node_index: HashMap<NodeId, usize>,
	edge_index: HashMap<EdgeId, usize>,
	adjacency: HashMap<NodeId, Vec<usize>>,
}

impl GraphModel {
	/// Build the model. Duplicate ids are rejected; edges whose endpoints do
	/// not exist are logged and dropped.
	pub fn new(
		nodes: Vec<Node>,
		edges: Vec<Edge>,
		handles: HashMap<NodeId, Handle>,
	) -> Result<Self, ScenarioError> {
		let mut node_index = HashMap::with_capacity(nodes.len());
		for (i, node) in nodes.iter().enumerate() {
			if node_index.insert(node.id.clone(), i).is_some() {
				return Err(ScenarioError::DuplicateNode(node.id.clone()));
			}
		}

		let mut kept = Vec::with_capacity(edges.len());
		let mut seen = HashSet::new();
		for edge in edges {
			if !seen.insert(edge.id.clone()) {
				return Err(ScenarioError::DuplicateEdge(edge.id));
			}
			if !node_index.contains_key(&edge.source) || !node_index.contains_key(&edge.target) {
				log::warn!(
					"edge `{}` references unknown node ({} -> {}), dropped",
					edge.id,
					edge.source,
					edge.target
				);
				continue;
			}
			kept.push(edge);
		}

		let mut edge_index = HashMap::with_capacity(kept.len());
		let mut adjacency: HashMap<NodeId, Vec<usize>> = HashMap::new();
		for (i, edge) in kept.iter().enumerate() {
			edge_index.insert(edge.id.clone(), i);
			adjacency.entry(edge.source.clone()).or_default().push(i);
			if edge.target != edge.source {
				adjacency.entry(edge.target.clone()).or_default().push(i);
			}
		}

		for id in handles.keys() {
			if !node_index.contains_key(id) {
				log::warn!("handle config for unknown node `{}` ignored", id);
			}
		}

		Ok(Self {
			nodes,
			edges: kept,
			handles,
			node_index,
			edge_index,
			adjacency,
		})
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Position of node `id` in [`GraphModel::nodes`].
	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.node_index.get(id).copied()
	}

	pub fn contains_node(&self, id: &str) -> bool {
		self.node_index.contains_key(id)
	}

	pub fn contains_edge(&self, id: &str) -> bool {
		self.edge_index.contains_key(id)
	}

	/// Edges touching `id` as source or target, in authoring order.
	pub fn adjacent_edges<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Edge> + 'a {
		self.adjacency
			.get(id)
			.into_iter()
			.flatten()
			.map(move |&i| &self.edges[i])
	}

	pub fn handle(&self, id: &str) -> Handle {
		self.handles.get(id).copied().unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_nodes() -> Vec<Node> {
		vec![
			Node::new("a", VisualKind::Actor, SemanticType::User, "Alice", 0.0, 0.0),
			Node::new("b", VisualKind::Process, SemanticType::Contract, "Router", 200.0, 0.0),
			Node::new("c", VisualKind::Store, SemanticType::Pool, "Pool", 400.0, 0.0),
		]
	}

	#[test]
	fn adjacency_covers_both_endpoints() {
		let graph = GraphModel::new(
			sample_nodes(),
			vec![Edge::new("e1", "a", "b"), Edge::new("e2", "b", "c")],
			HashMap::new(),
		)
		.unwrap();

		let around_b: Vec<&str> = graph.adjacent_edges("b").map(|e| e.id.as_str()).collect();
		assert_eq!(around_b, ["e1", "e2"]);
		assert_eq!(graph.adjacent_edges("a").count(), 1);
		assert_eq!(graph.adjacent_edges("missing").count(), 0);
	}

	#[test]
	fn dangling_edges_are_dropped_not_fatal() {
		let graph = GraphModel::new(
			sample_nodes(),
			vec![Edge::new("e1", "a", "b"), Edge::new("ghost", "a", "nowhere")],
			HashMap::new(),
		)
		.unwrap();

		assert_eq!(graph.edges().len(), 1);
		assert!(!graph.contains_edge("ghost"));
	}

	#[test]
	fn duplicate_ids_are_rejected() {
		let mut nodes = sample_nodes();
		nodes.push(Node::new("a", VisualKind::Actor, SemanticType::Wallet, "Dup", 0.0, 0.0));
		let err = GraphModel::new(nodes, vec![], HashMap::new()).unwrap_err();
		assert_eq!(err, ScenarioError::DuplicateNode("a".into()));

		let err = GraphModel::new(
			sample_nodes(),
			vec![Edge::new("e1", "a", "b"), Edge::new("e1", "b", "c")],
			HashMap::new(),
		)
		.unwrap_err();
		assert_eq!(err, ScenarioError::DuplicateEdge("e1".into()));
	}

	#[test]
	fn handles_default_to_vertical() {
		let mut handles = HashMap::new();
		handles.insert("b".to_string(), Handle { side: true });
		let graph = GraphModel::new(sample_nodes(), vec![], handles).unwrap();
		assert!(graph.handle("b").side);
		assert!(!graph.handle("a").side);
	}

	#[test]
	fn semantic_lookup_is_total() {
		for ty in SemanticType::ALL {
			assert!(!ty.label().is_empty());
			assert!(!ty.glyph().is_empty());
			assert!(!ty.description().is_empty());
		}
	}

	#[test]
	fn rect_enclose_and_center() {
		let r = Rect::enclose([
			Rect::from_origin_size(Point::new(0.0, 0.0), Size::new(10.0, 10.0)),
			Rect::from_origin_size(Point::new(30.0, 20.0), Size::new(10.0, 10.0)),
		])
		.unwrap();
		assert_eq!(r.width(), 40.0);
		assert_eq!(r.height(), 30.0);
		assert_eq!(r.center(), Point::new(20.0, 15.0));
		assert!(Rect::enclose(std::iter::empty()).is_none());
	}
}
