//! State-space graph of a puzzle variant.
//!
//! Nodes are identified by the cropped canonical text of a board, so two
//! boards that differ only by position on the grid are the same state. The
//! walker expands pending nodes last-in first-out by default until no unseen
//! state is left or the size ceiling is hit.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::board::Board;
use crate::error::GraphError;
use crate::moves::MoveGenerator;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub target: NodeId,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct Node {
    /// Cropped canonical text.
    pub state: String,
    pub edges: Vec<Edge>,
    pub progress: Option<usize>,
}

/// Which pending node a walk expands next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpansionOrder {
    /// Newest first, depth-first.
    #[default]
    LastInFirstOut,
    /// Oldest first, breadth-first.
    FirstInFirstOut,
}

/// Limits for a walk.
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Most states the graph may hold. Discovering one more fails the walk.
    pub size_limit: usize,
    pub order: ExpansionOrder,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            size_limit: usize::MAX,
            order: ExpansionOrder::default(),
        }
    }
}

/// Directed graph of states discovered by a walk. Node 0 is the start.
#[derive(Debug, Clone, Default)]
pub struct StateGraph {
    nodes: Vec<Node>,
    index: FxHashMap<String, NodeId>,
    solved: Option<NodeId>,
    closest: Option<NodeId>,
}

impl StateGraph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn start(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// State text of a node; empty for unknown ids.
    pub fn state(&self, id: NodeId) -> &str {
        self.nodes.get(id).map_or("", |node| node.state.as_str())
    }

    pub fn find(&self, state: &str) -> Option<NodeId> {
        self.index.get(state).copied()
    }

    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|node| node.edges.iter().map(|edge| edge.target))
    }

    pub fn out_degree(&self, id: NodeId) -> usize {
        self.nodes.get(id).map_or(0, |node| node.edges.len())
    }

    pub fn edge_label(&self, from: NodeId, to: NodeId) -> Option<&str> {
        self.nodes
            .get(from)?
            .edges
            .iter()
            .find(|edge| edge.target == to)
            .map(|edge| edge.label.as_str())
    }

    /// First discovered node whose progress is zero.
    pub fn solved(&self) -> Option<NodeId> {
        self.solved
    }

    /// Node with the lowest progress, earliest discovered on ties.
    pub fn closest(&self) -> Option<NodeId> {
        self.closest
    }

    /// State texts in discovery order.
    pub fn states(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.iter().map(|node| node.state.as_str())
    }

    /// Every edge as `(source, edge)`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, &Edge)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .flat_map(|(id, node)| node.edges.iter().map(move |edge| (id, edge)))
    }

    fn insert(
        &mut self,
        state: String,
        progress: Option<usize>,
        size_limit: usize,
    ) -> Result<NodeId, GraphError> {
        if self.nodes.len() >= size_limit {
            debug!(limit = size_limit, "state graph is full");
            return Err(GraphError::SizeExceeded { limit: size_limit });
        }
        let id = self.nodes.len();
        if let Some(value) = progress {
            if value == 0 && self.solved.is_none() {
                self.solved = Some(id);
            }
            let better = match self.closest.and_then(|c| self.nodes[c].progress) {
                Some(best) => value < best,
                None => true,
            };
            if better {
                self.closest = Some(id);
            }
        }
        self.index.insert(state.clone(), id);
        self.nodes.push(Node {
            state,
            edges: Vec::new(),
            progress,
        });
        Ok(id)
    }

    /// Keeps the first label seen between two nodes; self loops are dropped.
    fn add_edge(&mut self, from: NodeId, to: NodeId, label: String) {
        if from == to {
            return;
        }
        let node = &mut self.nodes[from];
        if node.edges.iter().all(|edge| edge.target != to) {
            node.edges.push(Edge { target: to, label });
        }
    }
}

/// Builds the state graph reachable from a start board under one variant.
#[derive(Debug)]
pub struct GraphWalker<G> {
    generator: G,
    config: WalkConfig,
    graph: StateGraph,
}

impl<G: MoveGenerator> GraphWalker<G> {
    pub fn new(generator: G) -> Self {
        Self::with_config(generator, WalkConfig::default())
    }

    pub fn with_config(generator: G, config: WalkConfig) -> Self {
        Self {
            generator,
            config,
            graph: StateGraph::default(),
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// The graph from the last walk, complete or not.
    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    pub fn into_graph(self) -> StateGraph {
        self.graph
    }

    /// Discover every state reachable from `start`.
    ///
    /// On `SizeExceeded` the partial graph stays available through
    /// [`GraphWalker::graph`].
    pub fn walk(&mut self, start: &Board) -> Result<&StateGraph, GraphError> {
        self.graph = StateGraph::default();
        let limit = self.config.size_limit;
        let max_pips = start.max_pips();
        let border = self.generator.expansion_border();

        let root = start.display(true);
        let progress = self.generator.progress(start);
        self.graph.insert(root, progress, limit)?;

        let mut pending: VecDeque<NodeId> = VecDeque::from([0]);
        loop {
            let next = match self.config.order {
                ExpansionOrder::LastInFirstOut => pending.pop_back(),
                ExpansionOrder::FirstInFirstOut => pending.pop_front(),
            };
            let Some(id) = next else {
                break;
            };
            let mut board = Board::create(&self.graph.nodes[id].state, border, max_pips)?;
            let moves = self.generator.generate_moves(&mut board);
            trace!(node = id, moves = moves.len(), "expanded state");

            for found in moves {
                let target = match self.graph.find(&found.state) {
                    Some(target) => target,
                    None => {
                        let target = self.graph.insert(found.state, found.progress, limit)?;
                        pending.push_back(target);
                        target
                    }
                };
                self.graph.add_edge(id, target, found.label);
            }
        }

        debug!(
            states = self.graph.len(),
            solved = self.graph.solved.is_some(),
            "walk complete"
        );
        Ok(&self.graph)
    }
}
