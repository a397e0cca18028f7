//! Solutions and difficulty figures drawn from a finished state graph.

use std::collections::VecDeque;

use serde::Serialize;

use crate::board::Board;
use crate::error::GraphError;
use crate::graph::{GraphWalker, NodeId, StateGraph, WalkConfig};
use crate::moves::MoveGenerator;

impl StateGraph {
    /// Shortest path by edge count, both ends included.
    pub fn path(&self, from: NodeId, to: NodeId) -> Result<Vec<NodeId>, GraphError> {
        let no_path = || GraphError::NoPath {
            goal: self.state(to).to_string(),
        };
        if from >= self.len() || to >= self.len() {
            return Err(no_path());
        }

        let mut parent: Vec<Option<NodeId>> = vec![None; self.len()];
        let mut seen = vec![false; self.len()];
        let mut queue = VecDeque::from([from]);
        seen[from] = true;
        while let Some(id) = queue.pop_front() {
            if id == to {
                let mut path = vec![to];
                let mut current = to;
                while let Some(previous) = parent[current] {
                    path.push(previous);
                    current = previous;
                }
                path.reverse();
                return Ok(path);
            }
            for next in self.successors(id) {
                if !seen[next] {
                    seen[next] = true;
                    parent[next] = Some(id);
                    queue.push_back(next);
                }
            }
        }
        Err(no_path())
    }

    /// The solved node, or with `partial` the closest node when nothing was
    /// solved.
    pub fn goal(&self, partial: bool) -> Result<NodeId, GraphError> {
        match (self.solved(), self.closest()) {
            (Some(solved), _) => Ok(solved),
            (None, Some(closest)) if partial => Ok(closest),
            _ => Err(GraphError::GoalNotReached),
        }
    }

    fn labels(&self, path: &[NodeId]) -> Vec<String> {
        path.windows(2)
            .filter_map(|pair| self.edge_label(pair[0], pair[1]))
            .map(str::to_string)
            .collect()
    }

    /// Move labels along the shortest path from the start to the goal.
    pub fn solution(&self, partial: bool) -> Result<Vec<String>, GraphError> {
        let goal = self.goal(partial)?;
        let path = self.path(0, goal)?;
        Ok(self.labels(&path))
    }

    /// Moves available at every step of a path, the last node excluded.
    pub fn choice_counts(&self, path: &[NodeId]) -> Vec<usize> {
        match path.split_last() {
            Some((_, steps)) => steps.iter().map(|&id| self.out_degree(id)).collect(),
            None => Vec::new(),
        }
    }
}

/// Summary of one puzzle: its solution and how much choice it offers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardAnalysis {
    pub start: String,
    pub graph_size: usize,
    pub solution: Vec<String>,
    /// The solution ends at the closest state rather than a solved one.
    pub partial: bool,
    pub choice_counts: Vec<usize>,
    pub average_choices: f64,
    pub max_choices: usize,
}

impl BoardAnalysis {
    /// Walk `board` under `generator` and analyse the resulting graph.
    pub fn new<G: MoveGenerator>(
        board: &Board,
        generator: G,
        config: &WalkConfig,
        partial: bool,
    ) -> Result<Self, GraphError> {
        let mut walker = GraphWalker::with_config(generator, config.clone());
        let graph = walker.walk(board)?;
        Self::from_graph(graph, partial)
    }

    pub fn from_graph(graph: &StateGraph, partial: bool) -> Result<Self, GraphError> {
        let goal = graph.goal(partial)?;
        let path = graph.path(0, goal)?;
        let choice_counts = graph.choice_counts(&path);
        let max_choices = choice_counts.iter().copied().max().unwrap_or(0);
        let average_choices = if choice_counts.is_empty() {
            0.0
        } else {
            choice_counts.iter().sum::<usize>() as f64 / choice_counts.len() as f64
        };

        Ok(Self {
            start: graph.state(0).to_string(),
            graph_size: graph.len(),
            solution: graph.labels(&path),
            partial: graph.solved() != Some(goal),
            choice_counts,
            average_choices,
            max_choices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::{CaptureRules, LadderRules};

    /// Follow `labels` from `start`, returning the final state text.
    fn replay<G: MoveGenerator>(generator: &G, start: &str, labels: &[String]) -> String {
        let mut state = start.to_string();
        for label in labels {
            let mut board = Board::create(&state, 1, None).unwrap();
            let found = generator
                .generate_moves(&mut board)
                .into_iter()
                .find(|m| &m.label == label)
                .unwrap_or_else(|| panic!("no move {} from {:?}", label, state));
            state = found.state;
        }
        state
    }

    #[test]
    fn test_capture_solution() {
        let board = Board::create("0|2 x\n\n1|0 x\n", 0, None).unwrap();
        let analysis =
            BoardAnalysis::new(&board, CaptureRules, &WalkConfig::default(), false).unwrap();

        assert_eq!(analysis.solution, vec!["02r"]);
        assert_eq!(analysis.graph_size, 2);
        assert!(!analysis.partial);
        assert_eq!(analysis.choice_counts, vec![1]);
        assert_eq!(replay(&CaptureRules, &analysis.start, &analysis.solution), "");
    }

    #[test]
    fn test_no_path_back_to_start() {
        let board = Board::create("0|2 x\n\n1|0 x\n", 0, None).unwrap();
        let mut walker = GraphWalker::new(CaptureRules);
        let graph = walker.walk(&board).unwrap();

        let solved = graph.solved().unwrap();
        assert_eq!(graph.path(0, solved).unwrap(), vec![0, solved]);
        assert_eq!(
            graph.path(solved, 0),
            Err(GraphError::NoPath {
                goal: "0|2\n\n1|0\n".to_string()
            })
        );
    }

    #[test]
    fn test_partial_solution_reaches_closest() {
        let text = "0|1 2|3\n---\nmarkers:(0,0)P\ntarget:1\n";
        let board = Board::create(text, 0, Some(4)).unwrap();
        let config = WalkConfig::default();

        let error = BoardAnalysis::new(&board, LadderRules::default(), &config, false);
        assert_eq!(error, Err(GraphError::GoalNotReached));

        let analysis = BoardAnalysis::new(&board, LadderRules::default(), &config, true).unwrap();
        assert!(analysis.partial);
        assert_eq!(analysis.solution, vec!["PR", "PR", "PR"]);
        assert_eq!(analysis.choice_counts, vec![1, 1, 1]);
        assert_eq!(analysis.average_choices, 1.0);
        assert_eq!(analysis.max_choices, 1);
    }

    #[test]
    fn test_stuck_start_is_its_own_goal() {
        let text = "0|1 2|3\n---\nmarkers:(0,0)P\ntarget:2\n";
        let board = Board::create(text, 0, Some(3)).unwrap();

        let analysis =
            BoardAnalysis::new(&board, LadderRules::default(), &WalkConfig::default(), true)
                .unwrap();

        assert_eq!(analysis.graph_size, 1);
        assert!(analysis.solution.is_empty());
        assert!(analysis.choice_counts.is_empty());
        assert_eq!(analysis.average_choices, 0.0);
        assert_eq!(analysis.max_choices, 0);
    }

    #[test]
    fn test_analysis_json_fields() {
        let board = Board::create("0|2 x\n\n1|0 x\n", 0, None).unwrap();
        let analysis =
            BoardAnalysis::new(&board, CaptureRules, &WalkConfig::default(), false).unwrap();

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["graphSize"], 2);
        assert_eq!(json["solution"][0], "02r");
        assert_eq!(json["choiceCounts"][0], 1);
        assert_eq!(json["start"], "0|2\n\n1|0\n");
    }

    #[test]
    fn test_walks_run_on_separate_threads() {
        let capture = Board::create("0|2 x\n\n1|0 x\n", 0, None).unwrap();
        let ladder =
            Board::create("0|1 2|3\n---\nmarkers:(0,0)P\ntarget:1\n", 0, Some(3)).unwrap();
        let config = WalkConfig::default();

        let (first, second) = std::thread::scope(|scope| {
            let first = scope.spawn(|| BoardAnalysis::new(&capture, CaptureRules, &config, false));
            let second =
                scope.spawn(|| BoardAnalysis::new(&ladder, LadderRules::default(), &config, false));
            (first.join().unwrap(), second.join().unwrap())
        });

        assert_eq!(first.unwrap().solution, vec!["02r"]);
        assert_eq!(second.unwrap().solution, vec!["PR", "PR", "PR"]);
    }
}
