//! Error types shared by the grid model, the walker and the CLI.

use thiserror::Error;

/// A placement or move that breaks adjacency, occupancy, bounds,
/// connectivity or a variant rule. Move generators treat it as "no edge".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bad position: {reason}")]
pub struct BadPosition {
    pub reason: String,
}

impl BadPosition {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Canonical board text that cannot be tokenized into a consistent grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed board text at line {line}: {reason}")]
pub struct ParseError {
    /// 1-based line number in the input text.
    pub line: usize,
    pub reason: String,
}

impl ParseError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// Failures while building or querying a state graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("graph size exceeded limit of {limit} states")]
    SizeExceeded { limit: usize },
    #[error("goal state was never reached")]
    GoalNotReached,
    #[error("no path from start to goal state {goal:?}")]
    NoPath { goal: String },
    #[error("state text could not be parsed: {0}")]
    State(#[from] ParseError),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    BadPosition(#[from] BadPosition),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
