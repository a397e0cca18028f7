//! Domino puzzle library.
//!
//! Boards of dominoes are tiled by a randomized backtracking fill, then
//! explored state by state under a puzzle variant's rules. The resulting
//! graph yields the shortest solution and how much choice the player has
//! along the way.

pub mod analysis;
pub mod board;
pub mod error;
pub mod fill;
pub mod graph;
pub mod moves;
pub mod text;
pub mod variants;

// Re-export main types
pub use analysis::BoardAnalysis;
pub use board::{
    domino_set, Arrow, Board, Cell, CropBounds, Direction, Domino, DominoId, Position,
    SideChannels, DEFAULT_MAX_PIPS,
};
pub use error::{BadPosition, Error, GraphError, ParseError, Result};
pub use fill::{FillConfig, FillOutcome, RandomChooser, TilingChooser, DEFAULT_CYCLE_BUDGET};
pub use graph::{Edge, ExpansionOrder, GraphWalker, Node, NodeId, StateGraph, WalkConfig};
pub use moves::{Move, MoveGenerator, Probe};
pub use text::CANONICAL_FORMAT_VERSION;
pub use variants::{AddingRules, CaptureRules, DriveRules, LadderRules, SlideRules};
