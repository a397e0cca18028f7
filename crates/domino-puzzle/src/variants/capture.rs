//! Capture rules: slide next to an equal cell to take both dominoes off.

use std::collections::BTreeSet;

use crate::board::{Board, DominoId};
use crate::error::BadPosition;
use crate::moves::{axis_moves, probe_move, slide_label, Move, MoveGenerator, Probe};

/// Pips on two touching cells that add up to this are complements.
pub const COMPLEMENT_SUM: u8 = 6;

/// A domino slides one step along its axis. Every neighbouring domino with a
/// cell equal to the cell it touches is captured along with the moved domino.
/// A slide without captures is legal only if it lands next to a complement.
/// The board must be connected after the slide and after the captures. The
/// puzzle is solved when no dominoes remain.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureRules;

impl CaptureRules {
    fn try_capture(
        &self,
        probe: &mut Probe<'_>,
        id: DominoId,
        dx: i32,
        dy: i32,
    ) -> Result<Move, BadPosition> {
        let domino = probe
            .domino(id)
            .ok_or_else(|| BadPosition::new("domino is not on the board"))?;
        probe.move_domino(id, dx, dy)?;
        probe.require_connected("after slide")?;

        let (head, tail) = probe
            .domino_cells(id)
            .ok_or_else(|| BadPosition::new("domino is not on the board"))?;
        let mut captured = BTreeSet::new();
        let mut complement_found = false;
        for position in [head, tail] {
            let Some(cell) = probe.cell(position).copied() else {
                continue;
            };
            for neighbour in probe.neighbour_cells(position) {
                if neighbour.domino == Some(id) {
                    continue;
                }
                if let (Some(a), Some(b)) = (cell.pips, neighbour.pips) {
                    if a == b {
                        if let Some(other) = neighbour.domino {
                            captured.insert(other);
                        }
                    }
                    complement_found |= a + b == COMPLEMENT_SUM;
                }
            }
        }

        if captured.is_empty() {
            if !complement_found {
                return Err(BadPosition::new(
                    "a legal move must have captures or complements",
                ));
            }
        } else {
            captured.insert(id);
            for other in captured {
                probe.remove(other)?;
            }
            probe.require_connected("after capture")?;
        }
        Ok(probe.finish(slide_label(&domino, dx, dy), self))
    }
}

impl MoveGenerator for CaptureRules {
    fn generate_moves(&self, board: &mut Board) -> Vec<Move> {
        let mut moves = Vec::new();
        for (id, dx, dy) in axis_moves(board) {
            probe_move(board, &mut moves, |probe| self.try_capture(probe, id, dx, dy));
        }
        moves
    }

    /// Dominoes still on the board.
    fn progress(&self, board: &Board) -> Option<usize> {
        Some(board.domino_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphWalker;

    #[test]
    fn test_capture_removes_both_dominoes() {
        let mut board = Board::create("0|2 x\n\n1|0 x\n", 1, None).unwrap();
        let before = board.display(false);

        let moves = CaptureRules.generate_moves(&mut board);
        let labels: Vec<&str> = moves.iter().map(|m| m.label.as_str()).collect();

        assert_eq!(labels, vec!["02r", "10l"]);
        assert!(moves.iter().all(|m| m.state.is_empty()));
        assert!(moves.iter().all(|m| m.progress == Some(0)));
        assert_eq!(board.display(false), before);
    }

    #[test]
    fn test_capture_walk_reaches_empty_board() {
        let board = Board::create("0|2 x\n\n1|0 x\n", 0, None).unwrap();
        let mut walker = GraphWalker::new(CaptureRules);
        let graph = walker.walk(&board).unwrap();

        assert_eq!(graph.len(), 2);
        let solved = graph.solved().unwrap();
        assert_eq!(graph.state(solved), "");
    }

    #[test]
    fn test_complement_allows_move_without_capture() {
        // 2|4 sliding left puts its 2 under the 4 of 4|5.
        let text = "4|5 x\n\nx 2|4\n";
        let mut board = Board::create(text, 1, None).unwrap();

        let moves = CaptureRules.generate_moves(&mut board);
        let slide = moves.iter().find(|m| m.label == "24l").unwrap();

        assert_eq!(slide.state, "4|5\n\n2|4\n");
        assert_eq!(slide.progress, Some(2));
    }

    #[test]
    fn test_capture_must_leave_board_connected() {
        // 0|2 sliding right captures 1|2, which would split 5|6 from 6|5.
        let text = "x 0|2 x x x\n\n5|6 1|2 6|5\n";
        let mut board = Board::create(text, 1, None).unwrap();

        let moves = CaptureRules.generate_moves(&mut board);

        assert!(moves.iter().all(|m| m.label != "02r"));
    }

    #[test]
    fn test_successors_stay_connected() {
        let text = "3|1 x x\n\n5|3 2|1\n";
        let mut board = Board::create(text, 1, None).unwrap();
        assert!(board.is_connected());

        let moves = CaptureRules.generate_moves(&mut board);
        assert!(!moves.is_empty());
        for found in moves {
            let next = Board::create(&found.state, 0, None).unwrap();
            assert!(next.is_connected(), "{} disconnected the board", found.label);
        }
    }
}
