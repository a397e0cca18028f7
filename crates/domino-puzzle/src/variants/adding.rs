//! Adding rules: place queued dominoes next to matching cells.

use crate::board::{Board, Direction, Domino, Position};
use crate::error::BadPosition;
use crate::moves::{probe_move, Move, MoveGenerator, Probe};
use crate::variants::capture::COMPLEMENT_SUM;

/// The front domino of the queue may go on any empty cells in any rotation
/// if it touches at least two equal cells or at least one complement. The
/// puzzle is solved when the queue is empty.
///
/// Labels give the placed pips, the direction and the head position relative
/// to the lower left corner of the occupied cells, e.g. `"25u(1,0)"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddingRules;

/// Equal neighbours needed when no complement is touched.
const REQUIRED_MATCHES: usize = 2;

impl AddingRules {
    fn try_add(
        &self,
        probe: &mut Probe<'_>,
        domino: Domino,
        head: Position,
        origin: Position,
    ) -> Result<Move, BadPosition> {
        probe.side_mut().queue.remove(0);
        let id = probe.add(domino, head.x, head.y)?;
        let (head, tail) = probe
            .domino_cells(id)
            .ok_or_else(|| BadPosition::new("domino is not on the board"))?;

        let mut matches = 0;
        let mut complement_found = false;
        for position in [head, tail] {
            let Some(pips) = probe.pips_at(position) else {
                continue;
            };
            for neighbour in probe.neighbour_cells(position) {
                if neighbour.domino == Some(id) {
                    continue;
                }
                if let Some(other) = neighbour.pips {
                    if other == pips {
                        matches += 1;
                    }
                    complement_found |= other + pips == COMPLEMENT_SUM;
                }
            }
        }
        if matches < REQUIRED_MATCHES && !complement_found {
            return Err(BadPosition::new("added domino needs two matches or a complement"));
        }
        probe.require_connected("after adding")?;

        let label = format!(
            "{}{}({},{})",
            domino.label(),
            domino.direction.letter(),
            head.x - origin.x,
            head.y - origin.y
        );
        Ok(probe.finish(label, self))
    }
}

impl MoveGenerator for AddingRules {
    fn generate_moves(&self, board: &mut Board) -> Vec<Move> {
        let mut moves = Vec::new();
        let Some(&next) = board.side.queue.first() else {
            return moves;
        };
        let origin = board
            .occupied_bounds()
            .map_or(Position::new(0, 0), |b| Position::new(b.xmin, b.ymin));
        for y in 0..board.height() {
            for x in 0..board.width() {
                let head = Position::new(x, y);
                if !board.is_empty_at(head) {
                    continue;
                }
                for direction in Direction::ALL {
                    let domino = next.with_direction(direction);
                    probe_move(board, &mut moves, |probe| {
                        self.try_add(probe, domino, head, origin)
                    });
                }
            }
        }
        moves
    }

    /// Dominoes still waiting in the queue.
    fn progress(&self, board: &Board) -> Option<usize> {
        Some(board.side.queue.len())
    }

    /// A domino laid end-on against the occupied cells reaches two cells out.
    fn expansion_border(&self) -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphWalker;

    #[test]
    fn test_add_needs_two_matches() {
        let text = "1|2\n===\n1\n-\n2\n";
        let mut board = Board::create(text, 1, None).unwrap();
        let before = board.display(false);

        let moves = AddingRules.generate_moves(&mut board);
        let mut labels: Vec<&str> = moves.iter().map(|m| m.label.as_str()).collect();
        labels.sort();

        // Only lying directly on top of (or under) 1|2 touches two equal cells.
        assert_eq!(labels, vec!["12r(0,-1)", "12r(0,1)"]);
        assert_eq!(moves[0].progress, Some(0));
        assert!(moves.iter().any(|m| m.state == "1|2\n\n1|2\n"));
        assert_eq!(board.display(false), before);
    }

    #[test]
    fn test_add_accepts_complement() {
        let text = "5|0\n===\n1\n-\n3\n";
        let mut board = Board::create(text, 2, None).unwrap();

        let moves = AddingRules.generate_moves(&mut board);

        // The 1 touching the 5 is enough.
        assert!(moves.iter().any(|m| m.label == "13l(-1,0)" && m.state == "3|1 5|0\n"));
        assert!(moves.iter().all(|m| m.progress == Some(0)));
    }

    #[test]
    fn test_walk_places_two_cells_out() {
        let board = Board::create("5|0\n===\n1\n-\n3\n", 0, None).unwrap();
        let mut walker = GraphWalker::new(AddingRules);
        let graph = walker.walk(&board).unwrap();

        // Standing on the 5, and lying end-on to its left.
        assert!(graph.find("3 x\n-\n1 x\n\n5|0\n").is_some());
        assert!(graph.find("3|1 5|0\n").is_some());
    }

    #[test]
    fn test_successors_stay_connected() {
        let text = "5|0 x\n\n2|1 6|6\n===\n1\n-\n3\n";
        let mut board = Board::create(text, 2, None).unwrap();
        assert!(board.is_connected());

        let moves = AddingRules.generate_moves(&mut board);
        assert!(!moves.is_empty());
        for found in moves {
            let next = Board::create(&found.state, 0, None).unwrap();
            assert!(next.is_connected(), "{} disconnected the board", found.label);
        }
    }

    #[test]
    fn test_empty_queue_has_no_moves() {
        let mut board = Board::create("1|2\n", 1, None).unwrap();
        assert!(AddingRules.generate_moves(&mut board).is_empty());
        assert_eq!(AddingRules.progress(&board), Some(0));
    }

    #[test]
    fn test_adding_walk_solves_queue() {
        let text = "1|2\n===\n1 2\n- -\n2 1\n";
        let board = Board::create(text, 2, None).unwrap();
        let mut walker = GraphWalker::new(AddingRules);
        let graph = walker.walk(&board).unwrap();

        let solved = graph.solved().unwrap();
        assert!(!graph.state(solved).contains("==="));
    }
}
