//! Base sliding rules.

use crate::board::{Board, DominoId};
use crate::error::BadPosition;
use crate::moves::{axis_moves, probe_move, slide_label, Move, MoveGenerator, Probe};

/// A domino slides one step along its own axis into empty cells. The board
/// must stay connected and no domino may be left without a neighbour that
/// shares a pip value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlideRules;

/// Slide `id` by `(dx, dy)` under the base rules and return the move label.
pub(crate) fn try_slide(
    probe: &mut Probe<'_>,
    id: DominoId,
    dx: i32,
    dy: i32,
) -> Result<String, BadPosition> {
    let domino = probe
        .domino(id)
        .ok_or_else(|| BadPosition::new("domino is not on the board"))?;
    probe.move_domino(id, dx, dy)?;
    probe.require_connected("after slide")?;
    if probe.has_loner() {
        return Err(BadPosition::new("slide leaves a domino without a match"));
    }
    Ok(slide_label(&domino, dx, dy))
}

impl MoveGenerator for SlideRules {
    fn generate_moves(&self, board: &mut Board) -> Vec<Move> {
        let mut moves = Vec::new();
        for (id, dx, dy) in axis_moves(board) {
            probe_move(board, &mut moves, |probe| {
                let label = try_slide(probe, id, dx, dy)?;
                Ok(probe.finish(label, self))
            });
        }
        moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;
    use crate::graph::GraphWalker;

    #[test]
    fn test_slide_moves_from_aligned_pair() {
        let mut board = Board::create("0|2 x\n\n0|1 x\n", 1, None).unwrap();
        let before = board.display(false);

        let mut moves = SlideRules.generate_moves(&mut board);
        moves.sort_by(|a, b| a.label.cmp(&b.label));

        let labels: Vec<&str> = moves.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["01l", "01r", "02l", "02r"]);
        assert_eq!(moves[3].state, "x 0|2\n\n0|1 x\n");
        assert_eq!(moves[2].state, "0|2 x\n\nx 0|1\n");
        assert!(moves.iter().all(|m| m.progress.is_none()));
        assert_eq!(board.display(false), before);
    }

    #[test]
    fn test_slide_rejects_disconnecting_move() {
        let mut board = Board::create("0|2 x\n\nx 0|1\n", 1, None).unwrap();
        let moves = SlideRules.generate_moves(&mut board);

        let labels: Vec<&str> = moves.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(moves.len(), 2);
        assert!(labels.contains(&"02r"));
        assert!(labels.contains(&"01l"));
    }

    #[test]
    fn test_slide_rejects_loner() {
        let text = "1|2 3|4\n\nx 2|3\n";
        let mut board = Board::create(text, 1, None).unwrap();
        assert!(!board.has_loner());

        let moves = SlideRules.generate_moves(&mut board);
        assert!(moves.is_empty());

        // Sliding 2|3 right keeps the board connected but strands 1|2.
        let id = board.domino_at(Position::new(2, 1)).unwrap();
        board.move_domino(id, 1, 0).unwrap();
        assert!(board.is_connected());
        assert!(board.has_loner());
    }

    #[test]
    fn test_slide_explores_three_states() {
        let board = Board::create("0|2 x\n\n0|1 x\n", 0, None).unwrap();
        let mut walker = GraphWalker::new(SlideRules);
        let graph = walker.walk(&board).unwrap();

        let mut states: Vec<&str> = graph.states().collect();
        states.sort();
        assert_eq!(
            states,
            vec!["0|2\n\n0|1\n", "0|2 x\n\nx 0|1\n", "x 0|2\n\n0|1 x\n"]
        );
    }

    #[test]
    fn test_successors_stay_connected() {
        let text = "0|2 1|1\n\n3 2|2 x\n-\n0 x 1|3\n";
        let mut board = Board::create(text, 1, None).unwrap();
        assert!(board.is_connected());

        for found in SlideRules.generate_moves(&mut board) {
            let next = Board::create(&found.state, 0, None).unwrap();
            assert!(next.is_connected(), "{} disconnected the board", found.label);
        }
    }
}
