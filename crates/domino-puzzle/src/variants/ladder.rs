//! Ladder rules: markers climb the pip values one step at a time.

use crate::board::{Board, Direction, DominoId, Position, DEFAULT_MAX_PIPS};
use crate::error::BadPosition;
use crate::moves::{axis_moves, probe_move, Move, MoveGenerator, Probe};
use crate::variants::slide::try_slide;

/// Markers step onto a neighbouring occupied cell showing the current
/// target, which then counts up by one, wrapping after the highest pip
/// value. Dominoes carrying no marker slide under the base rules. The puzzle
/// is solved when every marker stands on the highest pip value.
///
/// With `any_value` set, a marker may step onto any pips and the target is
/// left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LadderRules {
    pub any_value: bool,
}

impl LadderRules {
    pub fn new(any_value: bool) -> Self {
        Self { any_value }
    }

    fn top(board: &Board) -> u8 {
        board.max_pips().unwrap_or(DEFAULT_MAX_PIPS)
    }

    fn try_step(
        &self,
        probe: &mut Probe<'_>,
        name: char,
        direction: Direction,
    ) -> Result<Move, BadPosition> {
        let from = *probe
            .side
            .markers
            .get(&name)
            .ok_or_else(|| BadPosition::new(format!("no marker {}", name)))?;
        let to = from.step(direction);
        let cell = probe
            .cell(to)
            .copied()
            .ok_or_else(|| BadPosition::new(format!("{} is empty", to)))?;
        if probe.side.markers.values().any(|&p| p == to) {
            return Err(BadPosition::new(format!("{} already has a marker", to)));
        }

        let top = Self::top(probe);
        if !self.any_value {
            let target = probe.side.target.unwrap_or(0);
            if cell.pips != Some(target) {
                return Err(BadPosition::new(format!("{} does not show {}", to, target)));
            }
            probe.side_mut().target = Some(((u16::from(target) + 1) % (u16::from(top) + 1)) as u8);
        }
        probe.side_mut().markers.insert(name, to);

        let label = format!("{}{}", name, direction.letter().to_ascii_uppercase());
        Ok(probe.finish(label, self))
    }

    fn carries_marker(board: &Board, id: DominoId) -> bool {
        let Some((head, tail)) = board.domino_cells(id) else {
            return false;
        };
        board
            .side
            .markers
            .values()
            .any(|&p| p == head || p == tail)
    }
}

impl MoveGenerator for LadderRules {
    fn generate_moves(&self, board: &mut Board) -> Vec<Move> {
        let mut moves = Vec::new();
        let names: Vec<char> = board.side.markers.keys().copied().collect();
        for name in names {
            for direction in Direction::ALL {
                probe_move(board, &mut moves, |probe| self.try_step(probe, name, direction));
            }
        }
        for (id, dx, dy) in axis_moves(board) {
            if Self::carries_marker(board, id) {
                continue;
            }
            probe_move(board, &mut moves, |probe| {
                let label = try_slide(probe, id, dx, dy)?;
                Ok(probe.finish(label, self))
            });
        }
        moves
    }

    /// Steps still needed for every marker to reach the top value.
    fn progress(&self, board: &Board) -> Option<usize> {
        if board.side.markers.is_empty() {
            return None;
        }
        let top = Self::top(board);
        let remaining = board
            .side
            .markers
            .values()
            .map(|&p: &Position| match board.pips_at(p) {
                Some(pips) => usize::from(top.saturating_sub(pips)),
                None => usize::from(top),
            })
            .sum();
        Some(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphWalker;

    #[test]
    fn test_marker_steps_onto_target() {
        let text = "0|1 2|3\n---\nmarkers:(0,0)P\ntarget:1\n";
        let mut board = Board::create(text, 0, Some(3)).unwrap();
        let before = board.display(false);

        let moves = LadderRules::default().generate_moves(&mut board);
        let labels: Vec<&str> = moves.iter().map(|m| m.label.as_str()).collect();

        assert_eq!(labels, vec!["PR"]);
        assert_eq!(moves[0].state, "0|1 2|3\n---\nmarkers:(1,0)P\ntarget:2\n");
        assert_eq!(moves[0].progress, Some(2));
        assert_eq!(board.display(false), before);
    }

    #[test]
    fn test_target_wraps_after_top_value() {
        let text = "2|3 0|1\n---\nmarkers:(0,0)P\ntarget:3\n";
        let mut board = Board::create(text, 0, Some(3)).unwrap();

        let moves = LadderRules::default().generate_moves(&mut board);

        assert_eq!(moves.len(), 1);
        assert!(moves[0].state.ends_with("target:0\n"));
        assert_eq!(moves[0].progress, Some(0));
    }

    #[test]
    fn test_any_value_ignores_target() {
        let text = "0|1 2|3\n---\nmarkers:(1,0)P\n";
        let mut board = Board::create(text, 0, Some(3)).unwrap();

        let mut labels: Vec<String> = LadderRules::new(true)
            .generate_moves(&mut board)
            .into_iter()
            .map(|m| m.label)
            .collect();
        labels.sort();

        assert_eq!(labels, vec!["PL", "PR"]);
    }

    #[test]
    fn test_domino_with_marker_stays_put() {
        let text = "0|1 x\n\n1|2 x\n---\nmarkers:(0,1)P\ntarget:5\n";
        let mut board = Board::create(text, 1, Some(3)).unwrap();

        let moves = LadderRules::default().generate_moves(&mut board);
        let labels: Vec<&str> = moves.iter().map(|m| m.label.as_str()).collect();

        // Only 1|2 may slide; the marked 0|1 stays where it is.
        assert_eq!(labels, vec!["12r", "12l"]);
    }

    #[test]
    fn test_ladder_walk_climbs_to_top() {
        let text = "0|1 2|3\n---\nmarkers:(0,0)P\ntarget:1\n";
        let board = Board::create(text, 0, Some(3)).unwrap();
        let mut walker = GraphWalker::new(LadderRules::default());
        let graph = walker.walk(&board).unwrap();

        let solved = graph.solved().unwrap();
        assert!(graph.state(solved).contains("markers:(3,0)P"));
    }

    #[test]
    fn test_no_markers_has_no_goal() {
        let board = Board::create("0|1\n", 0, None).unwrap();
        assert_eq!(LadderRules::default().progress(&board), None);
    }

    #[test]
    fn test_successors_stay_connected() {
        let text = "0|1 x\n\n1|2 x\n\nx 2|0\n---\nmarkers:(0,2)P\ntarget:1\n";
        let mut board = Board::create(text, 1, None).unwrap();
        assert!(board.is_connected());

        let moves = LadderRules::default().generate_moves(&mut board);
        assert!(!moves.is_empty());
        for found in moves {
            let next = Board::create(&found.state, 0, None).unwrap();
            assert!(next.is_connected(), "{} disconnected the board", found.label);
        }
    }
}
