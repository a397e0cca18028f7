//! Drive rules: dominoes carrying dice drive them together.

use crate::board::{Board, Direction, DominoId};
use crate::error::BadPosition;
use crate::moves::{axis_moves, probe_move, Move, MoveGenerator, Probe};

/// Only dominoes with a die on one of their cells may move. They slide one
/// step along their axis into empty cells, taking their dice with them, and
/// the board must stay connected. The puzzle is solved when every die sits
/// next to another die.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriveRules;

impl DriveRules {
    fn try_drive(
        &self,
        probe: &mut Probe<'_>,
        id: DominoId,
        dx: i32,
        dy: i32,
    ) -> Result<Move, BadPosition> {
        let domino = probe
            .domino(id)
            .ok_or_else(|| BadPosition::new("domino is not on the board"))?;
        let (head, tail) = probe
            .domino_cells(id)
            .ok_or_else(|| BadPosition::new("domino is not on the board"))?;
        probe.move_domino(id, dx, dy)?;
        probe.require_connected("after drive")?;

        let side = probe.side_mut();
        let carried: Vec<_> = [head, tail]
            .into_iter()
            .filter_map(|p| side.dice.remove(&p).map(|pips| (p, pips)))
            .collect();
        for (position, pips) in carried {
            side.dice.insert(position.offset(dx, dy), pips);
        }

        let direction = Direction::from_delta(dx, dy)
            .ok_or_else(|| BadPosition::new("drive must be one step"))?;
        let label = format!("{}d{}", domino.label(), direction.letter());
        Ok(probe.finish(label, self))
    }

    fn carries_die(board: &Board, id: DominoId) -> bool {
        board
            .domino_cells(id)
            .map_or(false, |(head, tail)| {
                board.side.dice.contains_key(&head) || board.side.dice.contains_key(&tail)
            })
    }
}

impl MoveGenerator for DriveRules {
    fn generate_moves(&self, board: &mut Board) -> Vec<Move> {
        let mut moves = Vec::new();
        for (id, dx, dy) in axis_moves(board) {
            if !Self::carries_die(board, id) {
                continue;
            }
            probe_move(board, &mut moves, |probe| self.try_drive(probe, id, dx, dy));
        }
        moves
    }

    /// Extra steps each die needs to touch its nearest neighbour.
    fn progress(&self, board: &Board) -> Option<usize> {
        let dice: Vec<_> = board.side.dice.keys().copied().collect();
        if dice.len() < 2 {
            return None;
        }
        let total = dice
            .iter()
            .map(|&die| {
                dice.iter()
                    .filter(|&&other| other != die)
                    .map(|&other| die.manhattan(other))
                    .min()
                    .map_or(0, |distance| distance.saturating_sub(1) as usize)
            })
            .sum();
        Some(total)
    }
}
