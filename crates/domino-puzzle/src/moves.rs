//! Move-generation protocol shared by every puzzle variant.
//!
//! A generator receives one live [`Board`] per graph node and probes each
//! candidate move on it. All mutation goes through a [`Probe`], which keeps an
//! undo log and replays it when dropped, so the board is back in its original
//! state however the candidate ends.

use std::ops::Deref;

use smallvec::SmallVec;

use crate::board::{Board, Direction, Domino, DominoId, Position, SideChannels};
use crate::error::BadPosition;

/// One legal move out of a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    /// Short description such as `"02r"` or `"PU"`.
    pub label: String,
    /// Cropped canonical text of the resulting state.
    pub state: String,
    /// Distance from the goal as measured by the generator; `Some(0)` is solved.
    pub progress: Option<usize>,
}

/// A puzzle variant's rules.
pub trait MoveGenerator {
    /// Every legal successor of `board`. The board must be unchanged on return.
    fn generate_moves(&self, board: &mut Board) -> Vec<Move>;

    /// Distance from the goal, lower is better and `Some(0)` means solved.
    /// `None` if the variant has no goal.
    fn progress(&self, board: &Board) -> Option<usize> {
        let _ = board;
        None
    }

    /// Empty cells added around a state before its moves are generated.
    fn expansion_border(&self) -> usize {
        1
    }
}

impl<G: MoveGenerator + ?Sized> MoveGenerator for &G {
    fn generate_moves(&self, board: &mut Board) -> Vec<Move> {
        (**self).generate_moves(board)
    }

    fn progress(&self, board: &Board) -> Option<usize> {
        (**self).progress(board)
    }

    fn expansion_border(&self) -> usize {
        (**self).expansion_border()
    }
}

impl<G: MoveGenerator + ?Sized> MoveGenerator for Box<G> {
    fn generate_moves(&self, board: &mut Board) -> Vec<Move> {
        (**self).generate_moves(board)
    }

    fn progress(&self, board: &Board) -> Option<usize> {
        (**self).progress(board)
    }

    fn expansion_border(&self) -> usize {
        (**self).expansion_border()
    }
}

#[derive(Debug)]
enum Undo {
    Relocated {
        id: DominoId,
        domino: Domino,
        head: Position,
    },
    Added(DominoId),
    Removed {
        id: DominoId,
        domino: Domino,
        head: Position,
    },
    Side(SideChannels),
}

/// Scoped mutation of a board that is undone on drop.
pub struct Probe<'a> {
    board: &'a mut Board,
    undo: SmallVec<[Undo; 8]>,
}

impl<'a> Probe<'a> {
    pub fn new(board: &'a mut Board) -> Self {
        Self {
            board,
            undo: SmallVec::new(),
        }
    }

    fn placement(&self, id: DominoId) -> Result<(Domino, Position), BadPosition> {
        self.board
            .placement(id)
            .ok_or_else(|| BadPosition::new(format!("domino {:?} is not on the board", id)))
    }

    pub fn move_domino(&mut self, id: DominoId, dx: i32, dy: i32) -> Result<(), BadPosition> {
        let (domino, head) = self.placement(id)?;
        self.board.move_domino(id, dx, dy)?;
        self.undo.push(Undo::Relocated { id, domino, head });
        Ok(())
    }

    pub fn add(&mut self, domino: Domino, x: i32, y: i32) -> Result<DominoId, BadPosition> {
        let id = self.board.add(domino, x, y)?;
        self.undo.push(Undo::Added(id));
        Ok(id)
    }

    pub fn remove(&mut self, id: DominoId) -> Result<Domino, BadPosition> {
        let (domino, head) = self.placement(id)?;
        self.board.remove(id)?;
        self.undo.push(Undo::Removed { id, domino, head });
        Ok(domino)
    }

    /// Side channels, snapshotted before the first change.
    pub fn side_mut(&mut self) -> &mut SideChannels {
        if !self.undo.iter().any(|step| matches!(step, Undo::Side(_))) {
            self.undo.push(Undo::Side(self.board.side.clone()));
        }
        &mut self.board.side
    }

    /// Fail unless the board is connected.
    pub fn require_connected(&self, context: &str) -> Result<(), BadPosition> {
        if self.board.is_connected() {
            Ok(())
        } else {
            Err(BadPosition::new(format!("board is not connected {}", context)))
        }
    }

    /// Package the current state as a move.
    pub fn finish<G: MoveGenerator + ?Sized>(&self, label: String, generator: &G) -> Move {
        Move {
            label,
            state: self.board.display(true),
            progress: generator.progress(&*self.board),
        }
    }
}

impl Deref for Probe<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        &*self.board
    }
}

impl Drop for Probe<'_> {
    fn drop(&mut self) {
        while let Some(step) = self.undo.pop() {
            let restored = match step {
                Undo::Relocated { id, domino, head } => self.board.relocate(id, domino, head),
                Undo::Added(id) => self.board.remove(id).map(|_| ()),
                Undo::Removed { id, domino, head } => self.board.reinsert(id, domino, head),
                Undo::Side(side) => {
                    self.board.side = side;
                    Ok(())
                }
            };
            debug_assert!(restored.is_ok(), "undo failed: {:?}", restored);
        }
    }
}

/// Label for a domino moving by `(dx, dy)`: pips in current orientation plus
/// the direction letter.
pub fn slide_label(domino: &Domino, dx: i32, dy: i32) -> String {
    let letter = Direction::from_delta(dx, dy).map_or('?', Direction::letter);
    format!("{}{}", domino.label(), letter)
}

/// Both one-step moves along each domino's own axis.
pub fn axis_moves(board: &Board) -> Vec<(DominoId, i32, i32)> {
    let mut moves = Vec::new();
    for id in board.domino_ids() {
        if let Some(domino) = board.domino(id) {
            let (dx, dy) = domino.direction.delta();
            moves.push((id, dx, dy));
            moves.push((id, -dx, -dy));
        }
    }
    moves
}

/// Run one candidate inside a fresh probe, turning `BadPosition` into "no move".
pub fn probe_move<F>(board: &mut Board, moves: &mut Vec<Move>, candidate: F)
where
    F: FnOnce(&mut Probe<'_>) -> Result<Move, BadPosition>,
{
    let mut probe = Probe::new(board);
    if let Ok(found) = candidate(&mut probe) {
        moves.push(found);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_restores_on_drop() {
        let mut board = Board::create("0|2 x\n\n0|1 x\n", 1, None).unwrap();
        let before = board.display(false);
        let ids = board.domino_ids();

        {
            let mut probe = Probe::new(&mut board);
            probe.move_domino(ids[0], 1, 0).unwrap();
            probe.remove(ids[1]).unwrap();
            probe.add(Domino::new(1, 1), 0, 0).unwrap();
            probe.side_mut().target = Some(3);
            probe.side_mut().markers.insert('P', Position::new(2, 2));
            assert_ne!(probe.display(false), before);
        }

        assert_eq!(board.display(false), before);
        assert_eq!(board.domino_ids(), ids);
        assert!(board.side.is_empty());
    }

    #[test]
    fn test_probe_restores_after_rejection() {
        let mut board = Board::create("0|2 x\n\n0|1 x\n", 1, None).unwrap();
        let before = board.display(false);
        let pool = board.extra_dominoes().len();
        let ids = board.domino_ids();
        let mut moves = Vec::new();

        probe_move(&mut board, &mut moves, |probe| {
            probe.remove(ids[0])?;
            probe.move_domino(ids[1], 0, 5)?;
            unreachable!("move off the board must fail");
        });

        assert!(moves.is_empty());
        assert_eq!(board.display(false), before);
        assert_eq!(board.extra_dominoes().len(), pool);
    }

    #[test]
    fn test_slide_label() {
        let domino = Domino::new(0, 2);
        assert_eq!(slide_label(&domino, 1, 0), "02r");
        assert_eq!(slide_label(&domino, 0, -1), "02d");
    }
}
