//! Randomized backtracking tiling of the empty cells of a board.
//!
//! The search keeps an explicit stack with one frame per filled cell instead
//! of recursing, so large boards cannot overflow the call stack.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::board::{Board, Direction, Domino, DominoId, Position};

/// Candidate attempts allowed before a fill gives up.
pub const DEFAULT_CYCLE_BUDGET: usize = 10_000;

#[derive(Debug, Clone)]
pub struct FillConfig {
    /// Allow two different pieces to touch with equal pips.
    pub matches_allowed: bool,
    pub cycle_budget: usize,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            matches_allowed: true,
            cycle_budget: DEFAULT_CYCLE_BUDGET,
        }
    }
}

/// How a fill ended. Anything but `Filled` leaves the board as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    Filled,
    /// Every candidate was tried; no tiling exists from this board.
    Impossible,
    /// The cycle budget ran out first. Retrying with other choices may work.
    BudgetExhausted,
}

/// Source of the random decisions made while tiling.
pub trait TilingChooser {
    /// First rotation to try at a new cell; the others follow counter-clockwise.
    fn choose_direction(&mut self) -> Direction;

    /// Put the candidates for a new cell in the order they are tried.
    fn order_candidates(&mut self, candidates: &mut [Domino]);

    /// Whether to flip the domino just placed on `board`.
    fn choose_flip(&mut self, board: &Board) -> bool;
}

/// Chooser backed by any random number generator.
#[derive(Debug, Clone)]
pub struct RandomChooser<R> {
    rng: R,
}

impl<R: Rng> RandomChooser<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> TilingChooser for RandomChooser<R> {
    fn choose_direction(&mut self) -> Direction {
        Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())]
    }

    fn order_candidates(&mut self, candidates: &mut [Domino]) {
        candidates.shuffle(&mut self.rng);
    }

    fn choose_flip(&mut self, _board: &Board) -> bool {
        self.rng.gen_bool(0.5)
    }
}

/// One cell being filled.
#[derive(Debug)]
struct Frame {
    position: Position,
    rotations: [Direction; 4],
    /// Pool dominoes, non-doubles in both orientations.
    candidates: Vec<Domino>,
    /// Index into rotations × candidates, rotation-major.
    next: usize,
    placed: Option<DominoId>,
}

impl Frame {
    fn new<C: TilingChooser + ?Sized>(board: &Board, position: Position, chooser: &mut C) -> Self {
        let first = chooser.choose_direction();
        let start = Direction::ALL
            .iter()
            .position(|&d| d == first)
            .unwrap_or(0);
        let rotations = [0, 1, 2, 3].map(|k| Direction::ALL[(start + k) % 4]);

        let mut candidates = Vec::with_capacity(board.extra_dominoes().len() * 2);
        for &domino in board.extra_dominoes() {
            candidates.push(domino);
            if !domino.is_double() {
                candidates.push(domino.reversed());
            }
        }
        chooser.order_candidates(&mut candidates);

        Self {
            position,
            rotations,
            candidates,
            next: 0,
            placed: None,
        }
    }

    fn next_candidate(&mut self) -> Option<Domino> {
        if self.candidates.is_empty() {
            return None;
        }
        let rotation = self.next / self.candidates.len();
        let direction = *self.rotations.get(rotation)?;
        let domino = self.candidates[self.next % self.candidates.len()];
        self.next += 1;
        Some(domino.with_direction(direction))
    }
}

impl Board {
    /// Tile every empty cell with dominoes from the extra pool.
    pub fn fill<C: TilingChooser + ?Sized>(
        &mut self,
        chooser: &mut C,
        config: &FillConfig,
    ) -> FillOutcome {
        let Some(first) = self.first_empty() else {
            return FillOutcome::Filled;
        };
        if !self.has_even_gaps() {
            return FillOutcome::Impossible;
        }

        let mut stack = vec![Frame::new(self, first, chooser)];
        let mut cycles = 0;
        while let Some(frame) = stack.last_mut() {
            if let Some(id) = frame.placed.take() {
                let removed = self.remove(id);
                debug_assert!(removed.is_ok(), "backtrack failed: {:?}", removed);
            }
            let Some(domino) = frame.next_candidate() else {
                stack.pop();
                continue;
            };

            cycles += 1;
            if cycles > config.cycle_budget {
                self.unwind(&mut stack);
                debug!(cycles, "fill ran out of budget");
                return FillOutcome::BudgetExhausted;
            }

            let position = frame.position;
            let Ok(id) = self.add(domino, position.x, position.y) else {
                continue;
            };
            if !self.has_even_gaps() {
                let removed = self.remove(id);
                debug_assert!(removed.is_ok(), "odd gap rejection failed: {:?}", removed);
                continue;
            }
            if chooser.choose_flip(self) {
                let flipped = self.flip(id);
                debug_assert!(flipped.is_ok(), "flip failed: {:?}", flipped);
            }
            if !config.matches_allowed && self.domino_has_match(id) {
                let removed = self.remove(id);
                debug_assert!(removed.is_ok(), "match rejection failed: {:?}", removed);
                continue;
            }
            frame.placed = Some(id);

            match self.first_empty() {
                Some(next) => stack.push(Frame::new(self, next, chooser)),
                None => {
                    debug!(cycles, dominoes = self.domino_count(), "fill complete");
                    return FillOutcome::Filled;
                }
            }
        }

        debug!(cycles, "no tiling exists");
        FillOutcome::Impossible
    }

    fn unwind(&mut self, stack: &mut Vec<Frame>) {
        while let Some(frame) = stack.pop() {
            if let Some(id) = frame.placed {
                let removed = self.remove(id);
                debug_assert!(removed.is_ok(), "unwind failed: {:?}", removed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Puts the scripted domino first at each new cell.
    struct Scripted {
        picks: Vec<(u8, u8)>,
        direction: Direction,
    }

    impl TilingChooser for Scripted {
        fn choose_direction(&mut self) -> Direction {
            self.direction
        }

        fn order_candidates(&mut self, candidates: &mut [Domino]) {
            if self.picks.is_empty() {
                return;
            }
            let (head, tail) = self.picks.remove(0);
            if let Some(i) = candidates
                .iter()
                .position(|d| d.head == head && d.tail == tail)
            {
                candidates[..=i].rotate_right(1);
            }
        }

        fn choose_flip(&mut self, _board: &Board) -> bool {
            false
        }
    }

    /// Random choices that record the board each accepted placement leaves.
    struct Watching {
        inner: RandomChooser<StdRng>,
        accepted: Vec<(usize, bool)>,
    }

    impl TilingChooser for Watching {
        fn choose_direction(&mut self) -> Direction {
            self.inner.choose_direction()
        }

        fn order_candidates(&mut self, candidates: &mut [Domino]) {
            self.inner.order_candidates(candidates);
        }

        fn choose_flip(&mut self, board: &Board) -> bool {
            self.accepted.push((board.domino_count(), board.has_even_gaps()));
            self.inner.choose_flip(board)
        }
    }

    #[test]
    fn test_scripted_fill() {
        let mut board = Board::new(2, 2, Some(6));
        let mut chooser = Scripted {
            picks: vec![(0, 0), (0, 1)],
            direction: Direction::Up,
        };

        let outcome = board.fill(&mut chooser, &FillConfig::default());

        assert_eq!(outcome, FillOutcome::Filled);
        assert_eq!(board.display(false), "0 1\n- -\n0 0\n");
        assert_eq!(board.extra_dominoes().len(), 26);
    }

    #[test]
    fn test_random_fill_covers_board() {
        let mut board = Board::new(4, 4, Some(6));
        let mut chooser = RandomChooser::new(StdRng::seed_from_u64(7));

        let outcome = board.fill(&mut chooser, &FillConfig::default());

        assert_eq!(outcome, FillOutcome::Filled);
        assert_eq!(board.first_empty(), None);
        assert_eq!(board.domino_count(), 8);
        assert_eq!(board.extra_dominoes().len(), 20);
        assert!(board.is_connected());
    }

    #[test]
    fn test_gaps_stay_even_after_each_placement() {
        let text = "x x x x\n\nx 6|6 x\n\nx x x x\n";
        let mut board = Board::create(text, 0, Some(6)).unwrap();
        let mut chooser = Watching {
            inner: RandomChooser::new(StdRng::seed_from_u64(19)),
            accepted: Vec::new(),
        };

        let outcome = board.fill(&mut chooser, &FillConfig::default());

        assert_eq!(outcome, FillOutcome::Filled);
        assert!(chooser.accepted.len() >= 5);
        for (count, even) in &chooser.accepted {
            assert!(even, "odd gap left with {} dominoes placed", count);
        }
    }

    #[test]
    fn test_same_seed_same_tiling() {
        let tile = |seed| {
            let mut board = Board::new(4, 3, Some(6));
            let mut chooser = RandomChooser::new(StdRng::seed_from_u64(seed));
            board.fill(&mut chooser, &FillConfig::default());
            board.display(false)
        };
        assert_eq!(tile(11), tile(11));
    }

    #[test]
    fn test_fill_without_matches() {
        let config = FillConfig {
            matches_allowed: false,
            ..FillConfig::default()
        };
        let mut filled = 0;
        for seed in 0..10 {
            let mut board = Board::new(4, 3, Some(6));
            let mut chooser = RandomChooser::new(StdRng::seed_from_u64(seed));
            if board.fill(&mut chooser, &config) == FillOutcome::Filled {
                filled += 1;
                assert!(!board.has_match(), "seed {} left a match", seed);
                assert_eq!(board.first_empty(), None);
            } else {
                assert_eq!(board.domino_count(), 0);
            }
        }
        assert!(filled > 0);
    }

    #[test]
    fn test_fill_keeps_existing_pieces() {
        let mut board = Board::create("x x x\n\n5|5 x\n", 0, Some(6)).unwrap();
        let mut chooser = RandomChooser::new(StdRng::seed_from_u64(3));

        assert_eq!(board.fill(&mut chooser, &FillConfig::default()), FillOutcome::Filled);
        assert_eq!(board.domino_count(), 3);
        assert_eq!(board.pips_at(Position::new(0, 0)), Some(5));
        assert!(!board.extra_dominoes().contains(&Domino::new(5, 5)));
    }

    #[test]
    fn test_impossible_fill_restores_board() {
        let mut board = Board::new(3, 1, Some(6));
        let mut chooser = RandomChooser::new(StdRng::seed_from_u64(1));
        assert_eq!(
            board.fill(&mut chooser, &FillConfig::default()),
            FillOutcome::Impossible
        );

        // One domino cannot cover four cells.
        let mut board = Board::new(2, 2, Some(0));
        assert_eq!(
            board.fill(&mut chooser, &FillConfig::default()),
            FillOutcome::Impossible
        );
        assert_eq!(board.domino_count(), 0);
        assert_eq!(board.extra_dominoes().len(), 1);
    }

    #[test]
    fn test_budget_exhaustion_restores_board() {
        let mut board = Board::new(2, 2, Some(6));
        let before = board.display(false);
        let mut chooser = RandomChooser::new(StdRng::seed_from_u64(5));
        let config = FillConfig {
            cycle_budget: 1,
            ..FillConfig::default()
        };

        assert_eq!(board.fill(&mut chooser, &config), FillOutcome::BudgetExhausted);
        assert_eq!(board.display(false), before);
        assert_eq!(board.extra_dominoes().len(), 28);
    }
}
