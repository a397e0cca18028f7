//! Grid model: positions, cells, dominoes and the board that holds them.
//!
//! The board owns every cell and domino. Cells refer to their domino by a
//! stable [`DominoId`], so a domino keeps its id while it is moved, rotated or
//! flipped, and a removed domino can be restored into the same slot.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::BadPosition;

/// Pip count used when a board has no other way to know its domino set.
pub const DEFAULT_MAX_PIPS: u8 = 6;

/// Position on the grid. `y` grows upward, so row 0 is the bottom text row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Head-to-tail direction of a domino, counter-clockwise from the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Right,
    Up,
    Left,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Up,
        Direction::Left,
        Direction::Down,
    ];

    pub fn degrees(self) -> i32 {
        self as i32 * 90
    }

    /// Snap any multiple of 90 degrees (negative values included) to a direction.
    pub fn from_degrees(degrees: i32) -> Option<Direction> {
        if degrees % 90 != 0 {
            return None;
        }
        Some(Self::ALL[(degrees.rem_euclid(360) / 90) as usize])
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::Up => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Down => (0, -1),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        Self::ALL.into_iter().find(|d| d.delta() == (dx, dy))
    }

    pub fn rotate(self, degrees: i32) -> Option<Direction> {
        Self::from_degrees(self.degrees() + degrees)
    }

    pub fn reverse(self) -> Direction {
        Self::ALL[(self as usize + 2) % 4]
    }

    /// Lowercase move letter: `r`, `u`, `l` or `d`.
    pub fn letter(self) -> char {
        match self {
            Direction::Right => 'r',
            Direction::Up => 'u',
            Direction::Left => 'l',
            Direction::Down => 'd',
        }
    }

    /// Case-insensitive inverse of [`Direction::letter`].
    pub fn from_letter(letter: char) -> Option<Direction> {
        let letter = letter.to_ascii_lowercase();
        Self::ALL.into_iter().find(|d| d.letter() == letter)
    }
}

/// A domino tile. Equality and hashing ignore order and direction, so
/// `5|3 == 3|5`.
#[derive(Debug, Clone, Copy)]
pub struct Domino {
    pub head: u8,
    pub tail: u8,
    pub direction: Direction,
}

impl Domino {
    pub fn new(head: u8, tail: u8) -> Self {
        Self {
            head,
            tail,
            direction: Direction::Right,
        }
    }

    pub fn with_direction(self, direction: Direction) -> Self {
        Self { direction, ..self }
    }

    /// Swap head and tail, keeping the direction.
    pub fn reversed(self) -> Self {
        Self {
            head: self.tail,
            tail: self.head,
            direction: self.direction,
        }
    }

    pub fn is_double(&self) -> bool {
        self.head == self.tail
    }

    fn key(&self) -> (u8, u8) {
        (self.head.min(self.tail), self.head.max(self.tail))
    }

    /// True if the two dominoes have any pip value in common.
    pub fn shares_pips(&self, other: &Domino) -> bool {
        [self.head, self.tail].iter().any(|&p| p == other.head || p == other.tail)
    }

    /// Pips in current orientation, as used in move labels.
    pub fn label(&self) -> String {
        format!("{}{}", self.head, self.tail)
    }
}

impl PartialEq for Domino {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Domino {}

impl Hash for Domino {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Domino {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.head, self.tail)
    }
}

/// Every domino from `0|0` up to `max_pips|max_pips`.
pub fn domino_set(max_pips: u8) -> Vec<Domino> {
    let mut dominoes = Vec::new();
    for head in 0..=max_pips {
        for tail in head..=max_pips {
            dominoes.push(Domino::new(head, tail));
        }
    }
    dominoes
}

/// Stable handle to a domino placed on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DominoId(pub(crate) usize);

/// One occupied grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// `None` for a `#` wildcard.
    pub pips: Option<u8>,
    pub position: Position,
    pub domino: Option<DominoId>,
}

impl Cell {
    pub fn is_wildcard(&self) -> bool {
        self.pips.is_none()
    }

    /// Equal pips; wildcards never match anything.
    pub fn matches(&self, other: &Cell) -> bool {
        matches!((self.pips, other.pips), (Some(a), Some(b)) if a == b)
    }

    pub fn symbol(&self) -> char {
        match self.pips {
            Some(pips) => char::from_digit(u32::from(pips), 10).unwrap_or('?'),
            None => '#',
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    domino: Domino,
    head: Position,
}

impl Placement {
    fn tail(&self) -> Position {
        self.head.step(self.domino.direction)
    }
}

/// Diagram arrow annotation: `arrows:(x,y)R2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrow {
    pub position: Position,
    pub direction: Direction,
    pub length: u32,
}

/// Variant state carried alongside the grid. The grid logic never reads it;
/// it is rendered after the `===` and `---` dividers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideChannels {
    /// Dominoes waiting to be placed, front first.
    pub queue: Vec<Domino>,
    pub dice: BTreeMap<Position, u8>,
    pub markers: BTreeMap<char, Position>,
    pub target: Option<u8>,
    pub arrows: Vec<Arrow>,
}

impl SideChannels {
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
            && self.dice.is_empty()
            && self.markers.is_empty()
            && self.target.is_none()
            && self.arrows.is_empty()
    }

    /// Copy with every coordinate shifted by `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> SideChannels {
        SideChannels {
            queue: self.queue.clone(),
            dice: self
                .dice
                .iter()
                .map(|(position, pips)| (position.offset(dx, dy), *pips))
                .collect(),
            markers: self
                .markers
                .iter()
                .map(|(name, position)| (*name, position.offset(dx, dy)))
                .collect(),
            target: self.target,
            arrows: self
                .arrows
                .iter()
                .map(|arrow| Arrow {
                    position: arrow.position.offset(dx, dy),
                    ..*arrow
                })
                .collect(),
        }
    }
}

/// Inclusive bounding box reported when a display is cropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBounds {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

/// A rectangular grid of cells and dominoes plus the unplaced domino pool.
#[derive(Debug, Clone)]
pub struct Board {
    width: i32,
    height: i32,
    grid: Vec<Option<Cell>>,
    placements: Vec<Option<Placement>>,
    extra_dominoes: Vec<Domino>,
    max_pips: Option<u8>,
    pub side: SideChannels,
}

impl Board {
    /// Create an empty board. With `max_pips`, the whole domino set starts in
    /// the extra pool.
    pub fn new(width: usize, height: usize, max_pips: Option<u8>) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
            grid: vec![None; width * height],
            placements: Vec::new(),
            extra_dominoes: max_pips.map(domino_set).unwrap_or_default(),
            max_pips,
            side: SideChannels::default(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn max_pips(&self) -> Option<u8> {
        self.max_pips
    }

    pub fn extra_dominoes(&self) -> &[Domino] {
        &self.extra_dominoes
    }

    /// Reset the domino set, rebuilding the extra pool from what is placed.
    pub fn set_max_pips(&mut self, max_pips: Option<u8>) {
        self.max_pips = max_pips;
        self.extra_dominoes = max_pips.map(domino_set).unwrap_or_default();
        let placed: Vec<Domino> = self.placements.iter().flatten().map(|p| p.domino).collect();
        for domino in placed {
            self.take_from_pool(&domino);
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0 && position.y >= 0 && position.x < self.width && position.y < self.height
    }

    fn index(&self, position: Position) -> Option<usize> {
        if self.contains(position) {
            Some((position.y * self.width + position.x) as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, position: Position) -> Option<&Cell> {
        self.index(position).and_then(|i| self.grid[i].as_ref())
    }

    pub fn pips_at(&self, position: Position) -> Option<u8> {
        self.cell(position).and_then(|cell| cell.pips)
    }

    /// In bounds and unoccupied.
    pub fn is_empty_at(&self, position: Position) -> bool {
        matches!(self.index(position), Some(i) if self.grid[i].is_none())
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.grid.iter().flatten()
    }

    pub fn domino_ids(&self) -> Vec<DominoId> {
        self.placements
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| DominoId(i))
            .collect()
    }

    pub fn dominoes(&self) -> impl Iterator<Item = &Domino> {
        self.placements.iter().flatten().map(|p| &p.domino)
    }

    pub fn domino_count(&self) -> usize {
        self.placements.iter().flatten().count()
    }

    pub fn domino(&self, id: DominoId) -> Option<Domino> {
        self.placement(id).map(|(domino, _)| domino)
    }

    /// The domino and its head position.
    pub fn placement(&self, id: DominoId) -> Option<(Domino, Position)> {
        self.require(id).ok().map(|p| (p.domino, p.head))
    }

    /// Head and tail positions.
    pub fn domino_cells(&self, id: DominoId) -> Option<(Position, Position)> {
        self.require(id).ok().map(|p| (p.head, p.tail()))
    }

    pub fn domino_at(&self, position: Position) -> Option<DominoId> {
        self.cell(position).and_then(|cell| cell.domino)
    }

    fn require(&self, id: DominoId) -> Result<Placement, BadPosition> {
        self.placements
            .get(id.0)
            .and_then(|slot| *slot)
            .ok_or_else(|| BadPosition::new(format!("domino {:?} is not on the board", id)))
    }

    /// In-bounds edge neighbours of a position.
    pub fn neighbours(&self, position: Position) -> SmallVec<[Position; 4]> {
        Direction::ALL
            .iter()
            .map(|&direction| position.step(direction))
            .filter(|&p| self.contains(p))
            .collect()
    }

    /// Occupied edge neighbours of a position.
    pub fn neighbour_cells(&self, position: Position) -> SmallVec<[Cell; 4]> {
        self.neighbours(position)
            .into_iter()
            .filter_map(|p| self.cell(p).copied())
            .collect()
    }

    fn ensure_free(&self, position: Position, owner: Option<DominoId>) -> Result<usize, BadPosition> {
        let index = self
            .index(position)
            .ok_or_else(|| BadPosition::new(format!("{} is off the board", position)))?;
        match &self.grid[index] {
            Some(cell) if owner.is_none() || cell.domino != owner => {
                Err(BadPosition::new(format!("{} is occupied", position)))
            }
            _ => Ok(index),
        }
    }

    /// Place a lone cell.
    pub fn add_cell(&mut self, pips: Option<u8>, x: i32, y: i32) -> Result<(), BadPosition> {
        let position = Position::new(x, y);
        let index = self.ensure_free(position, None)?;
        self.grid[index] = Some(Cell {
            pips,
            position,
            domino: None,
        });
        Ok(())
    }

    /// Remove a lone cell, returning its pips.
    pub fn remove_cell(&mut self, x: i32, y: i32) -> Result<Option<u8>, BadPosition> {
        let position = Position::new(x, y);
        let index = self
            .index(position)
            .ok_or_else(|| BadPosition::new(format!("{} is off the board", position)))?;
        match self.grid[index] {
            Some(cell) if cell.domino.is_none() => {
                self.grid[index] = None;
                Ok(cell.pips)
            }
            Some(_) => Err(BadPosition::new(format!("{} belongs to a domino", position))),
            None => Err(BadPosition::new(format!("{} is empty", position))),
        }
    }

    /// Place a domino with its head at `(x, y)`. Both cells must be in bounds
    /// and free; nothing changes on failure.
    pub fn add(&mut self, domino: Domino, x: i32, y: i32) -> Result<DominoId, BadPosition> {
        let id = DominoId(self.placements.len());
        self.placements.push(None);
        if let Err(error) = self.relocate(id, domino, Position::new(x, y)) {
            self.placements.pop();
            return Err(error);
        }
        self.take_from_pool(&domino);
        Ok(id)
    }

    /// Detach a domino; it returns to the extra pool if it belongs to the set.
    pub fn remove(&mut self, id: DominoId) -> Result<Domino, BadPosition> {
        let placement = self.require(id)?;
        for position in [placement.head, placement.tail()] {
            if let Some(index) = self.index(position) {
                self.grid[index] = None;
            }
        }
        self.placements[id.0] = None;
        while matches!(self.placements.last(), Some(None)) {
            self.placements.pop();
        }
        self.return_to_pool(placement.domino);
        Ok(placement.domino)
    }

    /// Put a removed domino back into its old slot.
    pub(crate) fn reinsert(
        &mut self,
        id: DominoId,
        domino: Domino,
        head: Position,
    ) -> Result<(), BadPosition> {
        if self.placements.len() <= id.0 {
            self.placements.resize(id.0 + 1, None);
        }
        self.relocate(id, domino, head)?;
        self.take_from_pool(&domino);
        Ok(())
    }

    /// Move (or first place) a domino so its head sits at `head`. Checks both
    /// target cells before touching the grid.
    pub(crate) fn relocate(
        &mut self,
        id: DominoId,
        domino: Domino,
        head: Position,
    ) -> Result<(), BadPosition> {
        let tail = head.step(domino.direction);
        let head_index = self.ensure_free(head, Some(id))?;
        let tail_index = self.ensure_free(tail, Some(id))?;
        if let Some(old) = self.placements[id.0].take() {
            for position in [old.head, old.tail()] {
                if let Some(index) = self.index(position) {
                    self.grid[index] = None;
                }
            }
        }
        self.grid[head_index] = Some(Cell {
            pips: Some(domino.head),
            position: head,
            domino: Some(id),
        });
        self.grid[tail_index] = Some(Cell {
            pips: Some(domino.tail),
            position: tail,
            domino: Some(id),
        });
        self.placements[id.0] = Some(Placement { domino, head });
        Ok(())
    }

    pub fn move_domino(&mut self, id: DominoId, dx: i32, dy: i32) -> Result<(), BadPosition> {
        let placement = self.require(id)?;
        self.relocate(id, placement.domino, placement.head.offset(dx, dy))
    }

    /// Rotate counter-clockwise around the head cell.
    pub fn rotate(&mut self, id: DominoId, degrees: i32) -> Result<(), BadPosition> {
        let placement = self.require(id)?;
        let direction = placement
            .domino
            .direction
            .rotate(degrees)
            .ok_or_else(|| BadPosition::new(format!("cannot rotate by {} degrees", degrees)))?;
        self.relocate(id, placement.domino.with_direction(direction), placement.head)
    }

    pub fn rotate_to(&mut self, id: DominoId, direction: Direction) -> Result<(), BadPosition> {
        let placement = self.require(id)?;
        self.relocate(id, placement.domino.with_direction(direction), placement.head)
    }

    /// Swap head and tail in place; the domino covers the same two cells.
    pub fn flip(&mut self, id: DominoId) -> Result<(), BadPosition> {
        let placement = self.require(id)?;
        let flipped = placement
            .domino
            .reversed()
            .with_direction(placement.domino.direction.reverse());
        self.relocate(id, flipped, placement.tail())
    }

    fn take_from_pool(&mut self, domino: &Domino) {
        if let Some(i) = self.extra_dominoes.iter().position(|d| d == domino) {
            self.extra_dominoes.remove(i);
        }
    }

    fn return_to_pool(&mut self, domino: Domino) {
        let Some(max_pips) = self.max_pips else {
            return;
        };
        let in_set = domino.head <= max_pips && domino.tail <= max_pips;
        let still_placed = self.dominoes().any(|d| *d == domino);
        if in_set && !still_placed && !self.extra_dominoes.contains(&domino) {
            self.extra_dominoes.push(domino.with_direction(Direction::Right));
        }
    }

    /// Flood fill over edge adjacency; an empty board counts as connected.
    pub fn is_connected(&self) -> bool {
        let occupied = self.grid.iter().filter(|slot| slot.is_some()).count();
        let Some(start) = self.cells().next().map(|cell| cell.position) else {
            return true;
        };
        let mut visited = vec![false; self.grid.len()];
        let mut pending = VecDeque::from([start]);
        let mut reached = 0;
        while let Some(position) = pending.pop_front() {
            let Some(index) = self.index(position) else {
                continue;
            };
            if visited[index] || self.grid[index].is_none() {
                continue;
            }
            visited[index] = true;
            reached += 1;
            pending.extend(self.neighbours(position));
        }
        reached == occupied
    }

    /// Ids of dominoes touching `id` along an edge.
    pub fn neighbouring_dominoes(&self, id: DominoId) -> BTreeSet<DominoId> {
        self.domino_cells(id)
            .into_iter()
            .flat_map(|(head, tail)| [head, tail])
            .flat_map(|position| self.neighbour_cells(position))
            .filter_map(|cell| cell.domino)
            .filter(|&other| other != id)
            .collect()
    }

    /// A domino with no neighbouring domino sharing a pip value is a loner.
    pub fn has_loner(&self) -> bool {
        self.domino_ids().into_iter().any(|id| self.is_loner(id))
    }

    pub fn is_loner(&self, id: DominoId) -> bool {
        let Some(domino) = self.domino(id) else {
            return false;
        };
        !self
            .neighbouring_dominoes(id)
            .into_iter()
            .filter_map(|other| self.domino(other))
            .any(|other| domino.shares_pips(&other))
    }

    fn cell_has_match(&self, cell: &Cell) -> bool {
        self.neighbour_cells(cell.position)
            .iter()
            .any(|n| cell.matches(n) && (cell.domino.is_none() || n.domino != cell.domino))
    }

    /// Positions of cells that sit next to an equal cell of another piece.
    pub fn find_matches(&self) -> Vec<Position> {
        self.cells()
            .filter(|cell| self.cell_has_match(cell))
            .map(|cell| cell.position)
            .collect()
    }

    pub fn has_match(&self) -> bool {
        self.cells().any(|cell| self.cell_has_match(cell))
    }

    pub fn domino_has_match(&self, id: DominoId) -> bool {
        let Some((head, tail)) = self.domino_cells(id) else {
            return false;
        };
        [head, tail]
            .iter()
            .filter_map(|&p| self.cell(p))
            .any(|cell| self.cell_has_match(cell))
    }

    /// Every connected region of empty cells has an even size.
    pub fn has_even_gaps(&self) -> bool {
        let mut visited = vec![false; self.grid.len()];
        for start in 0..self.grid.len() {
            if visited[start] || self.grid[start].is_some() {
                continue;
            }
            let mut size = 0;
            let mut pending = vec![start];
            visited[start] = true;
            while let Some(index) = pending.pop() {
                size += 1;
                let position = Position::new(index as i32 % self.width, index as i32 / self.width);
                for neighbour in self.neighbours(position) {
                    if let Some(n) = self.index(neighbour) {
                        if !visited[n] && self.grid[n].is_none() {
                            visited[n] = true;
                            pending.push(n);
                        }
                    }
                }
            }
            if size % 2 == 1 {
                return false;
            }
        }
        true
    }

    /// First empty cell scanning rows bottom-up, left to right.
    pub fn first_empty(&self) -> Option<Position> {
        self.grid
            .iter()
            .position(|slot| slot.is_none())
            .map(|i| Position::new(i as i32 % self.width, i as i32 / self.width))
    }

    /// Bounding box of all occupied cells.
    pub fn occupied_bounds(&self) -> Option<CropBounds> {
        self.cells().map(|cell| cell.position).fold(None, |bounds, p| {
            Some(match bounds {
                None => CropBounds {
                    xmin: p.x,
                    ymin: p.y,
                    xmax: p.x,
                    ymax: p.y,
                },
                Some(b) => CropBounds {
                    xmin: b.xmin.min(p.x),
                    ymin: b.ymin.min(p.y),
                    xmax: b.xmax.max(p.x),
                    ymax: b.ymax.max(p.y),
                },
            })
        })
    }
}

/// Boards are equal when they render the same canonical text.
impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.display(false) == other.display(false)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display(false))
    }
}
