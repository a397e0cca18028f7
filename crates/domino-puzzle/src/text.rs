//! Canonical board text: rendering with [`Board::display`] and parsing with
//! [`Board::create`].
//!
//! Cropped display text doubles as graph node identity, so any change to the
//! output here changes which states the walker treats as equal. Bump
//! [`CANONICAL_FORMAT_VERSION`] when that happens.

use std::collections::BTreeMap;

use crate::board::{Arrow, Board, CropBounds, Direction, Domino, Position, SideChannels};
use crate::error::ParseError;

/// Version of the text grammar produced by [`Board::display`].
pub const CANONICAL_FORMAT_VERSION: u32 = 1;

const QUEUE_DIVIDER: &str = "===";
const STATE_DIVIDER: &str = "---";

impl Board {
    /// Render the board, optionally cropped to the occupied cells.
    pub fn display(&self, cropped: bool) -> String {
        self.display_with_bounds(cropped).0
    }

    /// Render the board and report the box that was drawn. Side channel
    /// coordinates are written relative to that box.
    pub fn display_with_bounds(&self, cropped: bool) -> (String, Option<CropBounds>) {
        let bounds = if cropped {
            self.occupied_bounds()
        } else if self.width() > 0 && self.height() > 0 {
            Some(CropBounds {
                xmin: 0,
                ymin: 0,
                xmax: self.width() - 1,
                ymax: self.height() - 1,
            })
        } else {
            None
        };

        let mut text = match bounds {
            Some(bounds) => self.render_grid(bounds),
            None => String::new(),
        };
        let side = match bounds {
            Some(bounds) => self.side.translated(-bounds.xmin, -bounds.ymin),
            None => self.side.clone(),
        };
        render_side_channels(&side, &mut text);
        (text, bounds)
    }

    fn render_grid(&self, bounds: CropBounds) -> String {
        let columns = ((bounds.xmax - bounds.xmin + 1) * 2 - 1) as usize;
        let rows = ((bounds.ymax - bounds.ymin + 1) * 2 - 1) as usize;
        let mut lines = vec![vec![' '; columns]; rows];

        for y in bounds.ymin..=bounds.ymax {
            let row = ((bounds.ymax - y) * 2) as usize;
            for x in bounds.xmin..=bounds.xmax {
                let column = ((x - bounds.xmin) * 2) as usize;
                let Some(cell) = self.cell(Position::new(x, y)) else {
                    lines[row][column] = 'x';
                    continue;
                };
                lines[row][column] = cell.symbol();

                let Some((domino, head)) = cell.domino.and_then(|id| self.placement(id)) else {
                    continue;
                };
                if head != cell.position {
                    continue;
                }
                let (dx, dy) = domino.direction.delta();
                let divider = if dx != 0 { '|' } else { '-' };
                let divider_row = row as i32 - dy;
                let divider_column = column as i32 + dx;
                if (0..rows as i32).contains(&divider_row)
                    && (0..columns as i32).contains(&divider_column)
                {
                    lines[divider_row as usize][divider_column as usize] = divider;
                }
            }
        }

        let mut text = String::new();
        for line in lines {
            let line: String = line.into_iter().collect();
            text.push_str(line.trim_end());
            text.push('\n');
        }
        text
    }

    /// Parse canonical text.
    ///
    /// `border` adds that many empty rings around the grid, shifting every
    /// coordinate including the side channels. Without `max_pips`, the domino
    /// set is sized from the highest visible pip value.
    pub fn create(text: &str, border: usize, max_pips: Option<u8>) -> Result<Board, ParseError> {
        let sections = split_sections(text)?;
        let grid = parse_grid(&sections.grid)?;
        let queue = match &sections.queue {
            Some(lines) => parse_queue(lines)?,
            None => Vec::new(),
        };
        let mut side = match &sections.state {
            Some(lines) => parse_state(lines)?,
            None => SideChannels::default(),
        };
        side.queue = queue;

        let offset = border as i32;
        let mut board = Board::new(
            grid.width + 2 * border,
            grid.height + 2 * border,
            None,
        );
        for (row, cells) in grid.cells.iter().enumerate() {
            let y = (grid.height - 1 - row) as i32 + offset;
            for (column, symbol) in cells.iter().enumerate() {
                let x = column as i32 + offset;
                match (symbol, grid.partner(column, row)) {
                    (Symbol::Empty, _) => {}
                    (Symbol::Pips(pips), Some(partner)) => {
                        // Each domino is placed once, from its head cell.
                        let direction = match partner {
                            (c, r) if r == row && c == column + 1 => Direction::Right,
                            (c, r) if c == column && r == row + 1 => Direction::Down,
                            _ => continue,
                        };
                        let Symbol::Pips(tail) = grid.cells[partner.1][partner.0] else {
                            continue;
                        };
                        let domino = Domino::new(*pips, tail).with_direction(direction);
                        board
                            .add(domino, x, y)
                            .map_err(|e| ParseError::new(grid.line_of(row), e.reason))?;
                    }
                    (Symbol::Pips(pips), None) => board
                        .add_cell(Some(*pips), x, y)
                        .map_err(|e| ParseError::new(grid.line_of(row), e.reason))?,
                    (Symbol::Wildcard, _) => board
                        .add_cell(None, x, y)
                        .map_err(|e| ParseError::new(grid.line_of(row), e.reason))?,
                }
            }
        }

        let visible = grid
            .cells
            .iter()
            .flatten()
            .filter_map(|symbol| match symbol {
                Symbol::Pips(pips) => Some(*pips),
                _ => None,
            })
            .chain(side.queue.iter().flat_map(|d| [d.head, d.tail]))
            .max();
        board.set_max_pips(max_pips.or(visible));
        board.side = side.translated(offset, offset);
        Ok(board)
    }
}

fn render_side_channels(side: &SideChannels, text: &mut String) {
    if !side.queue.is_empty() {
        let heads: Vec<String> = side.queue.iter().map(|d| d.head.to_string()).collect();
        let dashes: Vec<&str> = side.queue.iter().map(|_| "-").collect();
        let tails: Vec<String> = side.queue.iter().map(|d| d.tail.to_string()).collect();
        text.push_str(QUEUE_DIVIDER);
        text.push('\n');
        for line in [heads.join(" "), dashes.join(" "), tails.join(" ")] {
            text.push_str(&line);
            text.push('\n');
        }
    }

    let list = |key: &str, items: Vec<String>| {
        (!items.is_empty()).then(|| format!("{}:{}", key, items.join(",")))
    };
    let lines: Vec<String> = [
        list("dice", side.dice.iter().map(|(p, pips)| format!("{}{}", p, pips)).collect()),
        list("markers", side.markers.iter().map(|(name, p)| format!("{}{}", p, name)).collect()),
        side.target.map(|target| format!("target:{}", target)),
        list(
            "arrows",
            side.arrows
                .iter()
                .map(|a| {
                    let letter = a.direction.letter().to_ascii_uppercase();
                    format!("{}{}{}", a.position, letter, a.length)
                })
                .collect(),
        ),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !lines.is_empty() {
        text.push_str(STATE_DIVIDER);
        text.push('\n');
        for line in lines {
            text.push_str(&line);
            text.push('\n');
        }
    }
}

/// Lines of a section, each with its 1-based line number.
type Lines<'a> = Vec<(usize, &'a str)>;

struct Sections<'a> {
    grid: Lines<'a>,
    queue: Option<Lines<'a>>,
    state: Option<Lines<'a>>,
}

fn split_sections(text: &str) -> Result<Sections<'_>, ParseError> {
    let mut sections = Sections {
        grid: Vec::new(),
        queue: None,
        state: None,
    };
    for (i, line) in text.lines().enumerate() {
        let number = i + 1;
        let line = line.trim_end();
        if line == QUEUE_DIVIDER {
            if sections.queue.is_some() || sections.state.is_some() {
                return Err(ParseError::new(number, "unexpected queue divider"));
            }
            sections.queue = Some(Vec::new());
        } else if line == STATE_DIVIDER {
            if sections.state.is_some() {
                return Err(ParseError::new(number, "unexpected state divider"));
            }
            sections.state = Some(Vec::new());
        } else if let Some(state) = sections.state.as_mut() {
            state.push((number, line));
        } else if let Some(queue) = sections.queue.as_mut() {
            queue.push((number, line));
        } else {
            sections.grid.push((number, line));
        }
    }
    while matches!(sections.grid.last(), Some((_, line)) if line.is_empty()) {
        sections.grid.pop();
    }
    Ok(sections)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    Empty,
    Wildcard,
    Pips(u8),
}

struct ParsedGrid {
    width: usize,
    height: usize,
    /// Cell symbols by text row (top first) and column.
    cells: Vec<Vec<Symbol>>,
    partners: BTreeMap<(usize, usize), (usize, usize)>,
    line_numbers: Vec<usize>,
}

impl ParsedGrid {
    fn partner(&self, column: usize, row: usize) -> Option<(usize, usize)> {
        self.partners.get(&(column, row)).copied()
    }

    fn line_of(&self, row: usize) -> usize {
        self.line_numbers.get(row).copied().unwrap_or(0)
    }

    fn join(
        &mut self,
        a: (usize, usize),
        b: (usize, usize),
        line: usize,
    ) -> Result<(), ParseError> {
        for (column, row) in [a, b] {
            if !matches!(self.cells.get(row).and_then(|r| r.get(column)), Some(Symbol::Pips(_))) {
                return Err(ParseError::new(line, "join does not connect two pip cells"));
            }
            if self.partners.contains_key(&(column, row)) {
                return Err(ParseError::new(line, "cell joined to more than one partner"));
            }
        }
        self.partners.insert(a, b);
        self.partners.insert(b, a);
        Ok(())
    }
}

fn parse_grid(lines: &Lines<'_>) -> Result<ParsedGrid, ParseError> {
    if lines.is_empty() {
        return Ok(ParsedGrid {
            width: 0,
            height: 0,
            cells: Vec::new(),
            partners: BTreeMap::new(),
            line_numbers: Vec::new(),
        });
    }
    if lines.len() % 2 == 0 {
        let (number, _) = lines[lines.len() - 1];
        return Err(ParseError::new(number, "grid ends with a join row"));
    }
    let chars: Vec<Vec<char>> = lines.iter().map(|(_, line)| line.chars().collect()).collect();
    let width = chars.iter().map(|line| (line.len() + 1) / 2).max().unwrap_or(0);
    let height = (lines.len() + 1) / 2;

    let mut grid = ParsedGrid {
        width,
        height,
        cells: vec![vec![Symbol::Empty; width]; height],
        partners: BTreeMap::new(),
        line_numbers: (0..height).map(|row| lines[row * 2].0).collect(),
    };

    for row in 0..height {
        let (number, _) = lines[row * 2];
        for (column, &c) in chars[row * 2].iter().enumerate() {
            if column % 2 == 1 {
                continue;
            }
            grid.cells[row][column / 2] = match c {
                'x' | ' ' => Symbol::Empty,
                '#' => Symbol::Wildcard,
                _ => match c.to_digit(10) {
                    Some(pips) => Symbol::Pips(pips as u8),
                    None => {
                        return Err(ParseError::new(number, format!("invalid cell character {:?}", c)))
                    }
                },
            };
        }
    }

    for (i, line) in chars.iter().enumerate() {
        let number = lines[i].0;
        let row = i / 2;
        for (column, &c) in line.iter().enumerate() {
            let on_cell_row = i % 2 == 0;
            match (on_cell_row, column % 2 == 0, c) {
                (_, _, ' ') => {}
                (true, true, _) => {}
                (true, false, '|') => {
                    grid.join((column / 2, row), (column / 2 + 1, row), number)?;
                }
                (false, true, '-') => {
                    grid.join((column / 2, row), (column / 2, row + 1), number)?;
                }
                _ => {
                    return Err(ParseError::new(number, format!("invalid join character {:?}", c)))
                }
            }
        }
    }
    Ok(grid)
}

fn parse_digit(token: &str, line: usize) -> Result<u8, ParseError> {
    match token.parse::<u8>() {
        Ok(pips) if pips <= 9 && token.len() == 1 => Ok(pips),
        _ => Err(ParseError::new(line, format!("invalid pips {:?}", token))),
    }
}

fn parse_queue(lines: &Lines<'_>) -> Result<Vec<Domino>, ParseError> {
    let [(head_line, heads), (dash_line, dashes), (tail_line, tails)] = lines.as_slice() else {
        let line = lines.first().map_or(0, |(number, _)| *number);
        return Err(ParseError::new(line, "queue must have exactly three lines"));
    };
    let heads: Vec<&str> = heads.split_whitespace().collect();
    let dashes: Vec<&str> = dashes.split_whitespace().collect();
    let tails: Vec<&str> = tails.split_whitespace().collect();
    if dashes.len() != heads.len() || dashes.iter().any(|d| *d != "-") {
        return Err(ParseError::new(*dash_line, "queue dashes do not match heads"));
    }
    if tails.len() != heads.len() {
        return Err(ParseError::new(*tail_line, "queue tails do not match heads"));
    }
    heads
        .iter()
        .zip(&tails)
        .map(|(head, tail)| {
            Ok(Domino::new(
                parse_digit(head, *head_line)?,
                parse_digit(tail, *tail_line)?,
            ))
        })
        .collect()
}

/// Split `(x,y)A,(x,y)B` into positions and their payloads.
fn parse_positions(value: &str, line: usize) -> Result<Vec<(Position, &str)>, ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(Vec::new());
    }
    let bad = || ParseError::new(line, format!("invalid position list {:?}", value));
    let items: Vec<&str> = value.strip_prefix('(').ok_or_else(bad)?.split('(').collect();
    let last = items.len() - 1;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            // Every item but the last ends with the separating comma.
            let item = if i < last {
                item.trim_end().strip_suffix(',').ok_or_else(bad)?
            } else {
                *item
            };
            let (coords, payload) = item.split_once(')').ok_or_else(bad)?;
            let (x, y) = coords.split_once(',').ok_or_else(bad)?;
            let x = x.trim().parse().map_err(|_| bad())?;
            let y = y.trim().parse().map_err(|_| bad())?;
            Ok((Position::new(x, y), payload.trim()))
        })
        .collect()
}

fn parse_state(lines: &Lines<'_>) -> Result<SideChannels, ParseError> {
    let mut side = SideChannels::default();
    for &(number, line) in lines.iter().filter(|(_, line)| !line.is_empty()) {
        let invalid = |what: &str, token: &str| {
            ParseError::new(number, format!("invalid {} {:?}", what, token))
        };
        let (key, value) = line.split_once(':').ok_or_else(|| invalid("state line", line))?;
        match key {
            "dice" => {
                for (position, payload) in parse_positions(value, number)? {
                    side.dice.insert(position, parse_digit(payload, number)?);
                }
            }
            "markers" => {
                for (position, payload) in parse_positions(value, number)? {
                    let mut chars = payload.chars();
                    match (chars.next(), chars.next()) {
                        (Some(name), None) if name.is_ascii_alphabetic() => {
                            side.markers.insert(name, position);
                        }
                        _ => return Err(invalid("marker name", payload)),
                    }
                }
            }
            "target" => side.target = Some(parse_digit(value.trim(), number)?),
            "arrows" => {
                for (position, payload) in parse_positions(value, number)? {
                    let mut chars = payload.chars();
                    let direction = chars
                        .next()
                        .filter(char::is_ascii_uppercase)
                        .and_then(Direction::from_letter);
                    let length = chars.as_str().parse::<u32>();
                    let (Some(direction), Ok(length)) = (direction, length) else {
                        return Err(invalid("arrow", payload));
                    };
                    side.arrows.push(Arrow {
                        position,
                        direction,
                        length,
                    });
                }
            }
            _ => return Err(invalid("state key", key)),
        }
    }
    Ok(side)
}
