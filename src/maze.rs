use rand::Rng;
use std::error::Error;
use std::fmt;
use tracing::debug;

/// Smallest row/column count that still leaves one interior cell to seed from.
pub const MIN_DIM: usize = 3;

/// Every maze is carved outward from this cell.
pub const SEED: Pos = Pos { x: 1, y: 1 };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Wall,
    Open,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Moves `dist` cells towards `dir`, or `None` when that would leave the
    /// non-negative quadrant.
    pub fn offset(self, dir: Dir, dist: usize) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        let dist = isize::try_from(dist).ok()?;
        Some(Pos {
            x: self.x.checked_add_signed(dx * dist)?,
            y: self.y.checked_add_signed(dy * dist)?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Right,
    Down,
    Left,
}

impl Dir {
    /// Candidate order used while carving.
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Right, Dir::Down, Dir::Left];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (0, -1),
            Dir::Right => (1, 0),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MazeError {
    InvalidDimensions { rows: usize, cols: usize },
}

impl fmt::Display for MazeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MazeError::InvalidDimensions { rows, cols } => write!(
                f,
                "invalid maze dimensions {rows}x{cols}: rows and cols must both be at least {MIN_DIM}"
            ),
        }
    }
}

impl Error for MazeError {}

/// Uniform choice over a non-empty, ordered set of candidates.
///
/// Every [`Rng`] is a `RandomChoice`, so a seeded `StdRng` gives reproducible
/// mazes. [`ScriptedChoices`] and [`RecordingChoices`] exist for replaying an
/// exact sequence of picks.
pub trait RandomChoice {
    /// # Panics
    ///
    /// Implementations may panic when `options` is empty.
    fn pick<T: Copy>(&mut self, options: &[T]) -> T;
}

impl<R: Rng + ?Sized> RandomChoice for R {
    fn pick<T: Copy>(&mut self, options: &[T]) -> T {
        options[self.gen_range(0..options.len())]
    }
}

/// Replays a fixed list of candidate indices. Indices wrap around the number
/// of candidates on offer; once the script runs out, the first candidate wins.
#[derive(Clone, Debug, Default)]
pub struct ScriptedChoices {
    script: Vec<usize>,
    next: usize,
}

impl ScriptedChoices {
    pub fn new(script: Vec<usize>) -> Self {
        Self { script, next: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.script.len().saturating_sub(self.next)
    }
}

impl RandomChoice for ScriptedChoices {
    fn pick<T: Copy>(&mut self, options: &[T]) -> T {
        let idx = self.script.get(self.next).copied().unwrap_or(0);
        self.next += 1;
        options[idx % options.len()]
    }
}

/// Wraps an [`Rng`] and remembers every index it picked, so the run can be fed
/// back through [`ScriptedChoices`].
#[derive(Debug)]
pub struct RecordingChoices<R> {
    rng: R,
    picks: Vec<usize>,
}

impl<R: Rng> RecordingChoices<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            picks: Vec::new(),
        }
    }

    pub fn picks(&self) -> &[usize] {
        &self.picks
    }

    pub fn into_script(self) -> ScriptedChoices {
        ScriptedChoices::new(self.picks)
    }
}

impl<R: Rng> RandomChoice for RecordingChoices<R> {
    fn pick<T: Copy>(&mut self, options: &[T]) -> T {
        let idx = self.rng.gen_range(0..options.len());
        self.picks.push(idx);
        options[idx]
    }
}

/// Rectangular wall/open map, stored as rows of cells (`cells[y][x]`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    fn filled(rows: usize, cols: usize, cell: Cell) -> Self {
        Self {
            rows,
            cols,
            cells: vec![vec![cell; cols]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.cols && pos.y < self.rows
    }

    /// # Panics
    ///
    /// Panics when `pos` lies outside the grid; use [`Grid::cell_at`] for
    /// unchecked coordinates.
    pub fn cell(&self, pos: Pos) -> Cell {
        self.cells[pos.y][pos.x]
    }

    pub fn cell_at(&self, x: usize, y: usize) -> Option<Cell> {
        self.cells.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Out-of-range positions count as walls.
    pub fn is_open(&self, pos: Pos) -> bool {
        self.cell_at(pos.x, pos.y) == Some(Cell::Open)
    }

    pub fn is_border(&self, pos: Pos) -> bool {
        self.contains(pos)
            && (pos.x == 0 || pos.y == 0 || pos.x == self.cols - 1 || pos.y == self.rows - 1)
    }

    pub fn is_interior(&self, pos: Pos) -> bool {
        pos.x >= 1 && pos.y >= 1 && pos.x + 1 < self.cols && pos.y + 1 < self.rows
    }

    /// Forces a cell open. Meant for level setup (opening the exit) before the
    /// grid is handed to anything that reads it.
    ///
    /// # Panics
    ///
    /// Panics if `pos` lies outside the grid.
    pub fn open(&mut self, pos: Pos) {
        self.cells[pos.y][pos.x] = Cell::Open;
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.iter().map(Vec::as_slice)
    }

    /// Open cells in row-major order.
    pub fn open_cells(&self) -> Vec<Pos> {
        let mut cells = Vec::new();
        for (y, row) in self.cells.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if *cell == Cell::Open {
                    cells.push(Pos { x, y });
                }
            }
        }
        cells
    }

    pub fn open_count(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .filter(|cell| **cell == Cell::Open)
            .count()
    }

    /// In-bounds 4-neighbours of `pos`, in [`Dir::ALL`] order.
    pub fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        Dir::ALL
            .into_iter()
            .filter_map(move |dir| pos.offset(dir, 1))
            .filter(move |next| self.contains(*next))
    }

    #[cfg(test)]
    pub(crate) fn from_ascii(text: &str) -> Self {
        let cells: Vec<Vec<Cell>> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.chars()
                    .map(|c| if c == '#' { Cell::Wall } else { Cell::Open })
                    .collect()
            })
            .collect();
        Self {
            rows: cells.len(),
            cols: cells.first().map_or(0, Vec::len),
            cells,
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for cell in row {
                let c = match cell {
                    Cell::Wall => '#',
                    Cell::Open => '.',
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Carves a perfect maze with an iterative randomized depth-first search.
///
/// Starting from [`SEED`], the generator repeatedly looks two cells away in
/// each direction for an interior cell that is still a wall, opens the cell in
/// between and the target, and pushes the target. Dead ends pop the stack.
/// The open cells form a spanning tree over the odd-coordinate lattice, so
/// there is exactly one path between any two of them and the border is never
/// touched.
///
/// Even dimensions are accepted and the grid keeps the requested size, but the
/// lattice cannot reach the last interior row/column: with an even `cols`,
/// column `cols - 2` stays all wall (likewise row `rows - 2` for an even
/// `rows`).
pub fn generate(
    rows: usize,
    cols: usize,
    chooser: &mut impl RandomChoice,
) -> Result<Grid, MazeError> {
    if rows < MIN_DIM || cols < MIN_DIM {
        return Err(MazeError::InvalidDimensions { rows, cols });
    }
    if rows % 2 == 0 || cols % 2 == 0 {
        debug!(rows, cols, "even maze dimension, last interior row/column stays wall");
    }

    let mut grid = Grid::filled(rows, cols, Cell::Wall);
    let mut stack = vec![SEED];
    grid.open(SEED);
    let mut candidates: Vec<(Pos, Pos)> = Vec::with_capacity(Dir::ALL.len());

    while let Some(&current) = stack.last() {
        candidates.clear();
        for dir in Dir::ALL {
            let (Some(between), Some(next)) = (current.offset(dir, 1), current.offset(dir, 2))
            else {
                continue;
            };
            if grid.is_interior(next) && grid.cell(next) == Cell::Wall {
                candidates.push((between, next));
            }
        }

        if candidates.is_empty() {
            stack.pop();
            continue;
        }

        let (between, next) = chooser.pick(&candidates);
        grid.open(between);
        grid.open(next);
        stack.push(next);
    }

    debug!(rows, cols, open = grid.open_count(), "generated maze");
    Ok(grid)
}
