use std::collections::VecDeque;

use crate::maze::{Grid, Pos, SEED};

/// Step counts from `start` to every open cell, `None` where unreachable.
pub fn bfs_distance(grid: &Grid, start: Pos) -> Vec<Vec<Option<u32>>> {
    let mut dist = vec![vec![None; grid.cols()]; grid.rows()];
    if !grid.is_open(start) {
        return dist;
    }
    let mut q = VecDeque::new();
    dist[start.y][start.x] = Some(0);
    q.push_back(start);

    while let Some(pos) = q.pop_front() {
        let base = dist[pos.y][pos.x].unwrap_or(0);
        for next in grid.neighbors(pos) {
            if grid.is_open(next) && dist[next.y][next.x].is_none() {
                dist[next.y][next.x] = Some(base + 1);
                q.push_back(next);
            }
        }
    }
    dist
}

pub fn flood(grid: &Grid, start: Pos) -> Vec<Vec<bool>> {
    bfs_distance(grid, start)
        .into_iter()
        .map(|row| row.into_iter().map(|d| d.is_some()).collect())
        .collect()
}

/// Whether every open cell can be reached from the seed cell.
pub fn is_connected(grid: &Grid) -> bool {
    if !grid.is_open(SEED) {
        return false;
    }
    let reach = flood(grid, SEED);
    grid.open_cells().iter().all(|p| reach[p.y][p.x])
}

/// Number of horizontally or vertically adjacent open-open pairs.
pub fn open_edge_count(grid: &Grid) -> usize {
    let mut edges = 0;
    for pos in grid.open_cells() {
        let right = Pos::new(pos.x + 1, pos.y);
        let down = Pos::new(pos.x, pos.y + 1);
        edges += usize::from(grid.is_open(right)) + usize::from(grid.is_open(down));
    }
    edges
}

/// Connected and cycle-free: the open cells form a tree.
pub fn is_perfect(grid: &Grid) -> bool {
    is_connected(grid) && grid.open_count() == open_edge_count(grid) + 1
}

/// Opens the shortest run of interior cells that joins `target` to the part of
/// the maze reachable from the seed. Returns how many wall cells were carved,
/// zero when `target` was already reachable or cannot be joined.
pub fn connect_to_seed(grid: &mut Grid, target: Pos) -> usize {
    if !grid.is_interior(target) {
        return 0;
    }
    let reach = flood(grid, SEED);
    if reach[target.y][target.x] {
        return 0;
    }

    let mut prev: Vec<Vec<Option<Pos>>> = vec![vec![None; grid.cols()]; grid.rows()];
    let mut seen = vec![vec![false; grid.cols()]; grid.rows()];
    let mut q = VecDeque::new();
    seen[target.y][target.x] = true;
    q.push_back(target);

    let mut found = None;
    while let Some(pos) = q.pop_front() {
        if reach[pos.y][pos.x] {
            found = Some(pos);
            break;
        }
        for next in grid.neighbors(pos) {
            if !grid.is_interior(next) || seen[next.y][next.x] {
                continue;
            }
            seen[next.y][next.x] = true;
            prev[next.y][next.x] = Some(pos);
            q.push_back(next);
        }
    }

    let Some(mut pos) = found else {
        return 0;
    };
    let mut carved = 0;
    while let Some(back) = prev[pos.y][pos.x] {
        pos = back;
        if !grid.is_open(pos) {
            grid.open(pos);
            carved += 1;
        }
    }
    carved
}
