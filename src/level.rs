use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::maze::{self, Dir, Grid, MazeError, Pos, SEED};
use crate::paths;

pub const PLAYFIELD_W: usize = 1000;
pub const PLAYFIELD_H: usize = 620;
pub const TICKS_PER_SECOND: u32 = 10;
const BASE_TILE: usize = 40;
const MIN_TILE: usize = 20;
const TILE_SHRINK: usize = 3;
const BASE_ENEMIES: usize = 2;
const MAX_ENEMIES: usize = 10;
const BASE_COINS: usize = 3;
const MAX_COINS: usize = 20;
const BASE_ITEMS: usize = 3;
const MAX_ITEMS: usize = 10;
const TIMED_FROM_LEVEL: u32 = 5;
const TIME_LIMIT_SECS: u32 = 90;
const ENEMY_BASE_INTERVAL: u32 = 12;
const ENEMY_MIN_INTERVAL: u32 = 3;
const EXIT_INSET: usize = 3;
const ENEMY_MARGIN: usize = 3;
const FIRE_COOLDOWN_TICKS: u32 = 4;

/// Per-level tuning. Later levels shrink the tiles (so the maze grows), add
/// enemies, coins and items, and speed enemies up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelConfig {
    pub level: u32,
    pub tile_size: usize,
    pub rows: usize,
    pub cols: usize,
    pub enemies: usize,
    pub coins: usize,
    pub items: usize,
    pub time_limit_ticks: Option<u32>,
    pub enemy_interval: u32,
}

impl LevelConfig {
    pub fn for_level(level: u32) -> Self {
        let level = level.max(1);
        let steps = (level - 1) as usize;
        let tile_size = BASE_TILE
            .saturating_sub(steps.saturating_mul(TILE_SHRINK))
            .max(MIN_TILE);
        let half = (level / 2) as usize;

        Self {
            level,
            tile_size,
            rows: PLAYFIELD_H / tile_size,
            cols: PLAYFIELD_W / tile_size,
            enemies: (BASE_ENEMIES + half).min(MAX_ENEMIES),
            coins: (level as usize + BASE_COINS).min(MAX_COINS),
            items: (BASE_ITEMS + half).min(MAX_ITEMS),
            time_limit_ticks: (level >= TIMED_FROM_LEVEL)
                .then_some(TIME_LIMIT_SECS * TICKS_PER_SECOND),
            enemy_interval: ENEMY_BASE_INTERVAL
                .saturating_sub(level)
                .max(ENEMY_MIN_INTERVAL),
        }
    }

    pub fn with_size(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Exit sits three cells in from the bottom-right corner, clamped into the
    /// interior for tiny grids.
    pub fn exit(&self) -> Pos {
        Pos::new(
            self.cols.saturating_sub(EXIT_INSET).max(1),
            self.rows.saturating_sub(EXIT_INSET).max(1),
        )
    }
}

/// What the player asks for in one tick: a step, a shot, both, or neither.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Input {
    pub walk: Option<Dir>,
    pub fire: Option<Dir>,
}

impl Input {
    pub const IDLE: Input = Input {
        walk: None,
        fire: None,
    };

    pub fn walk(dir: Dir) -> Self {
        Self {
            walk: Some(dir),
            fire: None,
        }
    }

    pub fn fire(dir: Dir) -> Self {
        Self {
            walk: None,
            fire: Some(dir),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Projectile {
    pub pos: Pos,
    pub dir: Dir,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelEvent {
    Bumped,
    CoinCollected,
    ItemCollected { collected: usize, total: usize },
    HitEnemy,
    EnemyDestroyed,
    ExitLocked { remaining: usize },
    Completed,
    TimedOut,
}

#[derive(Clone, Debug)]
pub struct Level {
    config: LevelConfig,
    grid: Grid,
    start: Pos,
    exit: Pos,
    player: Pos,
    enemies: Vec<Pos>,
    coins: Vec<Pos>,
    items: Vec<Pos>,
    items_total: usize,
    projectiles: Vec<Projectile>,
    last_shot: Option<u32>,
    ticks: u32,
    enemy_tick: u32,
    finished: bool,
}

impl Level {
    /// Generates the maze, opens and wires up the exit, then scatters enemies,
    /// coins and items over distinct open cells.
    pub fn setup(config: LevelConfig, rng: &mut impl Rng) -> Result<Self, MazeError> {
        let mut grid = maze::generate(config.rows, config.cols, rng)?;
        let exit = config.exit();
        grid.open(exit);
        let carved = paths::connect_to_seed(&mut grid, exit);

        let start = SEED;
        let mut occupied = vec![start, exit];
        let (x_max, y_max) = (
            config.cols.saturating_sub(ENEMY_MARGIN),
            config.rows.saturating_sub(ENEMY_MARGIN),
        );
        let enemies = sample_cells(&grid, &occupied, config.enemies, rng, |p| {
            (ENEMY_MARGIN..=x_max).contains(&p.x) && (ENEMY_MARGIN..=y_max).contains(&p.y)
        });
        occupied.extend_from_slice(&enemies);
        let coins = sample_cells(&grid, &occupied, config.coins, rng, |_| true);
        occupied.extend_from_slice(&coins);
        let items = sample_cells(&grid, &occupied, config.items, rng, |_| true);

        debug!(
            level = config.level,
            rows = config.rows,
            cols = config.cols,
            exit_carved = carved,
            enemies = enemies.len(),
            coins = coins.len(),
            items = items.len(),
            "level set up"
        );

        Ok(Self {
            config,
            grid,
            start,
            exit,
            player: start,
            items_total: items.len(),
            enemies,
            coins,
            items,
            projectiles: Vec::new(),
            last_shot: None,
            ticks: 0,
            enemy_tick: 0,
            finished: false,
        })
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn start(&self) -> Pos {
        self.start
    }

    pub fn exit(&self) -> Pos {
        self.exit
    }

    pub fn player(&self) -> Pos {
        self.player
    }

    pub fn enemies(&self) -> &[Pos] {
        &self.enemies
    }

    pub fn coins(&self) -> &[Pos] {
        &self.coins
    }

    pub fn items(&self) -> &[Pos] {
        &self.items
    }

    pub fn items_collected(&self) -> usize {
        self.items_total - self.items.len()
    }

    pub fn items_total(&self) -> usize {
        self.items_total
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Set once the level is completed or out of time; later ticks are no-ops.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whole seconds left on timed levels.
    pub fn time_left_secs(&self) -> Option<u32> {
        self.config
            .time_limit_ticks
            .map(|limit| limit.saturating_sub(self.ticks) / TICKS_PER_SECOND)
    }

    /// Advances one tick: timer, player move, shot, pickups, enemy contact,
    /// exit check, enemy move, projectiles. At most one `HitEnemy` is reported
    /// per tick, and a finished level reports nothing.
    pub fn tick(&mut self, input: Input, rng: &mut impl Rng) -> Vec<LevelEvent> {
        if self.finished {
            return Vec::new();
        }
        self.ticks = self.ticks.saturating_add(1);
        if let Some(limit) = self.config.time_limit_ticks {
            if self.ticks >= limit {
                self.finished = true;
                return vec![LevelEvent::TimedOut];
            }
        }

        let mut events = Vec::new();
        if let Some(dir) = input.walk {
            match step(self.player, dir).filter(|next| self.grid.is_open(*next)) {
                Some(next) => self.player = next,
                None => events.push(LevelEvent::Bumped),
            }
        }
        if let Some(dir) = input.fire {
            self.try_fire(dir);
        }

        if let Some(idx) = self.coins.iter().position(|c| *c == self.player) {
            self.coins.swap_remove(idx);
            events.push(LevelEvent::CoinCollected);
        }
        if let Some(idx) = self.items.iter().position(|i| *i == self.player) {
            self.items.swap_remove(idx);
            events.push(LevelEvent::ItemCollected {
                collected: self.items_collected(),
                total: self.items_total,
            });
        }

        let hit = self.check_enemy_contact(&mut events);

        if self.player == self.exit {
            if self.items.is_empty() {
                self.finished = true;
                events.push(LevelEvent::Completed);
                return events;
            }
            events.push(LevelEvent::ExitLocked {
                remaining: self.items.len(),
            });
        }

        self.enemy_tick += 1;
        if self.enemy_tick >= self.config.enemy_interval {
            self.enemy_tick = 0;
            self.move_enemies(rng);
            if !hit {
                self.check_enemy_contact(&mut events);
            }
        }

        self.move_projectiles(&mut events);
        events
    }

    fn check_enemy_contact(&mut self, events: &mut Vec<LevelEvent>) -> bool {
        if !self.enemies.contains(&self.player) {
            return false;
        }
        events.push(LevelEvent::HitEnemy);
        self.player = self.start;
        true
    }

    /// Shots need more than `FIRE_COOLDOWN_TICKS` ticks since the previous one.
    fn try_fire(&mut self, dir: Dir) {
        let ready = self
            .last_shot
            .map_or(true, |last| self.ticks - last > FIRE_COOLDOWN_TICKS);
        if !ready {
            return;
        }
        self.last_shot = Some(self.ticks);
        self.projectiles.push(Projectile {
            pos: self.player,
            dir,
        });
    }

    /// Each projectile advances one cell; walls stop it, and an enemy sharing
    /// its cell before or after the step is destroyed along with it.
    fn move_projectiles(&mut self, events: &mut Vec<LevelEvent>) {
        let mut flying = Vec::with_capacity(self.projectiles.len());
        for mut shot in std::mem::take(&mut self.projectiles) {
            if self.destroy_enemy_at(shot.pos, events) {
                continue;
            }
            let Some(next) = step(shot.pos, shot.dir).filter(|p| self.grid.is_open(*p)) else {
                continue;
            };
            shot.pos = next;
            if self.destroy_enemy_at(next, events) {
                continue;
            }
            flying.push(shot);
        }
        self.projectiles = flying;
    }

    fn destroy_enemy_at(&mut self, pos: Pos, events: &mut Vec<LevelEvent>) -> bool {
        let Some(idx) = self.enemies.iter().position(|e| *e == pos) else {
            return false;
        };
        self.enemies.swap_remove(idx);
        events.push(LevelEvent::EnemyDestroyed);
        true
    }

    fn move_enemies(&mut self, rng: &mut impl Rng) {
        for enemy in self.enemies.iter_mut() {
            let options: Vec<Pos> = Dir::ALL
                .into_iter()
                .filter_map(|dir| step(*enemy, dir))
                .filter(|next| self.grid.is_open(*next))
                .collect();
            if let Some(next) = options.choose(rng) {
                *enemy = *next;
            }
        }
    }
}

pub fn step(pos: Pos, dir: Dir) -> Option<Pos> {
    pos.offset(dir, 1)
}

pub fn can_move(grid: &Grid, pos: Pos, dir: Dir) -> bool {
    step(pos, dir).is_some_and(|next| grid.is_open(next))
}

fn sample_cells(
    grid: &Grid,
    occupied: &[Pos],
    count: usize,
    rng: &mut impl Rng,
    filter: impl Fn(Pos) -> bool,
) -> Vec<Pos> {
    let candidates: Vec<Pos> = grid
        .open_cells()
        .into_iter()
        .filter(|p| !occupied.contains(p) && filter(*p))
        .collect();
    candidates.choose_multiple(rng, count).copied().collect()
}
