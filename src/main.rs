use anyhow::Result;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::QueueableCommand;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{self, Stdout, Write};
use tracing::info;
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

use mindmaze::config::Settings;
use mindmaze::level::Level;
use mindmaze::maze::{Cell, Pos};

const CELL_W: usize = 2;
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player,
    Enemy,
    Exit,
    Item,
    Coin,
    Wall,
    Floor,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let settings = Settings::from_env();
    let seed = settings.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let config = settings.level_config();
    let mut rng = StdRng::seed_from_u64(seed);
    let level = Level::setup(config, &mut rng)?;
    info!(seed, level = config.level, rows = config.rows, cols = config.cols, "level ready");

    let mut stdout = io::stdout();
    render(&mut stdout, &level)?;
    render_summary(&mut stdout, &level, seed)?;
    Ok(())
}

fn render(stdout: &mut Stdout, level: &Level) -> io::Result<()> {
    let grid = level.grid();
    for y in 0..grid.rows() {
        for x in 0..grid.cols() {
            draw_cell(stdout, glyph_for(level, Pos::new(x, y)))?;
        }
        stdout.queue(Print("\n"))?;
    }
    stdout.flush()
}

fn glyph_for(level: &Level, pos: Pos) -> Glyph {
    if pos == level.player() {
        return Glyph::Player;
    }
    if level.enemies().contains(&pos) {
        return Glyph::Enemy;
    }
    if pos == level.exit() {
        return Glyph::Exit;
    }
    if level.items().contains(&pos) {
        return Glyph::Item;
    }
    if level.coins().contains(&pos) {
        return Glyph::Coin;
    }
    match level.grid().cell(pos) {
        Cell::Wall => Glyph::Wall,
        Cell::Open => Glyph::Floor,
    }
}

fn draw_cell(stdout: &mut Stdout, glyph: Glyph) -> io::Result<()> {
    let (text, color) = match glyph {
        Glyph::Player => ("😃", Color::Yellow),
        Glyph::Enemy => ("👾", Color::Red),
        Glyph::Exit => ("🏁", Color::Green),
        Glyph::Item => ("🔑", Color::Magenta),
        Glyph::Coin => ("● ", Color::Yellow),
        Glyph::Wall => ("██", Color::Cyan),
        Glyph::Floor => ("  ", Color::Reset),
    };
    stdout.queue(SetForegroundColor(color))?;
    stdout.queue(Print(text))?;
    let w = UnicodeWidthStr::width(text);
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}

fn render_summary(stdout: &mut Stdout, level: &Level, seed: u64) -> io::Result<()> {
    let config = level.config();
    let timer = match level.time_left_secs() {
        Some(secs) => format!("{secs}s"),
        None => "none".to_string(),
    };
    stdout.queue(SetForegroundColor(Color::White))?;
    stdout.queue(Print(format!(
        "Level: {}  Size: {}x{}  Seed: {}  Enemies: {}  Coins: {}  Items: {}  Timer: {}\n",
        config.level,
        config.rows,
        config.cols,
        seed,
        level.enemies().len(),
        level.coins().len(),
        level.items_total(),
        timer
    )))?;
    stdout.queue(ResetColor)?;
    stdout.flush()
}
