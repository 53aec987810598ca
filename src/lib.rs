pub mod config;
pub mod level;
pub mod maze;
pub mod paths;
pub mod session;

pub use maze::{generate, Cell, Dir, Grid, MazeError, Pos, RandomChoice};
