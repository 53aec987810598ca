use std::error::Error;
use std::fmt;
use tracing::info;

use crate::level::LevelEvent;

pub const MAP_COUNT: usize = 4;
pub const LEVELS_PER_MAP: usize = 5;
pub const STARTING_LIVES: u32 = 3;
pub const KILL_REWARD: u32 = 2;
const QUIZ_LEVELS: [u32; 8] = [3, 5, 7, 9, 13, 16, 19, 20];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapInfo {
    pub number: usize,
    pub theme: &'static str,
}

pub const MAPS: [MapInfo; MAP_COUNT] = [
    MapInfo {
        number: 1,
        theme: "Enchanted Groove Maze",
    },
    MapInfo {
        number: 2,
        theme: "Pharaoh's Sunstone Maze",
    },
    MapInfo {
        number: 3,
        theme: "Frostfire Labyrinth",
    },
    MapInfo {
        number: 4,
        theme: "Crimson Caldera Maze",
    },
];

/// Levels are numbered 1..=20 across all maps; this is what drives maze size
/// and difficulty.
pub fn global_level(map: usize, level: usize) -> u32 {
    (map.saturating_sub(1) * LEVELS_PER_MAP + level) as u32
}

pub fn needs_quiz(global_level: u32) -> bool {
    QUIZ_LEVELS.contains(&global_level)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionError {
    UnknownMap(usize),
    UnknownLevel(usize),
    MapLocked(usize),
    LevelLocked { map: usize, level: usize },
    NoActiveRun,
    RunInProgress { map: usize, level: usize },
    NoQuizPending,
    QuizPending,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::UnknownMap(map) => write!(f, "no such map: {map}"),
            SessionError::UnknownLevel(level) => write!(f, "no such level: {level}"),
            SessionError::MapLocked(map) => write!(f, "map {map} is locked"),
            SessionError::LevelLocked { map, level } => {
                write!(f, "level {level} of map {map} is locked")
            }
            SessionError::NoActiveRun => write!(f, "no level is being played"),
            SessionError::RunInProgress { map, level } => {
                write!(f, "level {level} of map {map} is still being played")
            }
            SessionError::NoQuizPending => write!(f, "this run has no quiz to answer"),
            SessionError::QuizPending => write!(f, "the quiz must be passed before playing"),
        }
    }
}

impl Error for SessionError {}

/// One attempt at a single level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    pub map: usize,
    pub level: usize,
    pub global_level: u32,
    pub lives: u32,
    pub quiz_pending: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizOutcome {
    Passed,
    Retry { lives: u32 },
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Playing { lives: u32 },
    LevelComplete { map_complete: bool },
    Failed { lives: u32 },
    GameOver,
}

/// Progress that outlives a single level: coins, completion flags, unlocked
/// maps, and the run in progress. Only the transition methods below change it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSession {
    total_coins: u32,
    level_completion: [[bool; LEVELS_PER_MAP]; MAP_COUNT],
    map_unlocked: [bool; MAP_COUNT],
    run: Option<Run>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    pub fn new() -> Self {
        let mut map_unlocked = [false; MAP_COUNT];
        map_unlocked[0] = true;
        Self {
            total_coins: 0,
            level_completion: [[false; LEVELS_PER_MAP]; MAP_COUNT],
            map_unlocked,
            run: None,
        }
    }

    pub fn total_coins(&self) -> u32 {
        self.total_coins
    }

    pub fn run(&self) -> Option<&Run> {
        self.run.as_ref()
    }

    pub fn is_map_unlocked(&self, map: usize) -> bool {
        map_index(map).is_ok_and(|m| self.map_unlocked[m])
    }

    pub fn is_level_completed(&self, map: usize, level: usize) -> bool {
        match (map_index(map), level_index(level)) {
            (Ok(m), Ok(l)) => self.level_completion[m][l],
            _ => false,
        }
    }

    /// Level 1 of an unlocked map is always playable; later levels need the
    /// previous one completed.
    pub fn is_level_unlocked(&self, map: usize, level: usize) -> bool {
        let (Ok(m), Ok(l)) = (map_index(map), level_index(level)) else {
            return false;
        };
        self.map_unlocked[m] && (l == 0 || self.level_completion[m][l - 1])
    }

    pub fn all_levels_completed(&self) -> bool {
        self.level_completion.iter().flatten().all(|done| *done)
    }

    /// Fails with `RunInProgress` while another run is active; abandon it first.
    pub fn start_run(&mut self, map: usize, level: usize) -> Result<Run, SessionError> {
        if let Some(run) = &self.run {
            return Err(SessionError::RunInProgress {
                map: run.map,
                level: run.level,
            });
        }
        let m = map_index(map)?;
        level_index(level)?;
        if !self.map_unlocked[m] {
            return Err(SessionError::MapLocked(map));
        }
        if !self.is_level_unlocked(map, level) {
            return Err(SessionError::LevelLocked { map, level });
        }

        let global = global_level(map, level);
        let run = Run {
            map,
            level,
            global_level: global,
            lives: STARTING_LIVES,
            quiz_pending: needs_quiz(global),
        };
        info!(map, level, global, quiz = run.quiz_pending, "run started");
        self.run = Some(run);
        Ok(run)
    }

    pub fn abandon_run(&mut self) -> Option<Run> {
        let run = self.run.take();
        if let Some(run) = &run {
            info!(map = run.map, level = run.level, "run abandoned");
        }
        run
    }

    /// A wrong answer costs a life; the quiz repeats until it is passed or the
    /// lives run out.
    pub fn answer_quiz(&mut self, correct: bool) -> Result<QuizOutcome, SessionError> {
        let run = self.run.as_mut().ok_or(SessionError::NoActiveRun)?;
        if !run.quiz_pending {
            return Err(SessionError::NoQuizPending);
        }
        if correct {
            run.quiz_pending = false;
            return Ok(QuizOutcome::Passed);
        }

        run.lives = run.lives.saturating_sub(1);
        if run.lives == 0 {
            info!(map = run.map, level = run.level, "game over at quiz");
            self.run = None;
            return Ok(QuizOutcome::GameOver);
        }
        Ok(QuizOutcome::Retry { lives: run.lives })
    }

    /// Folds one level event into the session.
    pub fn apply(&mut self, event: LevelEvent) -> Result<RunStatus, SessionError> {
        let run = self.run.as_mut().ok_or(SessionError::NoActiveRun)?;
        if run.quiz_pending {
            return Err(SessionError::QuizPending);
        }

        match event {
            LevelEvent::CoinCollected => {
                self.total_coins += 1;
                Ok(RunStatus::Playing { lives: run.lives })
            }
            LevelEvent::EnemyDestroyed => {
                self.total_coins += KILL_REWARD;
                Ok(RunStatus::Playing { lives: run.lives })
            }
            LevelEvent::HitEnemy => {
                run.lives = run.lives.saturating_sub(1);
                if run.lives == 0 {
                    info!(map = run.map, level = run.level, "game over");
                    self.run = None;
                    return Ok(RunStatus::GameOver);
                }
                Ok(RunStatus::Playing { lives: run.lives })
            }
            LevelEvent::TimedOut => {
                run.lives = run.lives.saturating_sub(1);
                let lives = run.lives;
                info!(map = run.map, level = run.level, lives, "out of time");
                self.run = None;
                if lives == 0 {
                    Ok(RunStatus::GameOver)
                } else {
                    Ok(RunStatus::Failed { lives })
                }
            }
            LevelEvent::Completed => {
                let (map, level) = (run.map, run.level);
                self.run = None;
                let map_complete = self.complete_level(map, level)?;
                Ok(RunStatus::LevelComplete { map_complete })
            }
            LevelEvent::Bumped
            | LevelEvent::ItemCollected { .. }
            | LevelEvent::ExitLocked { .. } => Ok(RunStatus::Playing { lives: run.lives }),
        }
    }

    /// Marks a level done. Finishing the last level of a map unlocks the next
    /// map; returns whether the map is now finished.
    pub fn complete_level(&mut self, map: usize, level: usize) -> Result<bool, SessionError> {
        let m = map_index(map)?;
        let l = level_index(level)?;
        self.level_completion[m][l] = true;

        let last = l + 1 == LEVELS_PER_MAP;
        if last && m + 1 < MAP_COUNT {
            self.map_unlocked[m + 1] = true;
            info!(map, unlocked = map + 1, "map complete");
        } else {
            info!(map, level, "level complete");
        }
        Ok(last)
    }
}

fn map_index(map: usize) -> Result<usize, SessionError> {
    (1..=MAP_COUNT)
        .contains(&map)
        .then(|| map - 1)
        .ok_or(SessionError::UnknownMap(map))
}

fn level_index(level: usize) -> Result<usize, SessionError> {
    (1..=LEVELS_PER_MAP)
        .contains(&level)
        .then(|| level - 1)
        .ok_or(SessionError::UnknownLevel(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_levels_and_quizzes() {
        assert_eq!(global_level(1, 1), 1);
        assert_eq!(global_level(1, 3), 3);
        assert_eq!(global_level(3, 2), 12);
        assert_eq!(global_level(4, 5), 20);
        assert!(needs_quiz(3));
        assert!(needs_quiz(20));
        assert!(!needs_quiz(1));
        assert!(!needs_quiz(12));
    }

    #[test]
    fn fresh_session_only_opens_first_level() {
        let session = GameSession::new();
        assert!(session.is_map_unlocked(1));
        assert!(!session.is_map_unlocked(2));
        assert!(!session.is_map_unlocked(0));
        assert!(session.is_level_unlocked(1, 1));
        assert!(!session.is_level_unlocked(1, 2));
        assert!(!session.is_level_unlocked(2, 1));
        assert!(!session.is_level_unlocked(1, 6));
        assert!(!session.all_levels_completed());
    }

    #[test]
    fn start_run_validates_selection() {
        let mut session = GameSession::new();
        assert_eq!(session.start_run(0, 1), Err(SessionError::UnknownMap(0)));
        assert_eq!(session.start_run(5, 1), Err(SessionError::UnknownMap(5)));
        assert_eq!(session.start_run(1, 9), Err(SessionError::UnknownLevel(9)));
        assert_eq!(session.start_run(2, 1), Err(SessionError::MapLocked(2)));
        assert_eq!(
            session.start_run(1, 2),
            Err(SessionError::LevelLocked { map: 1, level: 2 })
        );

        let run = session.start_run(1, 1).unwrap();
        assert_eq!(run.lives, STARTING_LIVES);
        assert!(!run.quiz_pending);
        assert_eq!(session.run(), Some(&run));
    }

    #[test]
    fn completing_levels_unlocks_in_order() {
        let mut session = GameSession::new();
        for level in 1..=4 {
            assert_eq!(session.complete_level(1, level), Ok(false));
            assert!(session.is_level_unlocked(1, level + 1));
        }
        assert!(!session.is_map_unlocked(2));
        assert_eq!(session.complete_level(1, 5), Ok(true));
        assert!(session.is_map_unlocked(2));
        assert!(session.is_level_unlocked(2, 1));
    }

    #[test]
    fn finishing_every_map() {
        let mut session = GameSession::new();
        for map in 1..=MAP_COUNT {
            for level in 1..=LEVELS_PER_MAP {
                session.complete_level(map, level).unwrap();
            }
        }
        assert!(session.all_levels_completed());
    }

    #[test]
    fn quiz_gates_the_run() {
        let mut session = GameSession::new();
        session.complete_level(1, 1).unwrap();
        session.complete_level(1, 2).unwrap();
        let run = session.start_run(1, 3).unwrap();
        assert!(run.quiz_pending);

        assert_eq!(
            session.apply(LevelEvent::CoinCollected),
            Err(SessionError::QuizPending)
        );
        assert_eq!(session.answer_quiz(false), Ok(QuizOutcome::Retry { lives: 2 }));
        assert_eq!(session.answer_quiz(true), Ok(QuizOutcome::Passed));
        assert_eq!(session.answer_quiz(true), Err(SessionError::NoQuizPending));
        assert_eq!(
            session.apply(LevelEvent::CoinCollected),
            Ok(RunStatus::Playing { lives: 2 })
        );
        assert_eq!(session.total_coins(), 1);
    }

    #[test]
    fn failing_quiz_three_times_ends_run() {
        let mut session = GameSession::new();
        session.complete_level(1, 1).unwrap();
        session.complete_level(1, 2).unwrap();
        session.start_run(1, 3).unwrap();
        assert_eq!(session.answer_quiz(false), Ok(QuizOutcome::Retry { lives: 2 }));
        assert_eq!(session.answer_quiz(false), Ok(QuizOutcome::Retry { lives: 1 }));
        assert_eq!(session.answer_quiz(false), Ok(QuizOutcome::GameOver));
        assert_eq!(session.run(), None);
        assert_eq!(session.answer_quiz(true), Err(SessionError::NoActiveRun));
    }

    #[test]
    fn enemy_hits_drain_lives() {
        let mut session = GameSession::new();
        session.start_run(1, 1).unwrap();
        assert_eq!(
            session.apply(LevelEvent::HitEnemy),
            Ok(RunStatus::Playing { lives: 2 })
        );
        assert_eq!(
            session.apply(LevelEvent::HitEnemy),
            Ok(RunStatus::Playing { lives: 1 })
        );
        assert_eq!(session.apply(LevelEvent::HitEnemy), Ok(RunStatus::GameOver));
        assert_eq!(
            session.apply(LevelEvent::Bumped),
            Err(SessionError::NoActiveRun)
        );
        assert!(!session.is_level_completed(1, 1));
    }

    #[test]
    fn timeout_fails_the_run() {
        let mut session = GameSession::new();
        session.start_run(1, 1).unwrap();
        assert_eq!(
            session.apply(LevelEvent::TimedOut),
            Ok(RunStatus::Failed { lives: 2 })
        );
        assert_eq!(session.run(), None);
    }

    #[test]
    fn completion_event_records_progress() {
        let mut session = GameSession::new();
        session.start_run(1, 1).unwrap();
        assert_eq!(
            session.apply(LevelEvent::ExitLocked { remaining: 2 }),
            Ok(RunStatus::Playing { lives: 3 })
        );
        assert_eq!(
            session.apply(LevelEvent::Completed),
            Ok(RunStatus::LevelComplete {
                map_complete: false
            })
        );
        assert!(session.is_level_completed(1, 1));
        assert!(session.is_level_unlocked(1, 2));
        assert_eq!(session.run(), None);
    }

    #[test]
    fn abandoning_keeps_progress() {
        let mut session = GameSession::new();
        session.start_run(1, 1).unwrap();
        session.apply(LevelEvent::CoinCollected).unwrap();
        assert!(session.abandon_run().is_some());
        assert_eq!(session.abandon_run(), None);
        assert_eq!(session.total_coins(), 1);
    }

    #[test]
    fn maps_are_numbered_in_order() {
        for (idx, map) in MAPS.iter().enumerate() {
            assert_eq!(map.number, idx + 1);
        }
        assert_eq!(MAPS[2].theme, "Frostfire Labyrinth");
    }

    #[test]
    fn active_run_blocks_a_new_one() {
        let mut session = GameSession::new();
        session.complete_level(1, 1).unwrap();
        session.start_run(1, 1).unwrap();
        session.apply(LevelEvent::HitEnemy).unwrap();

        let err = session.start_run(1, 2).unwrap_err();
        assert_eq!(err, SessionError::RunInProgress { map: 1, level: 1 });
        assert_eq!(err.to_string(), "level 1 of map 1 is still being played");
        assert_eq!(session.run().map(|r| r.lives), Some(2));

        session.abandon_run();
        let run = session.start_run(1, 2).unwrap();
        assert_eq!(run.lives, STARTING_LIVES);
    }

    #[test]
    fn destroyed_enemies_pay_coins() {
        let mut session = GameSession::new();
        session.start_run(1, 1).unwrap();
        assert_eq!(
            session.apply(LevelEvent::EnemyDestroyed),
            Ok(RunStatus::Playing { lives: 3 })
        );
        session.apply(LevelEvent::CoinCollected).unwrap();
        assert_eq!(session.total_coins(), KILL_REWARD + 1);
    }
}
