use crate::level::LevelConfig;

const DEFAULT_LEVEL: u32 = 1;

/// Start-up settings taken from `MINDMAZE_*` environment variables. Missing,
/// unparsable or zero values fall back to the defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    pub seed: Option<u64>,
    pub level: u32,
    pub rows: Option<usize>,
    pub cols: Option<usize>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let seed = lookup("MINDMAZE_SEED").and_then(|v| v.trim().parse::<u64>().ok());
        let level = lookup("MINDMAZE_LEVEL")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_LEVEL);
        let rows = positive(lookup("MINDMAZE_ROWS"));
        let cols = positive(lookup("MINDMAZE_COLS"));
        Self {
            seed,
            level,
            rows,
            cols,
        }
    }

    pub fn level_config(&self) -> LevelConfig {
        let config = LevelConfig::for_level(self.level);
        config.with_size(
            self.rows.unwrap_or(config.rows),
            self.cols.unwrap_or(config.cols),
        )
    }
}

fn positive(value: Option<String>) -> Option<usize> {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let s = settings(&[]);
        assert_eq!(s.seed, None);
        assert_eq!(s.level, 1);
        assert_eq!(s.level_config(), LevelConfig::for_level(1));
    }

    #[test]
    fn reads_all_vars() {
        let s = settings(&[
            ("MINDMAZE_SEED", "42"),
            ("MINDMAZE_LEVEL", "6"),
            ("MINDMAZE_ROWS", "11"),
            ("MINDMAZE_COLS", " 16 "),
        ]);
        assert_eq!(s.seed, Some(42));
        let config = s.level_config();
        assert_eq!(config.level, 6);
        assert_eq!((config.rows, config.cols), (11, 16));
        assert_eq!(config.enemies, LevelConfig::for_level(6).enemies);
    }

    #[test]
    fn junk_and_zero_fall_back() {
        let s = settings(&[
            ("MINDMAZE_SEED", "abc"),
            ("MINDMAZE_LEVEL", "0"),
            ("MINDMAZE_ROWS", "-3"),
            ("MINDMAZE_COLS", "0"),
        ]);
        assert_eq!(s.seed, None);
        assert_eq!(s.level, 1);
        assert_eq!(s.rows, None);
        assert_eq!(s.cols, None);
    }

    #[test]
    fn seed_zero_is_a_seed() {
        assert_eq!(settings(&[("MINDMAZE_SEED", "0")]).seed, Some(0));
    }
}
