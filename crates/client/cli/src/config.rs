use std::env;
use std::path::PathBuf;

/// Replay configuration, read from the environment.
#[derive(Clone, Debug)]
pub struct ReplayConfig {
    /// Directory holding `roster.ron`, `script.ron` and the optional tables.
    pub content_dir: PathBuf,
    /// Overrides the seed from `config.toml`.
    pub seed: Option<u64>,
    /// Print the full damage breakdown of each entry.
    pub verbose: bool,
    /// Write the final action log here as JSON.
    pub log_out: Option<PathBuf>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("data"),
            seed: None,
            verbose: false,
            log_out: None,
        }
    }
}

impl ReplayConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("BATTLE_CONTENT_DIR") {
            config.content_dir = PathBuf::from(dir);
        }

        config.seed = read_env::<u64>("BATTLE_SEED");

        if let Some(verbose) = read_env::<bool>("BATTLE_VERBOSE") {
            config.verbose = verbose;
        } else if env::var("BATTLE_VERBOSE").is_ok() {
            config.verbose = true;
        }

        config.log_out = env::var("BATTLE_LOG_OUT").ok().map(PathBuf::from);

        config
    }

    /// A content directory passed on the command line wins over the environment.
    pub fn with_args(mut self, mut args: impl Iterator<Item = String>) -> Self {
        if let Some(dir) = args.next() {
            self.content_dir = PathBuf::from(dir);
        }
        self
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_overrides_directory() {
        let config = ReplayConfig::default().with_args(["fixtures".to_string()].into_iter());
        assert_eq!(config.content_dir, PathBuf::from("fixtures"));
        assert_eq!(config.seed, None);

        let config = ReplayConfig::default().with_args(std::iter::empty());
        assert_eq!(config.content_dir, PathBuf::from("data"));
    }
}
