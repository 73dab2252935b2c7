const ENV_DEFAULT_LIMIT: &str = "NEWSDESK_DEFAULT_LIMIT";
const ENV_MAX_LIMIT: &str = "NEWSDESK_MAX_LIMIT";

const DEFAULT_PAGE_LIMIT: usize = 20;
const DEFAULT_MAX_LIMIT: usize = 100;

/// Pagination knobs resolved once per client. Scoring weights and the
/// similarity threshold are fixed search semantics, not configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let default_limit = read_env_usize(ENV_DEFAULT_LIMIT, defaults.default_limit, 1);
        let max_limit = read_env_usize(ENV_MAX_LIMIT, defaults.max_limit, 1).max(default_limit);
        Self {
            default_limit,
            max_limit,
        }
    }
}

#[must_use]
fn read_env_usize(name: &str, default_value: usize, min_value: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|value| *value >= min_value)
        .unwrap_or(default_value)
}

#[cfg(test)]
mod tests {
    use super::{SearchConfig, read_env_usize};

    #[test]
    fn defaults_match_documented_contract() {
        let config = SearchConfig::default();
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.max_limit, 100);
    }

    #[test]
    fn read_env_usize_falls_back_to_default_when_unset() {
        assert_eq!(read_env_usize("NEWSDESK_TEST_UNSET_LIMIT", 20, 1), 20);
    }
}
