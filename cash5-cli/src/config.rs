use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

pub const DEFAULT_BASE_URL: &str = "https://www.njlottery.com/api/v1/draw-games/draws/page";
pub const GAME_NAME: &str = "Cash 5";
pub const REFERER: &str = "https://www.njlottery.com/en-us/drawgames/jerseycash.html";

/// Paging and retry tuning for one sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub base_url: String,
    pub page_size: usize,
    /// Stop a range once this many new records have been fetched.
    pub max_records: usize,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 365,
            max_records: 365,
            max_attempts: 5,
            retry_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(20),
        }
    }
}

pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}
