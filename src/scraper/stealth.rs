// Request identity and automation masking for the live-site adapter.

use rand::seq::SliceRandom;
use rand::Rng;

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Version/17.1 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Evaluated on every new document before any page script runs.
pub const MASK_AUTOMATION_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => false });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
"#;

/// Markers that show up on interstitial bot-check pages.
pub const BLOCK_MARKERS: &[&str] = &["px-captcha", "Press &amp; Hold", "Press & Hold", "captcha-container"];

pub fn random_user_agent<R: Rng>(rng: &mut R) -> &'static str {
    USER_AGENTS.choose(rng).copied().unwrap_or(USER_AGENTS[0])
}

pub fn looks_blocked(html: &str) -> Option<&'static str> {
    BLOCK_MARKERS.iter().copied().find(|m| html.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn user_agent_comes_from_rotation() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            assert!(USER_AGENTS.contains(&random_user_agent(&mut rng)));
        }
    }

    #[test]
    fn detects_bot_check_page() {
        assert_eq!(looks_blocked("<div id=\"px-captcha\"></div>"), Some("px-captcha"));
        assert_eq!(looks_blocked("<article>listing</article>"), None);
    }
}
