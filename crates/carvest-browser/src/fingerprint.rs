use rand::seq::SliceRandom;

/// User agents rotated between runs: two desktop, one mobile
const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Linux; Android 10; SM-G970F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Mobile Safari/537.36",
];

/// Common viewport sizes
const VIEWPORTS: [(u32, u32); 4] = [(1920, 1080), (1366, 768), (1536, 864), (1440, 900)];

/// Browser identity presented to the site for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Fingerprint {
    /// Pick a user agent and viewport at random
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();

        let user_agent = USER_AGENTS.choose(&mut rng).unwrap_or(&USER_AGENTS[0]);
        let (width, height) = *VIEWPORTS.choose(&mut rng).unwrap_or(&VIEWPORTS[0]);

        Self {
            user_agent: (*user_agent).to_string(),
            viewport_width: width,
            viewport_height: height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_randomized_fingerprint() {
        let fp = Fingerprint::randomized();
        assert!(USER_AGENTS.contains(&fp.user_agent.as_str()));
        assert!(VIEWPORTS.contains(&(fp.viewport_width, fp.viewport_height)));
    }

    #[test]
    fn test_fingerprint_variation() {
        // Probabilistic, but 20 identical draws out of 3 agents is vanishingly rare
        let fingerprints: Vec<_> = (0..20).map(|_| Fingerprint::randomized()).collect();

        let first_ua = &fingerprints[0].user_agent;
        let all_same = fingerprints.iter().all(|f| &f.user_agent == first_ua);
        assert!(!all_same, "Expected variation in user agents");
    }
}
