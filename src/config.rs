use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3333";
pub const DEFAULT_NUM_RESULTS: usize = 3;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        retrieval_base_url: get_env_or_default("RETRIEVAL_BASE_URL", DEFAULT_BASE_URL),
        num_results: parse_num_results(env::var("SEARCH_NUM_RESULTS").ok().as_deref()),
    }
});

#[derive(Debug, Clone)]
pub struct Config {
    /// Base of the retrieval API, `/query` is appended per request.
    pub retrieval_base_url: String,
    pub num_results: usize,
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_num_results(raw: Option<&str>) -> usize {
    match raw.map(str::trim).map(str::parse::<usize>) {
        Some(Ok(n)) => n,
        Some(Err(_)) => {
            log::warn!("ignoring unparsable SEARCH_NUM_RESULTS, using {DEFAULT_NUM_RESULTS}");
            DEFAULT_NUM_RESULTS
        }
        None => DEFAULT_NUM_RESULTS,
    }
}

#[test]
fn test_parse_num_results() {
    assert_eq!(parse_num_results(None), DEFAULT_NUM_RESULTS);
    assert_eq!(parse_num_results(Some("7")), 7);
    assert_eq!(parse_num_results(Some(" 10 ")), 10);
    assert_eq!(parse_num_results(Some("lots")), DEFAULT_NUM_RESULTS);
    assert_eq!(parse_num_results(Some("-1")), DEFAULT_NUM_RESULTS);
}
