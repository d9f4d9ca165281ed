use serde::Deserialize;

/// Main configuration structure for Rental-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub policy: PolicyConfig,
    #[serde(default)]
    pub request: RequestConfig,
    pub storage: StorageConfig,
    #[serde(rename = "source", default)]
    pub sources: Vec<SourceEntry>,
}

/// Recurring scrape schedule
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Hours between two firings
    #[serde(rename = "interval-hours")]
    pub interval_hours: u64,
}

/// Politeness rules applied to every fetch
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Path prefixes that may be fetched, in evaluation order
    #[serde(rename = "allowed-paths")]
    pub allowed_paths: Vec<String>,

    /// Path prefixes that must never be fetched; these win over allowed prefixes
    #[serde(rename = "disallowed-paths", default)]
    pub disallowed_paths: Vec<String>,

    /// Minimum wait before each index fetch (seconds)
    #[serde(rename = "crawl-delay")]
    pub crawl_delay: f64,

    /// Lower bound of the random pause between discovered items (milliseconds)
    #[serde(rename = "jitter-min-ms", default = "default_jitter_min_ms")]
    pub jitter_min_ms: u64,

    /// Upper bound of the random pause between discovered items (milliseconds)
    #[serde(rename = "jitter-max-ms", default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,
}

/// Outbound request identity
#[derive(Debug, Clone, Deserialize)]
pub struct RequestConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept")]
    pub accept: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept: default_accept(),
            accept_language: default_accept_language(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// One listings website and the locations to crawl on it
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Name stamped on every record this source produces (e.g. "zillow.com")
    pub name: String,

    /// Origin used to build index URLs and resolve relative links
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Index path template; `{location}` is replaced by each location token
    #[serde(rename = "index-path")]
    pub index_path: String,

    /// Hyphen-delimited city-state tokens, crawled in this order
    pub locations: Vec<String>,

    #[serde(default)]
    pub selectors: CardSelectors,
}

/// CSS selectors describing a listing card on an index page
#[derive(Debug, Clone, Deserialize)]
pub struct CardSelectors {
    #[serde(default = "default_card_selector")]
    pub card: String,

    #[serde(default = "default_link_selector")]
    pub link: String,

    #[serde(default = "default_price_selector")]
    pub price: String,

    #[serde(default = "default_address_selector")]
    pub address: String,

    #[serde(default = "default_details_selector")]
    pub details: String,

    #[serde(default = "default_image_selector")]
    pub image: String,
}

impl Default for CardSelectors {
    fn default() -> Self {
        Self {
            card: default_card_selector(),
            link: default_link_selector(),
            price: default_price_selector(),
            address: default_address_selector(),
            details: default_details_selector(),
            image: default_image_selector(),
        }
    }
}

fn default_jitter_min_ms() -> u64 {
    500
}

fn default_jitter_max_ms() -> u64 {
    1500
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_card_selector() -> String {
    ".list-card".to_string()
}

fn default_link_selector() -> String {
    ".list-card-link".to_string()
}

fn default_price_selector() -> String {
    ".list-card-price".to_string()
}

fn default_address_selector() -> String {
    ".list-card-addr".to_string()
}

fn default_details_selector() -> String {
    ".list-card-details".to_string()
}

fn default_image_selector() -> String {
    ".list-card-img".to_string()
}
