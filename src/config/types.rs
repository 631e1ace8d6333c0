use serde::Deserialize;

/// Main configuration structure for Offline Archiver
///
/// Every section and key is optional in the TOML file; missing values fall
/// back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub archive: ArchiveConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Total time allowed for one request, in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Time allowed to establish a connection, in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Drop query strings when deciding whether two URLs are the same resource
    #[serde(rename = "ignore-query")]
    pub ignore_query: bool,

    /// Maximum number of pages to dequeue (0 = no limit)
    #[serde(rename = "max-pages")]
    pub max_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            connect_timeout_secs: 10,
            ignore_query: false,
            max_pages: 0,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// Optional URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "OfflineArchiver".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: String::new(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        if self.contact_url.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, self.contact_url
            )
        }
    }
}

/// Archive layout configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// File name used for directory-like page URLs
    #[serde(rename = "index-document")]
    pub index_document: String,

    /// File name of the bookmarks viewer written at the archive root
    #[serde(rename = "bookmarks-page")]
    pub bookmarks_page: String,

    /// Whether saved pages get the bookmark button script
    #[serde(rename = "inject-bookmark-button")]
    pub inject_bookmark_button: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            index_document: "index.html".to_string(),
            bookmarks_page: "_bookmarks.html".to_string(),
            inject_bookmark_button: true,
        }
    }
}
