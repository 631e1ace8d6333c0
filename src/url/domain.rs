use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use offline_archiver::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// The network location a crawl is confined to
///
/// Two URLs are on the same site when their hosts match case-insensitively
/// and they carry the same explicit port. The scheme is not compared, so
/// `http://example.com/` and `https://example.com/` share a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteScope {
    host: String,
    port: Option<u16>,
}

impl SiteScope {
    /// Builds the scope of the given seed URL
    ///
    /// Returns None when the URL has no host to scope the crawl to.
    pub fn from_url(seed: &Url) -> Option<Self> {
        let host = extract_domain(seed)?;
        if host.is_empty() {
            return None;
        }

        Some(Self {
            host,
            port: seed.port(),
        })
    }

    /// Returns true if the URL belongs to this site
    pub fn contains(&self, url: &Url) -> bool {
        extract_domain(url).as_deref() == Some(self.host.as_str()) && url.port() == self.port
    }

    /// Host and explicit port, as it would appear in the URL authority
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }
}
