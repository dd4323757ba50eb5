use reqwest::Url;

/// Canonical store identifier for a listing URL: the lowercase host with a
/// leading `www.` removed.
///
/// Returns an empty string for anything that does not parse as an absolute
/// URL with a host.
///
/// # Examples
///
/// ```
/// use pricenest_scraper::normalize_domain;
///
/// assert_eq!(normalize_domain("https://www.Flipkart.com/apple-iphone-15/p/itm"), "flipkart.com");
/// assert_eq!(normalize_domain("not a url"), "");
/// ```
#[must_use]
pub fn normalize_domain(url: &str) -> String {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return String::new();
    };
    let Some(host) = parsed.host_str() else {
        return String::new();
    };

    let host = host.to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}
