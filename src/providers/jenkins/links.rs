use url::Url;

use crate::error::{CrawlError, Result};

const DESCRIBE_SUFFIX: &str = "wfapi/describe";

/// Builds the `wfapi/describe` endpoint for a build page URL.
///
/// # Arguments
///
/// * `build_url` - Build page URL (e.g., <https://ci.example.com/job/app/42/>)
///
/// # Returns
///
/// The describe endpoint (e.g., <https://ci.example.com/job/app/42/wfapi/describe>)
pub fn describe_url(build_url: &str) -> Result<Url> {
    let joined = format!("{}/{DESCRIBE_SUFFIX}", build_url.trim_end_matches('/'));
    Url::parse(&joined).map_err(|source| CrawlError::InvalidUrl {
        url: joined,
        source,
    })
}

/// Resolves an `_links` href against the scheme and host of the build URL.
///
/// Only the path and query of `href` are kept: Jenkins hands out absolute
/// paths (`/job/app/42/execution/node/6/wfapi/describe`), and any scheme or
/// authority in the href is replaced by the build's own.
pub fn resolve(base: &Url, href: &str) -> Result<Url> {
    let rooted = if href.starts_with('/') || href.contains("://") {
        href.to_string()
    } else {
        format!("/{href}")
    };

    let target = base.join(&rooted).map_err(|source| CrawlError::InvalidUrl {
        url: href.to_string(),
        source,
    })?;

    let mut url = base.clone();
    url.set_path(target.path());
    url.set_query(target.query());
    url.set_fragment(None);
    Ok(url)
}
