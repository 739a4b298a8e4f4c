//! Secure link codec
//!
//! `https://<host>/receive/?packageCode=<code>#keycode=<keycode>` — the
//! package code rides in the query string (the server resolves it), the
//! keycode in the fragment, which never leaves the client in any request.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use sealdrop_core::{SdResult, SealdropError};

/// Build a secure link for a finalized package.
pub fn encode(base: &str, package_code: &str, keycode: &str) -> SdResult<String> {
    let mut url = Url::parse(base)
        .map_err(|e| SealdropError::InvalidLink(format!("invalid base URL: {e}")))?;
    url.set_path("/receive/");
    url.query_pairs_mut()
        .clear()
        .append_pair("packageCode", package_code);
    url.set_fragment(Some(&format!("keycode={keycode}")));
    Ok(url.to_string())
}

/// Split a secure link into `(package_code, keycode)`.
pub fn decode(link: &str) -> SdResult<(String, String)> {
    let url =
        Url::parse(link).map_err(|e| SealdropError::InvalidLink(format!("not a URL: {e}")))?;

    let package_code = url
        .query_pairs()
        .find(|(key, _)| key == "packageCode")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| {
            SealdropError::InvalidLink("missing packageCode query parameter".into())
        })?;

    let keycode = url
        .fragment()
        .and_then(|fragment| {
            fragment
                .split('&')
                .find_map(|pair| pair.strip_prefix("keycode="))
        })
        .filter(|keycode| !keycode.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SealdropError::InvalidLink("missing keycode fragment".into()))?;

    Ok((package_code, keycode))
}

/// Extract every well-formed secure link embedded in free text (for
/// example a pasted email body). Hosts are not constrained; matches are
/// returned in order of appearance.
pub fn scan(text: &str) -> Vec<String> {
    static LINK_RE: OnceLock<Regex> = OnceLock::new();
    let re = LINK_RE.get_or_init(|| {
        Regex::new(
            r#"https?://[^\s"'<>]+/receive/\?[^\s"'<>#]*packageCode=[^\s"'<>#&]+[^\s"'<>#]*#keycode=[A-Za-z0-9_-]+"#,
        )
        .expect("secure link pattern")
    });
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}
