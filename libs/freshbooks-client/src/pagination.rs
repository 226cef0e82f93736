//! Page-number pagination for FreshBooks list endpoints.
//!
//! The next page is taken from a `Link: <...>; rel="next"` response header
//! when present, and otherwise computed from the body `meta` block.

use http::HeaderMap;
use url::Url;

use crate::models::PageMeta;

/// Page size used when the caller asks for none or for more than the API
/// allows.
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Largest page size the API honours.
pub const MAX_PER_PAGE: u32 = 100;

/// Requested page. Out-of-range values are clamped when the request is
/// built, so callers may pass raw cursor input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    /// 1-based page number; `<= 0` means the first page.
    pub page: i64,
    /// Items per page; `<= 0` or above [`MAX_PER_PAGE`] means
    /// [`DEFAULT_PER_PAGE`].
    pub per_page: i64,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self::first(i64::from(DEFAULT_PER_PAGE))
    }
}

impl PageOptions {
    #[must_use]
    pub fn first(per_page: i64) -> Self {
        Self { page: 1, per_page }
    }

    #[must_use]
    pub fn effective_page(&self) -> u32 {
        u32::try_from(self.page).ok().filter(|p| *p > 0).unwrap_or(1)
    }

    #[must_use]
    pub fn effective_per_page(&self) -> u32 {
        u32::try_from(self.per_page)
            .ok()
            .filter(|p| (1..=MAX_PER_PAGE).contains(p))
            .unwrap_or(DEFAULT_PER_PAGE)
    }

    /// Set `page` and `per_page` on `url`, replacing existing values.
    pub(crate) fn apply(&self, url: &mut Url) {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "page" && k != "per_page")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs
            .append_pair("page", &self.effective_page().to_string())
            .append_pair("per_page", &self.effective_per_page().to_string());
    }
}

/// One page of results plus the cursor for the following page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` once the last page has been returned.
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next_page.is_none()
    }
}

/// Work out the page after the one just fetched.
///
/// `request_url` resolves relative `Link` targets.
pub(crate) fn next_page(
    headers: &HeaderMap,
    request_url: &Url,
    meta: Option<&PageMeta>,
) -> Option<u32> {
    let from_link = headers
        .get_all(http::header::LINK)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| next_from_link_header(v, request_url));

    from_link.or_else(|| meta.and_then(next_from_meta))
}

/// Page number of the `rel="next"` entry of a `Link` header value.
fn next_from_link_header(value: &str, base: &Url) -> Option<u32> {
    value.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts
            .next()?
            .trim()
            .strip_prefix('<')?
            .strip_suffix('>')?;

        let is_next = parts.any(|param| {
            let Some((key, val)) = param.split_once('=') else {
                return false;
            };
            key.trim().eq_ignore_ascii_case("rel")
                && val
                    .trim()
                    .trim_matches('"')
                    .split_ascii_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        });
        if !is_next {
            return None;
        }

        let url = base.join(target).ok()?;
        url.query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse().ok())
    })
}

fn next_from_meta(meta: &PageMeta) -> Option<u32> {
    let seen = u64::from(meta.page) * u64::from(meta.per_page);
    (meta.page > 0 && meta.per_page > 0 && seen < meta.total)
        .then(|| meta.page.checked_add(1))
        .flatten()
}
