//! Pagination headers: `X-Total-Count` plus an RFC 5988 `Link` header with
//! `next`, `prev`, `last` and `first` relations.

use axum::http::{HeaderName, HeaderValue, header};
use phoneservice_storage::Page;

use crate::Headers;

pub const X_TOTAL_COUNT: &str = "x-total-count";

fn page_uri(base_url: &str, page: u64, size: u32, query: Option<&str>) -> String {
    match query {
        Some(q) => format!(
            "{base_url}?page={page}&size={size}&query={}",
            urlencoding::encode(q)
        ),
        None => format!("{base_url}?page={page}&size={size}"),
    }
}

fn link_header<T>(page: &Page<T>, base_url: &str, query: Option<&str>) -> String {
    let number = u64::from(page.number);
    let mut links = Vec::with_capacity(4);
    if number + 1 < page.total_pages() {
        links.push(format!(
            "<{}>; rel=\"next\"",
            page_uri(base_url, number + 1, page.size, query)
        ));
    }
    if number > 0 {
        links.push(format!(
            "<{}>; rel=\"prev\"",
            page_uri(base_url, number - 1, page.size, query)
        ));
    }
    let last = page.total_pages().saturating_sub(1);
    links.push(format!(
        "<{}>; rel=\"last\"",
        page_uri(base_url, last, page.size, query)
    ));
    links.push(format!(
        "<{}>; rel=\"first\"",
        page_uri(base_url, 0, page.size, query)
    ));
    links.join(",")
}

fn headers<T>(page: &Page<T>, base_url: &str, query: Option<&str>) -> Headers {
    let mut out = vec![(
        HeaderName::from_static(X_TOTAL_COUNT),
        HeaderValue::from(page.total_elements),
    )];
    if let Ok(link) = HeaderValue::from_str(&link_header(page, base_url, query)) {
        out.push((header::LINK, link));
    }
    out
}

/// Headers for a page of a listing served at `base_url`.
pub fn pagination_headers<T>(page: &Page<T>, base_url: &str) -> Headers {
    headers(page, base_url, None)
}

/// Headers for a page of search results; links repeat the encoded query.
pub fn search_pagination_headers<T>(query: &str, page: &Page<T>, base_url: &str) -> Headers {
    headers(page, base_url, Some(query))
}
