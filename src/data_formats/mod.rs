mod request;
mod response;

pub use request::*;
pub use response::*;

use serde::Serialize;

use crate::config::MAX_PAGE_SIZE;

/// Page-number pagination envelope shared by every paginated listing.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// `retained` is the query string to carry into the page links,
    /// without any `page` parameter.
    pub fn new(path: &str, retained: &str, page: u32, limit: u32, count: i64, results: Vec<T>) -> Page<T> {
        let next = if i64::from(page) * i64::from(limit) < count {
            Some(page_url(path, retained, page + 1))
        } else {
            None
        };
        let previous = if page > 1 {
            Some(page_url(path, retained, page - 1))
        } else {
            None
        };
        Page {
            count,
            next,
            previous,
            results,
        }
    }
}

fn page_url(path: &str, retained: &str, page: u32) -> String {
    if retained.is_empty() {
        format!("{path}?page={page}")
    } else {
        format!("{path}?{retained}&page={page}")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

impl PageQuery {
    pub fn parse(query: &str, default_limit: u32) -> PageQuery {
        let mut page = 1;
        let mut limit = default_limit;
        for (key, value) in query_pairs(query) {
            match key.as_str() {
                "page" => page = value.parse().unwrap_or(1).max(1),
                "limit" => limit = parse_limit(&value, default_limit),
                _ => {}
            }
        }
        PageQuery { page, limit }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn retained_query(&self) -> String {
        format!("limit={}", self.limit)
    }
}

/// Filters of the recipe listing. The boolean filters are kept as
/// parsed; handlers drop them for anonymous viewers.
#[derive(Debug, Clone, Default)]
pub struct RecipeListQuery {
    pub page: u32,
    pub limit: u32,
    pub tags: Vec<String>,
    pub author: Option<i64>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

impl RecipeListQuery {
    pub fn parse(query: &str, default_limit: u32) -> RecipeListQuery {
        let mut parsed = RecipeListQuery {
            page: 1,
            limit: default_limit,
            ..Default::default()
        };
        for (key, value) in query_pairs(query) {
            match key.as_str() {
                "page" => parsed.page = value.parse().unwrap_or(1).max(1),
                "limit" => parsed.limit = parse_limit(&value, default_limit),
                "tags" => parsed.tags.push(value),
                "author" => parsed.author = value.parse().ok(),
                "is_favorited" => parsed.is_favorited = parse_flag(&value),
                "is_in_shopping_cart" => parsed.is_in_shopping_cart = parse_flag(&value),
                _ => {}
            }
        }
        parsed
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    /// Canonical query string for pagination links, `page` excluded.
    pub fn retained_query(&self) -> String {
        let mut parts = Vec::new();
        for slug in &self.tags {
            parts.push(format!("tags={slug}"));
        }
        if let Some(author) = self.author {
            parts.push(format!("author={author}"));
        }
        if let Some(flag) = self.is_favorited {
            parts.push(format!("is_favorited={}", flag as u8));
        }
        if let Some(flag) = self.is_in_shopping_cart {
            parts.push(format!("is_in_shopping_cart={}", flag as u8));
        }
        parts.push(format!("limit={}", self.limit));
        parts.join("&")
    }
}

fn parse_limit(value: &str, default_limit: u32) -> u32 {
    value
        .parse::<u32>()
        .map(|limit| limit.clamp(1, MAX_PAGE_SIZE))
        .unwrap_or(default_limit)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Splits a raw query string into decoded key/value pairs. Needed
/// because `tags` repeats, which a map-based extractor would collapse.
pub fn query_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((key, value)) => (percent_decode(key), percent_decode(value)),
            None => (percent_decode(part), String::new()),
        })
        .collect()
}

fn percent_decode(value: &str) -> String {
    let mut out = Vec::with_capacity(value.len());
    let mut bytes = value.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'+' => out.push(b' '),
            b'%' => {
                let hi = bytes.next();
                let lo = bytes.next();
                match (hi.and_then(hex_digit), lo.and_then(hex_digit)) {
                    (Some(hi), Some(lo)) => out.push(hi * 16 + lo),
                    // Not an escape; keep the consumed bytes verbatim.
                    _ => {
                        out.push(b'%');
                        out.extend(hi);
                        out.extend(lo);
                    }
                }
            }
            other => out.push(other),
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
