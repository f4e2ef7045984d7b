//! Shared mock-server helpers for integration tests

#![allow(dead_code)]

use canvas_sdk::{Canvas, ClientConfig};
use serde_json::{json, Value};
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

/// Serves a Canvas-style paged collection, honoring the `page` query
/// parameter and emitting a full `Link` header on every page
pub struct PagedCollection {
    pub total_pages: u32,
    pub per_page: u32,
    /// Pages answered with a 403 rate-limit rejection
    pub throttled: Vec<u32>,
    pub record: fn(u32, u32) -> Value,
}

impl PagedCollection {
    pub fn courses(total_pages: u32, per_page: u32) -> Self {
        Self {
            total_pages,
            per_page,
            throttled: Vec::new(),
            record: |page, i| {
                json!({ "id": page * 1000 + i, "name": format!("Course {page}-{i}") })
            },
        }
    }

    pub fn with_record(mut self, record: fn(u32, u32) -> Value) -> Self {
        self.record = record;
        self
    }

    pub fn throttle(mut self, pages: &[u32]) -> Self {
        self.throttled = pages.to_vec();
        self
    }
}

pub fn query_value(request: &Request, key: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

impl Respond for PagedCollection {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let page: u32 = query_value(request, "page")
            .and_then(|p| p.parse().ok())
            .unwrap_or(1);

        if self.throttled.contains(&page) {
            return ResponseTemplate::new(403)
                .insert_header("X-Rate-Limit-Remaining", "0.0")
                .set_body_string("403 Forbidden (Rate Limit Exceeded)");
        }

        let base = request.url.as_str().split('?').next().unwrap_or_default().to_string();
        let link = |p: u32, rel: &str| {
            format!("<{base}?page={p}&per_page={}>; rel=\"{rel}\"", self.per_page)
        };
        let mut links = vec![link(page, "current")];
        if page < self.total_pages {
            links.push(link(page + 1, "next"));
        }
        if page > 1 {
            links.push(link(page - 1, "prev"));
        }
        links.push(link(1, "first"));
        links.push(link(self.total_pages, "last"));

        let records: Vec<Value> = (0..self.per_page).map(|i| (self.record)(page, i)).collect();
        ResponseTemplate::new(200)
            .insert_header("Link", links.join(",").as_str())
            .set_body_json(records)
    }
}

/// Client pointed at the mock server's `/api/v1`, unthrottled
pub fn canvas_for(server: &MockServer, token: &str, page_size: u32) -> Canvas {
    let mut config = ClientConfig::new(format!("{}/api/v1", server.uri())).with_token(token);
    config.page_size = page_size;
    config.rate_limit = None;
    Canvas::new(&config).unwrap()
}
