//! Cursor-following collection fetches.
//!
//! Collection endpoints return a JSON array per page and advertise the
//! following page in a `Link: <...?page=N>; rel="next"` header. The pager
//! keeps requesting until that relation disappears and concatenates the
//! pages in the order they were served. A failing page aborts the whole
//! fetch; partially collected items are dropped.

use std::collections::BTreeSet;

use crate::client::CbwClient;
use crate::diagnostics::Event;
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpMethod, HttpResponse};
use crate::normalize::normalize_record;
use crate::record::Record;
use crate::types::{Endpoint, ExpectedStatus, Params};

pub const DEFAULT_PER_PAGE: u32 = 100;
pub const PAGE_PARAM: &str = "page";
pub const PER_PAGE_PARAM: &str = "per_page";

impl CbwClient {
    /// Fetch every item of a collection.
    ///
    /// When `params` names a `page`, exactly that page is requested and
    /// returned as served. Otherwise `per_page` defaults to
    /// `DEFAULT_PER_PAGE` and `next` links are followed to the end.
    pub fn fetch_all(&self, method: HttpMethod, route: &str, params: &Params) -> ApiResult<Vec<Record>> {
        let mut query = params.clone();
        query
            .entry(PER_PAGE_PARAM.to_string())
            .or_insert_with(|| DEFAULT_PER_PAGE.to_string());

        if query.contains_key(PAGE_PARAM) {
            let (_, items) = self.fetch_page(method, route, &query)?;
            return Ok(items);
        }

        let mut items = Vec::new();
        let mut seen = BTreeSet::new();
        loop {
            let (response, page_items) = self.fetch_page(method, route, &query)?;
            items.extend(page_items);

            let Some(page) = next_page(&response)? else {
                break;
            };
            if !seen.insert(page.clone()) {
                return Err(ApiError::Pagination(format!(
                    "{route} links back to page {page} which was already fetched"
                )));
            }
            query.insert(PAGE_PARAM.to_string(), page);
        }
        Ok(items)
    }

    fn fetch_page(
        &self,
        method: HttpMethod,
        route: &str,
        query: &Params,
    ) -> ApiResult<(HttpResponse, Vec<Record>)> {
        let endpoint = Endpoint::new(method, route).query(query);
        let response = self.execute(&endpoint)?;
        let record = normalize_record(route, &response, ExpectedStatus::Exactly(200), self.diagnostics())?;
        let items = match record.into_items() {
            Ok(items) => items,
            Err(single) if query.contains_key(PAGE_PARAM) && single.is_object() => vec![single],
            Err(_) => {
                let reason = "expected a JSON array page".to_string();
                self.diagnostics().record(Event::DecodeFailed { route, reason: &reason });
                return Err(ApiError::Decode {
                    reason,
                    body: response.body,
                });
            }
        };
        self.diagnostics().record(Event::PageFetched {
            route,
            page: query.get(PAGE_PARAM).map(String::as_str),
            items: items.len(),
        });
        Ok((response, items))
    }
}

/// Page token of the response's `next` relation, if it has one.
pub fn next_page(response: &HttpResponse) -> ApiResult<Option<String>> {
    let links = response.links();
    let Some(next) = links.get("next") else {
        return Ok(None);
    };
    let query = next
        .split_once('?')
        .map(|(_, q)| q.split('#').next().unwrap_or(""))
        .unwrap_or("");
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == PAGE_PARAM)
        .map(|(_, value)| Some(value.into_owned()))
        .ok_or_else(|| ApiError::Pagination(format!("next link {next} has no page parameter")))
}
