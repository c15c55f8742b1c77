//! HTTP transport types shared by the signer, the transport and the pager.
//!
//! # Design
//! Requests and responses are plain data. `CbwClient::build_request`
//! produces an `HttpRequest`, a `Transport` turns it into an
//! `HttpResponse`, and the normalizer consumes that response. Keeping the
//! wire shape as owned values lets tests feed canned responses straight
//! into the normalizer and pager without a socket.

use std::collections::BTreeMap;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Upper-case verb as sent on the wire and used in the signature.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built, signed HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Every response the server actually sent ends up here, whatever its
/// status code. Status interpretation belongs to the normalizer.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Link relations parsed from `Link` headers, keyed by relation name.
pub type LinkMap = BTreeMap<String, String>;

impl HttpResponse {
    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All link relations advertised by the response.
    pub fn links(&self) -> LinkMap {
        let mut links = LinkMap::new();
        for (_, value) in self.headers.iter().filter(|(k, _)| k.eq_ignore_ascii_case("link")) {
            links.extend(parse_link_header(value));
        }
        links
    }
}

/// Parse one `Link` header value (RFC 8288 subset).
///
/// Entries look like `<https://host/path?page=2>; rel="next"`. Entries
/// without a `<...>` target or a `rel` parameter are skipped.
pub fn parse_link_header(value: &str) -> LinkMap {
    let mut links = LinkMap::new();
    for entry in split_entries(value) {
        let entry = entry.trim();
        let Some(rest) = entry.strip_prefix('<') else {
            continue;
        };
        let Some(end) = rest.find('>') else {
            continue;
        };
        let target = &rest[..end];
        for param in rest[end + 1..].split(';') {
            let Some((key, val)) = param.split_once('=') else {
                continue;
            };
            if !key.trim().eq_ignore_ascii_case("rel") {
                continue;
            }
            for rel in val.trim().trim_matches('"').split_whitespace() {
                links.insert(rel.to_ascii_lowercase(), target.to_string());
            }
        }
    }
    links
}

/// Split on commas that are not inside a `<...>` target.
fn split_entries(value: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                entries.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&value[start..]);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(headers: &[(&str, &str)]) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            body: String::new(),
        }
    }

    #[test]
    fn parses_next_and_last_relations() {
        let links = parse_link_header(
            r#"<https://cbw.local/api/v3/servers?page=2&per_page=100>; rel="next", <https://cbw.local/api/v3/servers?page=7&per_page=100>; rel="last""#,
        );
        assert_eq!(links["next"], "https://cbw.local/api/v3/servers?page=2&per_page=100");
        assert_eq!(links["last"], "https://cbw.local/api/v3/servers?page=7&per_page=100");
    }

    #[test]
    fn unquoted_and_multi_value_rel() {
        let links = parse_link_header("</a?page=3>; rel=next, </b?page=1>; rel=\"first prev\"");
        assert_eq!(links["next"], "/a?page=3");
        assert_eq!(links["first"], "/b?page=1");
        assert_eq!(links["prev"], "/b?page=1");
    }

    #[test]
    fn commas_inside_target_do_not_split() {
        let links = parse_link_header(r#"</s?ids=1,2,3&page=2>; rel="next""#);
        assert_eq!(links["next"], "/s?ids=1,2,3&page=2");
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let links = parse_link_header(r#"garbage, <no-rel>, </ok?page=2>; rel="next""#);
        assert_eq!(links.len(), 1);
        assert!(links.contains_key("next"));
    }

    #[test]
    fn links_merges_repeated_headers_case_insensitively() {
        let response = response_with(&[
            ("link", r#"</x?page=2>; rel="next""#),
            ("Link", r#"</x?page=1>; rel="prev""#),
        ]);
        let links = response.links();
        assert_eq!(links.len(), 2);
        assert_eq!(response.header("LINK"), Some(r#"</x?page=2>; rel="next""#));
    }

    #[test]
    fn no_link_header_means_no_relations() {
        assert!(response_with(&[("content-type", "application/json")]).links().is_empty());
    }

    #[test]
    fn method_names_match_wire_verbs() {
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}
