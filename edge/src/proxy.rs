use actix_web::http::StatusCode;
use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponseBuilder};
use log::{debug, error};

use crate::response::Response;

/// Headers that describe the connection rather than the message; they
/// must not travel across the proxy hop.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

/// Forwards pass-through requests to the storefront origin.
///
/// The proxy copies bytes; it understands nothing about the pages it
/// carries. Upstream failure maps to 502.
pub struct Proxy {
    site_url: String,
    client: reqwest::Client,
}

impl Proxy {
    pub fn new(site_url: &str) -> Self {
        Self {
            site_url: site_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn forward(&self, req: &HttpRequest, body: Option<Bytes>) -> Response {
        let mut url = format!("{}{}", self.site_url, req.path());
        if !req.query_string().is_empty() {
            url.push('?');
            url.push_str(req.query_string());
        }
        debug!("Proxy: {} {}", req.method(), url);

        let method = match reqwest::Method::from_bytes(req.method().as_str().as_bytes()) {
            Ok(method) => method,
            Err(_) => return Response::error("unsupported method"),
        };

        let mut upstream = self.client.request(method, &url);
        for (key, value) in req.headers() {
            if is_hop_by_hop(key.as_str()) {
                continue;
            }
            let value = match value.to_str() {
                Ok(value) => value,
                Err(_) => continue,
            };
            upstream = upstream.header(key.as_str(), value);
        }
        if let Some(body) = body {
            upstream = upstream.body(body.to_vec());
        }

        let resp = match upstream.send().await {
            Ok(resp) => resp,
            Err(e) => {
                error!("Proxy: upstream request error: {e:#}");
                return Response::bad_gateway(e.to_string());
            }
        };

        let status = StatusCode::from_u16(resp.status().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut builder = HttpResponseBuilder::new(status);
        for (key, value) in resp.headers() {
            if is_hop_by_hop(key.as_str()) {
                continue;
            }
            let value = match value.to_str() {
                Ok(value) => value,
                Err(_) => continue,
            };
            builder.append_header((key.as_str(), value));
        }

        let data = match resp.bytes().await {
            Ok(data) => data,
            Err(e) => {
                error!("Proxy: read upstream response error: {e:#}");
                return Response::bad_gateway(e.to_string());
            }
        };

        Response::from_http(builder.body(data))
    }
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}
