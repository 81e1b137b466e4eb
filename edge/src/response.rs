use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use serde::Serialize;

use admingate_misc::api;

/// A wrapper struct for HTTP responses that provides convenient methods
/// for the response types the edge produces itself.
pub struct Response {
    http_response: HttpResponse,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl Response {
    /// A temporary redirect to the given location. Redirects must stay
    /// temporary: the decision behind them is recomputed per request.
    pub fn redirect(location: &str) -> Self {
        Self {
            http_response: HttpResponse::TemporaryRedirect()
                .insert_header((api::HEADER_LOCATION, location))
                .finish(),
        }
    }

    pub fn bad_gateway(message: impl AsRef<str>) -> Self {
        let message = format!("Upstream error: {}", message.as_ref());
        Self::err_response(StatusCode::BAD_GATEWAY, message)
    }

    pub fn error(message: &str) -> Self {
        let message = format!("Server error: {message}");
        Self::err_response(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn from_http(http_response: HttpResponse) -> Self {
        Self { http_response }
    }

    fn err_response(status: StatusCode, message: String) -> Self {
        let body = ErrorBody {
            code: status.as_u16(),
            message,
        };
        Self {
            http_response: HttpResponseBuilder::new(status).json(body),
        }
    }
}

impl From<Response> for HttpResponse {
    fn from(val: Response) -> Self {
        val.http_response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect() {
        let resp: HttpResponse = Response::redirect("/admin/login?next=%2Fadmin").into();
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = resp.headers().get(api::HEADER_LOCATION).unwrap();
        assert_eq!(location.to_str().unwrap(), "/admin/login?next=%2Fadmin");
    }

    #[test]
    fn test_errors() {
        let resp: HttpResponse = Response::bad_gateway("connection refused").into();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let resp: HttpResponse = Response::error("boom").into();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
