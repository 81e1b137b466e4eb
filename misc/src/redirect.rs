use url::form_urlencoded;

use crate::policy::{Role, HOME_PATH, ORDERS_PREFIX};

/// Query parameter carrying the original destination across a login
/// redirect.
pub const NEXT_PARAM: &str = "next";

/// Joins the original path and query string into the continuation that
/// gets preserved across a login redirect.
pub fn continuation(path: &str, query: &str) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    format!("{path}?{query}")
}

/// Builds the login URL carrying `next` as the continuation parameter.
///
/// The continuation is percent-encoded losslessly, so a destination that
/// itself contains a query string survives the round trip.
pub fn login_url(login_path: &str, next: &str) -> String {
    let encoded: String = form_urlencoded::Serializer::new(String::new())
        .append_pair(NEXT_PARAM, next)
        .finish();
    format!("{login_path}?{encoded}")
}

/// Recovers the continuation from a login URL's query string.
pub fn parse_next(query: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == NEXT_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// The destination for an authenticated role that is not authorized for
/// its current path.
pub fn fallback_path(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::DeliveryPartner) => ORDERS_PREFIX,
        _ => HOME_PATH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::LOGIN_PATH;

    #[test]
    fn test_continuation() {
        assert_eq!(continuation("/admin/users", ""), "/admin/users");
        assert_eq!(
            continuation("/admin/products", "page=2"),
            "/admin/products?page=2"
        );
    }

    #[test]
    fn test_login_url() {
        // Plain path encodes its slashes
        assert_eq!(
            login_url(LOGIN_PATH, "/admin/users"),
            "/admin/login?next=%2Fadmin%2Fusers"
        );

        // Embedded query string is encoded too
        let url = login_url(LOGIN_PATH, "/admin/products?page=2");
        assert_eq!(url, "/admin/login?next=%2Fadmin%2Fproducts%3Fpage%3D2");
    }

    #[test]
    fn test_round_trip() {
        // Encoding a destination with query parameters and decoding it
        // back yields the identical path and query string
        let next = continuation("/admin/products", "page=2&sort=name desc");
        let url = login_url(LOGIN_PATH, &next);
        let query = url.split('?').nth(1).unwrap();
        assert_eq!(parse_next(query).unwrap(), next);

        // Continuation absent
        assert_eq!(parse_next("other=1"), None);
        assert_eq!(parse_next(""), None);
    }

    #[test]
    fn test_fallback_path() {
        assert_eq!(fallback_path(Some(Role::DeliveryPartner)), "/admin/orders");
        assert_eq!(fallback_path(Some(Role::Admin)), "/");
        assert_eq!(fallback_path(Some(Role::SuperAdmin)), "/");
        assert_eq!(fallback_path(None), "/");
    }
}
