use serde::{Deserialize, Serialize};

/// Root prefix of the protected admin namespace.
pub const ADMIN_PREFIX: &str = "/admin";

/// The only prefix a delivery partner may reach.
pub const ORDERS_PREFIX: &str = "/admin/orders";

/// Login page, excluded from gating so unauthenticated users can reach it.
pub const LOGIN_PATH: &str = "/admin/login";

/// Register page, excluded from gating.
pub const REGISTER_PATH: &str = "/admin/register";

/// Fallback destination for authenticated users with no admin access.
pub const HOME_PATH: &str = "/";

/// Authorization class assigned to an authenticated session.
///
/// Roles are immutable for the lifetime of a session; a role change
/// requires re-authentication. The serde names are the exact strings the
/// identity service puts on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "SUPER_ADMIN")]
    SuperAdmin,

    #[serde(rename = "ADMIN")]
    Admin,

    #[serde(rename = "DELIVERY_PARTNER")]
    DeliveryPartner,
}

impl Role {
    /// Parses a wire role name. Unknown or empty names yield `None`;
    /// callers decide whether that means "unauthenticated" (empty) or
    /// "authenticated without admin access" (present but unrecognized).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SUPER_ADMIN" => Some(Self::SuperAdmin),
            "ADMIN" => Some(Self::Admin),
            "DELIVERY_PARTNER" => Some(Self::DeliveryPartner),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::Admin => "ADMIN",
            Self::DeliveryPartner => "DELIVERY_PARTNER",
        }
    }

    /// All known roles, in privilege order.
    pub fn all() -> [Role; 3] {
        [Self::SuperAdmin, Self::Admin, Self::DeliveryPartner]
    }
}

/// The static role -> path-prefix policy for the admin namespace.
///
/// This table is pure and side-effect free. It is the single artifact
/// shared by the edge gate and the client guard, so the two enforcement
/// points cannot drift apart.
pub struct PolicyTable;

impl PolicyTable {
    /// Answers whether `role` may access `path`.
    ///
    /// Full admins may reach everything under the protected namespace;
    /// delivery partners only the orders subtree. Paths outside the
    /// namespace are nobody's business here and always return false.
    pub fn allows(role: Role, path: &str) -> bool {
        if !Self::is_protected(path) {
            return false;
        }

        Self::allowed_prefixes(role)
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }

    /// The set of path prefixes a role may access.
    pub fn allowed_prefixes(role: Role) -> &'static [&'static str] {
        match role {
            Role::SuperAdmin | Role::Admin => &[ADMIN_PREFIX],
            Role::DeliveryPartner => &[ORDERS_PREFIX],
        }
    }

    /// Whether `path` falls under the protected admin namespace.
    pub fn is_protected(path: &str) -> bool {
        path.starts_with(ADMIN_PREFIX)
    }

    /// Whether `path` is one of the unauthenticated entry points.
    pub fn is_public_entry(path: &str) -> bool {
        path.starts_with(LOGIN_PATH) || path.starts_with(REGISTER_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names() {
        // Wire names round-trip through parse
        for role in Role::all() {
            assert_eq!(Role::from_name(role.name()), Some(role));
        }

        // Unknown and empty names have no role
        assert_eq!(Role::from_name("CUSTOMER"), None);
        assert_eq!(Role::from_name("admin"), None);
        assert_eq!(Role::from_name(""), None);

        // Serde uses the same wire names
        let s = serde_json::to_string(&Role::DeliveryPartner).unwrap();
        assert_eq!(s, "\"DELIVERY_PARTNER\"");
        let role: Role = serde_json::from_str("\"SUPER_ADMIN\"").unwrap();
        assert_eq!(role, Role::SuperAdmin);
    }

    #[test]
    fn test_allows() {
        // Full admins reach everything under the namespace
        for role in [Role::SuperAdmin, Role::Admin] {
            assert!(PolicyTable::allows(role, "/admin"));
            assert!(PolicyTable::allows(role, "/admin/products"));
            assert!(PolicyTable::allows(role, "/admin/orders/123"));
            assert!(PolicyTable::allows(role, "/admin/users/55/edit"));
        }

        // Delivery partners only reach the orders subtree
        assert!(PolicyTable::allows(Role::DeliveryPartner, "/admin/orders"));
        assert!(PolicyTable::allows(
            Role::DeliveryPartner,
            "/admin/orders/123"
        ));
        assert!(PolicyTable::allows(
            Role::DeliveryPartner,
            "/admin/orders/123/dispatch"
        ));
        assert!(!PolicyTable::allows(Role::DeliveryPartner, "/admin"));
        assert!(!PolicyTable::allows(
            Role::DeliveryPartner,
            "/admin/products"
        ));

        // Nothing outside the namespace is answered positively
        for role in Role::all() {
            assert!(!PolicyTable::allows(role, "/"));
            assert!(!PolicyTable::allows(role, "/cart"));
        }
    }

    #[test]
    fn test_path_classification() {
        assert!(PolicyTable::is_protected("/admin"));
        assert!(PolicyTable::is_protected("/admin/orders/1"));
        assert!(!PolicyTable::is_protected("/"));
        assert!(!PolicyTable::is_protected("/products"));

        assert!(PolicyTable::is_public_entry("/admin/login"));
        assert!(PolicyTable::is_public_entry("/admin/register"));
        assert!(!PolicyTable::is_public_entry("/admin"));
        assert!(!PolicyTable::is_public_entry("/admin/users"));
    }
}
