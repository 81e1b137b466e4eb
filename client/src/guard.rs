use std::sync::{Arc, Mutex};

use log::debug;

use admingate_misc::policy::{Role, LOGIN_PATH};
use admingate_misc::redirect::{continuation, fallback_path, login_url};

use crate::identity::IdentityState;

/// A renderable UI unit with typed inputs.
///
/// The guard is a decorator over this trait: wrapping a view does not
/// change its props type, and an authorized render passes the props
/// through untouched.
pub trait View: Send + Sync {
    type Props;

    fn render(&self, props: &Self::Props) -> String;
}

/// Issues client-side navigations.
///
/// The guard only schedules redirects through this seam, so the
/// embedding shell decides how a navigation actually happens and tests
/// can observe what was scheduled.
pub trait Navigator: Send + Sync {
    fn navigate(&self, to: &str);
}

/// Placeholder rendered while the identity is still in flight.
pub trait LoadingView: Send + Sync {
    fn render(&self) -> String;
}

/// Built-in loading placeholder.
pub struct Skeleton;

impl LoadingView for Skeleton {
    fn render(&self) -> String {
        String::from(r#"<div class="admin-skeleton" aria-busy="true"></div>"#)
    }
}

pub struct GuardOptions {
    /// Roles allowed to see the wrapped view.
    pub allowed_roles: Vec<Role>,

    /// Where an unauthenticated caller is sent; the current destination
    /// travels along as the continuation parameter.
    pub redirect_to: String,

    /// Rendered while the identity is loading.
    pub loading: Box<dyn LoadingView>,
}

impl Default for GuardOptions {
    fn default() -> Self {
        Self {
            allowed_roles: Role::all().to_vec(),
            redirect_to: LOGIN_PATH.to_string(),
            loading: Box::new(Skeleton),
        }
    }
}

/// Output of one guard render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Identity still loading; placeholder markup, no redirect decision
    /// has been made yet.
    Loading(String),
    /// Authorized; the wrapped view's markup.
    Content(String),
    /// A redirect has been scheduled; nothing must be shown while it is
    /// pending.
    Empty,
}

/// Wraps a view and repeats the edge policy decision against the
/// client-held identity.
///
/// This is the defense-in-depth half of the authorization layer: it must
/// hold even when the edge gate is bypassed by configuration. It renders
/// loading/redirect UX instead of ever flashing protected content.
pub struct Guard<V: View> {
    view: V,
    opts: GuardOptions,
    navigator: Arc<dyn Navigator>,

    last_redirect_epoch: Mutex<Option<u64>>,
}

impl<V: View> Guard<V> {
    pub fn new(view: V, navigator: Arc<dyn Navigator>) -> Self {
        Self::with_options(view, navigator, GuardOptions::default())
    }

    pub fn with_options(view: V, navigator: Arc<dyn Navigator>, opts: GuardOptions) -> Self {
        Self {
            view,
            opts,
            navigator,
            last_redirect_epoch: Mutex::new(None),
        }
    }

    /// Guard letting only super admins through.
    pub fn super_admin_only(view: V, navigator: Arc<dyn Navigator>) -> Self {
        Self::with_options(
            view,
            navigator,
            GuardOptions {
                allowed_roles: vec![Role::SuperAdmin],
                ..GuardOptions::default()
            },
        )
    }

    /// Guard letting the two admin roles through, excluding delivery
    /// partners.
    pub fn admins_only(view: V, navigator: Arc<dyn Navigator>) -> Self {
        Self::with_options(
            view,
            navigator,
            GuardOptions {
                allowed_roles: vec![Role::SuperAdmin, Role::Admin],
                ..GuardOptions::default()
            },
        )
    }

    /// Decides what to show for the current identity snapshot.
    ///
    /// `path` and `query` describe the current destination; they feed
    /// the continuation parameter when an unauthenticated caller is
    /// sent to login.
    pub fn render(&self, state: &IdentityState, path: &str, query: &str, props: &V::Props) -> Rendered {
        if state.is_loading {
            return Rendered::Loading(self.opts.loading.render());
        }

        let user = match &state.user {
            Some(user) => user,
            None => {
                let next = continuation(path, query);
                self.schedule_redirect(state, &login_url(&self.opts.redirect_to, &next));
                return Rendered::Empty;
            }
        };

        let role = user.role();
        let allowed = role.map(|r| self.opts.allowed_roles.contains(&r)).unwrap_or(false);
        if !allowed {
            self.schedule_redirect(state, fallback_path(role));
            return Rendered::Empty;
        }

        Rendered::Content(self.view.render(props))
    }

    /// Issues at most one navigation per identity epoch: a re-render
    /// with unchanged identity must not queue a duplicate, and a newer
    /// identity supersedes a redirect pending for the old one.
    fn schedule_redirect(&self, state: &IdentityState, to: &str) {
        let mut last = self.last_redirect_epoch.lock().unwrap();
        if *last == Some(state.epoch) {
            return;
        }
        *last = Some(state.epoch);

        debug!("Guard: scheduling navigation to {to}");
        self.navigator.navigate(to);
    }
}

#[cfg(test)]
mod tests {
    use admingate_misc::api::auth::SessionUser;

    use crate::identity::IdentityState;

    use super::*;

    struct PageView;

    struct PageProps {
        title: String,
    }

    impl View for PageView {
        type Props = PageProps;

        fn render(&self, props: &Self::Props) -> String {
            format!("<h1>{}</h1>", props.title)
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        targets: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, to: &str) {
            self.targets.lock().unwrap().push(to.to_string());
        }
    }

    impl RecordingNavigator {
        fn targets(&self) -> Vec<String> {
            self.targets.lock().unwrap().clone()
        }
    }

    fn user(role: &str) -> Option<SessionUser> {
        Some(SessionUser {
            role: role.to_string(),
            name: None,
            email: None,
        })
    }

    fn props() -> PageProps {
        PageProps {
            title: "Products".to_string(),
        }
    }

    #[test]
    fn test_loading_renders_placeholder() {
        let nav = Arc::new(RecordingNavigator::default());
        let guard = Guard::new(PageView, nav.clone());

        let rendered = guard.render(&IdentityState::loading(), "/admin", "", &props());
        assert_eq!(
            rendered,
            Rendered::Loading(Skeleton.render()),
            "loading state should show the skeleton"
        );

        // No redirect decision is made while loading
        assert!(nav.targets().is_empty());
    }

    #[test]
    fn test_unauthenticated_navigates_to_login() {
        let nav = Arc::new(RecordingNavigator::default());
        let guard = Guard::new(PageView, nav.clone());

        let state = IdentityState::loaded(None, 1);
        let rendered = guard.render(&state, "/admin/products", "page=2", &props());
        assert_eq!(rendered, Rendered::Empty);
        assert_eq!(
            nav.targets(),
            vec!["/admin/login?next=%2Fadmin%2Fproducts%3Fpage%3D2".to_string()]
        );
    }

    #[test]
    fn test_redirect_keyed_on_epoch() {
        let nav = Arc::new(RecordingNavigator::default());
        let guard = Guard::new(PageView, nav.clone());

        // Rapid re-renders with the same identity issue one navigation
        let state = IdentityState::loaded(None, 1);
        guard.render(&state, "/admin", "", &props());
        guard.render(&state, "/admin", "", &props());
        guard.render(&state, "/admin", "", &props());
        assert_eq!(nav.targets().len(), 1);

        // A newer identity supersedes the pending redirect
        let state = IdentityState::loaded(None, 2);
        guard.render(&state, "/admin", "", &props());
        assert_eq!(nav.targets().len(), 2);
    }

    #[test]
    fn test_allowed_role_renders_content() {
        let nav = Arc::new(RecordingNavigator::default());
        let guard = Guard::new(PageView, nav.clone());

        // Props pass through the wrap unchanged
        let state = IdentityState::loaded(user("ADMIN"), 1);
        let rendered = guard.render(&state, "/admin/products", "", &props());
        assert_eq!(rendered, Rendered::Content("<h1>Products</h1>".to_string()));
        assert!(nav.targets().is_empty());
    }

    #[test]
    fn test_delivery_partner_falls_back_to_orders() {
        let nav = Arc::new(RecordingNavigator::default());
        let guard = Guard::admins_only(PageView, nav.clone());

        let state = IdentityState::loaded(user("DELIVERY_PARTNER"), 1);
        let rendered = guard.render(&state, "/admin/products", "", &props());
        assert_eq!(rendered, Rendered::Empty);
        assert_eq!(nav.targets(), vec!["/admin/orders".to_string()]);
    }

    #[test]
    fn test_super_admin_only_sends_admin_home() {
        // An ADMIN behind a super-admin-only guard goes home, not to the
        // delivery landing path
        let nav = Arc::new(RecordingNavigator::default());
        let guard = Guard::super_admin_only(PageView, nav.clone());

        let state = IdentityState::loaded(user("ADMIN"), 1);
        let rendered = guard.render(&state, "/admin/settings", "", &props());
        assert_eq!(rendered, Rendered::Empty);
        assert_eq!(nav.targets(), vec!["/".to_string()]);

        // The super admin itself is let through
        let state = IdentityState::loaded(user("SUPER_ADMIN"), 2);
        let rendered = guard.render(&state, "/admin/settings", "", &props());
        assert_eq!(rendered, Rendered::Content("<h1>Products</h1>".to_string()));
    }

    #[test]
    fn test_unrecognized_role_goes_home() {
        let nav = Arc::new(RecordingNavigator::default());
        let guard = Guard::new(PageView, nav.clone());

        let state = IdentityState::loaded(user("CUSTOMER"), 1);
        let rendered = guard.render(&state, "/admin", "", &props());
        assert_eq!(rendered, Rendered::Empty);
        assert_eq!(nav.targets(), vec!["/".to_string()]);
    }

    #[test]
    fn test_custom_redirect_target() {
        let nav = Arc::new(RecordingNavigator::default());
        let guard = Guard::with_options(
            PageView,
            nav.clone(),
            GuardOptions {
                redirect_to: "/admin/register".to_string(),
                ..GuardOptions::default()
            },
        );

        let state = IdentityState::loaded(None, 1);
        guard.render(&state, "/admin", "", &props());
        assert_eq!(nav.targets(), vec!["/admin/register?next=%2Fadmin".to_string()]);
    }
}
