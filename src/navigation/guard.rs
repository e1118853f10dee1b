use super::routes::{paths, ResolvedRoute, RouteAccess, RouteMeta};
use crate::session::SessionStore;
use std::sync::Arc;
use tracing::debug;

/// Suffix appended to the title of every non-public route.
pub const ADMIN_PANEL_LABEL: &str = "Admin Panel";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// The guard's verdict plus the title computed for the target route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Guarded {
    pub decision: GuardDecision,
    pub title: Option<String>,
}

/// Runs before every transition. UX only; the API must still enforce access.
pub struct NavigationGuard {
    session: Arc<SessionStore>,
    login_path: String,
    dashboard_path: String,
}

impl NavigationGuard {
    #[must_use]
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self {
            session,
            login_path: paths::LOGIN.to_string(),
            dashboard_path: paths::DASHBOARD.to_string(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Evaluates the transition `from` -> `to`. Checks run in a fixed order and
    /// the first redirect wins.
    pub async fn before_each(&self, from: Option<&ResolvedRoute>, to: &ResolvedRoute) -> Guarded {
        self.session.initialize().await;

        let title = page_title(&to.meta);
        debug!(
            from = from.map_or("-", |route| route.path.as_str()),
            to = %to.path,
            "evaluating route access"
        );

        let decision = match to.meta.access {
            RouteAccess::Public => GuardDecision::Allow,
            RouteAccess::RequiresAuth if !self.session.is_logged_in().await => {
                GuardDecision::Redirect(self.login_path.clone())
            }
            RouteAccess::GuestOnly if self.session.is_logged_in().await => {
                GuardDecision::Redirect(self.dashboard_path.clone())
            }
            RouteAccess::RequiresAuth | RouteAccess::GuestOnly => GuardDecision::Allow,
        };

        Guarded { decision, title }
    }
}

/// Public routes use their title as is; others get the admin panel suffix.
#[must_use]
pub fn page_title(meta: &RouteMeta) -> Option<String> {
    let title = meta.title.as_deref()?;
    match meta.access {
        RouteAccess::Public => Some(title.to_string()),
        RouteAccess::RequiresAuth | RouteAccess::GuestOnly => {
            Some(format!("{title} - {ADMIN_PANEL_LABEL}"))
        }
    }
}
