//! Route access control. The [`Router`] resolves a path against the static
//! [`RouteTable`], then asks the [`NavigationGuard`] whether the transition may
//! complete. The guard only reads the session, apart from running its
//! idempotent `initialize()` first.

mod guard;
mod router;
mod routes;

pub use guard::{page_title, GuardDecision, Guarded, NavigationGuard, ADMIN_PANEL_LABEL};
pub use router::Router;
pub use routes::{
    paths, ResolvedRoute, RouteAccess, RouteMeta, RouteTable, RouteTableBuilder, RouteTableError,
    RouteTarget,
};

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("no route matches {0}")]
    NotFound(String),
    #[error("redirects starting at {0} never settle")]
    RedirectLoop(String),
}
