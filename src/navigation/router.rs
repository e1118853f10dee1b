use super::guard::{GuardDecision, NavigationGuard};
use super::routes::{ResolvedRoute, RouteTable};
use super::NavigationError;
use tracing::{info, info_span, Instrument};

/// Guard redirects followed for one navigation before giving up.
const MAX_GUARD_REDIRECTS: usize = 8;

/// Tracks the current route and title, asking the guard before every move.
pub struct Router {
    table: RouteTable,
    guard: NavigationGuard,
    current: Option<ResolvedRoute>,
    title: Option<String>,
}

impl Router {
    #[must_use]
    pub fn new(table: RouteTable, guard: NavigationGuard) -> Self {
        Self {
            table,
            guard,
            current: None,
            title: None,
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&ResolvedRoute> {
        self.current.as_ref()
    }

    /// Title applied by the last guard evaluation, redirects included.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    /// Navigates to `path`, following guard redirects until one is allowed.
    ///
    /// # Errors
    /// Returns `NavigationError` when a path does not resolve or the guard keeps
    /// redirecting.
    pub async fn navigate(&mut self, path: &str) -> Result<&ResolvedRoute, NavigationError> {
        let span = info_span!("navigation", path = %path);
        let mut target = path.to_string();

        for _ in 0..=MAX_GUARD_REDIRECTS {
            let to = self.table.resolve(&target)?;
            let guarded = self
                .guard
                .before_each(self.current.as_ref(), &to)
                .instrument(span.clone())
                .await;

            if guarded.title.is_some() {
                self.title = guarded.title;
            }

            match guarded.decision {
                GuardDecision::Allow => {
                    span.in_scope(|| info!(route = %to.name, "navigated to {}", to.path));
                    return Ok(self.current.insert(to));
                }
                GuardDecision::Redirect(next) => {
                    span.in_scope(|| info!("{} redirected to {}", to.path, next));
                    target = next;
                }
            }
        }

        Err(NavigationError::RedirectLoop(path.to_string()))
    }
}
