//! Static route table. Each entry is either a view with an access policy and a
//! title, or a redirect to another path. The table is built once at start-up and
//! never mutated; invalid declarations are rejected when it is built.

use super::NavigationError;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Paths of the routes in the standard table.
pub mod paths {
    pub const ROOT: &str = "/";
    pub const CONTEST: &str = "/contest";
    pub const VERIFY_EMAIL: &str = "/verify-email/:token";
    pub const ADMIN: &str = "/admin";
    pub const LOGIN: &str = "/admin/login";
    pub const REGISTER: &str = "/admin/register";
    pub const DASHBOARD: &str = "/admin/dashboard";
}

/// Static redirects followed while resolving one path.
const MAX_STATIC_REDIRECTS: usize = 8;

/// Who may enter a route. A route carries exactly one policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteAccess {
    Public,
    RequiresAuth,
    GuestOnly,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMeta {
    pub access: RouteAccess,
    pub title: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteTarget {
    View { name: String, meta: RouteMeta },
    Redirect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Clone, Debug)]
struct RouteDef {
    pattern: String,
    segments: Vec<Segment>,
    target: RouteTarget,
}

/// A path matched to a view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub path: String,
    pub name: String,
    pub meta: RouteMeta,
    pub params: BTreeMap<String, String>,
    /// The requested path when static redirects were followed to get here.
    pub redirected_from: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("route pattern must start with '/': {0}")]
    InvalidPattern(String),
    #[error("route pattern declared twice: {0}")]
    DuplicatePattern(String),
    #[error("redirect from {from} targets unknown route {to}")]
    UnknownRedirect { from: String, to: String },
}

#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    routes: Vec<(String, RouteTarget)>,
}

impl RouteTableBuilder {
    #[must_use]
    pub fn view(mut self, pattern: &str, name: &str, access: RouteAccess, title: &str) -> Self {
        let meta = RouteMeta {
            access,
            title: Some(title.to_string()).filter(|title| !title.trim().is_empty()),
        };
        self.routes.push((
            pattern.to_string(),
            RouteTarget::View {
                name: name.to_string(),
                meta,
            },
        ));
        self
    }

    #[must_use]
    pub fn redirect(mut self, pattern: &str, to: &str) -> Self {
        self.routes
            .push((pattern.to_string(), RouteTarget::Redirect(to.to_string())));
        self
    }

    /// # Errors
    /// Returns `RouteTableError` for malformed or duplicate patterns and for
    /// redirects that point at no declared route.
    pub fn build(self) -> Result<RouteTable, RouteTableError> {
        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(self.routes.len());

        for (pattern, target) in self.routes {
            if !pattern.starts_with('/') {
                return Err(RouteTableError::InvalidPattern(pattern));
            }
            let segments = parse_segments(&pattern);
            if !seen.insert(shape(&segments)) {
                return Err(RouteTableError::DuplicatePattern(pattern));
            }
            routes.push(RouteDef {
                pattern,
                segments,
                target,
            });
        }

        let table = RouteTable { routes };
        for route in &table.routes {
            if let RouteTarget::Redirect(to) = &route.target {
                if table.find(to).is_none() {
                    return Err(RouteTableError::UnknownRedirect {
                        from: route.pattern.clone(),
                        to: to.clone(),
                    });
                }
            }
        }
        Ok(table)
    }
}

#[derive(Clone, Debug)]
pub struct RouteTable {
    routes: Vec<RouteDef>,
}

impl RouteTable {
    #[must_use]
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// The contest site's routes: the public contest pages, the guest-only
    /// admin sign-in pages and the authenticated dashboard.
    ///
    /// # Errors
    /// Returns `RouteTableError` only if the declarations below are inconsistent.
    pub fn standard() -> Result<Self, RouteTableError> {
        Self::builder()
            .redirect(paths::ROOT, paths::CONTEST)
            .view(
                paths::CONTEST,
                "ContestRegistration",
                RouteAccess::Public,
                "Valentine's Day Giveaway 2025",
            )
            .view(
                paths::VERIFY_EMAIL,
                "EmailVerification",
                RouteAccess::Public,
                "Verify Email - Valentine's Day Giveaway 2025",
            )
            .view(
                paths::LOGIN,
                "Login",
                RouteAccess::GuestOnly,
                "Sign In - Admin",
            )
            .view(
                paths::REGISTER,
                "Register",
                RouteAccess::GuestOnly,
                "Register - Admin",
            )
            .redirect(paths::ADMIN, paths::DASHBOARD)
            .view(
                paths::DASHBOARD,
                "AdminDashboard",
                RouteAccess::RequiresAuth,
                "Admin Dashboard",
            )
            .build()
    }

    /// Patterns of every view route with its policy, in declaration order.
    pub fn views(&self) -> impl Iterator<Item = (&str, &RouteMeta)> {
        self.routes.iter().filter_map(|route| match &route.target {
            RouteTarget::View { meta, .. } => Some((route.pattern.as_str(), meta)),
            RouteTarget::Redirect(_) => None,
        })
    }

    /// Matches `path` to a view, following static redirects.
    ///
    /// # Errors
    /// Returns `NavigationError::NotFound` when nothing matches and
    /// `NavigationError::RedirectLoop` when redirects do not settle.
    pub fn resolve(&self, path: &str) -> Result<ResolvedRoute, NavigationError> {
        let requested = normalize_path(path);
        let mut current = requested.clone();

        for _ in 0..=MAX_STATIC_REDIRECTS {
            let (route, params) = self
                .find(&current)
                .ok_or_else(|| NavigationError::NotFound(current.clone()))?;

            match &route.target {
                RouteTarget::Redirect(to) => current = normalize_path(to),
                RouteTarget::View { name, meta } => {
                    let redirected_from = (current != requested).then(|| requested.clone());
                    return Ok(ResolvedRoute {
                        path: current,
                        name: name.clone(),
                        meta: meta.clone(),
                        params,
                        redirected_from,
                    });
                }
            }
        }

        Err(NavigationError::RedirectLoop(requested))
    }

    fn find(&self, path: &str) -> Option<(&RouteDef, BTreeMap<String, String>)> {
        let parts: Vec<&str> = split_path(path).collect();
        self.routes
            .iter()
            .find_map(|route| match_segments(&route.segments, &parts).map(|params| (route, params)))
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|part| !part.is_empty())
}

fn parse_segments(pattern: &str) -> Vec<Segment> {
    split_path(pattern)
        .map(|part| match part.strip_prefix(':') {
            Some(name) => Segment::Param(name.to_string()),
            None => Segment::Literal(part.to_string()),
        })
        .collect()
}

/// The part of a pattern that decides which paths it matches: literals by text,
/// parameters by position only.
fn shape(segments: &[Segment]) -> Vec<Option<String>> {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Literal(text) => Some(text.clone()),
            Segment::Param(_) => None,
        })
        .collect()
}

fn match_segments(segments: &[Segment], parts: &[&str]) -> Option<BTreeMap<String, String>> {
    if segments.len() != parts.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    for (segment, part) in segments.iter().zip(parts) {
        match segment {
            Segment::Literal(literal) if literal == part => {}
            Segment::Literal(_) => return None,
            Segment::Param(name) => {
                params.insert(name.clone(), (*part).to_string());
            }
        }
    }
    Some(params)
}

/// Drops query and fragment, collapses empty segments and trailing slashes.
fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let joined = split_path(path).collect::<Vec<_>>().join("/");
    format!("/{joined}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn root_and_admin_redirect_to_their_targets() -> Result<()> {
        let table = RouteTable::standard()?;

        let contest = table.resolve("/")?;
        assert_eq!(contest.path, paths::CONTEST);
        assert_eq!(contest.name, "ContestRegistration");
        assert_eq!(contest.redirected_from.as_deref(), Some("/"));

        let dashboard = table.resolve("/admin/")?;
        assert_eq!(dashboard.path, paths::DASHBOARD);
        assert_eq!(dashboard.meta.access, RouteAccess::RequiresAuth);
        assert_eq!(dashboard.redirected_from.as_deref(), Some("/admin"));
        Ok(())
    }

    #[test]
    fn params_are_extracted() -> Result<()> {
        let table = RouteTable::standard()?;

        let route = table.resolve("/verify-email/0f8c2a?utm=mail#top")?;

        assert_eq!(route.name, "EmailVerification");
        assert_eq!(route.path, "/verify-email/0f8c2a");
        assert_eq!(route.params.get("token").map(String::as_str), Some("0f8c2a"));
        assert_eq!(route.redirected_from, None);
        Ok(())
    }

    #[test]
    fn unknown_paths_are_not_found() -> Result<()> {
        let table = RouteTable::standard()?;
        assert_eq!(
            table.resolve("/admin/participants"),
            Err(NavigationError::NotFound("/admin/participants".to_string()))
        );
        assert!(table.resolve("/verify-email").is_err());
        Ok(())
    }

    #[test]
    fn builder_rejects_bad_declarations() {
        let duplicate = RouteTable::builder()
            .view("/a/:id", "A", RouteAccess::Public, "A")
            .view("/a/:id", "B", RouteAccess::GuestOnly, "B")
            .build();
        assert_eq!(
            duplicate.err(),
            Some(RouteTableError::DuplicatePattern("/a/:id".to_string()))
        );

        let renamed = RouteTable::builder()
            .view("/a/:id", "A", RouteAccess::Public, "A")
            .view("/a/:x", "B", RouteAccess::GuestOnly, "B")
            .build();
        assert_eq!(
            renamed.err(),
            Some(RouteTableError::DuplicatePattern("/a/:x".to_string()))
        );

        let distinct = RouteTable::builder()
            .view("/a/:id", "A", RouteAccess::Public, "A")
            .view("/a/edit", "B", RouteAccess::Public, "B")
            .view("/a/:id/edit", "C", RouteAccess::Public, "C")
            .build();
        assert!(distinct.is_ok());

        let dangling = RouteTable::builder().redirect("/", "/missing").build();
        assert!(matches!(
            dangling,
            Err(RouteTableError::UnknownRedirect { .. })
        ));

        let relative = RouteTable::builder()
            .view("contest", "C", RouteAccess::Public, "C")
            .build();
        assert!(matches!(relative, Err(RouteTableError::InvalidPattern(_))));
    }

    #[test]
    fn redirect_cycles_are_reported() -> Result<()> {
        let table = RouteTable::builder()
            .redirect("/a", "/b")
            .redirect("/b", "/a")
            .build()?;
        assert_eq!(
            table.resolve("/a"),
            Err(NavigationError::RedirectLoop("/a".to_string()))
        );
        Ok(())
    }

    #[test]
    fn standard_table_declares_every_policy() -> Result<()> {
        let table = RouteTable::standard()?;
        let views: Vec<_> = table
            .views()
            .map(|(pattern, meta)| (pattern.to_string(), meta.access))
            .collect();

        assert_eq!(
            views,
            vec![
                (paths::CONTEST.to_string(), RouteAccess::Public),
                (paths::VERIFY_EMAIL.to_string(), RouteAccess::Public),
                (paths::LOGIN.to_string(), RouteAccess::GuestOnly),
                (paths::REGISTER.to_string(), RouteAccess::GuestOnly),
                (paths::DASHBOARD.to_string(), RouteAccess::RequiresAuth),
            ]
        );
        Ok(())
    }
}
