//! Tiered access policy
//!
//! Every resource is assigned one of three static tiers at build time.
//! The route table is an explicit enumeration keyed by normalized path;
//! paths it does not know default to the authenticated tier so that a
//! newly added endpoint is never exposed by accident.

use std::collections::HashSet;

/// Access tier of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Reachable by anyone, token or not
    Public,
    /// Requires a verified token, regardless of roles
    Authenticated,
    /// Requires a verified token carrying the configured admin role
    Admin,
}

/// Outcome of a policy evaluation. Computed per request, never persisted.
#[derive(Debug, Clone)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: &'static str,
}

impl AccessDecision {
    fn allow(reason: &'static str) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny(reason: &'static str) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// Static resource-to-tier mapping
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<(&'static str, Tier)>,
}

impl RouteTable {
    /// The gateway's resource table.
    pub fn gateway() -> Self {
        Self {
            entries: vec![
                ("/health", Tier::Public),
                ("/public", Tier::Public),
                ("/private", Tier::Authenticated),
                ("/admin", Tier::Admin),
                ("/admin/user", Tier::Admin),
            ],
        }
    }

    /// Resolve the tier for a request path.
    ///
    /// Unknown paths resolve to `Authenticated`: the table fails toward
    /// requiring auth, never toward public exposure.
    pub fn tier(&self, path: &str) -> Tier {
        let normalized = normalize(path);
        self.entries
            .iter()
            .find(|(entry, _)| *entry == normalized)
            .map(|(_, tier)| *tier)
            .unwrap_or(Tier::Authenticated)
    }
}

/// Strip trailing slashes; the empty path is the root.
fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Evaluate the access policy for one request.
///
/// `is_authenticated` reflects token verification only; a verified token
/// with zero roles is still authenticated. The admin check is exact string
/// membership, with no hierarchy and no wildcard matching.
pub fn decide(
    tier: Tier,
    role_set: &HashSet<String>,
    is_authenticated: bool,
    admin_role: &str,
) -> AccessDecision {
    match tier {
        Tier::Public => AccessDecision::allow("public resource"),
        Tier::Authenticated => {
            if is_authenticated {
                AccessDecision::allow("authenticated")
            } else {
                AccessDecision::deny("authentication required")
            }
        }
        Tier::Admin => {
            if !is_authenticated {
                AccessDecision::deny("authentication required")
            } else if role_set.contains(admin_role) {
                AccessDecision::allow("admin role present")
            } else {
                AccessDecision::deny("admin role required")
            }
        }
    }
}
