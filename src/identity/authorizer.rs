use serde::Serialize;

use super::principal::Identity;
use super::session::SessionStore;
use crate::security::{PermissionSet, PermissionTable, Section};

pub const ACCESS_DENIED_TITLE: &str = "Access Denied";
pub const ACCESS_DENIED_MESSAGE: &str = "You don't have permission to access this section.";
pub const ACCESS_DENIED_HINT: &str = "Please contact your production manager for access.";

/// Sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
    pub section: Section,
}

impl From<Section> for NavItem {
    fn from(section: Section) -> Self {
        NavItem { label: section.label(), path: section.route(), section }
    }
}

/// Outcome of visiting a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted(Section),
    Denied(Section),
    NotFound,
}

impl Access {
    pub fn is_granted(&self) -> bool { matches!(self, Access::Granted(_)) }
}

/// Permission set for an optional identity. `None` when there is no identity or
/// its role is not in the table.
pub fn permissions_for(table: &PermissionTable, identity: Option<&Identity>) -> Option<PermissionSet> {
    identity.and_then(|id| table.resolve(&id.role))
}

/// Read-only authorization queries over the current session.
/// Every query is total: no session or an unknown role gives false / empty / `None`.
pub struct PermissionResolver<'a> {
    session: &'a SessionStore,
    table: &'a PermissionTable,
}

impl<'a> PermissionResolver<'a> {
    pub fn new(session: &'a SessionStore, table: &'a PermissionTable) -> Self { Self { session, table } }

    pub fn has_permission(&self, section: Section) -> bool {
        self.user_permissions().map(|p| p.get(section)).unwrap_or(false)
    }

    pub fn user_permissions(&self) -> Option<PermissionSet> {
        permissions_for(self.table, self.session.current_user())
    }

    /// Routes in section order.
    pub fn accessible_routes(&self) -> Vec<&'static str> {
        match self.user_permissions() {
            Some(p) => p.granted().map(|s| s.route()).collect(),
            None => Vec::new(),
        }
    }

    /// Exact match against `accessible_routes`.
    pub fn can_access_route(&self, route: &str) -> bool {
        self.accessible_routes().iter().any(|r| *r == route)
    }

    pub fn navigation(&self) -> Vec<NavItem> {
        match self.user_permissions() {
            Some(p) => p.granted().map(NavItem::from).collect(),
            None => Vec::new(),
        }
    }

    pub fn guard(&self, section: Section) -> Access {
        if self.has_permission(section) { Access::Granted(section) } else { Access::Denied(section) }
    }

    pub fn guard_route(&self, route: &str) -> Access {
        match Section::from_route(route) {
            Some(section) => self.guard(section),
            None => Access::NotFound,
        }
    }
}
