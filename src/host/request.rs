//! The request being served

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{ContentId, ContentType, SiteId};

/// Entry point of the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// Public front end
    #[default]
    Frontend,
    /// Site admin screens
    Admin,
    /// Generic admin form handler
    AdminPost,
    /// Generic admin AJAX handler
    AdminAjax,
    /// Network admin screens
    NetworkAdmin,
}

impl Endpoint {
    pub fn is_admin(self) -> bool {
        self != Endpoint::Frontend
    }

    /// Endpoints that serve the whole network regardless of the current site
    pub fn is_network_wide(self) -> bool {
        matches!(
            self,
            Endpoint::AdminPost | Endpoint::AdminAjax | Endpoint::NetworkAdmin
        )
    }
}

/// Capability to edit any post
pub const EDIT_POSTS: &str = "edit_posts";

/// Capability to edit terms
pub const EDIT_TERMS: &str = "edit_terms";

/// Identity and capabilities of the visitor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Option<i64>,
    #[serde(default)]
    pub super_admin: bool,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
}

impl Session {
    /// A logged-out visitor
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A logged-in network administrator
    pub fn super_admin(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            super_admin: true,
            capabilities: BTreeSet::new(),
        }
    }

    /// A logged-in user with the given capabilities
    pub fn user(user_id: i64, capabilities: &[&str]) -> Self {
        Self {
            user_id: Some(user_id),
            super_admin: false,
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_id.is_some()
    }

    /// Super admins have every capability
    pub fn can(&self, capability: &str) -> bool {
        self.super_admin || self.capabilities.contains(capability)
    }
}

/// What the request is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueriedObject {
    pub content_type: ContentType,
    pub content_id: ContentId,
}

/// Request-scoped state handed over by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub site_id: SiteId,
    pub endpoint: Endpoint,
    pub queried_object: Option<QueriedObject>,
    pub session: Session,
}

impl RequestContext {
    /// An anonymous front-end request on `site_id`
    pub fn frontend(site_id: SiteId) -> Self {
        Self {
            site_id,
            endpoint: Endpoint::Frontend,
            queried_object: None,
            session: Session::anonymous(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn viewing(mut self, content_type: ContentType, content_id: ContentId) -> Self {
        self.queried_object = Some(QueriedObject {
            content_type,
            content_id,
        });
        self
    }

    pub fn is_admin(&self) -> bool {
        self.endpoint.is_admin()
    }

    /// ID of the viewed content if it is of `content_type`
    pub fn queried_id(&self, content_type: ContentType) -> Option<ContentId> {
        self.queried_object
            .filter(|object| object.content_type == content_type)
            .map(|object| object.content_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_wide_endpoints() {
        assert!(Endpoint::AdminAjax.is_network_wide());
        assert!(Endpoint::NetworkAdmin.is_network_wide());
        assert!(!Endpoint::Admin.is_network_wide());
        assert!(Endpoint::Admin.is_admin());
        assert!(!Endpoint::Frontend.is_admin());
    }

    #[test]
    fn capabilities() {
        assert!(Session::super_admin(1).can(EDIT_TERMS));
        assert!(Session::user(2, &[EDIT_POSTS]).can(EDIT_POSTS));
        assert!(!Session::user(2, &[EDIT_POSTS]).can(EDIT_TERMS));
        assert!(!Session::anonymous().is_logged_in());
    }

    #[test]
    fn queried_id_matches_type() {
        let site = SiteId::new(1).unwrap();
        let post = ContentId::new(42).unwrap();
        let request = RequestContext::frontend(site).viewing(ContentType::Post, post);

        assert_eq!(request.queried_id(ContentType::Post), Some(post));
        assert_eq!(request.queried_id(ContentType::Term), None);
    }
}
