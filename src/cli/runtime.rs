//! Opening the network and booting the plugin for a command

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use crate::domain::SiteId;
use crate::host::{Endpoint, RequestContext, Session};
use crate::storage::{Database, Network, NetworkConfig};
use crate::MultilingualPress;

/// The network in the current directory and its open database
pub struct Runtime {
    network: Network,
    database: Arc<Database>,
}

impl Runtime {
    pub fn open() -> Result<Self> {
        let network = Network::open_current()?;
        let database = network.database()?;

        Ok(Self { network, database })
    }

    pub fn database(&self) -> Arc<Database> {
        Arc::clone(&self.database)
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.network.config().network
    }

    /// The site commands act as unless told otherwise
    pub fn current_site(&self) -> Result<SiteId> {
        Ok(self.config().current_site()?)
    }

    /// Boots the plugin for a request
    pub fn boot(&self, request: RequestContext) -> Result<MultilingualPress> {
        crate::init(self.database(), self.config().clone(), request, [])
    }
}

/// The request a command simulates
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Site serving the request (default: current_site from mlp.toml)
    #[arg(long)]
    pub site: Option<SiteId>,

    /// Entry point of the request
    #[arg(long, value_enum, default_value_t = Endpoint::Frontend)]
    pub endpoint: Endpoint,

    /// Logged-in user ID (anonymous when omitted)
    #[arg(long)]
    pub user: Option<i64>,

    /// The user is a network administrator
    #[arg(long, requires = "user")]
    pub super_admin: bool,

    /// Capability of the user (repeatable)
    #[arg(long = "can", value_name = "CAPABILITY", requires = "user")]
    pub capabilities: Vec<String>,
}

impl RequestArgs {
    pub fn request(&self, runtime: &Runtime) -> Result<RequestContext> {
        let site = match self.site {
            Some(site) => site,
            None => runtime.current_site()?,
        };

        let session = match self.user {
            None => Session::anonymous(),
            Some(id) if self.super_admin => Session::super_admin(id),
            Some(id) => Session {
                user_id: Some(id),
                super_admin: false,
                capabilities: self.capabilities.iter().cloned().collect(),
            },
        };

        Ok(RequestContext::frontend(site)
            .with_endpoint(self.endpoint)
            .with_session(session))
    }
}
