//! Site CLI commands

use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use super::runtime::Runtime;
use crate::domain::{SiteId, SiteLanguage};
use crate::hooks::{EventBus, Signal};
use crate::host::{Endpoint, RequestContext, Session, SiteContext};
use crate::service::keys;
use crate::storage::{ContentDirectory, Options, SiteRelations, Sites};
use crate::MultilingualPress;

#[derive(Subcommand)]
pub enum SiteCommands {
    /// Add a site to the network
    Add {
        /// Domain of the site
        domain: String,

        /// Path below the domain
        #[arg(long, default_value = "/")]
        path: String,

        /// Hide the site from logged-out visitors
        #[arg(long)]
        private: bool,

        /// Locale the site represents (e.g., de_DE)
        #[arg(long, short)]
        language: Option<String>,
    },

    /// List sites with their languages
    List,

    /// Delete a site and everything linked to it
    Delete {
        /// Site ID
        id: SiteId,
    },
}

pub fn run(cmd: SiteCommands, output: &Output) -> Result<()> {
    match cmd {
        SiteCommands::Add {
            domain,
            path,
            private,
            language,
        } => add_site(output, &domain, &path, !private, language),
        SiteCommands::List => list_sites(output),
        SiteCommands::Delete { id } => delete_site(output, id),
    }
}

fn add_site(output: &Output, domain: &str, path: &str, public: bool, language: Option<String>) -> Result<()> {
    let runtime = Runtime::open()?;
    let id = Sites::new(runtime.database()).add(domain, path, public)?;

    if let Some(locale) = &language {
        Options::new(runtime.database()).set_site_language(id, SiteLanguage::new(locale.as_str()))?;
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id,
            "domain": domain,
            "path": path,
            "public": public,
            "language": language,
        }));
    } else {
        output.success(&format!("Added site {} ({}{})", id, domain, path));
    }

    Ok(())
}

fn list_sites(output: &Output) -> Result<()> {
    let runtime = Runtime::open()?;
    let sites = Sites::new(runtime.database()).list()?;
    let languages = Options::new(runtime.database()).site_languages()?;
    let relations = SiteRelations::new(runtime.database());

    if output.is_json() {
        let mut items = Vec::with_capacity(sites.len());
        for site in &sites {
            items.push(serde_json::json!({
                "id": site.id,
                "url": site.home_url(),
                "public": site.public,
                "language": languages.get(&site.id).map(|l| l.lang.as_str()),
                "related": relations.related_sites(site.id, false)?,
            }));
        }
        output.data(&items);
    } else if sites.is_empty() {
        println!("No sites found.");
    } else {
        output.header(&format!("{:<6} {:<10} {:<8} {:<12} URL", "ID", "LANGUAGE", "PUBLIC", "RELATED"));
        for site in &sites {
            let language = languages.get(&site.id).map(|l| l.lang.as_str()).unwrap_or("-");
            let related: Vec<String> = relations
                .related_sites(site.id, false)?
                .iter()
                .map(|id| id.to_string())
                .collect();
            println!(
                "{:<6} {:<10} {:<8} {:<12} {}",
                site.id,
                language,
                if site.public { "yes" } else { "no" },
                if related.is_empty() { "-".to_string() } else { related.join(",") },
                site.home_url()
            );
        }
    }

    Ok(())
}

/// Removes the host's data for a site, then lets the plugin clean up its own
fn delete_site(output: &Output, id: SiteId) -> Result<()> {
    let runtime = Runtime::open()?;
    let db = runtime.database();
    let sites = Sites::new(Arc::clone(&db));

    if sites.get(id)?.is_none() {
        anyhow::bail!("Site not found: {}", id);
    }

    let request = RequestContext::frontend(runtime.current_site()?)
        .with_endpoint(Endpoint::NetworkAdmin)
        .with_session(Session::super_admin(1));
    let _controller = runtime.boot(request)?;

    let context = Arc::new(SiteContext::new(id, Arc::new(sites.clone())));
    let content = ContentDirectory::new(Arc::clone(&db), context).delete_site(id)?;
    Options::new(Arc::clone(&db)).delete_scope(id)?;
    sites.delete(id)?;

    let events: Arc<EventBus> = MultilingualPress::resolve(keys::EVENTS)?;
    events.emit(&Signal::SiteDeleted(id))?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "deleted": id,
            "content_removed": content,
        }));
    } else {
        output.success(&format!("Deleted site {}", id));
    }

    Ok(())
}

pub fn relate(output: &Output, a: SiteId, b: SiteId) -> Result<()> {
    let runtime = Runtime::open()?;
    let created = SiteRelations::new(runtime.database()).set_relation(a, b)?;

    if output.is_json() {
        output.data(&serde_json::json!({ "sites": [a, b], "created": created }));
    } else if created {
        output.success(&format!("Related sites {} and {}", a, b));
    } else {
        output.success(&format!("Sites {} and {} are already related", a, b));
    }

    Ok(())
}

pub fn unrelate(output: &Output, site: SiteId, other: Option<SiteId>) -> Result<()> {
    let runtime = Runtime::open()?;
    let removed = SiteRelations::new(runtime.database()).delete_relation(site, other)?;

    if output.is_json() {
        output.data(&serde_json::json!({ "site": site, "removed": removed }));
    } else {
        output.success(&format!("Removed {} relation(s) of site {}", removed, site));
    }

    Ok(())
}
