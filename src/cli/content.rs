//! Content and link CLI commands

use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use super::runtime::Runtime;
use crate::domain::{ContentId, ContentType, SiteContent, SiteId};
use crate::host::SiteContext;
use crate::storage::{ContentDirectory, ContentRelations, NewPost, NewTerm, Sites, PUBLISHED};

#[derive(Subcommand)]
pub enum ContentCommands {
    /// Add a post, or a term with --taxonomy
    Add {
        /// Site ID
        site: SiteId,

        /// Post title or term name
        title: String,

        /// URL slug (default: derived from the title)
        #[arg(long)]
        slug: Option<String>,

        /// Explicit ID (default: next free ID on the site)
        #[arg(long)]
        id: Option<ContentId>,

        /// Post status
        #[arg(long, default_value = PUBLISHED)]
        status: String,

        /// Add a term of this taxonomy instead of a post
        #[arg(long)]
        taxonomy: Option<String>,
    },

    /// List posts of a site
    List {
        /// Site ID
        site: SiteId,
    },
}

pub fn run(cmd: ContentCommands, output: &Output) -> Result<()> {
    match cmd {
        ContentCommands::Add {
            site,
            title,
            slug,
            id,
            status,
            taxonomy,
        } => {
            let slug = slug.unwrap_or_else(|| slugify(&title));
            add_content(output, site, &title, &slug, id, &status, taxonomy.as_deref())
        }
        ContentCommands::List { site } => list_posts(output, site),
    }
}

fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn directory(runtime: &Runtime, site: SiteId) -> Result<ContentDirectory> {
    let db = runtime.database();
    let sites = Sites::new(Arc::clone(&db));

    if sites.get(site)?.is_none() {
        anyhow::bail!("Site not found: {}", site);
    }

    let context = Arc::new(SiteContext::new(site, Arc::new(sites)));
    Ok(ContentDirectory::new(db, context))
}

fn add_content(
    output: &Output,
    site: SiteId,
    title: &str,
    slug: &str,
    id: Option<ContentId>,
    status: &str,
    taxonomy: Option<&str>,
) -> Result<()> {
    let runtime = Runtime::open()?;
    let content = directory(&runtime, site)?;

    let (content_type, id) = match taxonomy {
        Some(taxonomy) => {
            let id = content.add_term(
                site,
                NewTerm {
                    term_taxonomy_id: id,
                    name: title,
                    slug,
                    taxonomy,
                },
            )?;
            (ContentType::Term, id)
        }
        None => {
            let id = content.add_post(
                site,
                NewPost {
                    id,
                    title,
                    slug,
                    status,
                },
            )?;
            (ContentType::Post, id)
        }
    };

    if output.is_json() {
        output.data(&serde_json::json!({
            "site": site,
            "id": id,
            "type": content_type,
            "slug": slug,
        }));
    } else {
        output.success(&format!("Added {} {} on site {}", content_type, id, site));
    }

    Ok(())
}

fn list_posts(output: &Output, site: SiteId) -> Result<()> {
    let runtime = Runtime::open()?;
    let posts = directory(&runtime, site)?.posts(site)?;

    if output.is_json() {
        output.data(&posts);
    } else if posts.is_empty() {
        println!("No posts found.");
    } else {
        output.header(&format!("{:<6} {:<10} {:<20} TITLE", "ID", "STATUS", "SLUG"));
        for post in &posts {
            println!("{:<6} {:<10} {:<20} {}", post.id, post.status, post.slug, post.title);
        }
    }

    Ok(())
}

/// Links `target` into the translation group of `source`
pub fn link(output: &Output, source: SiteContent, target: SiteContent, content_type: ContentType) -> Result<()> {
    let runtime = Runtime::open()?;
    ContentRelations::new(runtime.database()).set_relation(
        source.site_id,
        target.site_id,
        source.content_id,
        target.content_id,
        content_type,
    )?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "source": source.to_string(),
            "target": target.to_string(),
            "type": content_type,
        }));
    } else {
        output.success(&format!("Linked {} {} to {}", content_type, source, target));
    }

    Ok(())
}

/// Removes an item from its translation group
pub fn unlink(output: &Output, item: SiteContent, content_type: ContentType) -> Result<()> {
    let runtime = Runtime::open()?;
    let removed = ContentRelations::new(runtime.database()).delete_relation(
        item.site_id,
        item.content_id,
        content_type,
    )?;

    if output.is_json() {
        output.data(&serde_json::json!({ "item": item.to_string(), "removed": removed }));
    } else if removed == 0 {
        output.success(&format!("{} {} is not linked", content_type, item));
    } else {
        output.success(&format!("Unlinked {} {}", content_type, item));
    }

    Ok(())
}
