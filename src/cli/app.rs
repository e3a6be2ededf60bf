//! Main CLI application structure

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use super::content::{self, ContentCommands};
use super::language::{self, LanguageCommands};
use super::module_cmd::{self, ModuleCommands};
use super::output::{Output, OutputFormat};
use super::runtime::{RequestArgs, Runtime};
use super::site::{self, SiteCommands};
use super::translations::{self, TranslationsArgs};
use crate::core::Notices;
use crate::domain::{ContentType, SiteContent, SiteId};
use crate::hooks::{EventBus, Signal};
use crate::service::keys;
use crate::storage::{Config, Network, Sites};
use crate::MultilingualPress;

#[derive(Parser)]
#[command(name = "mlp")]
#[command(author, version, about = "Link content across the sites of a multisite network")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (default: default_format from the global config)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new network
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage sites
    #[command(subcommand)]
    Site(SiteCommands),

    /// Relate two sites
    Relate {
        a: SiteId,
        b: SiteId,
    },

    /// Remove one relation of a site, or all of them
    Unrelate {
        site: SiteId,
        other: Option<SiteId>,
    },

    /// Manage languages
    #[command(subcommand)]
    Language(LanguageCommands),

    /// Manage posts and terms
    #[command(subcommand)]
    Content(ContentCommands),

    /// Link two items as translations of each other
    Link {
        /// Source item as SITE:ID
        source: SiteContent,

        /// Target item as SITE:ID
        target: SiteContent,

        /// Content type
        #[arg(long = "type", short = 't', default_value = "post")]
        content_type: ContentType,
    },

    /// Remove an item from its translation group
    Unlink {
        /// Item as SITE:ID
        item: SiteContent,

        /// Content type
        #[arg(long = "type", short = 't', default_value = "post")]
        content_type: ContentType,
    },

    /// Show the translations of an item
    Translations(TranslationsArgs),

    /// Manage feature modules
    #[command(subcommand)]
    Module(ModuleCommands),

    /// Boot the plugin for a request and report its state
    Status(RequestArgs),
}

/// Main entry point for the CLI
pub fn run(cli: Cli) -> Result<()> {
    let format = cli.format.unwrap_or_else(|| {
        Config::load()
            .map(|config| config.global.default_format.into())
            .unwrap_or_default()
    });
    let output = Output::new(format);

    match cli.command {
        Commands::Init { path } => {
            debug!(path, "initializing network");
            let network = Network::init(&path)?;
            output.success(&format!(
                "Initialized MultilingualPress network at {}",
                network.root().display()
            ));
        }

        Commands::Site(cmd) => site::run(cmd, &output)?,
        Commands::Relate { a, b } => site::relate(&output, a, b)?,
        Commands::Unrelate { site, other } => site::unrelate(&output, site, other)?,
        Commands::Language(cmd) => language::run(cmd, &output)?,
        Commands::Content(cmd) => content::run(cmd, &output)?,

        Commands::Link {
            source,
            target,
            content_type,
        } => content::link(&output, source, target, content_type)?,
        Commands::Unlink { item, content_type } => content::unlink(&output, item, content_type)?,

        Commands::Translations(args) => translations::run(args, &output)?,
        Commands::Module(cmd) => module_cmd::run(cmd, &output)?,
        Commands::Status(request) => status(&output, &request)?,
    }

    debug!("command completed");
    Ok(())
}

/// Boots the plugin and reports what it decided
fn status(output: &Output, args: &RequestArgs) -> Result<()> {
    let runtime = Runtime::open()?;
    let request = args.request(&runtime)?;
    let site = request.site_id;

    let controller = runtime.boot(request)?;

    let events: Arc<EventBus> = MultilingualPress::resolve(keys::EVENTS)?;
    events.emit(&Signal::AdminNotices)?;
    let notices: Arc<Notices> = MultilingualPress::resolve(keys::NOTICES)?;

    let active = controller.active_site().unwrap_or(false);
    let modules: Vec<String> = controller
        .activated_modules()
        .iter()
        .map(|module| module.to_string())
        .collect();
    let sites = Sites::new(runtime.database()).list()?.len();

    if output.is_json() {
        output.data(&serde_json::json!({
            "site": site,
            "active_site": active,
            "container": controller.container().status().to_string(),
            "sites": sites,
            "activated_modules": modules,
            "notices": notices.all(),
        }));
    } else {
        println!("Site:      {}", site);
        println!("Active:    {}", if active { "yes" } else { "no" });
        println!("Container: {}", controller.container().status());
        println!("Sites:     {}", sites);
        println!(
            "Modules:   {}",
            if modules.is_empty() { "none".to_string() } else { modules.join(", ") }
        );
        for notice in notices.all() {
            println!();
            println!("Notice: {}", notice);
        }
    }

    Ok(())
}
