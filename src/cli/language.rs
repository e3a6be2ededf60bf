//! Language CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use super::runtime::Runtime;
use crate::domain::{Language, SiteId, SiteLanguage};
use crate::storage::{Languages, Options, Sites};

#[derive(Subcommand)]
pub enum LanguageCommands {
    /// Add or update a language
    Add {
        /// Locale (e.g., de_DE)
        locale: String,

        /// English name (e.g., German)
        english: String,

        /// Native name (e.g., Deutsch)
        native: String,

        /// Ordering weight, higher sorts first
        #[arg(long, default_value_t = 1)]
        priority: i32,

        /// Written right to left
        #[arg(long)]
        rtl: bool,

        /// Flag image URL
        #[arg(long)]
        flag: Option<String>,
    },

    /// List known languages
    List,

    /// Assign a language to a site
    Assign {
        /// Site ID
        site: SiteId,

        /// Locale (e.g., de_DE)
        locale: String,

        /// Alternative language title for the site
        #[arg(long)]
        text: Option<String>,
    },
}

pub fn run(cmd: LanguageCommands, output: &Output) -> Result<()> {
    match cmd {
        LanguageCommands::Add {
            locale,
            english,
            native,
            priority,
            rtl,
            flag,
        } => {
            let mut language = Language::from_locale(&locale, &english, &native);
            language.priority = priority;
            language.is_rtl = rtl;
            add_language(output, language, flag.as_deref())
        }
        LanguageCommands::List => list_languages(output),
        LanguageCommands::Assign { site, locale, text } => {
            assign_language(output, site, &locale, text)
        }
    }
}

fn add_language(output: &Output, language: Language, flag: Option<&str>) -> Result<()> {
    let runtime = Runtime::open()?;
    let languages = Languages::new(runtime.database());

    languages.upsert(&language)?;
    if let Some(flag) = flag {
        languages.set_flag(&language.locale, flag)?;
    }

    if output.is_json() {
        output.data(&language);
    } else {
        output.success(&format!(
            "Saved language {} ({})",
            language.locale, language.english_name
        ));
    }

    Ok(())
}

fn list_languages(output: &Output) -> Result<()> {
    let runtime = Runtime::open()?;
    let languages = Languages::new(runtime.database()).all()?;

    if output.is_json() {
        output.data(&languages);
    } else if languages.is_empty() {
        println!("No languages found.");
    } else {
        output.header(&format!("{:<10} {:<8} {:<9} {:<20} NATIVE", "LOCALE", "HTTP", "PRIORITY", "ENGLISH"));
        for language in &languages {
            println!(
                "{:<10} {:<8} {:<9} {:<20} {}",
                language.locale,
                language.http_name,
                language.priority,
                language.english_name,
                language.native_name
            );
        }
    }

    Ok(())
}

fn assign_language(output: &Output, site: SiteId, locale: &str, text: Option<String>) -> Result<()> {
    let runtime = Runtime::open()?;

    if Sites::new(runtime.database()).get(site)?.is_none() {
        anyhow::bail!("Site not found: {}", site);
    }

    let mut assignment = SiteLanguage::new(locale);
    assignment.text = text.unwrap_or_default();
    Options::new(runtime.database()).set_site_language(site, assignment)?;

    output.success(&format!("Site {} now represents {}", site, locale));
    Ok(())
}
