//! Translation lookup command

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use super::output::Output;
use super::runtime::{RequestArgs, Runtime};
use crate::domain::{ContentId, ContentType, NameField};
use crate::service::keys;
use crate::translation::{ListArgs, SortPolicy, TranslationApi, TranslationArgs};
use crate::MultilingualPress;

#[derive(Args, Debug)]
pub struct TranslationsArgs {
    /// Content ID on the requesting site
    pub id: ContentId,

    /// Content type
    #[arg(long = "type", short = 't', default_value = "post")]
    pub content_type: ContentType,

    /// Leave out sites without a linked item
    #[arg(long)]
    pub strict: bool,

    /// Include the requesting site itself
    #[arg(long)]
    pub include_base: bool,

    /// Ordering of the list (default: translations.sort from mlp.toml)
    #[arg(long, value_enum)]
    pub sort: Option<SortPolicy>,

    /// Language name shown as link text (default: translations.link_text)
    #[arg(long, value_enum)]
    pub link_text: Option<NameField>,

    #[command(flatten)]
    pub request: RequestArgs,
}

pub fn run(args: TranslationsArgs, output: &Output) -> Result<()> {
    let runtime = Runtime::open()?;
    let request = args.request.request(&runtime)?;
    let defaults = runtime.config().translations.clone();

    let _controller = runtime.boot(request)?;
    let api: Arc<TranslationApi> = MultilingualPress::resolve(keys::TRANSLATION_API)?;

    let list = ListArgs {
        link_text: args.link_text.unwrap_or(defaults.link_text),
        sort: args.sort.unwrap_or(defaults.sort),
        include_base: args.include_base,
        strict: args.strict,
    };
    let links = api.linked_elements_list(args.content_type, Some(args.id), list)?;

    if output.is_json() {
        let translations = api.translations(
            TranslationArgs::new(args.content_type)
                .content(args.id)
                .strict(args.strict)
                .include_base(args.include_base),
        )?;
        output.data(&serde_json::json!({
            "links": links,
            "translations": translations,
        }));
    } else if links.is_empty() {
        println!("No translations found.");
    } else {
        output.header(&format!("{:<6} {:<8} {:<16} {:<24} URL", "SITE", "LANG", "NAME", "TITLE"));
        for link in &links {
            println!(
                "{:<6} {:<8} {:<16} {:<24} {}{}",
                link.site_id,
                link.language,
                link.text,
                if link.title.is_empty() { "-" } else { link.title.as_str() },
                link.url,
                if link.is_current { " (current)" } else { "" }
            );
        }
    }

    Ok(())
}
