//! Term translations
//!
//! Resolving a term on another site needs a context switch, so results are
//! kept in the object cache under group `mlp`:
//!
//! - `mlp_term_translations`: resolved translations keyed by source term and
//!   target site
//! - `term_with_ttid_<site>_<id>`: terms looked up by term taxonomy ID

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::trace;

use crate::domain::{ContentId, ContentType, RemoteContent, SiteId};
use crate::host::{ObjectCache, ObjectCacheExt, RequestContext, SiteContext, EDIT_TERMS};
use crate::storage::{ContentDirectory, ContentRelations, Term};

/// Object cache group of all plugin entries
pub const CACHE_GROUP: &str = "mlp";

const TRANSLATIONS_KEY: &str = "mlp_term_translations";

/// Cached translations: `"{source site}:{term taxonomy id}"` to target site
/// to result, where `None` records a term without a translation
type TranslationCache = BTreeMap<String, BTreeMap<String, Option<RemoteContent>>>;

#[derive(serde::Serialize, serde::Deserialize)]
struct CachedTerm {
    term_id: i64,
    name: String,
    slug: String,
    taxonomy: String,
}

pub struct TermTranslator {
    relations: ContentRelations,
    content: ContentDirectory,
    context: Arc<SiteContext>,
    cache: Arc<dyn ObjectCache>,
    request: Arc<RequestContext>,
}

impl TermTranslator {
    pub fn new(
        relations: ContentRelations,
        content: ContentDirectory,
        context: Arc<SiteContext>,
        cache: Arc<dyn ObjectCache>,
        request: Arc<RequestContext>,
    ) -> Self {
        Self {
            relations,
            content,
            context,
            cache,
            request,
        }
    }

    /// Returns the translation of a term of `source_site` on `target_site`
    ///
    /// In admin requests the URL is the term's edit screen, and empty when
    /// the session may not edit terms.
    pub fn translation(
        &self,
        source_site: SiteId,
        term_taxonomy_id: ContentId,
        target_site: SiteId,
    ) -> Result<Option<RemoteContent>> {
        let source_key = format!("{}:{}", source_site, term_taxonomy_id);
        let target_key = target_site.to_string();

        let mut cached: TranslationCache = self
            .cache
            .get_as(TRANSLATIONS_KEY, CACHE_GROUP)
            .unwrap_or_default();

        if let Some(hit) = cached.get(&source_key).and_then(|targets| targets.get(&target_key)) {
            trace!(%source_site, %term_taxonomy_id, %target_site, "term translation cache hit");
            return Ok(hit.clone());
        }

        let result = self.resolve(source_site, term_taxonomy_id, target_site)?;

        cached
            .entry(source_key)
            .or_default()
            .insert(target_key, result.clone());
        self.cache.set_as(TRANSLATIONS_KEY, CACHE_GROUP, &cached);

        Ok(result)
    }

    fn resolve(
        &self,
        source_site: SiteId,
        term_taxonomy_id: ContentId,
        target_site: SiteId,
    ) -> Result<Option<RemoteContent>> {
        let target_id = if target_site == source_site {
            Some(term_taxonomy_id)
        } else {
            self.relations
                .translation_id(source_site, term_taxonomy_id, target_site, ContentType::Term)?
        };
        let Some(target_id) = target_id else {
            return Ok(None);
        };

        let _switch = self.context.switch_to(target_site)?;

        let Some(term) = self.term_by_ttid(target_site, target_id)? else {
            return Ok(None);
        };

        let url = if self.request.is_admin() {
            if self.request.session.can(EDIT_TERMS) {
                self.content.edit_term_url(&term)?
            } else {
                String::new()
            }
        } else {
            self.content.term_link(&term)?
        };

        Ok(Some(RemoteContent {
            title: term.name,
            url,
        }))
    }

    /// Looks a term of the current site up, through the object cache
    fn term_by_ttid(&self, site: SiteId, term_taxonomy_id: ContentId) -> Result<Option<Term>> {
        let key = format!("term_with_ttid_{}_{}", site, term_taxonomy_id);

        if let Some(cached) = self.cache.get_as::<CachedTerm>(&key, CACHE_GROUP) {
            return Ok(Some(Term {
                term_taxonomy_id,
                term_id: cached.term_id,
                name: cached.name,
                slug: cached.slug,
                taxonomy: cached.taxonomy,
            }));
        }

        let term = self.content.term(term_taxonomy_id)?;
        if let Some(term) = &term {
            self.cache.set_as(
                &key,
                CACHE_GROUP,
                &CachedTerm {
                    term_id: term.term_id,
                    name: term.name.clone(),
                    slug: term.slug.clone(),
                    taxonomy: term.taxonomy.clone(),
                },
            );
        }

        Ok(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Endpoint, MemoryCache, Session};
    use crate::storage::{Database, NewTerm, Sites, TableList};

    struct Fixture {
        db: Arc<Database>,
        context: Arc<SiteContext>,
        cache: Arc<MemoryCache>,
        en: SiteId,
        de: SiteId,
        news: ContentId,
        nachrichten: ContentId,
    }

    fn fixture() -> Fixture {
        let db = Arc::new(Database::open_in_memory(TableList::default()).unwrap());
        let sites = Sites::new(Arc::clone(&db));
        let en = sites.add("example.com", "/", true).unwrap();
        let de = sites.add("example.com", "/de/", true).unwrap();
        let context = Arc::new(SiteContext::new(en, Arc::new(sites)));

        let content = ContentDirectory::new(Arc::clone(&db), Arc::clone(&context));
        let term = |site, name, slug| {
            content
                .add_term(
                    site,
                    NewTerm {
                        term_taxonomy_id: None,
                        name,
                        slug,
                        taxonomy: "category",
                    },
                )
                .unwrap()
        };
        let news = term(en, "News", "news");
        let nachrichten = term(de, "Nachrichten", "nachrichten");

        ContentRelations::new(Arc::clone(&db))
            .set_relation(en, de, news, nachrichten, ContentType::Term)
            .unwrap();

        Fixture {
            db,
            context,
            cache: Arc::new(MemoryCache::new()),
            en,
            de,
            news,
            nachrichten,
        }
    }

    fn translator(f: &Fixture, request: RequestContext) -> TermTranslator {
        TermTranslator::new(
            ContentRelations::new(Arc::clone(&f.db)),
            ContentDirectory::new(Arc::clone(&f.db), Arc::clone(&f.context)),
            Arc::clone(&f.context),
            f.cache.clone(),
            Arc::new(request),
        )
    }

    #[test]
    fn frontend_translation_uses_term_link() {
        let f = fixture();
        let translator = translator(&f, RequestContext::frontend(f.en));

        let remote = translator.translation(f.en, f.news, f.de).unwrap().unwrap();
        assert_eq!(remote.title, "Nachrichten");
        assert_eq!(remote.url, "https://example.com/de/category/nachrichten/");
        assert_eq!(f.context.current(), f.en);
    }

    #[test]
    fn results_are_cached() {
        let f = fixture();
        let translator = translator(&f, RequestContext::frontend(f.en));
        translator.translation(f.en, f.news, f.de).unwrap();

        // Unlinking does not invalidate the cache
        ContentRelations::new(Arc::clone(&f.db))
            .delete_relation(f.de, f.nachrichten, ContentType::Term)
            .unwrap();

        let remote = translator.translation(f.en, f.news, f.de).unwrap();
        assert_eq!(remote.map(|r| r.title).as_deref(), Some("Nachrichten"));
        assert!(f.cache.get(TRANSLATIONS_KEY, CACHE_GROUP).is_some());
        assert!(f
            .cache
            .get(&format!("term_with_ttid_{}_{}", f.de, f.nachrichten), CACHE_GROUP)
            .is_some());
    }

    #[test]
    fn missing_translation_is_none_and_cached() {
        let f = fixture();
        let translator = translator(&f, RequestContext::frontend(f.de));
        let unlinked = ContentId::new(5).unwrap();

        assert_eq!(translator.translation(f.de, unlinked, f.en).unwrap(), None);
        let cached: TranslationCache = f.cache.get_as(TRANSLATIONS_KEY, CACHE_GROUP).unwrap();
        assert_eq!(cached[&format!("{}:{}", f.de, unlinked)][&f.en.to_string()], None);
    }

    #[test]
    fn source_site_resolves_without_a_link() {
        let f = fixture();
        let content = ContentDirectory::new(Arc::clone(&f.db), Arc::clone(&f.context));
        let sport = content
            .add_term(
                f.en,
                NewTerm {
                    term_taxonomy_id: None,
                    name: "Sport",
                    slug: "sport",
                    taxonomy: "category",
                },
            )
            .unwrap();

        let translator = translator(&f, RequestContext::frontend(f.en));
        let remote = translator.translation(f.en, sport, f.en).unwrap().unwrap();
        assert_eq!(remote.title, "Sport");
        assert_eq!(remote.url, "https://example.com/category/sport/");
        assert_eq!(translator.translation(f.en, sport, f.de).unwrap(), None);
    }

    #[test]
    fn admin_url_requires_capability() {
        let f = fixture();
        let editor = RequestContext::frontend(f.en)
            .with_endpoint(Endpoint::Admin)
            .with_session(Session::user(7, &[EDIT_TERMS]));
        let remote = translator(&f, editor)
            .translation(f.en, f.news, f.de)
            .unwrap()
            .unwrap();
        assert!(remote.url.contains("wp-admin/term.php?taxonomy=category"));

        let f = fixture();
        let author = RequestContext::frontend(f.en)
            .with_endpoint(Endpoint::Admin)
            .with_session(Session::user(8, &[]));
        let remote = translator(&f, author)
            .translation(f.en, f.news, f.de)
            .unwrap()
            .unwrap();
        assert_eq!(remote.url, "");
    }
}
