//! Translation lookup
//!
//! Given a content item on a source site, [`TranslationApi::translations`]
//! walks the related sites, looks the linked item up inside a scoped switch
//! to each site, and returns one [`Translation`] per site with a usable URL.
//! Missing links, missing content and unrelated sites are not errors: they
//! simply produce no entry.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::links::{sort_links, InterlinkedPermalink, LanguageLink, ListArgs};
use super::term::TermTranslator;
use crate::domain::{ContentId, ContentType, Language, NameField, SiteId, Translation};
use crate::host::{RequestContext, SiteContext, EDIT_POSTS};
use crate::storage::{ContentDirectory, ContentRelations, Languages, Options, SiteRelations};

/// What to look up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranslationArgs {
    /// Source site; the request's site when `None`
    pub site_id: Option<SiteId>,

    /// Source item; the viewed item when `None`
    pub content_id: Option<ContentId>,

    pub content_type: ContentType,

    /// Leave out sites without a linked item instead of falling back to
    /// their home page
    pub strict: bool,

    /// Include the source site itself
    pub include_base: bool,
}

impl TranslationArgs {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            site_id: None,
            content_id: None,
            content_type,
            strict: true,
            include_base: false,
        }
    }

    pub fn site(mut self, site_id: SiteId) -> Self {
        self.site_id = Some(site_id);
        self
    }

    pub fn content(mut self, content_id: ContentId) -> Self {
        self.content_id = Some(content_id);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn include_base(mut self, include_base: bool) -> Self {
        self.include_base = include_base;
        self
    }
}

impl Default for TranslationArgs {
    fn default() -> Self {
        Self::new(ContentType::Post)
    }
}

/// The services a [`TranslationApi`] reads from
pub struct TranslationSources {
    pub site_relations: SiteRelations,
    pub content_relations: ContentRelations,
    pub content: ContentDirectory,
    pub languages: Languages,
    pub options: Options,
    pub context: Arc<SiteContext>,
    pub terms: Arc<TermTranslator>,
    pub request: Arc<RequestContext>,
}

/// Cross-site translation lookup
pub struct TranslationApi {
    sources: TranslationSources,
    memo: Mutex<HashMap<TranslationArgs, BTreeMap<SiteId, Translation>>>,
}

impl TranslationApi {
    pub fn new(sources: TranslationSources) -> Self {
        Self {
            sources,
            memo: Mutex::new(HashMap::new()),
        }
    }

    fn request(&self) -> &RequestContext {
        &self.sources.request
    }

    /// The viewed item of `content_type`, if any
    pub fn default_content_id(&self, content_type: ContentType) -> Option<ContentId> {
        self.request().queried_id(content_type)
    }

    /// Returns the translations of an item, keyed by target site
    ///
    /// Results are memoized for the lifetime of this API, which is one
    /// request.
    pub fn translations(&self, args: TranslationArgs) -> Result<BTreeMap<SiteId, Translation>> {
        let site = args.site_id.unwrap_or(self.request().site_id);
        let Some(content_id) = args
            .content_id
            .or_else(|| self.default_content_id(args.content_type))
        else {
            trace!(%site, "no content to translate");
            return Ok(BTreeMap::new());
        };

        let args = TranslationArgs {
            site_id: Some(site),
            content_id: Some(content_id),
            ..args
        };

        if let Some(memoized) = self.memo.lock().get(&args) {
            return Ok(memoized.clone());
        }

        let translations = self.resolve(site, content_id, args)?;
        self.memo.lock().insert(args, translations.clone());

        Ok(translations)
    }

    fn resolve(
        &self,
        site: SiteId,
        content_id: ContentId,
        args: TranslationArgs,
    ) -> Result<BTreeMap<SiteId, Translation>> {
        let sources = &self.sources;
        let public_only = !self.request().session.is_logged_in();

        let mut targets = sources.site_relations.related_sites(site, public_only)?;
        if args.include_base {
            targets.push(site);
            targets.sort();
        }

        let linked = sources
            .content_relations
            .relations(site, content_id, args.content_type)?;

        let mut translations = BTreeMap::new();

        for target in targets {
            let Some(language) = self.language_of(target)? else {
                trace!(%target, "site has no language");
                continue;
            };

            let target_content_id = if target == site {
                Some(content_id)
            } else {
                linked.get(&target).copied()
            };

            let remote = match target_content_id {
                Some(target_id) => self.remote_content(site, content_id, target, target_id, args.content_type)?,
                None if args.strict => continue,
                None => {
                    let _switch = sources.context.switch_to(target)?;
                    Some((String::new(), sources.content.home_url()?))
                }
            };

            let Some((remote_title, remote_url)) = remote else {
                continue;
            };

            if remote_url.is_empty() {
                trace!(%target, "no usable URL");
                continue;
            }

            translations.insert(
                target,
                Translation {
                    source_site_id: site,
                    target_site_id: target,
                    source_content_id: content_id,
                    target_content_id,
                    content_type: args.content_type,
                    remote_title,
                    remote_url,
                    icon_url: self.flag_url(target)?.unwrap_or_default(),
                    language,
                },
            );
        }

        debug!(%site, %content_id, found = translations.len(), "resolved translations");
        Ok(translations)
    }

    /// Title and URL of a linked item, `None` when it is gone
    fn remote_content(
        &self,
        source_site: SiteId,
        source_id: ContentId,
        target: SiteId,
        target_id: ContentId,
        content_type: ContentType,
    ) -> Result<Option<(String, String)>> {
        let sources = &self.sources;

        match content_type {
            ContentType::Term => Ok(sources
                .terms
                .translation(source_site, source_id, target)?
                .map(|remote| (remote.title, remote.url))),
            ContentType::Post => {
                let _switch = sources.context.switch_to(target)?;

                let Some(post) = sources.content.post(target_id)? else {
                    return Ok(None);
                };

                let request = self.request();
                let url = if request.is_admin() && request.session.can(EDIT_POSTS) {
                    sources.content.edit_post_url(&post)?
                } else if post.is_published() {
                    sources.content.permalink(&post)?
                } else {
                    String::new()
                };

                Ok(Some((post.title, url)))
            }
        }
    }

    /// Linked items on other sites, keyed by site
    pub fn related_content_ids(
        &self,
        site: SiteId,
        content_id: ContentId,
        content_type: ContentType,
    ) -> Result<BTreeMap<SiteId, ContentId>> {
        let mut related = self
            .sources
            .content_relations
            .relations(site, content_id, content_type)?;
        related.remove(&site);
        Ok(related)
    }

    /// Like [`related_content_ids`](Self::related_content_ids), defaulting
    /// to the request's site and viewed item
    pub fn linked_elements(
        &self,
        content_id: Option<ContentId>,
        content_type: ContentType,
        site: Option<SiteId>,
    ) -> Result<BTreeMap<SiteId, ContentId>> {
        let site = site.unwrap_or(self.request().site_id);
        match content_id.or_else(|| self.default_content_id(content_type)) {
            Some(content_id) => self.related_content_ids(site, content_id, content_type),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Public URLs of a post's translations on other sites
    pub fn interlinked_permalinks(
        &self,
        content_id: Option<ContentId>,
    ) -> Result<BTreeMap<SiteId, InterlinkedPermalink>> {
        let mut args = TranslationArgs::new(ContentType::Post);
        args.content_id = content_id;

        let source = self.request().site_id;
        let translations = self.translations(args)?;

        Ok(translations
            .into_iter()
            .filter(|(site, translation)| *site != source && !translation.remote_url.is_empty())
            .filter_map(|(site, translation)| {
                let post_id = translation.target_content_id?;
                Some((
                    site,
                    InterlinkedPermalink {
                        post_id,
                        permalink: translation.remote_url,
                        title: translation.remote_title,
                        flag: translation.icon_url,
                        language: translation.language.locale,
                    },
                ))
            })
            .collect())
    }

    /// A language switcher for the viewed item
    pub fn linked_elements_list(
        &self,
        content_type: ContentType,
        content_id: Option<ContentId>,
        list: ListArgs,
    ) -> Result<Vec<LanguageLink>> {
        let mut args = TranslationArgs::new(content_type)
            .strict(list.strict)
            .include_base(list.include_base);
        args.content_id = content_id;

        let current = self.request().site_id;
        let mut links: Vec<LanguageLink> = self
            .translations(args)?
            .into_values()
            .map(|translation| LanguageLink {
                site_id: translation.target_site_id,
                language: translation.language.http_name.clone(),
                text: translation.language.name(list.link_text),
                url: translation.remote_url,
                title: translation.remote_title,
                icon_url: translation.icon_url,
                priority: translation.language.priority,
                is_current: translation.target_site_id == current,
            })
            .collect();

        sort_links(&mut links, list.sort);
        Ok(links)
    }

    /// Language of a site, from its locale in the site-language mapping
    ///
    /// The mapping's alternative title becomes the language's custom name.
    pub fn language_of(&self, site: SiteId) -> Result<Option<Language>> {
        let Some(assignment) = self.sources.options.site_language(site)? else {
            return Ok(None);
        };

        if !assignment.is_assigned() {
            return Ok(None);
        }

        let mut language = match self.sources.languages.by_locale(&assignment.lang)? {
            Some(language) => language,
            None => Language::from_locale(&assignment.lang, &assignment.lang, &assignment.lang),
        };

        if !assignment.text.is_empty() {
            language.custom_name = Some(assignment.text.clone());
        }

        Ok(Some(language))
    }

    /// Locale of a site (`de_DE`), or its language code (`de`) when `short`;
    /// empty when the site has no language
    pub fn site_language(&self, site: SiteId, short: bool) -> Result<String> {
        Ok(self
            .sources
            .options
            .site_language(site)?
            .filter(|assignment| assignment.is_assigned())
            .map(|assignment| assignment.code(short).to_string())
            .unwrap_or_default())
    }

    /// Locale of the request's site
    pub fn current_site_language(&self, short: bool) -> Result<String> {
        self.site_language(self.request().site_id, short)
    }

    /// Locales of all sites with a language, keyed by site
    ///
    /// With `related_only`, only the request's site and its related sites
    /// are included.
    pub fn available_languages(&self, related_only: bool) -> Result<BTreeMap<SiteId, String>> {
        let mut mapping: BTreeMap<SiteId, String> = self
            .sources
            .options
            .site_languages()?
            .into_iter()
            .filter(|(_, assignment)| assignment.is_assigned())
            .map(|(site, assignment)| (site, assignment.lang))
            .collect();

        if related_only {
            let current = self.request().site_id;
            let related = self.sources.site_relations.related_sites(current, false)?;
            mapping.retain(|site, _| *site == current || related.contains(site));
        }

        Ok(mapping)
    }

    /// Display titles of the sites with a language: the site's own language
    /// title when set, otherwise the language's native name
    pub fn available_language_titles(&self, related_only: bool) -> Result<BTreeMap<SiteId, String>> {
        let assignments = self.sources.options.site_languages()?;
        let mut titles = BTreeMap::new();

        for (site, locale) in self.available_languages(related_only)? {
            let custom = assignments
                .get(&site)
                .map(|assignment| assignment.text.clone())
                .filter(|text| !text.is_empty());

            let title = match custom {
                Some(text) => text,
                None => self
                    .sources
                    .languages
                    .by_locale(&locale)?
                    .map(|language| language.native_name)
                    .unwrap_or(locale),
            };
            titles.insert(site, title);
        }

        Ok(titles)
    }

    /// Name of the language with ISO 639-1 code `iso`; empty when unknown
    pub fn lang_by_iso(&self, iso: &str, field: NameField) -> Result<String> {
        Ok(self
            .sources
            .languages
            .by_iso(iso)?
            .map(|language| language.name(field))
            .unwrap_or_default())
    }

    /// Flag image of a site's language
    ///
    /// A flag stored with the language wins; otherwise the bundled flag for
    /// the language code under the site's home URL.
    pub fn flag_url(&self, site: SiteId) -> Result<Option<String>> {
        let Some(assignment) = self
            .sources
            .options
            .site_language(site)?
            .filter(|assignment| assignment.is_assigned())
        else {
            return Ok(None);
        };

        if let Some(flag) = self.sources.languages.flag(&assignment.lang)? {
            return Ok(Some(flag));
        }

        let _switch = self.sources.context.switch_to(site)?;
        Ok(Some(format!(
            "{}wp-content/plugins/multilingual-press/assets/images/flags/{}.gif",
            self.sources.content.home_url()?,
            assignment.code(true)
        )))
    }

    /// Runs `callback` once per other site with a language, switched to that
    /// site; returns how many sites were visited
    pub fn run_for_related_sites<F>(&self, site: SiteId, mut callback: F) -> Result<usize>
    where
        F: FnMut(SiteId) -> Result<()>,
    {
        let mut visited = 0;

        for target in self.available_languages(false)?.into_keys() {
            if target == site {
                continue;
            }

            let _switch = self.sources.context.switch_to(target)?;
            callback(target)?;
            visited += 1;
        }

        Ok(visited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SiteLanguage;
    use crate::host::{Endpoint, MemoryCache, Session, EDIT_TERMS};
    use crate::storage::{Database, NewPost, NewTerm, Sites, TableList, PUBLISHED};
    use crate::translation::SortPolicy;

    struct Network {
        db: Arc<Database>,
        sites: Sites,
        context: Arc<SiteContext>,
        en: SiteId,
        de: SiteId,
        fr: SiteId,
    }

    fn network() -> Network {
        let db = Arc::new(Database::open_in_memory(TableList::default()).unwrap());
        let sites = Sites::new(Arc::clone(&db));
        let en = sites.add("example.com", "/", true).unwrap();
        let de = sites.add("example.com", "/de/", true).unwrap();
        let fr = sites.add("example.com", "/fr/", true).unwrap();

        let languages = Languages::new(Arc::clone(&db));
        languages.upsert(&Language::from_locale("en_US", "English", "English")).unwrap();
        let mut german = Language::from_locale("de_DE", "German", "Deutsch");
        german.priority = 5;
        languages.upsert(&german).unwrap();
        languages.upsert(&Language::from_locale("fr_FR", "French", "Français")).unwrap();

        let options = Options::new(Arc::clone(&db));
        options.set_site_language(en, SiteLanguage::new("en_US")).unwrap();
        options.set_site_language(de, SiteLanguage::new("de_DE")).unwrap();
        options.set_site_language(fr, SiteLanguage::new("fr_FR")).unwrap();

        let relations = SiteRelations::new(Arc::clone(&db));
        relations.set_relation(en, de).unwrap();
        relations.set_relation(en, fr).unwrap();

        let context = Arc::new(SiteContext::new(en, Arc::new(sites.clone())));

        Network {
            db,
            sites,
            context,
            en,
            de,
            fr,
        }
    }

    impl Network {
        fn content(&self) -> ContentDirectory {
            ContentDirectory::new(Arc::clone(&self.db), Arc::clone(&self.context))
        }

        fn post(&self, site: SiteId, id: i64, slug: &str, status: &str) -> ContentId {
            self.content()
                .add_post(
                    site,
                    NewPost {
                        id: ContentId::new(id),
                        title: slug,
                        slug,
                        status,
                    },
                )
                .unwrap()
        }

        fn category(&self, site: SiteId, id: i64, slug: &str) -> ContentId {
            self.content()
                .add_term(
                    site,
                    NewTerm {
                        term_taxonomy_id: ContentId::new(id),
                        name: slug,
                        slug,
                        taxonomy: "category",
                    },
                )
                .unwrap()
        }

        fn link(&self, a: (SiteId, ContentId), b: (SiteId, ContentId)) {
            self.link_as(a, b, ContentType::Post);
        }

        fn link_as(&self, a: (SiteId, ContentId), b: (SiteId, ContentId), content_type: ContentType) {
            ContentRelations::new(Arc::clone(&self.db))
                .set_relation(a.0, b.0, a.1, b.1, content_type)
                .unwrap();
        }

        fn api(&self, request: RequestContext) -> TranslationApi {
            let request = Arc::new(request);
            let terms = Arc::new(TermTranslator::new(
                ContentRelations::new(Arc::clone(&self.db)),
                self.content(),
                Arc::clone(&self.context),
                Arc::new(MemoryCache::new()),
                Arc::clone(&request),
            ));

            TranslationApi::new(TranslationSources {
                site_relations: SiteRelations::new(Arc::clone(&self.db)),
                content_relations: ContentRelations::new(Arc::clone(&self.db)),
                content: self.content(),
                languages: Languages::new(Arc::clone(&self.db)),
                options: Options::new(Arc::clone(&self.db)),
                context: Arc::clone(&self.context),
                terms,
                request,
            })
        }
    }

    #[test]
    fn resolves_linked_posts() {
        let n = network();
        let hello = n.post(n.en, 42, "hello", PUBLISHED);
        let hallo = n.post(n.de, 99, "hallo", PUBLISHED);
        n.link((n.en, hello), (n.de, hallo));

        let api = n.api(RequestContext::frontend(n.en));
        let found = api
            .translations(TranslationArgs::new(ContentType::Post).content(hello))
            .unwrap();

        assert_eq!(found.len(), 1);
        let german = &found[&n.de];
        assert_eq!(german.target_content_id, Some(hallo));
        assert_eq!(german.language.iso_639_1, "de");
        assert_eq!(german.remote_url, "https://example.com/de/hallo/");
        assert_eq!(n.context.current(), n.en);
    }

    #[test]
    fn no_content_id_is_empty() {
        let n = network();
        let api = n.api(RequestContext::frontend(n.en));
        assert!(api.translations(TranslationArgs::default()).unwrap().is_empty());
    }

    #[test]
    fn viewed_item_is_the_default() {
        let n = network();
        let hello = n.post(n.en, 42, "hello", PUBLISHED);
        let hallo = n.post(n.de, 99, "hallo", PUBLISHED);
        n.link((n.en, hello), (n.de, hallo));

        let api = n.api(RequestContext::frontend(n.en).viewing(ContentType::Post, hello));
        let linked = api.linked_elements(None, ContentType::Post, None).unwrap();
        assert_eq!(linked.into_iter().collect::<Vec<_>>(), vec![(n.de, hallo)]);
    }

    #[test]
    fn unrelated_site_has_no_translations() {
        let n = network();
        let lonely = n.sites.add("example.com", "/it/", true).unwrap();
        let post = n.post(lonely, 1, "ciao", PUBLISHED);

        let api = n.api(RequestContext::frontend(lonely));
        let found = api
            .translations(TranslationArgs::new(ContentType::Post).content(post).strict(false))
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn empty_url_is_skipped() {
        let n = network();
        let hello = n.post(n.en, 42, "hello", PUBLISHED);
        let draft = n.post(n.de, 99, "entwurf", "draft");
        let bonjour = n.post(n.fr, 7, "bonjour", PUBLISHED);
        n.link((n.en, hello), (n.de, draft));
        n.link((n.en, hello), (n.fr, bonjour));

        let api = n.api(RequestContext::frontend(n.en));
        let found = api
            .translations(TranslationArgs::new(ContentType::Post).content(hello))
            .unwrap();

        assert_eq!(found.keys().copied().collect::<Vec<_>>(), vec![n.fr]);
    }

    #[test]
    fn admin_editor_gets_edit_urls_for_drafts() {
        let n = network();
        let hello = n.post(n.en, 42, "hello", PUBLISHED);
        let draft = n.post(n.de, 99, "entwurf", "draft");
        n.link((n.en, hello), (n.de, draft));

        let request = RequestContext::frontend(n.en)
            .with_endpoint(Endpoint::Admin)
            .with_session(Session::user(3, &[EDIT_POSTS]));
        let found = n
            .api(request)
            .translations(TranslationArgs::new(ContentType::Post).content(hello))
            .unwrap();

        assert_eq!(
            found[&n.de].remote_url,
            "https://example.com/de/wp-admin/post.php?post=99&action=edit"
        );
    }

    #[test]
    fn non_strict_falls_back_to_home() {
        let n = network();
        let hello = n.post(n.en, 42, "hello", PUBLISHED);
        let hallo = n.post(n.de, 99, "hallo", PUBLISHED);
        n.link((n.en, hello), (n.de, hallo));

        let api = n.api(RequestContext::frontend(n.en));
        let found = api
            .translations(
                TranslationArgs::new(ContentType::Post)
                    .content(hello)
                    .strict(false)
                    .include_base(true),
            )
            .unwrap();

        assert_eq!(found.len(), 3);
        assert!(!found[&n.fr].is_exact());
        assert_eq!(found[&n.fr].remote_url, "https://example.com/fr/");
        assert_eq!(found[&n.en].target_content_id, Some(hello));
        assert!(found[&n.de].is_exact());
    }

    #[test]
    fn resolves_linked_terms() {
        let n = network();
        let news = n.category(n.en, 3, "news");
        let nachrichten = n.category(n.de, 8, "nachrichten");
        n.link_as((n.en, news), (n.de, nachrichten), ContentType::Term);

        let args = TranslationArgs::new(ContentType::Term).content(news);
        let found = n.api(RequestContext::frontend(n.en)).translations(args).unwrap();

        assert_eq!(found.keys().copied().collect::<Vec<_>>(), vec![n.de]);
        let german = &found[&n.de];
        assert_eq!(german.target_content_id, Some(nachrichten));
        assert_eq!(german.remote_title, "nachrichten");
        assert_eq!(german.remote_url, "https://example.com/de/category/nachrichten/");

        let editor = RequestContext::frontend(n.en)
            .with_endpoint(Endpoint::Admin)
            .with_session(Session::user(3, &[EDIT_TERMS]));
        let found = n.api(editor).translations(args).unwrap();
        assert_eq!(
            found[&n.de].remote_url,
            "https://example.com/de/wp-admin/term.php?taxonomy=category&tag_ID=8"
        );
    }

    #[test]
    fn include_base_keeps_unlinked_items() {
        let n = network();
        let sport = n.category(n.en, 4, "sport");
        let hello = n.post(n.en, 42, "hello", PUBLISHED);
        let api = n.api(RequestContext::frontend(n.en));

        for (content_type, id, url) in [
            (ContentType::Term, sport, "https://example.com/category/sport/"),
            (ContentType::Post, hello, "https://example.com/hello/"),
        ] {
            let found = api
                .translations(TranslationArgs::new(content_type).content(id).include_base(true))
                .unwrap();

            assert_eq!(found.keys().copied().collect::<Vec<_>>(), vec![n.en]);
            assert_eq!(found[&n.en].target_content_id, Some(id));
            assert_eq!(found[&n.en].remote_url, url);
        }
    }

    #[test]
    fn failed_switch_restores_the_context() {
        let n = network();
        let hello = n.post(n.en, 42, "hello", PUBLISHED);
        let hallo = n.post(n.de, 99, "hallo", PUBLISHED);
        let bonjour = n.post(n.fr, 7, "bonjour", PUBLISHED);
        n.link((n.en, hello), (n.de, hallo));
        n.link((n.en, hello), (n.fr, bonjour));

        // The site row is gone but its relations and links were never cleaned up.
        n.sites.delete(n.fr).unwrap();

        let request = RequestContext::frontend(n.en).with_session(Session::user(1, &[]));
        let api = n.api(request);
        let args = TranslationArgs::new(ContentType::Post).content(hello);

        assert!(api.translations(args).is_err());
        assert_eq!(n.context.current(), n.en);
        assert_eq!(n.context.depth(), 0);

        let nested = api.run_for_related_sites(n.en, |site| {
            assert_eq!(n.context.depth(), 1);
            assert_eq!(n.context.current(), site);
            api.translations(args).map(|_| ())
        });
        assert!(nested.is_err());
        assert_eq!(n.context.current(), n.en);
        assert_eq!(n.context.depth(), 0);
    }

    #[test]
    fn anonymous_visitors_see_public_sites_only() {
        let n = network();
        let hidden = n.sites.add("example.com", "/es/", false).unwrap();
        Options::new(Arc::clone(&n.db))
            .set_site_language(hidden, SiteLanguage::new("es_ES"))
            .unwrap();
        SiteRelations::new(Arc::clone(&n.db)).set_relation(n.en, hidden).unwrap();

        let hello = n.post(n.en, 42, "hello", PUBLISHED);
        let hola = n.post(hidden, 5, "hola", PUBLISHED);
        n.link((n.en, hello), (hidden, hola));

        let args = TranslationArgs::new(ContentType::Post).content(hello);
        assert!(n.api(RequestContext::frontend(n.en)).translations(args).unwrap().is_empty());

        let logged_in = RequestContext::frontend(n.en).with_session(Session::user(1, &[]));
        assert_eq!(n.api(logged_in).translations(args).unwrap().len(), 1);
    }

    #[test]
    fn language_list_sorting() {
        let n = network();
        let hello = n.post(n.en, 42, "hello", PUBLISHED);
        let hallo = n.post(n.de, 99, "hallo", PUBLISHED);
        let bonjour = n.post(n.fr, 7, "bonjour", PUBLISHED);
        n.link((n.en, hello), (n.de, hallo));
        n.link((n.en, hello), (n.fr, bonjour));

        let api = n.api(RequestContext::frontend(n.en).viewing(ContentType::Post, hello));
        let list = |sort| {
            api.linked_elements_list(
                ContentType::Post,
                None,
                ListArgs {
                    sort,
                    include_base: true,
                    ..ListArgs::default()
                },
            )
            .unwrap()
            .into_iter()
            .map(|link| link.text)
            .collect::<Vec<_>>()
        };

        assert_eq!(list(SortPolicy::SiteId), vec!["English", "Deutsch", "Français"]);
        assert_eq!(list(SortPolicy::Priority), vec!["Deutsch", "English", "Français"]);
        assert_eq!(list(SortPolicy::Name), vec!["Deutsch", "English", "Français"]);
    }

    #[test]
    fn interlinked_permalinks_skip_source() {
        let n = network();
        let hello = n.post(n.en, 42, "hello", PUBLISHED);
        let hallo = n.post(n.de, 99, "hallo", PUBLISHED);
        n.link((n.en, hello), (n.de, hallo));

        let api = n.api(RequestContext::frontend(n.en));
        let permalinks = api.interlinked_permalinks(Some(hello)).unwrap();

        assert_eq!(permalinks.len(), 1);
        let german = &permalinks[&n.de];
        assert_eq!(german.post_id, hallo);
        assert_eq!(german.title, "hallo");
        assert_eq!(german.language, "de_DE");
        assert_eq!(german.permalink, "https://example.com/de/hallo/");
        assert!(german.flag.ends_with("/flags/de.gif"));
    }

    #[test]
    fn language_titles_prefer_the_site_title() {
        let n = network();
        let mut custom = SiteLanguage::new("fr_FR");
        custom.text = "Français (France)".to_string();
        Options::new(Arc::clone(&n.db)).set_site_language(n.fr, custom).unwrap();

        let api = n.api(RequestContext::frontend(n.en));
        let titles = api.available_language_titles(false).unwrap();
        assert_eq!(titles[&n.en], "English");
        assert_eq!(titles[&n.de], "Deutsch");
        assert_eq!(titles[&n.fr], "Français (France)");

        SiteRelations::new(Arc::clone(&n.db))
            .delete_relation(n.en, Some(n.fr))
            .unwrap();
        let related = api.available_language_titles(true).unwrap();
        assert_eq!(related.keys().copied().collect::<Vec<_>>(), vec![n.en, n.de]);
    }

    #[test]
    fn language_helpers() {
        let n = network();
        let api = n.api(RequestContext::frontend(n.de));

        assert_eq!(api.current_site_language(false).unwrap(), "de_DE");
        assert_eq!(api.site_language(n.fr, true).unwrap(), "fr");
        assert_eq!(api.lang_by_iso("fr", NameField::English).unwrap(), "French");
        assert_eq!(api.lang_by_iso("xx", NameField::English).unwrap(), "");
        assert_eq!(
            api.flag_url(n.de).unwrap().as_deref(),
            Some("https://example.com/de/wp-content/plugins/multilingual-press/assets/images/flags/de.gif")
        );

        let related = api.available_languages(true).unwrap();
        assert_eq!(related.keys().copied().collect::<Vec<_>>(), vec![n.en, n.de]);
        assert_eq!(api.available_languages(false).unwrap().len(), 3);
    }

    #[test]
    fn run_for_related_sites_switches_and_restores() {
        let n = network();
        let api = n.api(RequestContext::frontend(n.en));

        let mut seen = Vec::new();
        let visited = api
            .run_for_related_sites(n.en, |site| {
                assert_eq!(n.context.current(), site);
                seen.push(site);
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, 2);
        assert_eq!(seen, vec![n.de, n.fr]);
        assert_eq!(n.context.current(), n.en);
    }
}
