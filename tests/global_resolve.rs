//! Process-wide access to the first controller's container
//!
//! Kept in its own test binary: the global is set once per process, so the
//! assertions run in one test in a fixed order.

use std::sync::Arc;

use multilingual_press::host::RequestContext;
use multilingual_press::service::keys;
use multilingual_press::storage::{Database, NetworkConfig, Sites, TableList};
use multilingual_press::{ControllerError, MultilingualPress, TranslationApi};

#[test]
fn resolve_follows_the_first_controller() {
    assert!(matches!(
        MultilingualPress::resolve::<TranslationApi>(keys::TRANSLATION_API),
        Err(ControllerError::PrematureAccess(key)) if key == keys::TRANSLATION_API
    ));
    assert_eq!(MultilingualPress::is_active_site(), None);

    let db = Arc::new(Database::open_in_memory(TableList::default()).unwrap());
    let site = Sites::new(Arc::clone(&db)).add("example.com", "/", true).unwrap();

    // No language on the site, so the first decision is "inactive".
    let first = multilingual_press::init(
        Arc::clone(&db),
        NetworkConfig::default(),
        RequestContext::frontend(site),
        [],
    )
    .unwrap();
    assert_eq!(first.active_site(), Some(false));
    assert_eq!(MultilingualPress::is_active_site(), Some(false));

    let api: Arc<TranslationApi> = MultilingualPress::resolve(keys::TRANSLATION_API).unwrap();
    let own: Arc<TranslationApi> = first.container().get(keys::TRANSLATION_API).unwrap();
    assert!(Arc::ptr_eq(&api, &own));

    assert!(matches!(
        MultilingualPress::resolve::<TranslationApi>("multilingualpress.missing"),
        Err(ControllerError::Container(_))
    ));

    // A later controller keeps both the container and the decision, even
    // on an endpoint that would be active on its own.
    let second = multilingual_press::init(
        Arc::clone(&db),
        NetworkConfig::default(),
        RequestContext::frontend(site)
            .with_endpoint(multilingual_press::host::Endpoint::NetworkAdmin),
        [],
    )
    .unwrap();
    assert_eq!(second.active_site(), Some(false));
    assert_eq!(MultilingualPress::is_active_site(), Some(false));

    let again: Arc<TranslationApi> = MultilingualPress::resolve(keys::TRANSLATION_API).unwrap();
    assert!(Arc::ptr_eq(&again, &own));

    // An isolated controller decides for itself and publishes nothing.
    let isolated = multilingual_press::init_isolated(
        Arc::clone(&db),
        NetworkConfig::default(),
        RequestContext::frontend(site)
            .with_endpoint(multilingual_press::host::Endpoint::NetworkAdmin),
        [],
    )
    .unwrap();
    assert_eq!(isolated.active_site(), Some(true));
    assert_eq!(MultilingualPress::is_active_site(), Some(false));

    let after: Arc<TranslationApi> = MultilingualPress::resolve(keys::TRANSLATION_API).unwrap();
    assert!(Arc::ptr_eq(&after, &own));
}
