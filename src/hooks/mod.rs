//! # Hooks
//!
//! A typed replacement for the host's named-action bus. Subscribers attach
//! to a [`Signal`] value with a priority; emitting the signal runs them
//! lowest priority first, in subscription order within a priority.
//!
//! Subscriptions are keyed by [`Topic`]: a module's activation is its own
//! topic, while every site deletion shares one topic and handlers read the
//! site from the emitted signal.
//!
//! Module activation uses this bus as a two-step handshake: a module's
//! bootstrap subscribes its setup to [`Signal::ModuleActivated`], and the
//! controller emits that signal only if the module manager reports the
//! module as active.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::domain::{ModuleId, SiteId};

/// Priority used when a subscriber does not care about ordering
pub const DEFAULT_PRIORITY: i32 = 10;

/// Something that happened in the plugin or the host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Core providers are bootstrapped on an active site
    Init,

    /// Everything is bootstrapped; modules are about to be registered
    Loaded,

    /// The module manager reported the module as active
    ModuleActivated(ModuleId),

    /// A site was removed from the network
    SiteDeleted(SiteId),

    /// Administrator notices are being collected
    AdminNotices,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Init => f.write_str("init"),
            Signal::Loaded => f.write_str("loaded"),
            Signal::ModuleActivated(module) => write!(f, "activated:{}", module),
            Signal::SiteDeleted(site) => write!(f, "site_deleted:{}", site),
            Signal::AdminNotices => f.write_str("admin_notices"),
        }
    }
}

/// What a subscriber listens to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    Init,
    Loaded,
    ModuleActivated(ModuleId),
    SiteDeleted,
    AdminNotices,
}

impl From<&Signal> for Topic {
    fn from(signal: &Signal) -> Self {
        match signal {
            Signal::Init => Topic::Init,
            Signal::Loaded => Topic::Loaded,
            Signal::ModuleActivated(module) => Topic::ModuleActivated(module.clone()),
            Signal::SiteDeleted(_) => Topic::SiteDeleted,
            Signal::AdminNotices => Topic::AdminNotices,
        }
    }
}

impl From<Signal> for Topic {
    fn from(signal: Signal) -> Self {
        Topic::from(&signal)
    }
}

/// A subscriber callback
pub type Handler = Arc<dyn Fn(&Signal) -> Result<()> + Send + Sync>;

struct Subscriber {
    priority: i32,
    seq: u64,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    subscribers: HashMap<Topic, Vec<Subscriber>>,
    fired: HashMap<Topic, usize>,
    next_seq: u64,
}

/// Priority-ordered observer registry
#[derive(Default)]
pub struct EventBus {
    registry: Mutex<Registry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `handler` to a topic, given as a [`Topic`] or a [`Signal`]
    pub fn subscribe<F>(&self, topic: impl Into<Topic>, priority: i32, handler: F)
    where
        F: Fn(&Signal) -> Result<()> + Send + Sync + 'static,
    {
        let topic = topic.into();
        let mut registry = self.registry.lock();
        let seq = registry.next_seq;
        registry.next_seq += 1;

        trace!(?topic, priority, "subscribing handler");
        let subscribers = registry.subscribers.entry(topic).or_default();
        subscribers.push(Subscriber {
            priority,
            seq,
            handler: Arc::new(handler),
        });
        subscribers.sort_by_key(|s| (s.priority, s.seq));
    }

    /// Runs every subscriber of `signal`
    ///
    /// All subscribers run even if one fails; the first error is returned.
    /// Subscribers added while the signal is being emitted run the next time.
    pub fn emit(&self, signal: &Signal) -> Result<()> {
        let handlers: Vec<Handler> = {
            let topic = Topic::from(signal);
            let mut registry = self.registry.lock();
            *registry.fired.entry(topic.clone()).or_insert(0) += 1;
            registry
                .subscribers
                .get(&topic)
                .map(|subscribers| subscribers.iter().map(|s| Arc::clone(&s.handler)).collect())
                .unwrap_or_default()
        };

        debug!(%signal, handlers = handlers.len(), "emitting signal");

        let mut first_error = None;
        for handler in handlers {
            if let Err(err) = handler(signal) {
                warn!(%signal, error = %format!("{:#}", err), "signal handler failed");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Returns true if anything is subscribed to a topic
    pub fn has_subscribers(&self, topic: impl Into<Topic>) -> bool {
        self.registry
            .lock()
            .subscribers
            .get(&topic.into())
            .is_some_and(|subscribers| !subscribers.is_empty())
    }

    /// Returns how many times a topic has been emitted
    pub fn fired(&self, topic: impl Into<Topic>) -> usize {
        self.registry.lock().fired.get(&topic.into()).copied().unwrap_or(0)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("EventBus")
            .field("topics", &registry.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recorder(log: &Log, name: &'static str) -> impl Fn(&Signal) -> Result<()> + Send + Sync {
        let log = Arc::clone(log);
        move |_| {
            log.lock().push(name);
            Ok(())
        }
    }

    #[test]
    fn priority_then_subscription_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = EventBus::new();

        bus.subscribe(Signal::Init, DEFAULT_PRIORITY, recorder(&log, "second"));
        bus.subscribe(Signal::Init, 1, recorder(&log, "first"));
        bus.subscribe(Signal::Init, DEFAULT_PRIORITY, recorder(&log, "third"));
        bus.subscribe(Signal::Loaded, 0, recorder(&log, "other"));

        bus.emit(&Signal::Init).unwrap();
        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
        assert_eq!(bus.fired(&Signal::Init), 1);
        assert_eq!(bus.fired(&Signal::Loaded), 0);
    }

    #[test]
    fn signals_with_payload_are_distinct() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = EventBus::new();
        let trasher: ModuleId = "trasher".parse().unwrap();
        let redirect: ModuleId = "redirect".parse().unwrap();

        bus.subscribe(Signal::ModuleActivated(trasher.clone()), DEFAULT_PRIORITY, recorder(&log, "trasher"));

        bus.emit(&Signal::ModuleActivated(redirect)).unwrap();
        assert!(log.lock().is_empty());

        bus.emit(&Signal::ModuleActivated(trasher)).unwrap();
        assert_eq!(*log.lock(), vec!["trasher"]);
    }

    #[test]
    fn site_deletions_share_a_topic() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let bus = EventBus::new();

        let sink = Arc::clone(&seen);
        bus.subscribe(Topic::SiteDeleted, DEFAULT_PRIORITY, move |signal| {
            if let Signal::SiteDeleted(site) = signal {
                sink.lock().push(site.get());
            }
            Ok(())
        });

        bus.emit(&Signal::SiteDeleted(SiteId::new(3).unwrap())).unwrap();
        bus.emit(&Signal::SiteDeleted(SiteId::new(5).unwrap())).unwrap();
        assert_eq!(*seen.lock(), vec![3, 5]);
        assert_eq!(bus.fired(Topic::SiteDeleted), 2);
    }

    #[test]
    fn failing_handler_does_not_stop_others() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = EventBus::new();

        bus.subscribe(Signal::AdminNotices, 1, |_| anyhow::bail!("first failure"));
        bus.subscribe(Signal::AdminNotices, 2, |_| anyhow::bail!("second failure"));
        bus.subscribe(Signal::AdminNotices, 3, recorder(&log, "ran"));

        let err = bus.emit(&Signal::AdminNotices).unwrap_err();
        assert_eq!(err.to_string(), "first failure");
        assert_eq!(*log.lock(), vec!["ran"]);
    }

    #[test]
    fn handler_may_subscribe_during_emit() {
        let bus = Arc::new(EventBus::new());
        let inner = Arc::clone(&bus);

        bus.subscribe(Signal::Init, DEFAULT_PRIORITY, move |_| {
            inner.subscribe(Signal::Loaded, DEFAULT_PRIORITY, |_| Ok(()));
            Ok(())
        });

        assert!(!bus.has_subscribers(&Signal::Loaded));
        bus.emit(&Signal::Init).unwrap();
        assert!(bus.has_subscribers(&Signal::Loaded));
    }
}
