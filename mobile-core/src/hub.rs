//! Reference host: routes events to registered listeners and keeps the
//! versioned shared states extensions read their configuration from.
//!
//! Every dispatched event gets a monotonically increasing number. A shared
//! state set while event `n` is the latest dispatched one is visible to event
//! `n` and later events. Events an extension is not ready for are queued per
//! extension and re-offered, in order, each time a shared state changes.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::event::{Event, EventData, EventSource, EventType};
use crate::extension::{
    DynExtension, Extension, ExtensionApi, Listener, Register, SharedStateResult, SharedStateStatus,
};
use crate::services::Services;
use crate::{DashMap, Error, Result, CONFIGURATION_EXTENSION};

type Versions = BTreeMap<u64, EventData>;

struct ListenerEntry {
    owner: Option<String>,
    typ: EventType,
    source: EventSource,
    listener: Arc<dyn Listener>,
}

impl ListenerEntry {
    #[inline]
    fn matches(&self, event: &Event) -> bool {
        &self.typ == event.typ() && &self.source == event.source()
    }
}

struct HubInner {
    services: Services,
    extensions: DashMap<String, DynExtension>,
    listeners: RwLock<Vec<ListenerEntry>>,
    shared_states: RwLock<HashMap<String, Versions>>,
    pending: Mutex<HashMap<String, VecDeque<Event>>>,
    counter: AtomicU64,
}

#[derive(Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

impl EventHub {
    pub fn new(services: Services) -> Self {
        Self {
            inner: Arc::new(HubInner {
                services,
                extensions: DashMap::default(),
                listeners: RwLock::new(Vec::new()),
                shared_states: RwLock::new(HashMap::new()),
                pending: Mutex::new(HashMap::new()),
                counter: AtomicU64::new(0),
            }),
        }
    }

    #[inline]
    pub fn services(&self) -> &Services {
        &self.inner.services
    }

    /// Builds the extension with its host API and lets it register its listeners.
    pub fn register_extension<E, F>(&self, f: F) -> Result<Arc<E>>
    where
        E: Extension + 'static,
        F: FnOnce(Arc<dyn ExtensionApi>) -> Result<E>,
    {
        let api: Arc<dyn ExtensionApi> =
            Arc::new(HubApi { hub: Arc::downgrade(&self.inner), services: self.inner.services.clone() });
        let ext = Arc::new(f(api)?);
        let name = ext.name().to_owned();
        if self.inner.extensions.contains_key(&name) {
            return Err(Error::Msg(format!("extension {} is already registered", name)));
        }
        self.inner.extensions.insert(name.clone(), ext.clone());
        ext.on_registered(&HubRegister { hub: &self.inner, owner: Some(name.clone()) });
        log::info!(
            "extension {} registered, package: {}, version: {}",
            ext.friendly_name(),
            ext.package(),
            ext.version()
        );
        Ok(ext)
    }

    pub fn unregister_extension(&self, name: &str) -> bool {
        let ext = match self.inner.extensions.remove(name) {
            Some((_, ext)) => ext,
            None => return false,
        };
        self.inner.listeners.write().retain(|l| l.owner.as_deref() != Some(name));
        self.inner.pending.lock().remove(name);
        ext.on_unregistered();
        log::info!("extension {} unregistered", ext.friendly_name());
        true
    }

    #[inline]
    pub fn extension(&self, name: &str) -> Option<DynExtension> {
        self.inner.extensions.get(name).map(|e| e.value().clone())
    }

    /// Observer outside of any extension, always called immediately.
    pub fn register_listener<L>(&self, typ: EventType, source: EventSource, listener: L)
    where
        L: Listener + 'static,
    {
        HubRegister { hub: &self.inner, owner: None }.add(typ, source, Box::new(listener));
    }

    #[inline]
    pub fn dispatch(&self, event: Event) {
        self.inner.dispatch(event)
    }

    #[inline]
    pub fn set_shared_state(&self, owner: &str, state: EventData) {
        self.inner.set_shared_state(owner, state)
    }

    #[inline]
    pub fn shared_state(&self, owner: &str, event: Option<&Event>) -> Option<SharedStateResult> {
        self.inner.shared_state(owner, event)
    }

    /// Publishes a new configuration and notifies listeners of the change.
    pub fn update_configuration(&self, config: EventData) {
        self.inner.set_shared_state(CONFIGURATION_EXTENSION, config.clone());
        let event = Event::builder("Configuration Response Event", EventType::Configuration, EventSource::ResponseContent)
            .data(config)
            .build();
        self.inner.dispatch(event);
    }

    /// Number of events held back for the named extension.
    #[inline]
    pub fn pending_count(&self, name: &str) -> usize {
        self.inner.pending.lock().get(name).map(|q| q.len()).unwrap_or_default()
    }
}

impl HubInner {
    fn dispatch(&self, mut event: Event) {
        let number = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        event.set_number(number);
        log::trace!("dispatch {}", event);

        let mut observers = Vec::new();
        let mut owners = Vec::new();
        for l in self.listeners.read().iter().filter(|l| l.matches(&event)) {
            match l.owner.as_ref() {
                None => observers.push(l.listener.clone()),
                Some(owner) => {
                    if !owners.contains(owner) {
                        owners.push(owner.clone())
                    }
                }
            }
        }

        for owner in owners {
            let ext = match self.extensions.get(&owner) {
                Some(ext) => ext.value().clone(),
                None => continue,
            };
            let deliver_now = {
                let mut pending = self.pending.lock();
                let queue = pending.entry(owner.clone()).or_default();
                if queue.is_empty() && ext.ready_for_event(&event) {
                    true
                } else {
                    log::debug!("{} is not ready for {}, queued", owner, event);
                    queue.push_back(event.clone());
                    false
                }
            };
            if deliver_now {
                self.deliver(&owner, &event);
            }
        }

        for listener in observers {
            listener.hear(&event);
        }
    }

    fn deliver(&self, owner: &str, event: &Event) {
        let listeners = self
            .listeners
            .read()
            .iter()
            .filter(|l| l.owner.as_deref() == Some(owner) && l.matches(event))
            .map(|l| l.listener.clone())
            .collect::<Vec<_>>();
        for listener in listeners {
            listener.hear(event);
        }
    }

    fn drain_pending(&self) {
        let owners = self.pending.lock().keys().cloned().collect::<Vec<_>>();
        for owner in owners {
            let ext = match self.extensions.get(&owner) {
                Some(ext) => ext.value().clone(),
                None => continue,
            };
            loop {
                let event = {
                    let mut pending = self.pending.lock();
                    let queue = match pending.get_mut(&owner) {
                        Some(queue) => queue,
                        None => break,
                    };
                    match queue.front() {
                        Some(front) if ext.ready_for_event(front) => queue.pop_front(),
                        _ => None,
                    }
                };
                match event {
                    Some(event) => self.deliver(&owner, &event),
                    None => break,
                }
            }
        }
    }

    fn set_shared_state(&self, owner: &str, state: EventData) {
        let version = self.counter.load(Ordering::SeqCst);
        self.shared_states.write().entry(owner.to_owned()).or_default().insert(version, state);
        log::debug!("shared state of {} set at version {}", owner, version);
        self.drain_pending();
    }

    fn shared_state(&self, owner: &str, event: Option<&Event>) -> Option<SharedStateResult> {
        let states = self.shared_states.read();
        let versions = states.get(owner)?;
        let state = match event {
            None => versions.values().next_back(),
            Some(event) => {
                versions.range(..=event.number()).next_back().map(|(_, s)| s).or_else(|| versions.values().next())
            }
        };
        Some(match state {
            Some(state) => SharedStateResult { status: SharedStateStatus::Set, value: Some(state.clone()) },
            None => SharedStateResult::none(),
        })
    }
}

struct HubRegister<'a> {
    hub: &'a HubInner,
    owner: Option<String>,
}

impl Register for HubRegister<'_> {
    fn add(&self, typ: EventType, source: EventSource, listener: Box<dyn Listener>) {
        log::debug!("{:?} listens to {}/{}", self.owner, typ, source);
        self.hub.listeners.write().push(ListenerEntry {
            owner: self.owner.clone(),
            typ,
            source,
            listener: Arc::from(listener),
        });
    }
}

struct HubApi {
    hub: Weak<HubInner>,
    services: Services,
}

impl ExtensionApi for HubApi {
    fn shared_state(&self, owner: &str, event: Option<&Event>) -> Option<SharedStateResult> {
        self.hub.upgrade().and_then(|hub| hub.shared_state(owner, event))
    }

    fn dispatch(&self, event: Event) {
        match self.hub.upgrade() {
            Some(hub) => hub.dispatch(event),
            None => log::warn!("event hub is gone, {} dropped", event),
        }
    }

    #[inline]
    fn services(&self) -> &Services {
        &self.services
    }
}
