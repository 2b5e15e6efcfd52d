use std::sync::Arc;

use serde_json::Value;

use crate::event::{Event, EventData, EventSource, EventType};
use crate::services::Services;

/// Package metadata, usually generated by `#[derive(Extension)]`.
pub trait PackageInfo {
    fn package(&self) -> &str;

    fn version(&self) -> &str;

    fn descr(&self) -> Option<&str>;

    fn authors(&self) -> Option<Vec<&str>>;

    fn license(&self) -> Option<&str>;
}

pub trait Extension: PackageInfo + Send + Sync {
    /// Unique name, also the owner of the extension's shared state
    fn name(&self) -> &str;

    #[inline]
    fn friendly_name(&self) -> &str {
        self.name()
    }

    /// Called once by the host, the extension registers its listeners here.
    fn on_registered(&self, register: &dyn Register);

    #[inline]
    fn on_unregistered(&self) {}

    /// Events are held by the host until this returns true.
    #[inline]
    fn ready_for_event(&self, _event: &Event) -> bool {
        true
    }

    #[inline]
    fn attrs(&self) -> Value {
        Value::Null
    }
}

pub trait Listener: Send + Sync {
    fn hear(&self, event: &Event);
}

impl<F> Listener for F
where
    F: Fn(&Event) + Send + Sync,
{
    #[inline]
    fn hear(&self, event: &Event) {
        self(event)
    }
}

pub trait Register {
    fn add(&self, typ: EventType, source: EventSource, listener: Box<dyn Listener>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedStateStatus {
    Set,
    None,
}

#[derive(Debug, Clone)]
pub struct SharedStateResult {
    pub status: SharedStateStatus,
    pub value: Option<EventData>,
}

impl SharedStateResult {
    #[inline]
    pub fn none() -> Self {
        Self { status: SharedStateStatus::None, value: None }
    }
}

/// What the host offers to a registered extension.
pub trait ExtensionApi: Send + Sync {
    /// Shared state of `owner` as of `event`, the latest one when `event` is `None`.
    fn shared_state(&self, owner: &str, event: Option<&Event>) -> Option<SharedStateResult>;

    fn dispatch(&self, event: Event);

    fn services(&self) -> &Services;
}

pub type DynExtension = Arc<dyn Extension>;
