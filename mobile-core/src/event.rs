use std::fmt;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::utils::{format_timestamp_millis, timestamp_millis, TimestampMillis};

pub type EventData = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    Campaign,
    Configuration,
    Hub,
    Custom(String),
}

impl EventType {
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Campaign => "com.adobe.eventType.campaign",
            EventType::Configuration => "com.adobe.eventType.configuration",
            EventType::Hub => "com.adobe.eventType.hub",
            EventType::Custom(t) => t.as_str(),
        }
    }
}

impl From<&str> for EventType {
    fn from(t: &str) -> Self {
        match t {
            "com.adobe.eventType.campaign" => EventType::Campaign,
            "com.adobe.eventType.configuration" => EventType::Configuration,
            "com.adobe.eventType.hub" => EventType::Hub,
            _ => EventType::Custom(t.to_owned()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventSource {
    RequestContent,
    ResponseContent,
    SharedState,
    Custom(String),
}

impl EventSource {
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            EventSource::RequestContent => "com.adobe.eventSource.requestContent",
            EventSource::ResponseContent => "com.adobe.eventSource.responseContent",
            EventSource::SharedState => "com.adobe.eventSource.sharedState",
            EventSource::Custom(s) => s.as_str(),
        }
    }
}

impl From<&str> for EventSource {
    fn from(s: &str) -> Self {
        match s {
            "com.adobe.eventSource.requestContent" => EventSource::RequestContent,
            "com.adobe.eventSource.responseContent" => EventSource::ResponseContent,
            "com.adobe.eventSource.sharedState" => EventSource::SharedState,
            _ => EventSource::Custom(s.to_owned()),
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable message travelling through the hub.
///
/// `number` is assigned by the hub when the event is dispatched and orders the
/// event against shared state versions.
#[derive(Debug, Clone)]
pub struct Event {
    id: Uuid,
    name: String,
    typ: EventType,
    source: EventSource,
    data: Option<EventData>,
    timestamp: TimestampMillis,
    number: u64,
}

impl Event {
    #[inline]
    pub fn builder<N: Into<String>>(name: N, typ: EventType, source: EventSource) -> EventBuilder {
        EventBuilder { name: name.into(), typ, source, data: None }
    }

    #[inline]
    pub fn id(&self) -> &Uuid {
        &self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn typ(&self) -> &EventType {
        &self.typ
    }

    #[inline]
    pub fn source(&self) -> &EventSource {
        &self.source
    }

    #[inline]
    pub fn data(&self) -> Option<&EventData> {
        self.data.as_ref()
    }

    #[inline]
    pub fn timestamp(&self) -> TimestampMillis {
        self.timestamp
    }

    /// Dispatch order within the hub, 0 until dispatched.
    #[inline]
    pub fn number(&self) -> u64 {
        self.number
    }

    #[inline]
    pub(crate) fn set_number(&mut self, number: u64) {
        self.number = number;
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}, {}, #{}, {})",
            self.name,
            self.typ,
            self.source,
            self.number,
            format_timestamp_millis(self.timestamp)
        )
    }
}

pub struct EventBuilder {
    name: String,
    typ: EventType,
    source: EventSource,
    data: Option<EventData>,
}

impl EventBuilder {
    #[inline]
    pub fn data(mut self, data: EventData) -> Self {
        self.data = Some(data);
        self
    }

    #[inline]
    pub fn build(self) -> Event {
        Event {
            id: Uuid::new_v4(),
            name: self.name,
            typ: self.typ,
            source: self.source,
            data: self.data,
            timestamp: timestamp_millis(),
            number: 0,
        }
    }
}
