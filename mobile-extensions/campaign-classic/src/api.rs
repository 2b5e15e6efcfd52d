//! Application facing calls. Each one validates its input and dispatches a
//! campaign request event for the extension to handle.

use std::collections::HashMap;

use serde_json::{Map, Value};

use mobile_core::event::{Event, EventSource, EventType};
use mobile_core::extension::ExtensionApi;
use mobile_core::hub::EventHub;

use crate::constants::event_keys;

pub const REGISTER_DEVICE_EVENT: &str = "CampaignClassic Register Device";
pub const TRACK_RECEIVE_EVENT: &str = "CampaignClassic Track Notification Receive";
pub const TRACK_CLICK_EVENT: &str = "CampaignClassic Track Notification Click";

/// Where the public calls send their events.
pub trait Dispatcher {
    fn dispatch_event(&self, event: Event);
}

impl Dispatcher for EventHub {
    #[inline]
    fn dispatch_event(&self, event: Event) {
        self.dispatch(event)
    }
}

impl Dispatcher for dyn ExtensionApi {
    #[inline]
    fn dispatch_event(&self, event: Event) {
        self.dispatch(event)
    }
}

#[inline]
pub fn extension_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn register_device<D: Dispatcher + ?Sized>(
    core: &D,
    token: &str,
    user_key: Option<&str>,
    additional_params: Option<Map<String, Value>>,
) {
    match register_device_event(token, user_key, additional_params) {
        Some(event) => core.dispatch_event(event),
        None => log::error!("Failed to register device for CampaignClassic (The provided token is null or empty)"),
    }
}

pub fn track_notification_receive<D: Dispatcher + ?Sized>(core: &D, track_info: &HashMap<String, String>) {
    match track_event(TRACK_RECEIVE_EVENT, event_keys::TRACK_RECEIVE, track_info) {
        Some(event) => core.dispatch_event(event),
        None => log::error!(
            "Failed to track notification receive for CampaignClassic (The provided trackInfo map is null or empty)"
        ),
    }
}

pub fn track_notification_click<D: Dispatcher + ?Sized>(core: &D, track_info: &HashMap<String, String>) {
    match track_event(TRACK_CLICK_EVENT, event_keys::TRACK_CLICK, track_info) {
        Some(event) => core.dispatch_event(event),
        None => log::error!(
            "Failed to track notification click for CampaignClassic (The provided trackInfo map is null or empty)"
        ),
    }
}

/// `None` when the token is empty.
pub fn register_device_event(
    token: &str,
    user_key: Option<&str>,
    additional_params: Option<Map<String, Value>>,
) -> Option<Event> {
    if mobile_core::utils::is_blank(token) {
        return None;
    }
    let mut data = Map::new();
    data.insert(event_keys::REGISTER_DEVICE.into(), Value::Bool(true));
    data.insert(event_keys::DEVICE_TOKEN.into(), Value::String(token.to_owned()));
    data.insert(event_keys::USER_KEY.into(), user_key.map(|k| Value::String(k.to_owned())).unwrap_or(Value::Null));
    data.insert(
        event_keys::ADDITIONAL_PARAMETERS.into(),
        additional_params.map(Value::Object).unwrap_or(Value::Null),
    );
    Some(Event::builder(REGISTER_DEVICE_EVENT, EventType::Campaign, EventSource::RequestContent).data(data).build())
}

fn track_event(name: &str, flag: &str, track_info: &HashMap<String, String>) -> Option<Event> {
    if track_info.is_empty() {
        return None;
    }
    let info = track_info.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect::<Map<_, _>>();
    let mut data = Map::new();
    data.insert(flag.to_owned(), Value::Bool(true));
    data.insert(event_keys::TRACK_INFO.into(), Value::Object(info));
    Some(Event::builder(name, EventType::Campaign, EventSource::RequestContent).data(data).build())
}

/// `None` when `track_info` is empty.
#[inline]
pub fn track_receive_event(track_info: &HashMap<String, String>) -> Option<Event> {
    track_event(TRACK_RECEIVE_EVENT, event_keys::TRACK_RECEIVE, track_info)
}

/// `None` when `track_info` is empty.
#[inline]
pub fn track_click_event(track_info: &HashMap<String, String>) -> Option<Event> {
    track_event(TRACK_CLICK_EVENT, event_keys::TRACK_CLICK, track_info)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::events::{request_kind, RegistrationRequest, RequestKind, TrackRequest};

    #[derive(Default)]
    struct Collect(RefCell<Vec<Event>>);

    impl Dispatcher for Collect {
        fn dispatch_event(&self, event: Event) {
            self.0.borrow_mut().push(event);
        }
    }

    #[test]
    fn test_version() {
        assert_eq!(extension_version(), "2.1.3");
    }

    #[test]
    fn test_register_device() {
        let core = Collect::default();
        register_device(&core, "", Some("user"), None);
        assert!(core.0.borrow().is_empty());

        let mut params = Map::new();
        params.insert("k".into(), Value::from(1));
        register_device(&core, "token", Some("user"), Some(params));
        let events = core.0.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name(), REGISTER_DEVICE_EVENT);
        assert_eq!(request_kind(&events[0]), Some(RequestKind::Register));

        let req = RegistrationRequest::from_event(&events[0]);
        assert_eq!(req.device_token.as_deref(), Some("token"));
        assert_eq!(req.user_key, "user");
        assert_eq!(req.additional_parameters.get("k"), Some(&Value::from(1)));
    }

    #[test]
    fn test_track_notification() {
        let core = Collect::default();
        track_notification_receive(&core, &HashMap::new());
        track_notification_click(&core, &HashMap::new());
        assert!(core.0.borrow().is_empty());

        let mut info = HashMap::new();
        info.insert("_mId".to_string(), "12345".to_string());
        info.insert("_dId".to_string(), "d".to_string());
        track_notification_receive(&core, &info);
        track_notification_click(&core, &info);

        let events = core.0.borrow();
        assert_eq!(events[0].name(), TRACK_RECEIVE_EVENT);
        assert_eq!(request_kind(&events[0]), Some(RequestKind::TrackReceive));
        assert_eq!(events[1].name(), TRACK_CLICK_EVENT);
        assert_eq!(request_kind(&events[1]), Some(RequestKind::TrackClick));
        assert_eq!(
            TrackRequest::from_event(&events[1]),
            TrackRequest { message_id: Some("12345".into()), delivery_id: Some("d".into()) }
        );
    }
}
