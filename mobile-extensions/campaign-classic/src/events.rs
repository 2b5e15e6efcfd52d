//! Reads campaign request events into the requests the managers work on.

use std::collections::HashMap;

use serde_json::{Map, Value};

use mobile_core::data::{opt_bool, opt_map, opt_str, opt_string_map};
use mobile_core::event::Event;
use mobile_core::utils::non_blank;

use crate::constants::event_keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Register,
    TrackReceive,
    TrackClick,
}

/// Classifies a campaign request by its flags, registration taking precedence.
pub fn request_kind(event: &Event) -> Option<RequestKind> {
    let data = event.data();
    if opt_bool(data, event_keys::REGISTER_DEVICE, false) {
        Some(RequestKind::Register)
    } else if opt_bool(data, event_keys::TRACK_RECEIVE, false) {
        Some(RequestKind::TrackReceive)
    } else if opt_bool(data, event_keys::TRACK_CLICK, false) {
        Some(RequestKind::TrackClick)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationRequest {
    /// `None` when absent or blank
    pub device_token: Option<String>,
    pub user_key: String,
    pub additional_parameters: Map<String, Value>,
}

impl RegistrationRequest {
    pub fn from_event(event: &Event) -> Self {
        let data = event.data();
        Self {
            device_token: non_blank(opt_str(data, event_keys::DEVICE_TOKEN)).map(String::from),
            user_key: non_blank(opt_str(data, event_keys::USER_KEY)).unwrap_or_default().to_owned(),
            additional_parameters: opt_map(data, event_keys::ADDITIONAL_PARAMETERS).cloned().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRequest {
    /// `None` when absent or blank
    pub message_id: Option<String>,
    /// `None` when absent or blank
    pub delivery_id: Option<String>,
}

impl TrackRequest {
    pub fn from_event(event: &Event) -> Self {
        let info = opt_string_map(event.data(), event_keys::TRACK_INFO);
        Self::from_track_info(info.as_ref())
    }

    pub fn from_track_info(info: Option<&HashMap<String, String>>) -> Self {
        let get = |key: &str| {
            info.and_then(|info| info.get(key)).and_then(|v| non_blank(Some(v.as_str()))).map(String::from)
        };
        Self {
            message_id: get(event_keys::TRACK_INFO_KEY_MESSAGE_ID),
            delivery_id: get(event_keys::TRACK_INFO_KEY_DELIVERY_ID),
        }
    }
}
