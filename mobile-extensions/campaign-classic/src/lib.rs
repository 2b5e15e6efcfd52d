#![deny(unsafe_code)]

//! Campaign Classic extension.
//!
//! Registers the device with a Campaign Classic marketing server and reports
//! push notification receives and clicks to its tracking server. A
//! registration is only sent when the registration fields differ from the
//! last registration the server accepted.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use campaign_classic::{api, CampaignClassicExtension};
//! use mobile_core::hub::EventHub;
//! use mobile_core::services::{MemoryDataStore, Services};
//!
//! let hub = EventHub::new(Services::default().data_storing(Arc::new(MemoryDataStore::new())));
//! hub.register_extension(|api| Ok(CampaignClassicExtension::new(api))).unwrap();
//! api::register_device(&hub, "token", Some("user@example.com"), None);
//! ```

use std::sync::Arc;

use serde_json::json;

use mobile_core::event::{Event, EventSource, EventType};
use mobile_core::extension::{Extension, ExtensionApi, PackageInfo, Register, SharedStateStatus};
use mobile_core::macros::Extension;
use mobile_core::privacy::MobilePrivacyStatus;
use mobile_core::CONFIGURATION_EXTENSION;

use crate::config::CampaignClassicConfiguration;
use crate::constants::{EXTENSION_NAME, FRIENDLY_NAME, MESSAGE_CLICKED_TAGID, MESSAGE_RECEIVED_TAGID};
use crate::events::{request_kind, RequestKind};
use crate::registration::RegistrationManager;
use crate::tracking::TrackRequestManager;

pub use crate::payload::{CampaignClassicPushPayload, RemoteNotification};

pub mod api;
pub mod config;
pub mod constants;
pub mod events;
pub mod fingerprint;
pub mod payload;
pub mod registration;
pub mod serializer;
pub mod tracking;

#[derive(Extension, Clone)]
pub struct CampaignClassicExtension {
    inner: Arc<ExtensionInner>,
}

struct ExtensionInner {
    api: Arc<dyn ExtensionApi>,
    registration: RegistrationManager,
    tracking: TrackRequestManager,
}

impl CampaignClassicExtension {
    pub fn new(api: Arc<dyn ExtensionApi>) -> Self {
        let registration = RegistrationManager::new(api.clone());
        let tracking = TrackRequestManager::new(api.clone());
        Self::with_managers(api, registration, tracking)
    }

    pub fn with_managers(
        api: Arc<dyn ExtensionApi>,
        registration: RegistrationManager,
        tracking: TrackRequestManager,
    ) -> Self {
        Self { inner: Arc::new(ExtensionInner { api, registration, tracking }) }
    }

    pub fn handle_campaign_request_event(&self, event: &Event) {
        if event.data().map(|d| d.is_empty()).unwrap_or(true) {
            log::debug!(
                "handleCampaignRequestEvent - Failed to process CAMPAIGN_CLASSIC REQUEST_CONTENT event (event data was null or empty)"
            );
            return;
        }
        match request_kind(event) {
            Some(RequestKind::Register) => self.inner.registration.register_device(event),
            Some(RequestKind::TrackReceive) => {
                self.inner.tracking.handle_track_request(event, MESSAGE_RECEIVED_TAGID)
            }
            Some(RequestKind::TrackClick) => self.inner.tracking.handle_track_request(event, MESSAGE_CLICKED_TAGID),
            None => log::trace!("handleCampaignRequestEvent - Ignoring {}", event),
        }
    }

    pub fn handle_configuration_response_event(&self, event: &Event) {
        let config = CampaignClassicConfiguration::for_event(self.inner.api.as_ref(), event);
        if config.privacy_status() == MobilePrivacyStatus::OptOut {
            log::debug!(
                "handleConfigurationResponseEvent - Privacy status is opt out, clearing persisted registration info."
            );
            self.inner.registration.clear_registration_data();
        }
    }
}

impl Extension for CampaignClassicExtension {
    #[inline]
    fn name(&self) -> &str {
        EXTENSION_NAME
    }

    #[inline]
    fn friendly_name(&self) -> &str {
        FRIENDLY_NAME
    }

    fn on_registered(&self, register: &dyn Register) {
        let ext = self.clone();
        register.add(
            EventType::Campaign,
            EventSource::RequestContent,
            Box::new(move |event: &Event| ext.handle_campaign_request_event(event)),
        );
        let ext = self.clone();
        register.add(
            EventType::Configuration,
            EventSource::ResponseContent,
            Box::new(move |event: &Event| ext.handle_configuration_response_event(event)),
        );
    }

    fn ready_for_event(&self, event: &Event) -> bool {
        self.inner
            .api
            .shared_state(CONFIGURATION_EXTENSION, Some(event))
            .map(|s| s.status == SharedStateStatus::Set)
            .unwrap_or_default()
    }

    fn attrs(&self) -> serde_json::Value {
        json!({
            "name": self.name(),
            "friendly_name": self.friendly_name(),
            "package": self.package(),
            "version": self.version(),
        })
    }
}
