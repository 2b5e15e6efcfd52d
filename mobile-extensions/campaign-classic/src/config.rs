use std::time::Duration;

use mobile_core::data::{opt_int, opt_str};
use mobile_core::event::{Event, EventData};
use mobile_core::extension::ExtensionApi;
use mobile_core::privacy::MobilePrivacyStatus;
use mobile_core::utils::non_blank;
use mobile_core::CONFIGURATION_EXTENSION;

use crate::constants::{config_keys, DEFAULT_TIMEOUT};

/// Campaign Classic view over a configuration snapshot.
///
/// Blank strings read as absent, a missing or non numeric timeout reads as the
/// default, a missing privacy status reads as unknown.
#[derive(Debug, Clone, Default)]
pub struct CampaignClassicConfiguration {
    snapshot: Option<EventData>,
}

impl CampaignClassicConfiguration {
    #[inline]
    pub fn new(snapshot: Option<EventData>) -> Self {
        Self { snapshot }
    }

    /// The configuration in effect for `event`.
    #[inline]
    pub fn for_event(api: &dyn ExtensionApi, event: &Event) -> Self {
        Self::new(api.shared_state(CONFIGURATION_EXTENSION, Some(event)).and_then(|s| s.value))
    }

    #[inline]
    pub fn marketing_server(&self) -> Option<&str> {
        self.get_non_blank(config_keys::MARKETING_SERVER)
    }

    #[inline]
    pub fn integration_key(&self) -> Option<&str> {
        self.get_non_blank(config_keys::INTEGRATION_KEY)
    }

    #[inline]
    pub fn tracking_server(&self) -> Option<&str> {
        self.get_non_blank(config_keys::TRACKING_SERVER)
    }

    /// Request timeout in seconds
    #[inline]
    pub fn timeout(&self) -> i64 {
        opt_int(self.snapshot.as_ref(), config_keys::TIMEOUT, DEFAULT_TIMEOUT)
    }

    #[inline]
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout().max(0) as u64)
    }

    #[inline]
    pub fn privacy_status(&self) -> MobilePrivacyStatus {
        opt_str(self.snapshot.as_ref(), config_keys::GLOBAL_PRIVACY)
            .map(MobilePrivacyStatus::from_value)
            .unwrap_or_default()
    }

    #[inline]
    fn get_non_blank(&self, key: &str) -> Option<&str> {
        non_blank(opt_str(self.snapshot.as_ref(), key))
    }
}
