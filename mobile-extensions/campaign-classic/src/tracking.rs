use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use mobile_core::event::Event;
use mobile_core::extension::ExtensionApi;
use mobile_core::privacy::MobilePrivacyStatus;
use mobile_core::services::{HttpConnection, HttpMethod, NetworkRequest, Networking};

use crate::config::CampaignClassicConfiguration;
use crate::constants::HTTP_OK;
use crate::events::TrackRequest;

static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)[0-9a-f]{8}-([0-9a-f]{4}-){3}[0-9a-f]{12}$").expect("message id pattern is a valid regex")
});

/// V8 message ids are UUIDs and are sent as is. V7 message ids are decimal
/// 32-bit integers and are sent as lowercase hex, two's complement for
/// negative values. `None` if the id is neither.
pub fn normalize_message_id(message_id: &str) -> Option<String> {
    if UUID_PATTERN.is_match(message_id) {
        return Some(message_id.to_owned());
    }
    message_id.parse::<i32>().ok().map(|id| format!("{:x}", id))
}

#[inline]
pub fn tracking_url(tracking_server: &str, message_id: &str, delivery_id: &str, tag_id: &str) -> String {
    format!("https://{}/r/?id=h{},{},{}", tracking_server, message_id, delivery_id, tag_id)
}

/// Reports push notification receives and clicks to the tracking server.
pub struct TrackRequestManager {
    api: Arc<dyn ExtensionApi>,
    networking: Option<Arc<dyn Networking>>,
}

impl TrackRequestManager {
    pub fn new(api: Arc<dyn ExtensionApi>) -> Self {
        let networking = api.services().get_networking().cloned();
        Self::with_networking(api, networking)
    }

    #[inline]
    pub fn with_networking(api: Arc<dyn ExtensionApi>, networking: Option<Arc<dyn Networking>>) -> Self {
        Self { api, networking }
    }

    pub fn handle_track_request(&self, event: &Event, tag_id: &str) {
        let request = TrackRequest::from_event(event);
        let config = CampaignClassicConfiguration::for_event(self.api.as_ref(), event);
        self.track(&request, &config, tag_id)
    }

    pub fn track(&self, request: &TrackRequest, config: &CampaignClassicConfiguration, tag_id: &str) {
        if config.privacy_status() != MobilePrivacyStatus::OptIn {
            log::debug!("handleTrackRequest - Failed to process TrackNotification request, MobilePrivacyStatus is not optedIn.");
            return;
        }

        let tracking_server = match config.tracking_server() {
            Some(server) => server,
            None => {
                log::debug!("handleTrackRequest - Failed to process TrackNotification request, Configuration not available.");
                return;
            }
        };

        let delivery_id = match request.delivery_id.as_deref() {
            Some(id) => id,
            None => {
                log::debug!("handleTrackRequest - Failed to process TrackNotification request, trackingInfo deliveryId is missing or empty.");
                return;
            }
        };

        let message_id = match request.message_id.as_deref() {
            Some(id) => id,
            None => {
                log::debug!("handleTrackRequest - Failed to process TrackNotification request, trackingInfo messageId is missing or empty.");
                return;
            }
        };

        let message_id = match normalize_message_id(message_id) {
            Some(id) => id,
            None => {
                log::debug!(
                    "handleTrackRequest - Failed to process TrackNotification request, messageId {} could not be parsed as a UUID or a decimal (integer).",
                    message_id
                );
                return;
            }
        };

        let url = tracking_url(tracking_server, &message_id, delivery_id, tag_id);
        self.send_tracking_request(url, config);
    }

    fn send_tracking_request(&self, url: String, config: &CampaignClassicConfiguration) {
        let networking = match self.networking.as_ref() {
            Some(networking) => networking,
            None => {
                log::debug!("sendTrackingRequest - Cannot send request, Network service is not available");
                return;
            }
        };

        log::trace!("sendTrackingRequest - TrackingNotification network call initiated with URL : {}.", url);
        let request = NetworkRequest::new(url, HttpMethod::Get, config.timeout_duration());
        networking.connect_async(
            request,
            Box::new(|conn: Option<HttpConnection>| {
                if let Some(conn) = conn {
                    let conn = scopeguard::guard(conn, HttpConnection::close);
                    if conn.response_code() == HTTP_OK {
                        log::trace!("sendTrackingRequest - Connection successful {:?}.", conn.response_message());
                    } else {
                        log::warn!("sendTrackingRequest - Connection failed {:?}.", conn.response_message());
                    }
                }
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mobile_core::extension::SharedStateResult;
    use mobile_core::services::{ConnectCallback, Services};
    use serde_json::{json, Value};

    use super::*;
    use crate::constants::{MESSAGE_CLICKED_TAGID, MESSAGE_RECEIVED_TAGID};

    #[test]
    fn test_uuid_pattern() {
        assert!(UUID_PATTERN.is_match("6b6499a8-9d43-4bc5-acf0-b6aeb96846f6"));
        assert!(!UUID_PATTERN.is_match("6b6499a8-9d43-4bc5-acf0-b6aeb96846f6 "));
        assert!(!UUID_PATTERN.is_match("6b6499a89d434bc5acf0b6aeb96846f6"));
    }

    #[test]
    fn test_normalize_message_id() {
        assert_eq!(normalize_message_id("12345").as_deref(), Some("3039"));
        assert_eq!(
            normalize_message_id("6b6499a8-9d43-4bc5-acf0-b6aeb96846f6").as_deref(),
            Some("6b6499a8-9d43-4bc5-acf0-b6aeb96846f6")
        );
        assert_eq!(
            normalize_message_id("6B6499A8-9D43-4BC5-ACF0-B6AEB96846F6").as_deref(),
            Some("6B6499A8-9D43-4BC5-ACF0-B6AEB96846F6")
        );
        assert_eq!(normalize_message_id("00112233-4455-6677-8899-aabbccddee"), None);
        assert_eq!(normalize_message_id("-1").as_deref(), Some("ffffffff"));
        assert_eq!(normalize_message_id("0").as_deref(), Some("0"));
        assert_eq!(normalize_message_id("2147483648"), None);
        assert_eq!(normalize_message_id("12a"), None);
    }

    #[derive(Default)]
    struct NoopApi {
        services: Services,
    }

    impl ExtensionApi for NoopApi {
        fn shared_state(&self, _owner: &str, _event: Option<&Event>) -> Option<SharedStateResult> {
            None
        }
        fn dispatch(&self, _event: Event) {}
        fn services(&self) -> &Services {
            &self.services
        }
    }

    #[derive(Default)]
    struct RecordingNetworking {
        requests: Mutex<Vec<NetworkRequest>>,
    }

    impl Networking for RecordingNetworking {
        fn connect_async(&self, request: NetworkRequest, callback: ConnectCallback) {
            self.requests.lock().unwrap().push(request);
            callback(Some(HttpConnection::new(200, Some("OK".into()))));
        }
    }

    fn config(v: Value) -> CampaignClassicConfiguration {
        match v {
            Value::Object(m) => CampaignClassicConfiguration::new(Some(m)),
            _ => unreachable!(),
        }
    }

    fn opted_in() -> CampaignClassicConfiguration {
        config(json!({
            "campaignclassic.trackingServer": "testTrackingServer",
            "global.privacy": "optedin"
        }))
    }

    fn track_request(message_id: &str, delivery_id: &str) -> TrackRequest {
        TrackRequest { message_id: Some(message_id.into()), delivery_id: Some(delivery_id.into()) }
    }

    fn manager() -> (TrackRequestManager, Arc<RecordingNetworking>) {
        let net = Arc::new(RecordingNetworking::default());
        let manager = TrackRequestManager::with_networking(Arc::new(NoopApi::default()), Some(net.clone()));
        (manager, net)
    }

    #[test]
    fn test_track_receive_and_click() {
        let (manager, net) = manager();
        manager.track(&track_request("12345", "testDeliveryId"), &opted_in(), MESSAGE_RECEIVED_TAGID);
        manager.track(&track_request("12345", "testDeliveryId"), &opted_in(), MESSAGE_CLICKED_TAGID);

        let requests = net.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "https://testTrackingServer/r/?id=h3039,testDeliveryId,1");
        assert_eq!(requests[1].url, "https://testTrackingServer/r/?id=h3039,testDeliveryId,2");
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert!(requests[0].body.is_none());
        assert!(requests[0].headers.is_empty());
        assert_eq!(requests[0].connect_timeout, std::time::Duration::from_secs(30));
    }

    #[test]
    fn test_v8_message_id() {
        let (manager, net) = manager();
        manager.track(
            &track_request("6b6499a8-9d43-4bc5-acf0-b6aeb96846f6", "testDeliveryId"),
            &opted_in(),
            MESSAGE_RECEIVED_TAGID,
        );
        assert_eq!(
            net.requests.lock().unwrap()[0].url,
            "https://testTrackingServer/r/?id=h6b6499a8-9d43-4bc5-acf0-b6aeb96846f6,testDeliveryId,1"
        );
    }

    #[test]
    fn test_preconditions() {
        let (manager, net) = manager();
        let req = track_request("12345", "testDeliveryId");
        manager.track(&req, &CampaignClassicConfiguration::new(None), MESSAGE_RECEIVED_TAGID);
        manager.track(
            &req,
            &config(json!({"campaignclassic.trackingServer": "s", "global.privacy": "optedout"})),
            MESSAGE_RECEIVED_TAGID,
        );
        manager.track(
            &req,
            &config(json!({"campaignclassic.trackingServer": "s", "global.privacy": "optunknown"})),
            MESSAGE_RECEIVED_TAGID,
        );
        manager.track(&req, &config(json!({"global.privacy": "optedin"})), MESSAGE_RECEIVED_TAGID);
        manager.track(&TrackRequest { delivery_id: None, ..req.clone() }, &opted_in(), MESSAGE_RECEIVED_TAGID);
        manager.track(&TrackRequest { message_id: None, ..req.clone() }, &opted_in(), MESSAGE_RECEIVED_TAGID);
        manager.track(
            &track_request("00112233-4455-6677-8899-aabbccddee", "testDeliveryId"),
            &opted_in(),
            MESSAGE_RECEIVED_TAGID,
        );
        assert!(net.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_networking() {
        let manager = TrackRequestManager::with_networking(Arc::new(NoopApi::default()), None);
        manager.track(&track_request("12345", "d"), &opted_in(), MESSAGE_RECEIVED_TAGID);
    }
}
