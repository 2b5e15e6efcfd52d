use std::sync::Arc;

use serde_json::{Map, Value};

use mobile_core::event::{Event, EventSource, EventType};
use mobile_core::extension::ExtensionApi;
use mobile_core::privacy::MobilePrivacyStatus;
use mobile_core::services::{
    DeviceInforming, HttpConnection, HttpMethod, NamedCollection, NetworkRequest, Networking,
};

use crate::config::CampaignClassicConfiguration;
use crate::constants::{
    event_keys, DATASTORE_KEY_TOKEN_HASH, DATASTORE_NAME, HTTP_HEADER_CONTENT_TYPE_FORM_UTF8,
    HTTP_HEADER_KEY_CONTENT_LENGTH, HTTP_HEADER_KEY_CONTENT_TYPE, HTTP_OK, REGISTER_API_PATH,
    REGISTER_PARAM_DEVICE_OS_NAME,
};
use crate::events::RegistrationRequest;
use crate::fingerprint::{compute_fingerprint, device_uuid, has_changed};
use crate::serializer::serialize_map;

pub const REGISTRATION_STATUS_EVENT: &str = "CampaignClassic Registration Status";

/// Registers the device with the marketing server, once per distinct set of
/// registration fields.
pub struct RegistrationManager {
    api: Arc<dyn ExtensionApi>,
    device_info: Option<Arc<dyn DeviceInforming>>,
    data_store: Option<Arc<dyn NamedCollection>>,
    networking: Option<Arc<dyn Networking>>,
}

impl RegistrationManager {
    pub fn new(api: Arc<dyn ExtensionApi>) -> Self {
        let services = api.services().clone();
        let data_store = services.get_data_storing().and_then(|s| s.named_collection(DATASTORE_NAME));
        Self::with_services(
            api,
            services.get_device_info().cloned(),
            data_store,
            services.get_networking().cloned(),
        )
    }

    pub fn with_services(
        api: Arc<dyn ExtensionApi>,
        device_info: Option<Arc<dyn DeviceInforming>>,
        data_store: Option<Arc<dyn NamedCollection>>,
        networking: Option<Arc<dyn Networking>>,
    ) -> Self {
        Self { api, device_info, data_store, networking }
    }

    pub fn register_device(&self, event: &Event) {
        let request = RegistrationRequest::from_event(event);
        let config = CampaignClassicConfiguration::for_event(self.api.as_ref(), event);
        self.register(&request, &config)
    }

    pub fn register(&self, request: &RegistrationRequest, config: &CampaignClassicConfiguration) {
        let token = match request.device_token.as_deref() {
            Some(token) => token,
            None => {
                log::debug!("registerDevice - Failed to process device registration request, device token is not available.");
                return;
            }
        };

        if config.privacy_status() != MobilePrivacyStatus::OptIn {
            log::debug!("registerDevice - Failed to process device registration request, MobilePrivacyStatus is not optedIn.");
            return;
        }

        let marketing_server = match config.marketing_server() {
            Some(server) => server,
            None => {
                log::debug!("registerDevice - Failed to process device registration request, Marketing server is not configured.");
                return;
            }
        };

        let integration_key = match config.integration_key() {
            Some(key) => key,
            None => {
                log::debug!("registerDevice - Failed to process device registration request, Integration key is not configured.");
                return;
            }
        };

        let additional_params = serialize_map(&request.additional_parameters);
        let device_id = self.device_info.as_ref().and_then(|d| d.device_unique_id());
        let fingerprint =
            compute_fingerprint(token, &request.user_key, &additional_params, &device_uuid(device_id.as_deref()));

        if !self.has_registration_info_changed(&fingerprint) {
            log::debug!("registerDevice - Not sending device registration request, there is no change in registration info.");
            return;
        }

        let payload = self.build_payload(token, integration_key, &request.user_key, &additional_params);
        let url = registration_url(marketing_server);
        self.send_registration_request(url, payload, config, fingerprint);
    }

    /// Forgets the last accepted registration, the next one is always sent.
    pub fn clear_registration_data(&self) {
        update_registration_info(self.data_store.as_deref(), None);
    }

    fn has_registration_info_changed(&self, fingerprint: &str) -> bool {
        let store = match self.data_store.as_ref() {
            Some(store) => store,
            None => {
                log::debug!("hasRegistrationInfoChanged - Cannot get registration info, Data store is not available.");
                return true;
            }
        };
        let stored = store.get_string(DATASTORE_KEY_TOKEN_HASH);
        let changed = has_changed(Some(fingerprint), stored.as_deref());
        if !changed {
            log::trace!("hasRegistrationInfoChanged - Registration information has not changed in Data store.");
        }
        changed
    }

    fn build_payload(&self, token: &str, integration_key: &str, user_key: &str, additional_params: &str) -> String {
        let device = self.device_info.as_deref();
        let device_id = device.and_then(|d| d.device_unique_id()).unwrap_or_default();
        let device_name = device.and_then(|d| d.device_name()).unwrap_or_default();
        let device_model = device.and_then(|d| d.device_model()).unwrap_or_default();
        let device_brand = device.and_then(|d| d.device_brand()).unwrap_or_default();
        let device_manufacturer = device.and_then(|d| d.device_manufacturer()).unwrap_or_default();
        let os_version = format!(
            "{} {}",
            device.and_then(|d| d.operating_system_name()).unwrap_or_default(),
            device.and_then(|d| d.operating_system_version()).unwrap_or_default()
        );
        let locale = device.and_then(|d| d.active_locale()).unwrap_or_default().replace('_', "-");

        let fields = [
            ("registrationToken", token),
            ("mobileAppUuid", integration_key),
            ("userKey", user_key),
            ("deviceImei", device_id.as_str()),
            ("deviceName", device_name.as_str()),
            ("deviceModel", device_model.as_str()),
            ("deviceBrand", device_brand.as_str()),
            ("deviceManufacturer", device_manufacturer.as_str()),
            ("osName", REGISTER_PARAM_DEVICE_OS_NAME),
            ("osVersion", os_version.as_str()),
            ("osLanguage", locale.as_str()),
            ("additionalParams", additional_params),
        ];
        fields.iter().map(|(k, v)| format!("{}={}", k, urlencoding::encode(v))).collect::<Vec<_>>().join("&")
    }

    fn send_registration_request(
        &self,
        url: String,
        payload: String,
        config: &CampaignClassicConfiguration,
        fingerprint: String,
    ) {
        let networking = match self.networking.as_ref() {
            Some(networking) => networking,
            None => {
                log::debug!("sendRegistrationRequest - Cannot send request, Network service is not available.");
                return;
            }
        };

        let request = NetworkRequest::new(url, HttpMethod::Post, config.timeout_duration())
            .header(HTTP_HEADER_KEY_CONTENT_TYPE, HTTP_HEADER_CONTENT_TYPE_FORM_UTF8)
            .header(HTTP_HEADER_KEY_CONTENT_LENGTH, payload.len().to_string())
            .body(payload.into_bytes());

        log::trace!("sendRegistrationRequest - Registration request was sent with url {}", request.url);

        let api = self.api.clone();
        let data_store = self.data_store.clone();
        networking.connect_async(
            request,
            Box::new(move |conn: Option<HttpConnection>| {
                let registered = match conn {
                    Some(conn) => {
                        let conn = scopeguard::guard(conn, HttpConnection::close);
                        if conn.response_code() == HTTP_OK {
                            log::debug!("sendRegistrationRequest - Registration successful.");
                            update_registration_info(data_store.as_deref(), Some(&fingerprint));
                            true
                        } else {
                            log::debug!(
                                "sendRegistrationRequest - Unsuccessful Registration request with connection status {}",
                                conn.response_code()
                            );
                            false
                        }
                    }
                    None => {
                        log::debug!("sendRegistrationRequest - Registration request failed, no connection.");
                        false
                    }
                };
                api.dispatch(registration_status_event(registered));
            }),
        );
    }
}

#[inline]
pub fn registration_url(marketing_server: &str) -> String {
    format!("https://{}{}", marketing_server, REGISTER_API_PATH)
}

pub fn registration_status_event(registered: bool) -> Event {
    let mut data = Map::new();
    data.insert(event_keys::REGISTRATION_STATUS.into(), Value::Bool(registered));
    Event::builder(REGISTRATION_STATUS_EVENT, EventType::Campaign, EventSource::ResponseContent).data(data).build()
}

fn update_registration_info(store: Option<&dyn NamedCollection>, fingerprint: Option<&str>) {
    let store = match store {
        Some(store) => store,
        None => {
            log::debug!("updateDataStoreWithRegistrationInfo - Cannot set registration info, data store is not available.");
            return;
        }
    };
    match fingerprint.filter(|f| !f.trim().is_empty()) {
        Some(fingerprint) => store.set_string(DATASTORE_KEY_TOKEN_HASH, fingerprint),
        None => store.remove(DATASTORE_KEY_TOKEN_HASH),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mobile_core::extension::SharedStateResult;
    use mobile_core::services::{MemoryDataStore, DataStoring, Services, StaticDeviceInfo};
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct RecordingApi {
        services: Services,
        dispatched: Mutex<Vec<Event>>,
    }

    impl ExtensionApi for RecordingApi {
        fn shared_state(&self, _owner: &str, _event: Option<&Event>) -> Option<SharedStateResult> {
            None
        }
        fn dispatch(&self, event: Event) {
            self.dispatched.lock().unwrap().push(event);
        }
        fn services(&self) -> &Services {
            &self.services
        }
    }

    /// Answers every request synchronously with a fixed status code.
    struct FixedNetworking {
        code: Option<u16>,
        requests: Mutex<Vec<NetworkRequest>>,
    }

    impl FixedNetworking {
        fn new(code: Option<u16>) -> Arc<Self> {
            Arc::new(Self { code, requests: Mutex::new(Vec::new()) })
        }

        fn requests(&self) -> Vec<NetworkRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Networking for FixedNetworking {
        fn connect_async(&self, request: NetworkRequest, callback: mobile_core::services::ConnectCallback) {
            self.requests.lock().unwrap().push(request);
            callback(self.code.map(|code| HttpConnection::new(code, None)));
        }
    }

    fn config(privacy: &str) -> CampaignClassicConfiguration {
        match json!({
            "campaignclassic.marketingServer": "testMarketingServer",
            "campaignclassic.android.integrationKey": "testIntegrationKey",
            "campaignclassic.timeout": 5,
            "global.privacy": privacy
        }) {
            Value::Object(m) => CampaignClassicConfiguration::new(Some(m)),
            _ => unreachable!(),
        }
    }

    fn device() -> Arc<dyn DeviceInforming> {
        Arc::new(StaticDeviceInfo::new(mobile_core::conf::Device {
            unique_id: Some("testDeviceId".into()),
            name: Some("testDevice".into()),
            model: Some("Pixel 7".into()),
            brand: Some("google".into()),
            manufacturer: Some("Google".into()),
            os_name: Some("Android".into()),
            os_version: Some("14".into()),
            locale: Some("en_US".into()),
        }))
    }

    fn request(token: &str, user_key: &str) -> RegistrationRequest {
        RegistrationRequest {
            device_token: Some(token.into()),
            user_key: user_key.into(),
            additional_parameters: Map::new(),
        }
    }

    fn manager(
        networking: Arc<FixedNetworking>,
        store: Option<Arc<dyn NamedCollection>>,
    ) -> (RegistrationManager, Arc<RecordingApi>) {
        let api = Arc::new(RecordingApi::default());
        let manager = RegistrationManager::with_services(api.clone(), Some(device()), store, Some(networking));
        (manager, api)
    }

    fn store() -> Arc<dyn NamedCollection> {
        MemoryDataStore::new().named_collection(DATASTORE_NAME).unwrap()
    }

    #[test]
    fn test_request_format() {
        let net = FixedNetworking::new(Some(200));
        let (manager, _) = manager(net.clone(), Some(store()));
        manager.register(&request("testToken", "test user"), &config("optedin"));

        let requests = net.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.url, "https://testMarketingServer/nms/mobile/1/registerAndroid.jssp");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.connect_timeout, std::time::Duration::from_secs(5));
        assert_eq!(req.read_timeout, std::time::Duration::from_secs(5));
        assert_eq!(req.get_header("Content-Type"), Some("application/x-www-form-urlencoded;charset=UTF-8"));

        let body = String::from_utf8(req.body.clone().unwrap()).unwrap();
        assert_eq!(req.get_header("Content-Length"), Some(body.len().to_string().as_str()));
        assert_eq!(
            body,
            "registrationToken=testToken&mobileAppUuid=testIntegrationKey&userKey=test%20user\
             &deviceImei=testDeviceId&deviceName=testDevice&deviceModel=Pixel%207&deviceBrand=google\
             &deviceManufacturer=Google&osName=android&osVersion=Android%2014&osLanguage=en-US\
             &additionalParams=%3CadditionalParameters%3E%3C%2FadditionalParameters%3E"
        );
    }

    #[test]
    fn test_duplicate_registration_is_suppressed() {
        let net = FixedNetworking::new(Some(200));
        let store = store();
        let (manager, api) = manager(net.clone(), Some(store.clone()));
        manager.register(&request("token", "user"), &config("optedin"));
        manager.register(&request("token", "user"), &config("optedin"));
        assert_eq!(net.requests().len(), 1);
        assert!(store.contains(DATASTORE_KEY_TOKEN_HASH));

        let dispatched = api.dispatched.lock().unwrap();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].data().and_then(|d| d.get("registrationstatus")), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_changed_fields_are_resent() {
        let net = FixedNetworking::new(Some(200));
        let (manager, _) = manager(net.clone(), Some(store()));
        manager.register(&request("token", "user"), &config("optedin"));
        manager.register(&request("token", "user2"), &config("optedin"));
        manager.register(&request("token2", "user2"), &config("optedin"));

        let mut with_params = request("token2", "user2");
        with_params.additional_parameters.insert("k".into(), json!("v"));
        manager.register(&with_params, &config("optedin"));
        assert_eq!(net.requests().len(), 4);
    }

    #[test]
    fn test_failed_registration_is_retried() {
        let net = FixedNetworking::new(Some(500));
        let store = store();
        let (manager, api) = manager(net.clone(), Some(store.clone()));
        manager.register(&request("token", "user"), &config("optedin"));
        manager.register(&request("token", "user"), &config("optedin"));
        assert_eq!(net.requests().len(), 2);
        assert!(!store.contains(DATASTORE_KEY_TOKEN_HASH));
        assert!(api
            .dispatched
            .lock()
            .unwrap()
            .iter()
            .all(|e| e.data().and_then(|d| d.get("registrationstatus")) == Some(&Value::Bool(false))));
    }

    #[test]
    fn test_no_connection_is_a_failure() {
        let net = FixedNetworking::new(None);
        let store = store();
        let (manager, api) = manager(net.clone(), Some(store.clone()));
        manager.register(&request("token", "user"), &config("optedin"));
        assert!(!store.contains(DATASTORE_KEY_TOKEN_HASH));
        assert_eq!(api.dispatched.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_store_always_sends() {
        let net = FixedNetworking::new(Some(200));
        let (manager, _) = manager(net.clone(), None);
        manager.register(&request("token", "user"), &config("optedin"));
        manager.register(&request("token", "user"), &config("optedin"));
        assert_eq!(net.requests().len(), 2);
    }

    #[test]
    fn test_preconditions() {
        let net = FixedNetworking::new(Some(200));
        let (manager, _) = manager(net.clone(), Some(store()));

        let no_token = RegistrationRequest { device_token: None, ..request("", "") };
        manager.register(&no_token, &config("optedin"));
        manager.register(&request("token", "user"), &config("optedout"));
        manager.register(&request("token", "user"), &config("optunknown"));
        manager.register(&request("token", "user"), &CampaignClassicConfiguration::new(None));

        let no_server = match json!({
            "campaignclassic.android.integrationKey": "key",
            "global.privacy": "optedin"
        }) {
            Value::Object(m) => CampaignClassicConfiguration::new(Some(m)),
            _ => unreachable!(),
        };
        manager.register(&request("token", "user"), &no_server);

        let no_key = match json!({
            "campaignclassic.marketingServer": "server",
            "global.privacy": "optedin"
        }) {
            Value::Object(m) => CampaignClassicConfiguration::new(Some(m)),
            _ => unreachable!(),
        };
        manager.register(&request("token", "user"), &no_key);

        assert!(net.requests().is_empty());
    }

    #[test]
    fn test_missing_networking() {
        let store = store();
        let api = Arc::new(RecordingApi::default());
        let manager = RegistrationManager::with_services(api.clone(), Some(device()), Some(store.clone()), None);
        manager.register(&request("token", "user"), &config("optedin"));
        assert!(!store.contains(DATASTORE_KEY_TOKEN_HASH));
        assert!(api.dispatched.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clear_registration_data() {
        let net = FixedNetworking::new(Some(200));
        let store = store();
        let (manager, _) = manager(net.clone(), Some(store.clone()));
        manager.register(&request("token", "user"), &config("optedin"));
        manager.clear_registration_data();
        assert!(!store.contains(DATASTORE_KEY_TOKEN_HASH));

        manager.register(&request("token", "user"), &config("optedin"));
        assert_eq!(net.requests().len(), 2);
    }

    #[test]
    fn test_previously_persisted_fingerprint_suppresses_request() {
        let net = FixedNetworking::new(Some(200));
        let store = store();
        store.set_string(DATASTORE_KEY_TOKEN_HASH, crate::fingerprint::PERSISTED_FINGERPRINT);

        let device: Arc<dyn DeviceInforming> = Arc::new(StaticDeviceInfo::new(mobile_core::conf::Device {
            unique_id: Some("12345".into()),
            ..Default::default()
        }));
        let api = Arc::new(RecordingApi::default());
        let manager =
            RegistrationManager::with_services(api.clone(), Some(device), Some(store.clone()), Some(net.clone()));

        let mut with_params = request("testToken", "testUser");
        with_params.additional_parameters.insert("key".into(), json!("value"));
        manager.register(&with_params, &config("optedin"));
        assert!(net.requests().is_empty());
        assert!(api.dispatched.lock().unwrap().is_empty());

        with_params.user_key = "otherUser".into();
        manager.register(&with_params, &config("optedin"));
        assert_eq!(net.requests().len(), 1);
    }

    #[test]
    fn test_stored_fingerprint_matches_recomputed() {
        let net = FixedNetworking::new(Some(200));
        let store = store();
        let (manager, _) = manager(net, Some(store.clone()));
        manager.register(&request("token", "user"), &config("optedin"));

        let expected = compute_fingerprint(
            "token",
            "user",
            "<additionalParameters></additionalParameters>",
            &device_uuid(Some("testDeviceId")),
        );
        assert_eq!(store.get_string(DATASTORE_KEY_TOKEN_HASH), Some(expected));
    }
}
