pub const EXTENSION_NAME: &str = "com.adobe.module.campaignclassic";
pub const FRIENDLY_NAME: &str = "CampaignClassic";

pub(crate) const REGISTER_API_PATH: &str = "/nms/mobile/1/registerAndroid.jssp";
pub(crate) const REGISTER_PARAM_DEVICE_OS_NAME: &str = "android";
pub(crate) const DEFAULT_TIMEOUT: i64 = 30;

pub const MESSAGE_RECEIVED_TAGID: &str = "1";
pub const MESSAGE_CLICKED_TAGID: &str = "2";

pub const DATASTORE_NAME: &str = "ADOBEMOBILE_CAMPAIGNCLASSIC";
pub const DATASTORE_KEY_TOKEN_HASH: &str = "ADOBEMOBILE_STOREDDEFAULTS_TOKENHASH";

pub(crate) const HTTP_HEADER_KEY_CONTENT_TYPE: &str = "Content-Type";
pub(crate) const HTTP_HEADER_CONTENT_TYPE_FORM_UTF8: &str = "application/x-www-form-urlencoded;charset=UTF-8";
pub(crate) const HTTP_HEADER_KEY_CONTENT_LENGTH: &str = "Content-Length";

pub(crate) const HTTP_OK: u16 = 200;

/// Keys of the configuration shared state
pub mod config_keys {
    pub const GLOBAL_PRIVACY: &str = "global.privacy";
    pub const MARKETING_SERVER: &str = "campaignclassic.marketingServer";
    pub const TRACKING_SERVER: &str = "campaignclassic.trackingServer";
    pub const INTEGRATION_KEY: &str = "campaignclassic.android.integrationKey";
    pub const TIMEOUT: &str = "campaignclassic.timeout";
}

/// Keys of campaign request and response event data
pub mod event_keys {
    pub const REGISTER_DEVICE: &str = "registerdevice";
    pub const REGISTRATION_STATUS: &str = "registrationstatus";
    pub const TRACK_RECEIVE: &str = "trackreceive";
    pub const TRACK_CLICK: &str = "trackclick";
    pub const TRACK_INFO: &str = "trackinfo";
    pub const TRACK_INFO_KEY_MESSAGE_ID: &str = "_mId";
    pub const TRACK_INFO_KEY_DELIVERY_ID: &str = "_dId";
    pub const DEVICE_TOKEN: &str = "devicetoken";
    pub const USER_KEY: &str = "userkey";
    pub const ADDITIONAL_PARAMETERS: &str = "additionalparameters";
}

/// Keys of the push data map understood by the notification renderer
pub mod push_keys {
    pub const TAG: &str = "adb_tag";
    pub const SMALL_ICON: &str = "adb_small_icon";
    pub const SOUND: &str = "adb_sound";
    pub const ACTION_URI: &str = "adb_uri";
    pub const CHANNEL_ID: &str = "adb_channel_id";
    pub const TICKER: &str = "adb_ticker";
    pub const STICKY: &str = "adb_sticky";
    pub const VISIBILITY: &str = "adb_n_visibility";
    pub const PRIORITY: &str = "adb_n_priority";
    pub const BADGE_COUNT: &str = "adb_n_count";
    pub const BODY: &str = "adb_body";
    pub const TITLE: &str = "adb_title";
    pub const IMAGE_URL: &str = "adb_image";

    /// Body key used by older Campaign Classic payloads
    pub const LEGACY_BODY: &str = "_msg";
}
