use std::collections::HashMap;

use mobile_core::{Error, Result};

use crate::constants::{event_keys, push_keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationVisibility {
    Public,
    Private,
    Secret,
}

impl NotificationVisibility {
    /// Unknown or missing values fall back to `Private`.
    pub fn from_value(value: Option<i32>) -> Self {
        match value {
            Some(1) => NotificationVisibility::Public,
            Some(-1) => NotificationVisibility::Secret,
            _ => NotificationVisibility::Private,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationVisibility::Public => "PUBLIC",
            NotificationVisibility::Private => "PRIVATE",
            NotificationVisibility::Secret => "SECRET",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPriority {
    Min,
    Low,
    Default,
    High,
    Max,
}

impl NotificationPriority {
    /// Unknown or missing values fall back to `Default`.
    pub fn from_value(value: Option<i32>) -> Self {
        match value {
            Some(-2) => NotificationPriority::Min,
            Some(-1) => NotificationPriority::Low,
            Some(1) => NotificationPriority::High,
            Some(2) => NotificationPriority::Max,
            _ => NotificationPriority::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Min => "PRIORITY_MIN",
            NotificationPriority::Low => "PRIORITY_LOW",
            NotificationPriority::Default => "PRIORITY_DEFAULT",
            NotificationPriority::High => "PRIORITY_HIGH",
            NotificationPriority::Max => "PRIORITY_MAX",
        }
    }
}

/// The notification block a messaging transport may deliver next to the data map.
#[derive(Debug, Clone, Default)]
pub struct RemoteNotification {
    pub tag: Option<String>,
    pub icon: Option<String>,
    pub sound: Option<String>,
    pub click_action: Option<String>,
    pub channel_id: Option<String>,
    pub ticker: Option<String>,
    pub sticky: bool,
    pub visibility: Option<i32>,
    pub notification_priority: Option<i32>,
    pub notification_count: Option<i32>,
    pub body: Option<String>,
    pub title: Option<String>,
    pub image_url: Option<String>,
}

/// A Campaign Classic push message, normalized to the `adb_*` keys the
/// notification renderer reads.
#[derive(Debug, Clone)]
pub struct CampaignClassicPushPayload {
    message_data: HashMap<String, String>,
    message_id: String,
    delivery_id: String,
    tag: Option<String>,
}

impl CampaignClassicPushPayload {
    pub fn new(data: HashMap<String, String>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidPayload("remote message data payload is empty".into()));
        }
        let message_id = match data.get(event_keys::TRACK_INFO_KEY_MESSAGE_ID).filter(|v| !v.is_empty()) {
            Some(id) => id.clone(),
            None => return Err(Error::InvalidPayload("message id is missing or empty".into())),
        };
        let delivery_id = match data.get(event_keys::TRACK_INFO_KEY_DELIVERY_ID).filter(|v| !v.is_empty()) {
            Some(id) => id.clone(),
            None => return Err(Error::InvalidPayload("delivery id is missing or empty".into())),
        };

        let mut payload = Self { message_data: data, message_id, delivery_id, tag: None };

        //the message id stands in for a missing tag, it is always present
        match payload.non_empty(push_keys::TAG).map(String::from) {
            Some(tag) => payload.tag = Some(tag),
            None => {
                payload.message_data.insert(push_keys::TAG.into(), payload.message_id.clone());
                payload.tag = Some(payload.message_id.clone());
            }
        }

        if payload.non_empty(push_keys::BODY).is_none() {
            if let Some(body) = payload.message_data.get(push_keys::LEGACY_BODY).cloned() {
                payload.message_data.insert(push_keys::BODY.into(), body);
            }
        }

        Ok(payload)
    }

    /// Builds the payload from a data map and its optional notification block.
    /// Values already in the data map win over the notification block.
    pub fn from_message(data: HashMap<String, String>, notification: Option<&RemoteNotification>) -> Result<Self> {
        let mut payload = Self::new(data)?;
        if let Some(notification) = notification {
            payload.migrate_notification(notification);
        }
        Ok(payload)
    }

    fn migrate_notification(&mut self, n: &RemoteNotification) {
        if self.non_empty(push_keys::TAG).is_none() {
            self.tag = n.tag.clone();
        }
        let tag = self.tag.clone();
        self.migrate(push_keys::TAG, tag);
        self.migrate(push_keys::SMALL_ICON, n.icon.clone());
        self.migrate(push_keys::SOUND, n.sound.clone());
        self.migrate(push_keys::ACTION_URI, n.click_action.clone());
        self.migrate(push_keys::CHANNEL_ID, n.channel_id.clone());
        self.migrate(push_keys::TICKER, n.ticker.clone());
        self.migrate(push_keys::STICKY, Some(n.sticky.to_string()));
        self.migrate(
            push_keys::VISIBILITY,
            Some(NotificationVisibility::from_value(n.visibility).as_str().to_owned()),
        );
        self.migrate(
            push_keys::PRIORITY,
            Some(NotificationPriority::from_value(n.notification_priority).as_str().to_owned()),
        );
        self.migrate(push_keys::BADGE_COUNT, n.notification_count.map(|c| c.to_string()));
        self.migrate(push_keys::BODY, n.body.clone());
        self.migrate(push_keys::TITLE, n.title.clone());
        self.migrate(push_keys::IMAGE_URL, n.image_url.clone());
    }

    #[inline]
    fn migrate(&mut self, key: &str, value: Option<String>) {
        if self.non_empty(key).is_some() {
            return;
        }
        if let Some(value) = value {
            self.message_data.insert(key.to_owned(), value);
        }
    }

    #[inline]
    fn non_empty(&self, key: &str) -> Option<&str> {
        self.message_data.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    #[inline]
    pub fn message_data(&self) -> &HashMap<String, String> {
        &self.message_data
    }

    #[inline]
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    #[inline]
    pub fn delivery_id(&self) -> &str {
        &self.delivery_id
    }

    #[inline]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// The identifiers the tracking calls expect.
    pub fn track_info(&self) -> HashMap<String, String> {
        let mut info = HashMap::new();
        info.insert(event_keys::TRACK_INFO_KEY_MESSAGE_ID.to_owned(), self.message_id.clone());
        info.insert(event_keys::TRACK_INFO_KEY_DELIVERY_ID.to_owned(), self.delivery_id.clone());
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_invalid_payloads() {
        assert!(matches!(CampaignClassicPushPayload::new(HashMap::new()), Err(Error::InvalidPayload(_))));
        assert!(CampaignClassicPushPayload::new(data(&[("_dId", "d")])).is_err());
        assert!(CampaignClassicPushPayload::new(data(&[("_mId", ""), ("_dId", "d")])).is_err());
        assert!(CampaignClassicPushPayload::new(data(&[("_mId", "m")])).is_err());
    }

    #[test]
    fn test_tag_and_legacy_body() {
        let payload =
            CampaignClassicPushPayload::new(data(&[("_mId", "12345"), ("_dId", "d"), ("_msg", "hello")])).unwrap();
        assert_eq!(payload.tag(), Some("12345"));
        assert_eq!(payload.message_data().get("adb_tag").map(String::as_str), Some("12345"));
        assert_eq!(payload.message_data().get("adb_body").map(String::as_str), Some("hello"));

        let payload = CampaignClassicPushPayload::new(data(&[
            ("_mId", "12345"),
            ("_dId", "d"),
            ("adb_tag", "custom"),
            ("adb_body", "body"),
            ("_msg", "legacy"),
        ]))
        .unwrap();
        assert_eq!(payload.tag(), Some("custom"));
        assert_eq!(payload.message_data().get("adb_body").map(String::as_str), Some("body"));
    }

    #[test]
    fn test_notification_migration() {
        let notification = RemoteNotification {
            tag: Some("ntag".into()),
            icon: Some("icon".into()),
            sound: Some("bell".into()),
            click_action: Some("app://open".into()),
            channel_id: Some("channel".into()),
            ticker: Some("ticker".into()),
            sticky: true,
            visibility: Some(1),
            notification_priority: Some(2),
            notification_count: Some(3),
            body: Some("nbody".into()),
            title: Some("ntitle".into()),
            image_url: Some("https://img".into()),
        };
        let payload = CampaignClassicPushPayload::from_message(
            data(&[("_mId", "m"), ("_dId", "d"), ("adb_title", "data title")]),
            Some(&notification),
        )
        .unwrap();
        let get = |k: &str| payload.message_data().get(k).map(String::as_str);

        //the message id already filled the tag
        assert_eq!(get("adb_tag"), Some("m"));
        assert_eq!(get("adb_small_icon"), Some("icon"));
        assert_eq!(get("adb_sound"), Some("bell"));
        assert_eq!(get("adb_uri"), Some("app://open"));
        assert_eq!(get("adb_channel_id"), Some("channel"));
        assert_eq!(get("adb_ticker"), Some("ticker"));
        assert_eq!(get("adb_sticky"), Some("true"));
        assert_eq!(get("adb_n_visibility"), Some("PUBLIC"));
        assert_eq!(get("adb_n_priority"), Some("PRIORITY_MAX"));
        assert_eq!(get("adb_n_count"), Some("3"));
        assert_eq!(get("adb_body"), Some("nbody"));
        assert_eq!(get("adb_title"), Some("data title"));
        assert_eq!(get("adb_image"), Some("https://img"));
    }

    #[test]
    fn test_notification_defaults() {
        let payload =
            CampaignClassicPushPayload::from_message(data(&[("_mId", "m"), ("_dId", "d")]), Some(&Default::default()))
                .unwrap();
        let get = |k: &str| payload.message_data().get(k).map(String::as_str);
        assert_eq!(get("adb_n_visibility"), Some("PRIVATE"));
        assert_eq!(get("adb_n_priority"), Some("PRIORITY_DEFAULT"));
        assert_eq!(get("adb_sticky"), Some("false"));
        assert_eq!(get("adb_n_count"), None);
        assert_eq!(NotificationVisibility::from_value(Some(-1)), NotificationVisibility::Secret);
        assert_eq!(NotificationPriority::from_value(Some(-2)).as_str(), "PRIORITY_MIN");
    }

    #[test]
    fn test_track_info() {
        let payload = CampaignClassicPushPayload::new(data(&[("_mId", "m"), ("_dId", "d")])).unwrap();
        let info = payload.track_info();
        assert_eq!(info.len(), 2);
        assert_eq!(info.get("_mId").map(String::as_str), Some("m"));
        assert_eq!(info.get("_dId").map(String::as_str), Some("d"));
    }
}
