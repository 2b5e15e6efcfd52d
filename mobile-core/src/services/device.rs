use crate::conf::Device;

/// Read-only facts about the device the host runs on.
pub trait DeviceInforming: Send + Sync {
    fn device_unique_id(&self) -> Option<String>;

    fn device_name(&self) -> Option<String>;

    fn device_model(&self) -> Option<String>;

    fn device_brand(&self) -> Option<String>;

    fn device_manufacturer(&self) -> Option<String>;

    fn operating_system_name(&self) -> Option<String>;

    fn operating_system_version(&self) -> Option<String>;

    /// Locale in `language_REGION` form, e.g. `en_US`
    fn active_locale(&self) -> Option<String>;
}

/// Device facts taken from the `[device]` settings section.
#[derive(Debug, Clone, Default)]
pub struct StaticDeviceInfo {
    device: Device,
}

impl StaticDeviceInfo {
    #[inline]
    pub fn new(device: Device) -> Self {
        Self { device }
    }
}

impl From<Device> for StaticDeviceInfo {
    #[inline]
    fn from(device: Device) -> Self {
        Self::new(device)
    }
}

impl DeviceInforming for StaticDeviceInfo {
    fn device_unique_id(&self) -> Option<String> {
        self.device.unique_id.clone()
    }

    fn device_name(&self) -> Option<String> {
        self.device.name.clone()
    }

    fn device_model(&self) -> Option<String> {
        self.device.model.clone()
    }

    fn device_brand(&self) -> Option<String> {
        self.device.brand.clone()
    }

    fn device_manufacturer(&self) -> Option<String> {
        self.device.manufacturer.clone()
    }

    fn operating_system_name(&self) -> Option<String> {
        self.device.os_name.clone()
    }

    fn operating_system_version(&self) -> Option<String> {
        self.device.os_version.clone()
    }

    fn active_locale(&self) -> Option<String> {
        self.device.locale.clone()
    }
}
