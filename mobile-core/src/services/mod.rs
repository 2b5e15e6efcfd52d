//! Platform services offered by the host to its extensions.
//!
//! Each service is optional; an extension must treat a missing service as
//! "capability unavailable" and skip the work that needs it.

use std::sync::Arc;

pub use self::device::{DeviceInforming, StaticDeviceInfo};
pub use self::network::{
    ConnectCallback, HttpConnection, HttpMethod, HttpNetworkService, NetworkRequest, Networking,
};
pub use self::store::{DataStoring, MemoryDataStore, NamedCollection};

mod device;
mod network;
mod store;

#[derive(Clone, Default)]
pub struct Services {
    networking: Option<Arc<dyn Networking>>,
    data_storing: Option<Arc<dyn DataStoring>>,
    device_info: Option<Arc<dyn DeviceInforming>>,
}

impl Services {
    #[inline]
    pub fn networking(mut self, networking: Arc<dyn Networking>) -> Self {
        self.networking = Some(networking);
        self
    }

    #[inline]
    pub fn data_storing(mut self, data_storing: Arc<dyn DataStoring>) -> Self {
        self.data_storing = Some(data_storing);
        self
    }

    #[inline]
    pub fn device_info(mut self, device_info: Arc<dyn DeviceInforming>) -> Self {
        self.device_info = Some(device_info);
        self
    }

    #[inline]
    pub fn get_networking(&self) -> Option<&Arc<dyn Networking>> {
        self.networking.as_ref()
    }

    #[inline]
    pub fn get_data_storing(&self) -> Option<&Arc<dyn DataStoring>> {
        self.data_storing.as_ref()
    }

    #[inline]
    pub fn get_device_info(&self) -> Option<&Arc<dyn DeviceInforming>> {
        self.device_info.as_ref()
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("networking", &self.networking.is_some())
            .field("data_storing", &self.data_storing.is_some())
            .field("device_info", &self.device_info.is_some())
            .finish()
    }
}
