//! Device registry port.

use std::future::Future;

use mitmlight_domain::device::Device;
use mitmlight_domain::error::MitmLightError;

/// Looks up the device record an entity belongs to.
pub trait DeviceRegistry: Send + Sync {
    fn device_for_entity(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<Device>, MitmLightError>> + Send;
}
