//! Entities provided for each link: the toggle switch and the two proxy
//! lights.

pub mod proxy_light;
pub mod toggle_switch;

pub use proxy_light::ProxyLight;
pub use toggle_switch::ToggleSwitch;

use mitmlight_domain::error::MitmLightError;
use mitmlight_domain::id::DeviceId;

use crate::ports::DeviceRegistry;

/// Device of the target light, which the link's entities attach to.
async fn target_device<R>(registry: &R, target_entity_id: &str) -> Result<Option<DeviceId>, MitmLightError>
where
    R: DeviceRegistry + ?Sized,
{
    let device = registry.device_for_entity(target_entity_id).await?;
    Ok(device.map(|device| device.id))
}
