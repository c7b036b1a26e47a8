//! Service caller port: commands sent to other entities.

use std::future::Future;

use mitmlight_domain::error::MitmLightError;
use mitmlight_domain::service::ServiceCall;

/// Issues service calls through the host.
pub trait ServiceCaller: Send + Sync {
    fn call_service(
        &self,
        call: ServiceCall,
    ) -> impl Future<Output = Result<(), MitmLightError>> + Send;
}
