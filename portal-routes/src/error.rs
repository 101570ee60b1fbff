#[derive(Debug, thiserror::Error)]
#[error("the portal service failed to complete the request")]
pub struct PortalServiceError;
