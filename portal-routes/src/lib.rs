use crate::error::PortalServiceError;
use error_stack::Report;

pub type ServiceResult<T> = Result<T, Report<PortalServiceError>>;
pub type OptServiceResult<T> = Result<Option<T>, Report<PortalServiceError>>;

pub mod error;
mod metrics;
pub mod routes;
pub mod service;
pub mod state;
