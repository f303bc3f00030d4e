//! Virtual bridge error types.

use lumen_domain::error::{LumenError, NotFoundError, ValidationError};
use lumen_domain::id::LightId;

/// Errors specific to the virtual bridge.
#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    /// The light is not registered and auto-registration is off.
    #[error("unknown light `{0}`")]
    UnknownLight(LightId),

    /// The light was marked unreachable.
    #[error("light `{0}` is unreachable")]
    Unreachable(LightId),

    /// A configured light id is not a valid key.
    #[error("invalid light id in configuration")]
    InvalidLightId(#[source] ValidationError),
}

impl From<VirtualError> for LumenError {
    fn from(err: VirtualError) -> Self {
        match err {
            VirtualError::UnknownLight(id) => NotFoundError {
                entity: "Light",
                id: id.to_string(),
            }
            .into(),
            VirtualError::InvalidLightId(err) => err.into(),
            other @ VirtualError::Unreachable(_) => LumenError::Device(Box::new(other)),
        }
    }
}
