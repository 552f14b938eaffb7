//! Error type shared by every external service call.
//!
//! Embedding, reranking, and vector-store calls all return
//! [`ServiceResult`]. Callers choose between failing fast (`?`) and
//! degrading to an empty result ([`Degrade::degrade`]); transport
//! failures survive degradation because nothing local can recover them.

use thiserror::Error;

/// Boxed transport-layer cause (network, DNS, TLS, timeout).
pub type TransportSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a call to an external collaborator.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(#[source] TransportSource),

    /// The service answered with a non-2xx status. `body` is the decoded
    /// error body, kept verbatim for diagnosis.
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response parsed but did not have the expected shape (missing
    /// keys, wrong item count, out-of-range index).
    #[error("unexpected response shape: {reason}")]
    Shape { reason: String, body: String },

    /// A local precondition failed before any response was produced.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ServiceError::Transport(Box::new(err))
    }

    /// Build a [`ServiceError::Shape`], logging the raw payload.
    pub fn shape(reason: impl Into<String>, body: impl Into<String>) -> Self {
        let reason = reason.into();
        let body = body.into();
        tracing::warn!(%reason, raw = %body, "rejecting malformed service response");
        ServiceError::Shape { reason, body }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ServiceError::Transport(_))
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Turns recoverable service failures into an empty value.
///
/// `Status`, `Shape`, and `InvalidRequest` errors are logged and replaced
/// by `T::default()`. `Transport` errors are returned unchanged.
pub trait Degrade<T> {
    fn degrade(self) -> ServiceResult<T>;
}

impl<T: Default> Degrade<T> for ServiceResult<T> {
    fn degrade(self) -> ServiceResult<T> {
        match self {
            Ok(value) => Ok(value),
            Err(err) if err.is_transport() => Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "service call failed, continuing with empty result");
                Ok(T::default())
            }
        }
    }
}
