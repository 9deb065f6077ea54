//! Error types for dispatch operations.

use portbridge_core::CodecError;

use crate::ports::EntangleError;

/// Errors that can occur while dispatching one inbound message.
///
/// Every variant is synchronous and surfaces to the transport-driving
/// caller; a failed dispatch emits no event and performs no partial side
/// effects. There is no retry logic here, delivery policy belongs to the
/// transport.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The payload could not be decoded into the environment's native
    /// value representation.
    #[error("payload decode failed: {0}")]
    Decode(#[from] CodecError),

    /// Port descriptors transferred with the message could not be
    /// entangled into local channel objects.
    #[error("port entanglement failed: {0}")]
    Entangle(#[from] EntangleError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use portbridge_core::PortToken;

    #[test]
    fn test_dispatch_error_from_codec_error() {
        let codec_err = CodecError::Decode(Box::new(std::io::Error::other("bad bytes")));
        let err: DispatchError = codec_err.into();
        assert!(matches!(err, DispatchError::Decode(_)));
        assert!(err.to_string().contains("payload decode failed"));
    }

    #[test]
    fn test_dispatch_error_from_entangle_error() {
        let err: DispatchError = EntangleError::Consumed {
            token: PortToken::new(1, 2),
        }
        .into();
        assert!(matches!(err, DispatchError::Entangle(_)));
        assert!(err.to_string().contains("port entanglement failed"));
    }
}
