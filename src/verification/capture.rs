use super::domain::RunId;

/// Element id the capture widget mounts into.
pub const DEFAULT_MOUNT_ID: &str = "capture-mount";

/// Parameters handed to the embedded capture widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    /// Opaque token minted alongside the run.
    pub sdk_token: String,
    pub run_id: RunId,
    pub mount_id: String,
}

impl CaptureRequest {
    pub fn new(sdk_token: impl Into<String>, run_id: RunId) -> Self {
        Self {
            sdk_token: sdk_token.into(),
            run_id,
            mount_id: DEFAULT_MOUNT_ID.to_string(),
        }
    }
}

/// Errors reported by the capture widget.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("capture widget failed to initialize: {0}")]
    Init(String),
    #[error("{0}")]
    Sdk(String),
}

/// The externally owned document/biometric capture widget.
///
/// The widget owns camera and media streams, so the session holds at most one
/// live handle and releases it on every exit path back to the home screen.
/// Releasing through the session is idempotent: tearing down a session that
/// never acquired a handle is a no-op.
pub trait CaptureSdk: Send + Sync {
    type Handle: Send;

    fn acquire(&self, request: &CaptureRequest) -> Result<Self::Handle, CaptureError>;

    fn release(&self, handle: Self::Handle);
}
