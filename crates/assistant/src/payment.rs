//! Payment QR display.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::artifacts::{Artifact, ArtifactError, ArtifactStore, PAYMENT_QR_ARTIFACT};

/// Default location of the payment QR image.
pub const DEFAULT_PAYMENT_QR_PATH: &str = "qr_payments/qr1.jpg";

const DISPLAYED: &str =
    "QR code for payment has been displayed. Please scan to complete your purchase.";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("QR code file not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read QR code: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to save QR code: {0}")]
    Save(#[from] ArtifactError),
}

/// Publishes a fixed QR image as the `payment_qr` artifact.
#[derive(Debug, Clone)]
pub struct PaymentDisplay {
    path: PathBuf,
}

impl Default for PaymentDisplay {
    fn default() -> Self {
        Self::new(DEFAULT_PAYMENT_QR_PATH)
    }
}

impl PaymentDisplay {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save the QR image as an artifact.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::NotFound`] without saving anything when the
    /// image does not exist, or an error if reading or saving fails.
    #[instrument(skip(self, artifacts), fields(path = %self.path.display()))]
    pub async fn try_show<A: ArtifactStore>(
        &self,
        artifacts: &A,
    ) -> Result<&'static str, PaymentError> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(PaymentError::NotFound(self.path.clone()));
        }

        let data = tokio::fs::read(&self.path)
            .await
            .map_err(PaymentError::Read)?;
        let version = artifacts
            .save(PAYMENT_QR_ARTIFACT, Artifact::jpeg(data))
            .await?;

        info!(version, "Payment QR displayed");
        Ok(DISPLAYED)
    }

    /// Save the QR image as an artifact and describe the outcome for the user.
    pub async fn show<A: ArtifactStore>(&self, artifacts: &A) -> String {
        match self.try_show(artifacts).await {
            Ok(message) => message.to_string(),
            Err(PaymentError::NotFound(path)) => {
                warn!(path = %path.display(), "Payment QR missing");
                format!("Error: QR code file not found at {}", path.display())
            }
            Err(e) => {
                warn!(error = %e, "Payment QR display failed");
                format!("Error displaying QR code: {e}")
            }
        }
    }
}
