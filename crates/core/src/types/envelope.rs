//! Backend error envelope.

use serde::{Deserialize, Serialize};

/// Body the backend sends with every non-success response.
///
/// ```json
/// { "success": false, "message": "Protected route, Oauth2 Bearer token not found" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always `false` on error responses.
    #[serde(default)]
    pub success: bool,
    /// Human readable reason, suitable for showing to the user.
    pub message: String,
}

impl ErrorEnvelope {
    /// Build a failure envelope.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
