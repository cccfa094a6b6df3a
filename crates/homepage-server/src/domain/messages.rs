//! JSON message types exchanged with the browser.
//!
//! Every JSON endpoint answers with the same envelope:
//!
//! ```json
//! { "data": <payload or null>, "message": "success", "success": true }
//! ```
//!
//! Failures carry `data: null`, `success: false` and a human-readable message.
//! There are no structured error codes; front ends only branch on `success`.

use std::collections::BTreeMap;

use homepage_core::domain::transform::BgView;
use homepage_core::AppConfig;
use serde::{Deserialize, Serialize};

/// Message used by every successful response.
pub const MSG_SUCCESS: &str = "success";

/// Message for a rejected verification attempt.
pub const MSG_FAIL: &str = "fail";

/// Message for a verification request without a check code.
pub const MSG_CHECK_CODE_REQUIRED: &str = "checkCode is required";

/// Message for gated API calls made without a valid access cookie.
pub const MSG_UNAUTHORIZED: &str = "unauthorized";

/// Message for unknown paths.
pub const MSG_NOT_FOUND: &str = "not found";

/// Message for a known path called with the wrong method.
pub const MSG_METHOD_NOT_ALLOWED: &str = "method not allowed";

// ── Envelope ──────────────────────────────────────────────────────────────────

/// The uniform `{data, message, success}` response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Payload; always serialised, `null` on failure.
    pub data: Option<T>,
    pub message: String,
    pub success: bool,
}

impl<T> ApiResponse<T> {
    /// A successful envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            message: MSG_SUCCESS.to_string(),
            success: true,
        }
    }

    /// A failed envelope with `data: null`.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: message.into(),
            success: false,
        }
    }
}

// ── Requests ──────────────────────────────────────────────────────────────────

/// Body of `POST /api/verify`.
///
/// `checkCode` is the Base64 legacy ciphertext of the password the user typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    pub check_code: Option<String>,
}

impl VerifyRequest {
    /// The check code, or `None` when it is missing or empty.
    pub fn code(&self) -> Option<&str> {
        self.check_code.as_deref().filter(|c| !c.is_empty())
    }
}

// ── Page views ────────────────────────────────────────────────────────────────

/// Payload of `GET /config`.
///
/// Both variants carry the theming the page needs to draw its frame.  The
/// settings variant additionally carries the document merged over the
/// built-in defaults; the verification variant never exposes the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPage {
    /// `true` when the visitor must enter the password first.
    pub verify: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<AppConfig>,
    pub primary_color: String,
    /// CSS custom properties for the page root, including the primary
    /// colour's HSL channels.
    pub var_style: BTreeMap<String, String>,
    pub bg_config: BgView,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
