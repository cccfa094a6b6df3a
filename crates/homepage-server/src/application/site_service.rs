//! Request use cases: home view, config page, verification, save, download.
//!
//! [`SiteService`] holds everything a request needs (the document store, the
//! access gate and the route policy) and exposes one method per endpoint.
//! Methods are synchronous and free of HTTP types, so they are unit tested
//! here against a mocked [`ConfigRepository`] while the infrastructure layer
//! only translates between hyper requests and these calls.

use std::time::{SystemTime, UNIX_EPOCH};

use homepage_core::domain::transform::{background_view, editor_var_style, primary_color};
use homepage_core::{transform, AccessGate, AppConfig, GateDecision, HomeView, RoutePolicy};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::application::repository::{ConfigRepository, StoreError};
use crate::domain::messages::{MSG_CHECK_CODE_REQUIRED, MSG_FAIL};
use crate::domain::{ApiResponse, ConfigPage, ServerConfig, VerifyRequest};

// ── Error type ────────────────────────────────────────────────────────────────

/// Failures surfaced by the use cases.
///
/// The HTTP layer turns each of these into a `success: false` envelope.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request body is not the JSON the endpoint expects.
    #[error("invalid request body: {0}")]
    InvalidBody(#[source] serde_json::Error),
}

/// Result of `POST /api/verify`: the envelope plus, on success, the cookie
/// value to hand out.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyOutcome {
    pub response: ApiResponse<bool>,
    pub token: Option<String>,
}

impl VerifyOutcome {
    fn rejected(message: &str) -> Self {
        Self {
            response: ApiResponse::fail(message),
            token: None,
        }
    }
}

/// Seconds since the Unix epoch; `0` if the clock is before 1970.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ── Service ───────────────────────────────────────────────────────────────────

/// The homepage use cases, generic over the document store.
#[derive(Debug)]
pub struct SiteService<R> {
    repo: R,
    gate: AccessGate,
    policy: RoutePolicy,
}

impl<R: ConfigRepository> SiteService<R> {
    pub fn new(repo: R, gate: AccessGate, policy: RoutePolicy) -> Self {
        Self { repo, gate, policy }
    }

    /// Builds the service from the runtime configuration.
    pub fn from_config(repo: R, config: &ServerConfig) -> Self {
        let gate = AccessGate::new(
            config.password.clone(),
            config.gate_mode,
            &config.session_secret,
        );
        let policy = RoutePolicy::new(config.private_prefixes.iter());
        Self::new(repo, gate, policy)
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// `GET /`: the render-ready view of the stored document.
    pub fn home_view(&self) -> Result<HomeView, ServiceError> {
        let config = self.repo.load()?;
        Ok(transform(&config))
    }

    /// `GET /config`: the verification view when `verify` is set, otherwise
    /// the settings view with the document merged over the defaults.
    ///
    /// The verification view only needs theming, so a document that cannot be
    /// parsed at all still yields it, drawn with the default colour and
    /// backgrounds.  Otherwise the owner could not reach the editor to fix it.
    pub fn config_page(&self, verify: bool) -> Result<ConfigPage, ServiceError> {
        let stored = match self.repo.load() {
            Ok(stored) => stored,
            Err(StoreError::Parse(e)) if verify => {
                warn!("stored configuration unreadable, using default theming: {e}");
                AppConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        let config = if verify {
            None
        } else {
            Some(stored.merged_with_builtin().map_err(StoreError::Parse)?)
        };

        let primary_color = primary_color(&stored);
        Ok(ConfigPage {
            verify,
            config,
            var_style: editor_var_style(&primary_color),
            primary_color,
            bg_config: background_view(stored.bg_config.as_ref()),
        })
    }

    /// `POST /api/verify` with a raw JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidBody`] if the body is not a JSON object.
    pub fn verify_body(&self, body: &[u8], now: u64) -> Result<VerifyOutcome, ServiceError> {
        let request: VerifyRequest =
            serde_json::from_slice(body).map_err(ServiceError::InvalidBody)?;
        Ok(self.verify(&request, now))
    }

    /// Checks a submitted code and, on success, issues an access token.
    pub fn verify(&self, request: &VerifyRequest, now: u64) -> VerifyOutcome {
        let Some(code) = request.code() else {
            return VerifyOutcome::rejected(MSG_CHECK_CODE_REQUIRED);
        };

        if !self.gate.is_configured() {
            warn!("verification attempted but no master password is configured");
            return VerifyOutcome::rejected(MSG_FAIL);
        }

        if !self.gate.check_code_matches(code) {
            warn!("verification failed: check code does not match");
            return VerifyOutcome::rejected(MSG_FAIL);
        }

        match self.gate.issue_token(code, now) {
            Ok(token) => {
                info!("verification succeeded ({} token issued)", self.gate.mode());
                VerifyOutcome {
                    response: ApiResponse::ok(true),
                    token: Some(token),
                }
            }
            Err(e) => {
                error!("failed to issue access token: {e}");
                VerifyOutcome::rejected(MSG_FAIL)
            }
        }
    }

    /// `POST /api/config`: checks that the body is a JSON object and replaces
    /// the stored file with it.
    ///
    /// The body is written back as submitted (re-indented), so values this
    /// crate reads leniently are never dropped from the file.
    pub fn save_config(&self, body: &[u8]) -> Result<(), ServiceError> {
        let document: Map<String, Value> =
            serde_json::from_slice(body).map_err(ServiceError::InvalidBody)?;
        let contents = serde_json::to_string_pretty(&document).map_err(StoreError::Serialize)?;

        self.repo.save(&contents).map_err(|e| {
            error!("failed to save configuration: {e}");
            ServiceError::from(e)
        })?;

        info!("configuration saved ({} bytes)", contents.len());
        Ok(())
    }

    /// `GET /api/file`: the stored document, byte for byte.
    pub fn download(&self) -> Result<String, ServiceError> {
        Ok(self.repo.load_raw()?)
    }

    /// Applies the route policy to a request for `path` carrying the access
    /// cookie value `token`, if any.
    pub fn authorize(&self, path: &str, token: Option<&str>, now: u64) -> GateDecision {
        let token_valid = token.is_some_and(|t| self.gate.token_is_valid(t, now));
        let decision = self
            .policy
            .decide(path, self.gate.is_configured(), token_valid);

        if decision == GateDecision::Pass {
            debug!(path, "gate: pass");
        } else {
            warn!(path, ?decision, "gate: request blocked");
        }
        decision
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repository::MockConfigRepository;
    use homepage_core::domain::transform::{FALLBACK_BG, FALLBACK_MOBILE_BG};
    use homepage_core::gate::legacy;
    use homepage_core::{AppConfig, GateMode, Site};

    const PASSWORD: &str = "remio-password";
    const NOW: u64 = 1_700_000_000;

    fn gate(mode: GateMode) -> AccessGate {
        AccessGate::new(Some(PASSWORD.to_string()), mode, "test-secret")
    }

    fn service_with(repo: MockConfigRepository, mode: GateMode) -> SiteService<MockConfigRepository> {
        SiteService::new(repo, gate(mode), RoutePolicy::default())
    }

    fn repo_returning(config: AppConfig) -> MockConfigRepository {
        let mut repo = MockConfigRepository::new();
        repo.expect_load().returning(move || Ok(config.clone()));
        repo
    }

    fn request(code: &str) -> VerifyRequest {
        VerifyRequest {
            check_code: Some(code.to_string()),
        }
    }

    // ── home / config page ────────────────────────────────────────────────────

    #[test]
    fn test_home_view_partitions_sites_from_store() {
        // Arrange
        let config = AppConfig {
            sites: Some(vec![Site::linked("a", "https://a"), Site::anchor("more")]),
            ..AppConfig::default()
        };
        let service = service_with(repo_returning(config), GateMode::Sealed);

        // Act
        let view = service.home_view().unwrap();

        // Assert: modal flag off, anchor dropped
        assert_eq!(view.static_sites, vec![Site::linked("a", "https://a")]);
        assert!(view.modal_sites.is_empty());
        assert_eq!(view.bg_config.bgs, vec![FALLBACK_BG.to_string()]);
    }

    #[test]
    fn test_home_view_propagates_store_error() {
        let mut repo = MockConfigRepository::new();
        repo.expect_load().returning(|| {
            Err(StoreError::NotFound {
                path: "config/config.json".into(),
            })
        });
        let service = service_with(repo, GateMode::Sealed);

        let result = service.home_view();

        assert!(matches!(
            result,
            Err(ServiceError::Store(StoreError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_config_page_verify_hides_document() {
        let service = service_with(repo_returning(AppConfig::builtin()), GateMode::Sealed);

        let page = service.config_page(true).unwrap();

        assert!(page.verify);
        assert!(page.config.is_none());
        assert_eq!(page.primary_color, "#229fff");
        assert_eq!(page.bg_config.mbgs, vec![FALLBACK_MOBILE_BG.to_string()]);
    }

    #[test]
    fn test_config_page_carries_primary_color_vars() {
        let service = service_with(repo_returning(AppConfig::builtin()), GateMode::Sealed);

        let page = service.config_page(true).unwrap();

        assert_eq!(page.var_style["--primary-color"], "#229fff");
        assert_eq!(page.var_style["--mio-primary"], "206.06 100% 56.67%");
    }

    fn repo_with_unparsable_document() -> MockConfigRepository {
        let mut repo = MockConfigRepository::new();
        repo.expect_load().returning(|| {
            Err(StoreError::Parse(
                serde_json::from_str::<Value>("[1, 2").unwrap_err(),
            ))
        });
        repo
    }

    #[test]
    fn test_config_page_verify_survives_unparsable_document() {
        // Arrange
        let service = service_with(repo_with_unparsable_document(), GateMode::Sealed);

        // Act
        let page = service.config_page(true).unwrap();

        // Assert: default theming, no document
        assert!(page.config.is_none());
        assert_eq!(page.primary_color, "#229fff");
        assert_eq!(page.bg_config.bgs, vec![FALLBACK_BG.to_string()]);
    }

    #[test]
    fn test_config_page_settings_surfaces_unparsable_document() {
        let service = service_with(repo_with_unparsable_document(), GateMode::Sealed);

        let result = service.config_page(false);

        assert!(matches!(result, Err(ServiceError::Store(StoreError::Parse(_)))));
    }

    #[test]
    fn test_config_page_settings_merges_over_defaults() {
        // Arrange: stored document only sets a name
        let stored = AppConfig {
            name: Some("Alice".to_string()),
            ..AppConfig::default()
        };
        let service = service_with(repo_returning(stored), GateMode::Sealed);

        // Act
        let page = service.config_page(false).unwrap();

        // Assert: name from store, everything else from the built-in document
        let merged = page.config.unwrap();
        assert!(!page.verify);
        assert_eq!(merged.name.as_deref(), Some("Alice"));
        assert_eq!(merged.sub_title, AppConfig::builtin().sub_title);
        assert_eq!(merged.sites, AppConfig::builtin().sites);
    }

    // ── verify ────────────────────────────────────────────────────────────────

    #[test]
    fn test_verify_without_code_requires_check_code() {
        let service = service_with(MockConfigRepository::new(), GateMode::Sealed);

        let outcome = service.verify(&VerifyRequest::default(), NOW);

        assert_eq!(outcome.response, ApiResponse::fail("checkCode is required"));
        assert!(outcome.token.is_none());
    }

    #[test]
    fn test_verify_with_correct_code_issues_sealed_token() {
        // Arrange
        let service = service_with(MockConfigRepository::new(), GateMode::Sealed);
        let code = legacy::encrypt(PASSWORD).unwrap();

        // Act
        let outcome = service.verify(&request(&code), NOW);

        // Assert: success envelope, and the token opens the gate
        assert_eq!(outcome.response, ApiResponse::ok(true));
        let token = outcome.token.unwrap();
        assert_ne!(token, code);
        assert!(service.gate().token_is_valid(&token, NOW));
    }

    #[test]
    fn test_verify_legacy_mode_returns_submitted_code_as_token() {
        let service = service_with(MockConfigRepository::new(), GateMode::Legacy);
        let code = legacy::encrypt(PASSWORD).unwrap();

        let outcome = service.verify(&request(&code), NOW);

        assert_eq!(outcome.token.as_deref(), Some(code.as_str()));
    }

    #[test]
    fn test_verify_with_wrong_code_fails() {
        let service = service_with(MockConfigRepository::new(), GateMode::Sealed);
        let code = legacy::encrypt("wrong-password").unwrap();

        let outcome = service.verify(&request(&code), NOW);

        assert_eq!(outcome.response, ApiResponse::fail("fail"));
        assert!(outcome.token.is_none());
    }

    #[test]
    fn test_verify_with_garbage_code_fails_without_panicking() {
        let service = service_with(MockConfigRepository::new(), GateMode::Sealed);

        let outcome = service.verify(&request("not base64 !!"), NOW);

        assert_eq!(outcome.response, ApiResponse::fail("fail"));
    }

    #[test]
    fn test_verify_without_master_password_fails() {
        let service = SiteService::new(
            MockConfigRepository::new(),
            AccessGate::new(None, GateMode::Sealed, "s"),
            RoutePolicy::default(),
        );
        let code = legacy::encrypt(PASSWORD).unwrap();

        let outcome = service.verify(&request(&code), NOW);

        assert_eq!(outcome.response, ApiResponse::fail("fail"));
    }

    #[test]
    fn test_verify_body_rejects_invalid_json() {
        let service = service_with(MockConfigRepository::new(), GateMode::Sealed);

        let result = service.verify_body(b"{not json", NOW);

        assert!(matches!(result, Err(ServiceError::InvalidBody(_))));
    }

    // ── save / download ───────────────────────────────────────────────────────

    #[test]
    fn test_save_config_writes_document_with_unknown_keys() {
        // Arrange: expect a single write that keeps the unknown key
        let mut repo = MockConfigRepository::new();
        repo.expect_save()
            .withf(|contents| contents.contains("\"name\"") && contents.contains("customKey"))
            .times(1)
            .returning(|_| Ok(()));
        let service = service_with(repo, GateMode::Sealed);

        // Act
        let result = service.save_config(br#"{"name":"Bob","customKey":[1,2]}"#);

        // Assert
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_config_keeps_mistyped_values() {
        // Arrange: values the model reads leniently must still reach the file
        let mut repo = MockConfigRepository::new();
        repo.expect_save()
            .withf(|contents| contents.contains("\"istTransition\": \"false\""))
            .times(1)
            .returning(|_| Ok(()));
        let service = service_with(repo, GateMode::Sealed);

        // Act
        let result = service.save_config(br#"{"layoutConfig":{"istTransition":"false"}}"#);

        // Assert
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_config_rejects_non_object_body() {
        let mut repo = MockConfigRepository::new();
        repo.expect_save().times(0);
        let service = service_with(repo, GateMode::Sealed);

        let result = service.save_config(b"[1, 2]");

        assert!(matches!(result, Err(ServiceError::InvalidBody(_))));
    }

    #[test]
    fn test_save_config_rejects_invalid_json_without_writing() {
        let mut repo = MockConfigRepository::new();
        repo.expect_save().times(0);
        let service = service_with(repo, GateMode::Sealed);

        let result = service.save_config(b"[1, 2");

        assert!(matches!(result, Err(ServiceError::InvalidBody(_))));
    }

    #[test]
    fn test_save_config_surfaces_write_failure() {
        let mut repo = MockConfigRepository::new();
        repo.expect_save().returning(|_| {
            Err(StoreError::Io {
                path: "config/config.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        });
        let service = service_with(repo, GateMode::Sealed);

        let result = service.save_config(b"{}");

        assert!(matches!(result, Err(ServiceError::Store(StoreError::Io { .. }))));
    }

    #[test]
    fn test_download_returns_raw_document() {
        let mut repo = MockConfigRepository::new();
        repo.expect_load_raw()
            .returning(|| Ok("{\n  \"name\": \"raw\"\n}".to_string()));
        let service = service_with(repo, GateMode::Sealed);

        assert_eq!(service.download().unwrap(), "{\n  \"name\": \"raw\"\n}");
    }

    // ── authorize ─────────────────────────────────────────────────────────────

    #[test]
    fn test_authorize_public_path_passes() {
        let service = service_with(MockConfigRepository::new(), GateMode::Sealed);
        assert_eq!(service.authorize("/", None, NOW), GateDecision::Pass);
    }

    #[test]
    fn test_authorize_config_page_without_token_rewrites_to_verify() {
        let service = service_with(MockConfigRepository::new(), GateMode::Sealed);
        assert_eq!(
            service.authorize("/config", None, NOW),
            GateDecision::RewriteToVerify
        );
    }

    #[test]
    fn test_authorize_api_without_token_is_denied() {
        let service = service_with(MockConfigRepository::new(), GateMode::Sealed);
        assert_eq!(
            service.authorize("/api/config", Some("bogus"), NOW),
            GateDecision::Deny
        );
    }

    #[test]
    fn test_authorize_with_issued_token_passes() {
        // Arrange
        let service = service_with(MockConfigRepository::new(), GateMode::Sealed);
        let code = legacy::encrypt(PASSWORD).unwrap();
        let token = service.verify(&request(&code), NOW).token.unwrap();

        // Act / Assert
        assert_eq!(
            service.authorize("/api/file", Some(&token), NOW + 60),
            GateDecision::Pass
        );
    }

    #[test]
    fn test_authorize_without_password_redirects_home() {
        let service = SiteService::new(
            MockConfigRepository::new(),
            AccessGate::new(None, GateMode::Sealed, "s"),
            RoutePolicy::default(),
        );
        assert_eq!(
            service.authorize("/config", None, NOW),
            GateDecision::RedirectHome
        );
    }

    #[test]
    fn test_from_config_uses_password_and_prefixes() {
        let config = ServerConfig {
            password: Some(PASSWORD.to_string()),
            private_prefixes: vec!["/secret".to_string()],
            ..ServerConfig::default()
        };

        let service = SiteService::from_config(MockConfigRepository::new(), &config);

        assert!(service.gate().is_configured());
        assert_eq!(service.authorize("/config", None, NOW), GateDecision::Pass);
        assert_eq!(
            service.authorize("/secret", None, NOW),
            GateDecision::RewriteToVerify
        );
    }

    #[test]
    fn test_unix_now_is_after_2023() {
        assert!(unix_now() > NOW);
    }
}
