//! Authenticated-session lifecycle.
//!
//! The manager owns the observable [`SessionState`] and drives the
//! [`AuthGateway`] port for restore, login, signup, and logout. Every
//! session-mutating call takes a fresh epoch when it starts; state writes
//! carrying an older epoch are discarded, so the most recently started call
//! always decides the final state regardless of completion order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::api::ApiError;
use super::auth::{LoginCredentials, SignupDetails};
use super::ports::AuthGateway;
use super::session::{RestoreFailure, Session, SessionState, classify_restore_failure};

/// Owns the current-user state and its transitions.
pub struct SessionManager {
    gateway: Arc<dyn AuthGateway>,
    state: watch::Sender<SessionState>,
    epoch: AtomicU64,
}

impl SessionManager {
    /// Create a manager in the initial `loading` state.
    ///
    /// Call [`SessionManager::start`] to perform the first restore.
    pub fn new(gateway: Arc<dyn AuthGateway>) -> Self {
        let (state, _receiver) = watch::channel(SessionState::initial());
        Self {
            gateway,
            state,
            epoch: AtomicU64::new(0),
        }
    }

    /// Run the startup restore.
    pub async fn start(&self) {
        self.restore().await;
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Current session, if any.
    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Re-read the profile from the service.
    ///
    /// Any failure clears the session; nothing is raised. Ends with
    /// `loading = false` unless a newer call has started meanwhile.
    pub async fn restore(&self) {
        let epoch = self.begin(false);
        self.restore_within(epoch).await;
        self.finish(epoch);
    }

    /// Sign in, then restore the canonical profile.
    ///
    /// The restore runs whether or not the login call succeeded; the login
    /// response body is never used as the profile. The endpoint error, if
    /// any, is returned once `loading` is cleared.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<(), ApiError> {
        let epoch = self.begin(true);
        let outcome = self.gateway.login(credentials).await;
        match &outcome {
            Ok(()) => info!(username = credentials.username(), "login accepted"),
            Err(error) => {
                debug!(username = credentials.username(), error = %error, "login rejected");
            }
        }
        self.restore_within(epoch).await;
        self.finish(epoch);
        outcome
    }

    /// Register an account, then restore the canonical profile.
    pub async fn signup(&self, details: &SignupDetails) -> Result<(), ApiError> {
        let epoch = self.begin(true);
        let outcome = self.gateway.signup(details).await;
        match &outcome {
            Ok(()) => info!(username = details.username(), "signup accepted"),
            Err(error) => {
                debug!(username = details.username(), error = %error, "signup rejected");
            }
        }
        self.restore_within(epoch).await;
        self.finish(epoch);
        outcome
    }

    /// End the session.
    ///
    /// The local session is cleared even when the endpoint call fails.
    pub async fn logout(&self) {
        let epoch = self.begin(true);
        if let Err(error) = self.gateway.logout().await {
            warn!(error = %error, "logout call failed; clearing local session anyway");
        }
        self.apply(epoch, |state| {
            state.session = None;
            state.loading = false;
        });
    }

    fn begin(&self, mark_loading: bool) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        if mark_loading {
            self.apply(epoch, |state| state.loading = true);
        }
        epoch
    }

    async fn restore_within(&self, epoch: u64) {
        let session = match self.gateway.current_user().await {
            Ok(session) => {
                debug!(username = %session.username, role = %session.role, "session restored");
                Some(session)
            }
            Err(error) => match classify_restore_failure(&error) {
                RestoreFailure::Unauthenticated => None,
            },
        };
        if !self.apply(epoch, |state| state.session = session) {
            debug!(epoch, "discarding restore result from a superseded call");
        }
    }

    fn finish(&self, epoch: u64) {
        self.apply(epoch, |state| state.loading = false);
    }

    /// Write `update` unless a newer call has started. Returns whether the
    /// epoch was still current.
    fn apply(&self, epoch: u64, update: impl FnOnce(&mut SessionState)) -> bool {
        let mut current = false;
        self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            current = true;
            let before = state.clone();
            update(state);
            *state != before
        });
        current
    }
}

#[cfg(test)]
mod tests {
    //! Lifecycle and race coverage for the session manager.
    use super::*;
    use crate::domain::Role;
    use crate::domain::ports::MockAuthGateway;
    use async_trait::async_trait;
    use rstest::{fixture, rstest};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn alice(role: Role) -> Session {
        Session {
            id: 1,
            username: "alice".to_owned(),
            email: Some("alice@example.com".to_owned()),
            role,
        }
    }

    fn credentials() -> LoginCredentials {
        LoginCredentials::try_from_parts("alice", "pw").expect("valid credentials")
    }

    #[fixture]
    fn signed_out_gateway() -> MockAuthGateway {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_current_user()
            .returning(|| Err(ApiError::from_status(401, "Unauthorized")));
        gateway
    }

    #[tokio::test]
    async fn starts_loading_without_session() {
        let manager = SessionManager::new(Arc::new(MockAuthGateway::new()));
        assert_eq!(manager.state(), SessionState::initial());
    }

    #[rstest]
    #[tokio::test]
    async fn failed_restore_collapses_to_signed_out(signed_out_gateway: MockAuthGateway) {
        let manager = SessionManager::new(Arc::new(signed_out_gateway));
        manager.start().await;
        let state = manager.state();
        assert!(!state.loading);
        assert!(state.session.is_none());
    }

    #[rstest]
    #[case(ApiError::transport("connection refused"))]
    #[case(ApiError::from_status(500, "Internal Server Error"))]
    #[case(ApiError::decode("missing field `username`"))]
    #[tokio::test]
    async fn restore_never_raises(#[case] error: ApiError) {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_current_user()
            .return_once(move || Err(error));
        let manager = SessionManager::new(Arc::new(gateway));
        manager.restore().await;
        assert_eq!(
            manager.state(),
            SessionState {
                loading: false,
                session: None
            }
        );
    }

    #[tokio::test]
    async fn login_uses_restored_profile() {
        let mut gateway = MockAuthGateway::new();
        gateway.expect_login().times(1).returning(|_| Ok(()));
        gateway
            .expect_current_user()
            .times(1)
            .returning(|| Ok(alice(Role::Admin)));
        let manager = SessionManager::new(Arc::new(gateway));

        manager.login(&credentials()).await.expect("login succeeds");

        let state = manager.state();
        assert!(!state.loading);
        assert!(state.is_admin());
        assert_eq!(state.session, Some(alice(Role::Admin)));
    }

    #[tokio::test]
    async fn login_failure_is_returned_after_loading_clears() {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_login()
            .returning(|_| Err(ApiError::from_status(401, "invalid credentials")));
        gateway
            .expect_current_user()
            .times(1)
            .returning(|| Err(ApiError::from_status(401, "Unauthorized")));
        let manager = SessionManager::new(Arc::new(gateway));

        let err = manager
            .login(&credentials())
            .await
            .expect_err("login must fail");
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.message(), "invalid credentials");
        assert!(!manager.state().loading);
        assert!(manager.current_session().is_none());
    }

    #[tokio::test]
    async fn signup_restores_profile() {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_signup()
            .withf(|details| details.username() == "alice" && details.email().is_none())
            .returning(|_| Ok(()));
        gateway
            .expect_current_user()
            .returning(|| Ok(alice(Role::User)));
        let manager = SessionManager::new(Arc::new(gateway));
        let details = SignupDetails::try_from_parts("alice", Some(""), "pw").expect("valid");

        manager.signup(&details).await.expect("signup succeeds");
        assert_eq!(manager.current_session(), Some(alice(Role::User)));
    }

    #[tokio::test]
    async fn logout_clears_session_even_when_call_fails() {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_current_user()
            .returning(|| Ok(alice(Role::User)));
        gateway
            .expect_logout()
            .returning(|| Err(ApiError::transport("connection reset")));
        let manager = SessionManager::new(Arc::new(gateway));
        manager.start().await;
        assert!(manager.state().is_authenticated());

        manager.logout().await;
        assert_eq!(
            manager.state(),
            SessionState {
                loading: false,
                session: None
            }
        );
    }

    /// Gateway whose profile fetch waits for the test to release it.
    struct GatedGateway {
        profile: Session,
        entered: Notify,
        release: Notify,
        profile_calls: AtomicUsize,
    }

    impl GatedGateway {
        fn new(profile: Session) -> Self {
            Self {
                profile,
                entered: Notify::new(),
                release: Notify::new(),
                profile_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AuthGateway for GatedGateway {
        async fn current_user(&self) -> Result<Session, ApiError> {
            let call = self.profile_calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Ok(self.profile.clone())
        }

        async fn login(&self, _credentials: &LoginCredentials) -> Result<(), ApiError> {
            Ok(())
        }

        async fn signup(&self, _details: &SignupDetails) -> Result<(), ApiError> {
            Ok(())
        }

        async fn logout(&self) -> Result<(), ApiError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn slow_restore_cannot_resurrect_session_after_logout() {
        let gateway = Arc::new(GatedGateway::new(alice(Role::User)));
        let manager = Arc::new(SessionManager::new(gateway.clone()));

        let restoring = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.restore().await }
        });
        gateway.entered.notified().await;

        manager.logout().await;
        gateway.release.notify_one();
        restoring.await.expect("restore task completes");

        assert_eq!(
            manager.state(),
            SessionState {
                loading: false,
                session: None
            }
        );
    }

    #[tokio::test]
    async fn later_login_wins_over_earlier_slow_restore() {
        let gateway = Arc::new(GatedGateway::new(alice(Role::Admin)));
        let manager = Arc::new(SessionManager::new(gateway.clone()));

        let restoring = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.restore().await }
        });
        gateway.entered.notified().await;

        manager.login(&credentials()).await.expect("login succeeds");
        let after_login = manager.state();

        gateway.release.notify_one();
        restoring.await.expect("restore task completes");

        assert_eq!(manager.state(), after_login);
        assert!(!after_login.loading);
        assert!(after_login.is_admin());
        assert_eq!(gateway.profile_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn subscribers_observe_loading_then_result() {
        let mut gateway = MockAuthGateway::new();
        gateway.expect_login().returning(|_| Ok(()));
        gateway
            .expect_current_user()
            .returning(|| Ok(alice(Role::User)));
        let manager = SessionManager::new(Arc::new(gateway));
        let mut receiver = manager.subscribe();

        manager.login(&credentials()).await.expect("login succeeds");

        assert!(receiver.has_changed().expect("sender alive"));
        let state = receiver.borrow_and_update().clone();
        assert!(!state.loading);
        assert!(state.is_authenticated());
    }
}
