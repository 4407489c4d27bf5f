use tracing::{debug, info, warn};

use super::principal::{Identity, TestCredential};
use super::provider::{AuthProvider, LocalAuthProvider, LoginRequest, PasswordScheme, SignupRequest, TEST_CREDENTIALS};
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::security::Role;
use crate::storage::{read_json, write_json, SharedKv, CURRENT_USER_KEY};
use crate::tprintln;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub password_scheme: PasswordScheme,
    pub seed_demo_accounts: bool,
}

impl Default for SessionOptions {
    fn default() -> Self { Self { password_scheme: PasswordScheme::Plaintext, seed_demo_accounts: true } }
}

impl From<&AppConfig> for SessionOptions {
    fn from(cfg: &AppConfig) -> Self {
        Self { password_scheme: cfg.password_scheme, seed_demo_accounts: cfg.seed_demo_accounts }
    }
}

/// Authentication lifecycle and the single current-identity slot.
///
/// Two states: anonymous (`current_user()` is `None`) and authenticated.
/// A successful `login` or `signup` moves to authenticated, `logout` moves back;
/// failed attempts change nothing. The persisted slot is read once, at construction.
pub struct SessionStore {
    kv: SharedKv,
    provider: Box<dyn AuthProvider>,
    current: Option<Identity>,
}

impl SessionStore {
    /// Open a session over `kv` with the local credential store, seeding the demo
    /// accounts first if the credential collection is empty.
    pub fn new(kv: SharedKv, options: SessionOptions) -> Self {
        let provider = LocalAuthProvider::new(kv.clone(), options.password_scheme);
        if options.seed_demo_accounts {
            // failure is already logged by the provider; the session still opens
            let _ = provider.seed_if_empty();
        }
        Self::with_provider(kv, Box::new(provider))
    }

    /// Open a session with a caller-supplied credential provider. No seeding happens here.
    pub fn with_provider(kv: SharedKv, provider: Box<dyn AuthProvider>) -> Self {
        let current = match read_json::<Identity>(kv.as_ref(), CURRENT_USER_KEY) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable persisted session");
                None
            }
        };
        if let Some(id) = &current {
            debug!(user = %id.username, "restored persisted session");
        }
        Self { kv, provider, current }
    }

    pub fn login(&mut self, username: &str, password: &str) -> bool {
        let req = LoginRequest { username: username.to_string(), password: password.to_string() };
        self.authenticate(&req).is_ok()
    }

    /// Like `login`, with the reason on failure.
    pub fn authenticate(&mut self, req: &LoginRequest) -> AppResult<Identity> {
        let identity = self.provider.verify(req)?;
        self.establish(identity.clone())?;
        info!(user = %identity.username, role = %identity.role, "login");
        tprintln!("session.login user={} role={}", identity.username, identity.role);
        Ok(identity)
    }

    pub fn signup(&mut self, username: &str, email: &str, password: &str, role: &str) -> bool {
        let req = SignupRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        };
        self.register(&req).is_ok()
    }

    pub fn signup_as(&mut self, username: &str, email: &str, password: &str, role: Role) -> bool {
        self.signup(username, email, password, role.as_str())
    }

    /// Like `signup`, with the reason on failure. A new account is signed in immediately.
    pub fn register(&mut self, req: &SignupRequest) -> AppResult<Identity> {
        let identity = self.provider.register(req)?;
        self.establish(identity.clone())?;
        info!(user = %identity.username, id = %identity.id, role = %identity.role, "signup");
        tprintln!("session.signup user={} id={}", identity.username, identity.id);
        Ok(identity)
    }

    /// Safe to call while anonymous. The in-memory slot is cleared even if the
    /// persisted copy cannot be removed.
    pub fn logout(&mut self) {
        let prev = self.current.take();
        if let Err(e) = self.kv.remove_item(CURRENT_USER_KEY) {
            warn!(error = %e, "failed to remove persisted session");
        }
        if let Some(id) = prev {
            info!(user = %id.username, "logout");
            tprintln!("session.logout user={}", id.username);
        }
    }

    pub fn current_user(&self) -> Option<&Identity> { self.current.as_ref() }

    pub fn is_authenticated(&self) -> bool { self.current.is_some() }

    pub fn test_credentials(&self) -> &'static [TestCredential] { &TEST_CREDENTIALS }

    /// Persist first so a storage failure leaves the session untouched.
    fn establish(&mut self, identity: Identity) -> AppResult<()> {
        write_json(self.kv.as_ref(), CURRENT_USER_KEY, &identity)?;
        self.current = Some(identity);
        Ok(())
    }
}
