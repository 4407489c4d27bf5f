//! Session handling and role-based access for the dashboard.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
mod authorizer;

pub use principal::{CredentialRecord, Identity, TestCredential};
pub use session::{SessionOptions, SessionStore};
pub use provider::{AuthProvider, LocalAuthProvider, LoginRequest, PasswordScheme, SignupRequest, TEST_CREDENTIALS};
pub use authorizer::{
    permissions_for, Access, NavItem, PermissionResolver, ACCESS_DENIED_HINT, ACCESS_DENIED_MESSAGE, ACCESS_DENIED_TITLE,
};
