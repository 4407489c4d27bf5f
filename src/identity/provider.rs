use anyhow::anyhow;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{SecondsFormat, Utc};
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::principal::{CredentialRecord, Identity, TestCredential};
use crate::error::{AppError, AppResult};
use crate::security::Role;
use crate::storage::{read_json, write_json, SharedKv, USERS_KEY};

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// How newly stored passwords are written. Verification accepts both forms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordScheme {
    /// Stored as given. Only acceptable for the local demo store.
    #[default]
    Plaintext,
    /// Salted Argon2id PHC strings.
    Argon2,
}

impl PasswordScheme {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plaintext" | "plain" => Some(PasswordScheme::Plaintext),
            "argon2" | "argon2id" => Some(PasswordScheme::Argon2),
            _ => None,
        }
    }
}

/// Checks credentials and creates accounts.
pub trait AuthProvider: Send + Sync {
    fn verify(&self, req: &LoginRequest) -> AppResult<Identity>;
    fn register(&self, req: &SignupRequest) -> AppResult<Identity>;
}

pub(crate) const DEMO_ACCOUNTS: [(&str, &str, &str, &str, Role); 3] = [
    ("1", "admin", "admin@movieproduction.com", "admin123", Role::ProductionManager),
    ("2", "director", "director@movieproduction.com", "director123", Role::Director),
    ("3", "coordinator", "coordinator@movieproduction.com", "coord123", Role::ProductionCoordinator),
];

pub const TEST_CREDENTIALS: [TestCredential; 3] = [
    TestCredential { username: DEMO_ACCOUNTS[0].1, password: DEMO_ACCOUNTS[0].3, role: DEMO_ACCOUNTS[0].4 },
    TestCredential { username: DEMO_ACCOUNTS[1].1, password: DEMO_ACCOUNTS[1].3, role: DEMO_ACCOUNTS[1].4 },
    TestCredential { username: DEMO_ACCOUNTS[2].1, password: DEMO_ACCOUNTS[2].3, role: DEMO_ACCOUNTS[2].4 },
];

pub(crate) fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Time-based id: `now_ms` as decimal, bumped past any id already taken.
pub(crate) fn next_id(records: &[CredentialRecord], now_ms: i64) -> String {
    let mut candidate = now_ms;
    loop {
        let id = candidate.to_string();
        if !records.iter().any(|r| r.id == id) { return id; }
        candidate += 1;
    }
}

pub(crate) fn hash_password(password: &str) -> anyhow::Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

fn parse_argon2_phc(stored: &str) -> Option<PasswordHash<'_>> {
    let parsed = PasswordHash::new(stored).ok()?;
    if parsed.algorithm.as_str().starts_with("argon2") { Some(parsed) } else { None }
}

/// Argon2 PHC strings are verified as hashes; anything else is compared verbatim.
pub(crate) fn verify_password(stored: &str, password: &str) -> bool {
    match parse_argon2_phc(stored) {
        Some(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        None => stored == password,
    }
}

/// Credential collection kept as a JSON array under `users` in the key/value store.
pub struct LocalAuthProvider {
    kv: SharedKv,
    scheme: PasswordScheme,
}

impl LocalAuthProvider {
    pub fn new(kv: SharedKv, scheme: PasswordScheme) -> Self {
        if scheme == PasswordScheme::Plaintext {
            warn!("passwords are stored in plain text; use the argon2 scheme for anything beyond a local demo");
        }
        Self { kv, scheme }
    }

    pub fn scheme(&self) -> PasswordScheme { self.scheme }

    /// Whole collection, `[]` when the key is absent.
    pub fn records(&self) -> AppResult<Vec<CredentialRecord>> {
        Ok(read_json::<Vec<CredentialRecord>>(self.kv.as_ref(), USERS_KEY)?.unwrap_or_default())
    }

    fn save_records(&self, records: &[CredentialRecord]) -> AppResult<()> {
        write_json(self.kv.as_ref(), USERS_KEY, records)?;
        Ok(())
    }

    fn stored_password(&self, password: &str) -> AppResult<String> {
        match self.scheme {
            PasswordScheme::Plaintext => Ok(password.to_string()),
            PasswordScheme::Argon2 => Ok(hash_password(password)?),
        }
    }

    /// Write the three demo accounts when the collection is empty.
    /// A populated collection is left alone, as is one that cannot be read.
    pub fn seed_if_empty(&self) -> AppResult<bool> {
        let existing = match self.records() {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "credential store unreadable; skipping demo seed");
                return Err(e);
            }
        };
        if !existing.is_empty() { return Ok(false); }
        let created_at = now_iso();
        let mut seeded = Vec::with_capacity(DEMO_ACCOUNTS.len());
        for (id, username, email, password, role) in DEMO_ACCOUNTS {
            seeded.push(CredentialRecord {
                id: id.to_string(),
                username: username.to_string(),
                email: email.to_string(),
                password: self.stored_password(password)?,
                role: role.as_str().to_string(),
                created_at: created_at.clone(),
            });
        }
        self.save_records(&seeded)?;
        info!(count = seeded.len(), "seeded demo accounts");
        Ok(true)
    }
}

impl AuthProvider for LocalAuthProvider {
    fn verify(&self, req: &LoginRequest) -> AppResult<Identity> {
        let records = self.records()?;
        // both fields must match; a username hit with the wrong password is a miss
        let hit = records.iter().find(|r| r.username == req.username && verify_password(&r.password, &req.password));
        match hit {
            Some(rec) => Ok(rec.identity()),
            None => {
                debug!(user = %req.username, "credential check failed");
                Err(AppError::auth("invalid_credentials", "invalid username or password"))
            }
        }
    }

    /// Username and email are stored trimmed. Login still compares the username
    /// exactly, so `" bob "` signs up as `bob` and must log in as `bob`.
    fn register(&self, req: &SignupRequest) -> AppResult<Identity> {
        let username = req.username.trim();
        let email = req.email.trim();
        if username.is_empty() { return Err(AppError::user("empty_username", "Username is required")); }
        if email.is_empty() { return Err(AppError::user("empty_email", "Email is required")); }
        if req.password.is_empty() { return Err(AppError::user("empty_password", "Password is required")); }
        // a plaintext record holding a PHC string would later be verified as a hash
        if self.scheme == PasswordScheme::Plaintext && parse_argon2_phc(&req.password).is_some() {
            return Err(AppError::user("password_reserved_format", "Password cannot be an Argon2 hash string"));
        }

        let mut records = self.records()?;
        if records.iter().any(|r| r.username == username) {
            return Err(AppError::conflict("username_taken".to_string(), format!("username '{}' already exists", username)));
        }
        if records.iter().any(|r| r.email == email) {
            return Err(AppError::conflict("email_taken".to_string(), format!("email '{}' already exists", email)));
        }
        if Role::parse(&req.role).is_none() {
            warn!(user = username, role = %req.role, "account created with a role outside the permission table");
        }
        let rec = CredentialRecord {
            id: next_id(&records, Utc::now().timestamp_millis()),
            username: username.to_string(),
            email: email.to_string(),
            password: self.stored_password(&req.password)?,
            role: req.role.clone(),
            created_at: now_iso(),
        };
        let identity = rec.identity();
        records.push(rec);
        self.save_records(&records)?;
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn record(id: &str, username: &str, email: &str) -> CredentialRecord {
        CredentialRecord {
            id: id.into(),
            username: username.into(),
            email: email.into(),
            password: "pw".into(),
            role: "Crew Member".into(),
            created_at: now_iso(),
        }
    }

    #[test]
    fn next_id_skips_taken_ids() {
        let recs = vec![record("1000", "a", "a@x"), record("1001", "b", "b@x")];
        assert_eq!(next_id(&recs, 999), "999");
        assert_eq!(next_id(&recs, 1000), "1002");
    }

    #[test]
    fn created_at_matches_browser_iso_format() {
        let s = now_iso();
        assert_eq!(s.len(), "2024-01-01T00:00:00.000Z".len());
        assert!(s.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&s).is_ok());
    }

    #[test]
    fn argon2_hash_verifies_and_plaintext_still_compares() {
        let phc = hash_password("s3cret").unwrap();
        assert!(phc.starts_with("$argon2"));
        assert!(verify_password(&phc, "s3cret"));
        assert!(!verify_password(&phc, "S3cret"));
        assert!(verify_password("plain", "plain"));
        assert!(!verify_password("plain", "Plain"));
        // not an argon2 PHC string, so compared literally
        assert!(verify_password("$md5$abc", "$md5$abc"));
    }

    #[test]
    fn scheme_parse() {
        assert_eq!(PasswordScheme::parse("ARGON2"), Some(PasswordScheme::Argon2));
        assert_eq!(PasswordScheme::parse(" plaintext "), Some(PasswordScheme::Plaintext));
        assert_eq!(PasswordScheme::parse("bcrypt"), None);
    }

    #[test]
    fn register_validates_required_fields() {
        let kv: SharedKv = Arc::new(MemoryStore::new());
        let p = LocalAuthProvider::new(kv, PasswordScheme::Plaintext);
        let req = |u: &str, e: &str, pw: &str| SignupRequest { username: u.into(), email: e.into(), password: pw.into(), role: "Director".into() };
        assert_eq!(p.register(&req("  ", "e@x", "pw")).unwrap_err().code_str(), "empty_username");
        assert_eq!(p.register(&req("u", "", "pw")).unwrap_err().code_str(), "empty_email");
        assert_eq!(p.register(&req("u", "e@x", "")).unwrap_err().code_str(), "empty_password");
        let id = p.register(&req(" u ", " e@x ", "pw")).unwrap();
        assert_eq!(id.username, "u");
        assert_eq!(id.email, "e@x");
    }

    #[test]
    fn seed_skips_unreadable_collection() {
        let mem = Arc::new(MemoryStore::new());
        mem.set_item(USERS_KEY, "not json").unwrap();
        let p = LocalAuthProvider::new(mem.clone(), PasswordScheme::Plaintext);
        assert!(p.seed_if_empty().is_err());
        assert_eq!(mem.get_item(USERS_KEY).as_deref(), Some("not json"));
    }
}
