use crate::domain::models::User;
use crate::error::AppError;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    user: User,
    hash: String,
}

/// Validated signup input waiting for its password hash.
pub struct PendingAccount {
    email: String,
    name: String,
}

/// In-process identity provider: accounts with argon2 hashes plus the set of
/// live session ids. Session tokens themselves are signed in `web::session`.
///
/// Password hashing never happens inside this struct's methods; the async
/// `signup` and `login` below run it on the blocking pool between short lock
/// sections.
pub struct AuthService {
    hasher: Argon2<'static>,
    accounts: HashMap<Uuid, Account>,
    by_email: HashMap<String, Uuid>,
    sessions: HashMap<Uuid, Uuid>, // session_id -> user_id
}

impl AuthService {
    pub fn new() -> Self {
        Self::with_hasher(Argon2::default())
    }

    pub fn with_hasher(hasher: Argon2<'static>) -> Self {
        Self {
            hasher,
            accounts: HashMap::new(),
            by_email: HashMap::new(),
            sessions: HashMap::new(),
        }
    }

    pub fn prepare_signup(&self, email: &str, name: &str, password: &str) -> Result<PendingAccount, AppError> {
        let email = normalize_email(email)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.by_email.contains_key(&email) {
            return Err(AppError::Conflict("email already in use".into()));
        }
        Ok(PendingAccount {
            email,
            name: name.to_string(),
        })
    }

    /// Email uniqueness is checked again: another signup may have won the race.
    pub fn register(&mut self, pending: PendingAccount, hash: String) -> Result<User, AppError> {
        if self.by_email.contains_key(&pending.email) {
            return Err(AppError::Conflict("email already in use".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: pending.email.clone(),
            name: pending.name,
            avatar: None,
        };
        self.by_email.insert(pending.email, user.id);
        self.accounts.insert(user.id, Account { user: user.clone(), hash });
        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// The account and its stored hash, for verification outside the lock.
    pub fn credentials(&self, email: &str) -> Option<(User, String)> {
        let email = normalize_email(email).ok()?;
        self.by_email
            .get(&email)
            .and_then(|id| self.accounts.get(id))
            .map(|account| (account.user.clone(), account.hash.clone()))
    }

    pub fn hasher(&self) -> Argon2<'static> {
        self.hasher.clone()
    }

    /// New live session for an existing account.
    pub fn open_session(&mut self, user_id: Uuid) -> Result<Uuid, AppError> {
        if !self.accounts.contains_key(&user_id) {
            return Err(AppError::NotFound("user"));
        }
        let session_id = Uuid::new_v4();
        self.sessions.insert(session_id, user_id);
        Ok(session_id)
    }

    pub fn logout(&mut self, session_id: Uuid) {
        if let Some(user_id) = self.sessions.remove(&session_id) {
            tracing::info!("User {} logged out", user_id);
        }
    }

    pub fn current_user(&self, session_id: Uuid) -> Option<User> {
        self.sessions
            .get(&session_id)
            .and_then(|user_id| self.accounts.get(user_id))
            .map(|account| account.user.clone())
    }

    pub fn find_user(&self, user_id: Uuid) -> Option<&User> {
        self.accounts.get(&user_id).map(|a| &a.user)
    }

    pub fn update_profile(
        &mut self,
        user_id: Uuid,
        name: Option<String>,
        avatar: Option<String>,
    ) -> Result<User, AppError> {
        let account = self.accounts.get_mut(&user_id).ok_or(AppError::NotFound("user"))?;

        if let Some(name) = name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::Validation("name must not be empty".into()));
            }
            account.user.name = name.to_string();
        }
        if let Some(avatar) = avatar {
            let avatar = avatar.trim();
            account.user.avatar = (!avatar.is_empty()).then(|| avatar.to_string());
        }
        Ok(account.user.clone())
    }
}

impl Default for AuthService {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates the account and opens its first session.
pub async fn signup(
    auth: &RwLock<AuthService>,
    email: &str,
    name: &str,
    password: &str,
) -> Result<(User, Uuid), AppError> {
    let (pending, hasher) = {
        let auth = auth.read().await;
        (auth.prepare_signup(email, name, password)?, auth.hasher())
    };

    let password = password.to_string();
    let hash = run_blocking(move || hash_password(&hasher, &password)).await?;

    let mut auth = auth.write().await;
    let user = auth.register(pending, hash)?;
    let session_id = auth.open_session(user.id)?;
    Ok((user, session_id))
}

/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(auth: &RwLock<AuthService>, email: &str, password: &str) -> Result<(User, Uuid), AppError> {
    let (user, hash, hasher) = {
        let auth = auth.read().await;
        let (user, hash) = auth.credentials(email).ok_or(AppError::Unauthorized)?;
        (user, hash, auth.hasher())
    };

    let password = password.to_string();
    run_blocking(move || verify_password(&hasher, &password, &hash)).await?;

    let session_id = auth
        .write()
        .await
        .open_session(user.id)
        .map_err(|_| AppError::Unauthorized)?;
    tracing::info!("User {} logged in", user.id);
    Ok((user, session_id))
}

fn hash_password(hasher: &Argon2<'static>, password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            AppError::Storage("could not store credentials".into())
        })
}

fn verify_password(hasher: &Argon2<'static>, password: &str, hash: &str) -> Result<(), AppError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AppError::Unauthorized)?;
    hasher
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::Unauthorized)
}

async fn run_blocking<T, F>(work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!("Credential task failed: {}", e);
        AppError::Storage("credential check interrupted".into())
    })?
}

fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::Validation("invalid email address".into())),
    }
}

#[cfg(test)]
pub(crate) fn fast_hasher() -> Argon2<'static> {
    let params = argon2::Params::new(1024, 1, 1, None).unwrap();
    Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn service() -> RwLock<AuthService> {
        RwLock::new(AuthService::with_hasher(fast_hasher()))
    }

    #[tokio::test]
    async fn test_signup_login_logout() {
        let auth = service();
        let (user, first) = signup(&auth, "Dana@Example.com", "Dana", "hunter22").await.unwrap();
        assert_eq!(user.email, "dana@example.com");
        assert_eq!(auth.read().await.current_user(first).map(|u| u.id), Some(user.id));

        let (logged_in, session) = login(&auth, "dana@example.com ", "hunter22").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_ne!(session, first);

        auth.write().await.logout(session);
        assert!(auth.read().await.current_user(session).is_none());
        assert!(auth.write().await.open_session(Uuid::new_v4()).is_err());
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let auth = service();
        signup(&auth, "sam@example.com", "Sam", "correct-horse").await.unwrap();
        assert!(matches!(
            login(&auth, "sam@example.com", "wrong-horse").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            login(&auth, "nobody@example.com", "correct-horse").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            login(&auth, "not-an-email", "correct-horse").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let auth = service();
        assert!(matches!(signup(&auth, "not-an-email", "A", "secret1").await, Err(AppError::Validation(_))));
        assert!(matches!(signup(&auth, "a@b.io", " ", "secret1").await, Err(AppError::Validation(_))));
        assert!(matches!(signup(&auth, "a@b.io", "A", "123").await, Err(AppError::Validation(_))));

        signup(&auth, "a@b.io", "A", "secret1").await.unwrap();
        assert!(matches!(signup(&auth, "A@B.io", "A", "secret1").await, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_register_rechecks_email() {
        let mut auth = AuthService::with_hasher(fast_hasher());
        let first = auth.prepare_signup("kim@example.com", "Kim", "secret1").unwrap();
        let second = auth.prepare_signup("kim@example.com", "Kim", "secret1").unwrap();

        auth.register(first, "hash".into()).unwrap();
        assert!(matches!(auth.register(second, "hash".into()), Err(AppError::Conflict(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_readers_proceed_during_password_check() {
        let auth = Arc::new(service());
        signup(&auth, "a@b.io", "A", "secret1").await.unwrap();

        let attempt = tokio::spawn({
            let auth = auth.clone();
            async move { login(&auth, "a@b.io", "wrong-pass").await }
        });

        let mut blocked = 0;
        while !attempt.is_finished() {
            if auth.try_read().is_err() {
                blocked += 1;
            }
            tokio::task::yield_now().await;
        }
        assert!(matches!(attempt.await.unwrap(), Err(AppError::Unauthorized)));
        assert_eq!(blocked, 0);

        // A held read guard must not stall a password check either.
        let reader = auth.read().await;
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            login(&auth, "a@b.io", "wrong-pass"),
        )
        .await
        .expect("login waited on a reader");
        assert!(matches!(result, Err(AppError::Unauthorized)));
        drop(reader);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let auth = service();
        let (user, _) = signup(&auth, "kim@example.com", "Kim", "secret1").await.unwrap();
        let mut auth = auth.write().await;

        let updated = auth
            .update_profile(user.id, Some("Kim Lee".into()), Some("https://img/k.png".into()))
            .unwrap();
        assert_eq!(updated.name, "Kim Lee");
        assert_eq!(updated.avatar.as_deref(), Some("https://img/k.png"));

        let cleared = auth.update_profile(user.id, None, Some(String::new())).unwrap();
        assert_eq!(cleared.avatar, None);
        assert_eq!(cleared.name, "Kim Lee");

        assert!(matches!(
            auth.update_profile(Uuid::new_v4(), None, None),
            Err(AppError::NotFound("user"))
        ));
    }
}
