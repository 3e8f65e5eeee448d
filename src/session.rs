use crate::error::SessionError;
use crate::model::*;
use crate::storage::KeyValueStore;
use log::{debug, warn};

/// Answers "who is signed in". Consumers only read from it.
pub trait SessionProvider {
    fn current_user(&self) -> Option<UserIdentity>;
}

impl SessionProvider for Option<UserIdentity> {
    fn current_user(&self) -> Option<UserIdentity> {
        self.clone()
    }
}

impl SessionProvider for UserIdentity {
    fn current_user(&self) -> Option<UserIdentity> {
        Some(self.clone())
    }
}

impl<'a, P: SessionProvider + ?Sized> SessionProvider for &'a P {
    fn current_user(&self) -> Option<UserIdentity> {
        (**self).current_user()
    }
}

pub const SESSION_KEY: &str = "user";

/// Session persisted under the `user` key, as written by the login flow.
#[derive(Debug)]
pub struct StoredSession<S> {
    storage: S,
}

impl<S: KeyValueStore> StoredSession<S>
where
    S::Error: std::error::Error + 'static,
{
    pub fn new(storage: S) -> Self {
        StoredSession { storage }
    }

    /// The stored user, or none when nobody is signed in or the stored value
    /// cannot be read.
    pub fn current(&self) -> Option<SessionUser> {
        let data = match self.storage.get(SESSION_KEY) {
            Ok(data) => data?,
            Err(err) => {
                warn!("failed to read session: {:?}", err);
                return None;
            }
        };
        match serde_json::from_str::<Option<SessionUser>>(&data) {
            Ok(user) => user,
            Err(err) => {
                warn!("ignoring malformed session: {}", err);
                None
            }
        }
    }

    pub fn sign_in(&self, user: &SessionUser) -> Result<(), SessionError<S::Error>> {
        let data = serde_json::to_string(user).map_err(SessionError::Encode)?;
        self.storage
            .set(SESSION_KEY, &data)
            .map_err(SessionError::Storage)?;
        debug!("signed in as {}", user.display_name());
        Ok(())
    }

    pub fn sign_out(&self) -> Result<(), SessionError<S::Error>> {
        self.storage
            .remove(SESSION_KEY)
            .map_err(SessionError::Storage)?;
        debug!("signed out");
        Ok(())
    }
}

impl<S: KeyValueStore> SessionProvider for StoredSession<S>
where
    S::Error: std::error::Error + 'static,
{
    fn current_user(&self) -> Option<UserIdentity> {
        self.current().as_ref().and_then(SessionUser::identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn alice() -> SessionUser {
        SessionUser {
            id: Some(json!(7)),
            username: Some("alice".to_owned()),
            email: Some("alice@example.com".to_owned()),
            token: Some("jwt".to_owned()),
        }
    }

    #[test]
    fn sign_in_and_out() {
        let storage = MemoryStorage::new();
        let session = StoredSession::new(&storage);
        assert_eq!(session.current_user(), None);

        session.sign_in(&alice()).unwrap();
        assert_eq!(session.current(), Some(alice()));
        assert_eq!(session.current_user(), Some(UserIdentity::new("alice")));

        session.sign_out().unwrap();
        assert_eq!(session.current(), None);
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn reads_login_payload() {
        let storage = MemoryStorage::new();
        storage
            .set(
                SESSION_KEY,
                r#"{"id":"65f0","username":"bob","email":"bob@example.com","token":"t"}"#,
            )
            .unwrap();
        let session = StoredSession::new(&storage);
        assert_eq!(session.current_user(), Some(UserIdentity::new("bob")));
    }

    #[test]
    fn malformed_or_nameless_session_is_signed_out() {
        let storage = MemoryStorage::new();
        let session = StoredSession::new(&storage);

        storage.set(SESSION_KEY, "{not json").unwrap();
        assert_eq!(session.current(), None);

        storage.set(SESSION_KEY, "null").unwrap();
        assert_eq!(session.current(), None);

        storage
            .set(SESSION_KEY, r#"{"email":"carol@example.com"}"#)
            .unwrap();
        assert!(session.current().is_some());
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn unreadable_session_in_sled_is_signed_out() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        db.open_tree("local_storage")
            .unwrap()
            .insert(SESSION_KEY, &b"{\"username\":\"al\xffce\"}"[..])
            .unwrap();
        let session = StoredSession::new(&db);
        assert_eq!(session.current(), None);
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn fixed_providers() {
        let nobody: Option<UserIdentity> = None;
        assert_eq!(nobody.current_user(), None);
        let alice = UserIdentity::new("alice");
        assert_eq!((&alice).current_user(), Some(alice.clone()));
    }
}
