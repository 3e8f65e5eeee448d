use crate::error::FavoritesError;
use crate::model::*;
use crate::session::SessionProvider;
use crate::storage::KeyValueStore;
use log::{debug, info, warn};
use serde_json::Value;
use std::error::Error as StdError;

const FAVORITES_PREFIX: &str = "favorites_";

pub fn storage_key(user: &UserIdentity) -> String {
    format!("{}{}", FAVORITES_PREFIX, user.as_str())
}

fn has_id(entry: &Value, movie_id: &MovieId) -> bool {
    match (entry.get("id"), movie_id) {
        (Some(Value::Number(n)), MovieId::Int(id)) => n.as_i64() == Some(*id),
        (Some(Value::String(s)), MovieId::Str(id)) => s == id,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

impl AddOutcome {
    pub fn added(self) -> bool {
        self == AddOutcome::Added
    }
}

/// Per-user favorites kept in a [`KeyValueStore`].
///
/// Nothing is cached between calls: every operation reads the collection
/// back from storage, changes it and writes it out again. Two writers on the
/// same storage can overwrite each other's changes.
///
/// Stored data that cannot be read or parsed is treated as an empty
/// collection. Write failures are returned to the caller.
pub struct FavoritesStore<S, P> {
    storage: S,
    session: P,
}

impl<S, P> FavoritesStore<S, P>
where
    S: KeyValueStore,
    S::Error: StdError + 'static,
    P: SessionProvider,
{
    pub fn new(storage: S, session: P) -> Self {
        FavoritesStore { storage, session }
    }

    /// The stored entries as raw JSON. Entries are only decoded for reading so
    /// that a record this crate cannot interpret survives a rewrite. Anything
    /// other than a JSON array reads as empty.
    fn load(&self, user: &UserIdentity) -> Vec<Value> {
        let key = storage_key(user);
        let data = match self.storage.get(&key) {
            Ok(Some(data)) => data,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!("failed to read {}: {:?}", key, err);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Value>(&data) {
            Ok(Value::Array(entries)) => entries,
            Ok(Value::Null) => Vec::new(),
            Ok(other) => {
                warn!("discarding favorites in {}: not an array: {}", key, other);
                Vec::new()
            }
            Err(err) => {
                warn!("discarding malformed favorites in {}: {}", key, err);
                Vec::new()
            }
        }
    }

    fn save(
        &self,
        user: &UserIdentity,
        entries: &[Value],
    ) -> Result<(), FavoritesError<S::Error>> {
        let key = storage_key(user);
        let data = serde_json::to_string(entries).map_err(FavoritesError::Encode)?;
        self.storage
            .set(&key, &data)
            .map_err(FavoritesError::Storage)?;
        debug!("wrote {} favorites to {}", entries.len(), key);
        Ok(())
    }

    /// Appends `movie` unless a record with the same id is already stored.
    pub fn add_for(
        &self,
        user: Option<&UserIdentity>,
        movie: MovieRecord,
    ) -> Result<AddOutcome, FavoritesError<S::Error>> {
        let user = user.ok_or(FavoritesError::Unauthenticated)?;
        let mut entries = self.load(user);
        if entries.iter().any(|entry| has_id(entry, &movie.id)) {
            info!("{} already has movie {} in favorites", user, movie.id);
            return Ok(AddOutcome::AlreadyPresent);
        }
        info!("adding movie {} ({}) to favorites of {}", movie.id, movie.title, user);
        entries.push(serde_json::to_value(&movie).map_err(FavoritesError::Encode)?);
        self.save(user, &entries)?;
        Ok(AddOutcome::Added)
    }

    /// Drops every record with `movie_id` and writes the result back even if
    /// nothing matched. Returns whether a record was dropped.
    pub fn remove_for(
        &self,
        user: Option<&UserIdentity>,
        movie_id: &MovieId,
    ) -> Result<bool, FavoritesError<S::Error>> {
        let user = user.ok_or(FavoritesError::Unauthenticated)?;
        let mut entries = self.load(user);
        let before = entries.len();
        entries.retain(|entry| !has_id(entry, movie_id));
        let removed = entries.len() != before;
        self.save(user, &entries)?;
        if removed {
            info!("removed movie {} from favorites of {}", movie_id, user);
        }
        Ok(removed)
    }

    /// Stored records in order. Entries without a usable id are skipped here
    /// but stay in storage.
    pub fn list_for(&self, user: Option<&UserIdentity>) -> Vec<MovieRecord> {
        let user = match user {
            Some(user) => user,
            None => return Vec::new(),
        };
        self.load(user)
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<MovieRecord>(entry) {
                Ok(movie) => Some(movie),
                Err(err) => {
                    warn!("skipping favorite of {}: {}", user, err);
                    None
                }
            })
            .collect()
    }

    pub fn contains_for(&self, user: Option<&UserIdentity>, movie_id: &MovieId) -> bool {
        match user {
            Some(user) => self.load(user).iter().any(|entry| has_id(entry, movie_id)),
            None => false,
        }
    }

    pub fn add(&self, movie: MovieRecord) -> Result<AddOutcome, FavoritesError<S::Error>> {
        self.add_for(self.session.current_user().as_ref(), movie)
    }

    pub fn remove(&self, movie_id: &MovieId) -> Result<bool, FavoritesError<S::Error>> {
        self.remove_for(self.session.current_user().as_ref(), movie_id)
    }

    pub fn list(&self) -> Vec<MovieRecord> {
        self.list_for(self.session.current_user().as_ref())
    }

    pub fn contains(&self, movie_id: &MovieId) -> bool {
        self.contains_for(self.session.current_user().as_ref(), movie_id)
    }
}
