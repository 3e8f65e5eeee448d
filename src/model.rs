use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::TryFrom;
use std::fmt;

/// Identifier of a movie. Integers and strings are distinct ids: `42` never
/// equals `"42"`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum MovieId {
    Int(i64),
    Str(String),
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovieId::Int(id) => write!(f, "{}", id),
            MovieId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for MovieId {
    fn from(id: i64) -> Self {
        MovieId::Int(id)
    }
}

impl From<&str> for MovieId {
    fn from(id: &str) -> Self {
        MovieId::Str(id.to_owned())
    }
}

impl From<String> for MovieId {
    fn from(id: String) -> Self {
        MovieId::Str(id)
    }
}

impl std::str::FromStr for MovieId {
    type Err = std::convert::Infallible;

    /// Numeric text becomes an integer id, anything else a string id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map(MovieId::Int)
            .unwrap_or_else(|_| MovieId::Str(s.to_owned())))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Genre {
    Tagged {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<i64>,
        name: String,
    },
    Name(String),
    Other(Value),
}

impl Genre {
    pub fn name(&self) -> Option<&str> {
        match self {
            Genre::Tagged { name, .. } => Some(name),
            Genre::Name(name) => Some(name),
            Genre::Other(_) => None,
        }
    }
}

/// Snapshot of a movie taken when it was favorited.
///
/// Decoding only requires an `id`. Fields of an unexpected type, and any
/// field this crate does not know about, are kept in `extra` and written back
/// untouched. `poster_path` and `release_date` are read when the camelCase
/// name is absent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", try_from = "Map<String, Value>")]
pub struct MovieRecord {
    pub id: MovieId,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<Genre>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MovieRecord {
    pub fn new<I: Into<MovieId>, T: Into<String>>(id: I, title: T) -> Self {
        MovieRecord {
            id: id.into(),
            title: title.into(),
            poster_path: None,
            poster: None,
            release_date: None,
            genres: None,
            overview: None,
            extra: Map::new(),
        }
    }
}

/// Removes `key` if it holds a string or null. Values of any other type stay
/// in the map.
fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(_)) | Some(Value::Null) => match map.remove(key) {
            Some(Value::String(value)) => Some(value),
            _ => None,
        },
        _ => None,
    }
}

fn take_string_or(map: &mut Map<String, Value>, key: &str, fallback: &str) -> Option<String> {
    take_string(map, key).or_else(|| {
        if map.contains_key(key) {
            None
        } else {
            take_string(map, fallback)
        }
    })
}

impl TryFrom<Map<String, Value>> for MovieRecord {
    type Error = RecordError;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, RecordError> {
        let id = match map.remove("id") {
            Some(Value::Number(n)) => n
                .as_i64()
                .map(MovieId::Int)
                .ok_or(RecordError::InvalidId)?,
            Some(Value::String(id)) => MovieId::Str(id),
            Some(_) => return Err(RecordError::InvalidId),
            None => return Err(RecordError::MissingId),
        };
        let genres = match map.get("genres") {
            Some(Value::Array(_)) => match map.remove("genres") {
                Some(Value::Array(genres)) => Some(
                    genres
                        .into_iter()
                        .map(|genre| {
                            serde_json::from_value(genre.clone()).unwrap_or(Genre::Other(genre))
                        })
                        .collect(),
                ),
                _ => None,
            },
            Some(Value::Null) => {
                map.remove("genres");
                None
            }
            _ => None,
        };
        Ok(MovieRecord {
            id,
            title: take_string(&mut map, "title").unwrap_or_default(),
            poster_path: take_string_or(&mut map, "posterPath", "poster_path"),
            poster: take_string(&mut map, "poster"),
            release_date: take_string_or(&mut map, "releaseDate", "release_date"),
            genres,
            overview: take_string(&mut map, "overview"),
            extra: map,
        })
    }
}

/// Opaque name a favorites collection is filed under.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserIdentity(String);

impl UserIdentity {
    pub fn new<S: Into<String>>(name: S) -> Self {
        UserIdentity(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserIdentity {
    fn from(name: &str) -> Self {
        UserIdentity::new(name)
    }
}

/// The signed-in user as the login flow stores it under the `user` key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SessionUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl SessionUser {
    /// Favorites are keyed by username; a session without one has no identity.
    pub fn identity(&self) -> Option<UserIdentity> {
        self.username
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(UserIdentity::new)
    }

    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| self.email.as_deref().filter(|email| !email.is_empty()))
            .unwrap_or("User")
    }
}
