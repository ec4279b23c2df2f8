//! Hierarchical entity keys with a stable string encoding.
//!
//! The store addresses every entity by a path of `(kind, id)` segments:
//! a Conference lives under its organizer's Profile, a Session under its
//! Conference. Keys round-trip through an opaque "websafe" string form
//! (`Profile:u1/Conference:7/Session:3`) because several operations accept
//! them as plain strings from callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Store kind name for Profile entities.
pub const PROFILE_KIND: &str = "Profile";
/// Store kind name for Conference entities.
pub const CONFERENCE_KIND: &str = "Conference";
/// Store kind name for Session entities.
pub const SESSION_KIND: &str = "Session";

/// Errors raised while constructing or parsing keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("key string is empty")]
    Empty,

    #[error("malformed key segment '{0}', expected 'Kind:id'")]
    MalformedSegment(String),

    #[error("expected kind '{expected}', found '{actual}'")]
    WrongKind { expected: &'static str, actual: String },

    #[error("id '{0}' is not a valid numeric id")]
    NonNumericId(String),

    #[error("id '{0}' contains a reserved character")]
    ReservedCharacter(String),
}

/// One `(kind, id)` step of an entity key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySegment {
    pub kind: String,
    pub id: String,
}

impl KeySegment {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Untyped hierarchical key: the full ancestor path of an entity.
///
/// # Invariants
///
/// - At least one segment.
/// - Segment ids never contain `/` (the path separator). Kinds never
///   contain `:`, so parsing splits each segment on the first `:` and the
///   remainder of the segment is the id, which may itself contain `:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityKey {
    segments: Vec<KeySegment>,
}

impl EntityKey {
    /// Creates a root key with a single segment.
    pub fn root(kind: impl Into<String>, id: impl Into<String>) -> Result<Self, KeyError> {
        let segment = KeySegment::new(kind, id);
        Self::validate_segment(&segment)?;
        Ok(Self {
            segments: vec![segment],
        })
    }

    /// Creates a key one level below this one.
    pub fn child(&self, kind: impl Into<String>, id: impl Into<String>) -> Result<Self, KeyError> {
        let segment = KeySegment::new(kind, id);
        Self::validate_segment(&segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    fn validate_segment(segment: &KeySegment) -> Result<(), KeyError> {
        if segment.id.is_empty() || segment.kind.is_empty() {
            return Err(KeyError::MalformedSegment(segment.to_string()));
        }
        if segment.id.contains('/') {
            return Err(KeyError::ReservedCharacter(segment.id.clone()));
        }
        Ok(())
    }

    /// The kind of the entity this key addresses (its last segment).
    pub fn kind(&self) -> &str {
        &self.segments.last().expect("key has at least one segment").kind
    }

    /// The id of the entity this key addresses (its last segment).
    pub fn id(&self) -> &str {
        &self.segments.last().expect("key has at least one segment").id
    }

    /// The key of the enclosing entity group member one level up, if any.
    pub fn parent(&self) -> Option<EntityKey> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// All path segments, root first.
    pub fn segments(&self) -> &[KeySegment] {
        &self.segments
    }

    /// Whether `ancestor` is a strict prefix of this key's path.
    pub fn is_descendant_of(&self, ancestor: &EntityKey) -> bool {
        self.segments.len() > ancestor.segments.len()
            && self.segments[..ancestor.segments.len()] == ancestor.segments[..]
    }

    /// The stable string form accepted back by [`EntityKey::from_str`].
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for EntityKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(KeyError::Empty);
        }
        let mut segments = Vec::new();
        for part in s.split('/') {
            let (kind, id) = part
                .split_once(':')
                .ok_or_else(|| KeyError::MalformedSegment(part.to_string()))?;
            let segment = KeySegment::new(kind, id);
            Self::validate_segment(&segment)?;
            segments.push(segment);
        }
        Ok(Self { segments })
    }
}

impl TryFrom<String> for EntityKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityKey> for String {
    fn from(key: EntityKey) -> Self {
        key.to_string()
    }
}

/// Key of an attendee/organizer Profile: the identity provider's stable id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileKey {
    user_id: String,
}

impl ProfileKey {
    pub fn new(user_id: impl Into<String>) -> Result<Self, KeyError> {
        let user_id = user_id.into();
        if user_id.is_empty() {
            return Err(KeyError::Empty);
        }
        if user_id.contains('/') {
            return Err(KeyError::ReservedCharacter(user_id));
        }
        Ok(Self { user_id })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn entity_key(&self) -> EntityKey {
        EntityKey::root(PROFILE_KIND, &self.user_id).expect("profile key is pre-validated")
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity_key())
    }
}

impl FromStr for ProfileKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: EntityKey = s.parse()?;
        Self::try_from(key)
    }
}

impl TryFrom<EntityKey> for ProfileKey {
    type Error = KeyError;

    fn try_from(key: EntityKey) -> Result<Self, Self::Error> {
        let [segment] = key.segments() else {
            return Err(KeyError::WrongKind {
                expected: PROFILE_KIND,
                actual: key.to_string(),
            });
        };
        if segment.kind != PROFILE_KIND {
            return Err(KeyError::WrongKind {
                expected: PROFILE_KIND,
                actual: segment.kind.clone(),
            });
        }
        Self::new(segment.id.clone())
    }
}

impl TryFrom<String> for ProfileKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProfileKey> for String {
    fn from(key: ProfileKey) -> Self {
        key.to_string()
    }
}

/// Key of a Conference: a numeric id under its organizer's Profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConferenceKey {
    organizer: ProfileKey,
    id: u64,
}

impl ConferenceKey {
    pub fn new(organizer: ProfileKey, id: u64) -> Self {
        Self { organizer, id }
    }

    pub fn organizer(&self) -> &ProfileKey {
        &self.organizer
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn entity_key(&self) -> EntityKey {
        self.organizer
            .entity_key()
            .child(CONFERENCE_KIND, self.id.to_string())
            .expect("numeric id contains no reserved characters")
    }
}

impl fmt::Display for ConferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity_key())
    }
}

impl FromStr for ConferenceKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: EntityKey = s.parse()?;
        Self::try_from(key)
    }
}

impl TryFrom<EntityKey> for ConferenceKey {
    type Error = KeyError;

    fn try_from(key: EntityKey) -> Result<Self, Self::Error> {
        if key.kind() != CONFERENCE_KIND || key.segments().len() != 2 {
            return Err(KeyError::WrongKind {
                expected: CONFERENCE_KIND,
                actual: key.to_string(),
            });
        }
        let organizer = ProfileKey::try_from(key.parent().expect("two segments"))?;
        let id = key
            .id()
            .parse::<u64>()
            .map_err(|_| KeyError::NonNumericId(key.id().to_string()))?;
        Ok(Self::new(organizer, id))
    }
}

impl TryFrom<String> for ConferenceKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConferenceKey> for String {
    fn from(key: ConferenceKey) -> Self {
        key.to_string()
    }
}

/// Key of a Session: a numeric id under its Conference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionKey {
    conference: ConferenceKey,
    id: u64,
}

impl SessionKey {
    pub fn new(conference: ConferenceKey, id: u64) -> Self {
        Self { conference, id }
    }

    pub fn conference(&self) -> &ConferenceKey {
        &self.conference
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn entity_key(&self) -> EntityKey {
        self.conference
            .entity_key()
            .child(SESSION_KIND, self.id.to_string())
            .expect("numeric id contains no reserved characters")
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity_key())
    }
}

impl FromStr for SessionKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: EntityKey = s.parse()?;
        Self::try_from(key)
    }
}

impl TryFrom<EntityKey> for SessionKey {
    type Error = KeyError;

    fn try_from(key: EntityKey) -> Result<Self, Self::Error> {
        if key.kind() != SESSION_KIND || key.segments().len() != 3 {
            return Err(KeyError::WrongKind {
                expected: SESSION_KIND,
                actual: key.to_string(),
            });
        }
        let conference = ConferenceKey::try_from(key.parent().expect("three segments"))?;
        let id = key
            .id()
            .parse::<u64>()
            .map_err(|_| KeyError::NonNumericId(key.id().to_string()))?;
        Ok(Self::new(conference, id))
    }
}

impl TryFrom<String> for SessionKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SessionKey> for String {
    fn from(key: SessionKey) -> Self {
        key.to_string()
    }
}
