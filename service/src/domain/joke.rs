//! [`Joke`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::User;
use crate::domain::{field, user};

/// Joke submitted by a [`User`].
#[derive(Clone, Debug)]
pub struct Joke {
    /// ID of this [`Joke`].
    pub id: Id,

    /// [`Name`] of this [`Joke`].
    pub name: Name,

    /// [`Content`] of this [`Joke`].
    pub content: Content,

    /// ID of the [`User`] who submitted this [`Joke`].
    pub jokester_id: user::Id,

    /// [`DateTime`] when this [`Joke`] was created.
    pub created_at: CreationDateTime,
}

impl Joke {
    /// Name of the database constraint binding a [`Joke`] to an existing
    /// [`User`].
    pub const JOKESTER_CONSTRAINT: &'static str = "jokes_jokester_id_fkey";
}

/// ID of a [`Joke`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Name of a [`Joke`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` passes
    /// [`field::Kind::JokeName`] validation.
    ///
    /// # Errors
    ///
    /// If the `name` is too short.
    pub fn new(name: impl Into<String>) -> Result<Self, field::Invalid> {
        let name = name.into();
        field::Kind::JokeName.validate(&name)?;
        Ok(Self(name))
    }
}

impl FromStr for Name {
    type Err = field::Invalid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Content of a [`Joke`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Content(String);

impl Content {
    /// Creates a new [`Content`] if the given `text` passes
    /// [`field::Kind::JokeContent`] validation.
    ///
    /// # Errors
    ///
    /// If the `text` is too short.
    pub fn new(text: impl Into<String>) -> Result<Self, field::Invalid> {
        let text = text.into();
        field::Kind::JokeContent.validate(&text)?;
        Ok(Self(text))
    }
}

impl FromStr for Content {
    type Err = field::Invalid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Selector of the most recently created [`Joke`]s, newest first.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Latest {
    /// Maximum number of [`Joke`]s to select.
    pub limit: u16,
}

/// [`DateTime`] when a [`Joke`] was created.
pub type CreationDateTime = DateTimeOf<(Joke, unit::Creation)>;
