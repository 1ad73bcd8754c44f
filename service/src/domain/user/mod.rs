//! [`User`] definitions.

pub mod session;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::field;

pub use self::session::Session;

/// Registered jokester.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Username`] of this [`User`].
    pub username: Username,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`User`].
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

/// Name a [`User`] logs in with.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Username(String);

impl Username {
    /// Name of the database constraint keeping [`Username`]s unique.
    pub const UNIQUE_CONSTRAINT: &'static str = "users_username_key";

    /// Creates a new [`Username`] if the given `name` passes
    /// [`field::Kind::Username`] validation.
    ///
    /// # Errors
    ///
    /// If the `name` is too short.
    pub fn new(name: impl Into<String>) -> Result<Self, field::Invalid> {
        let name = name.into();
        field::Kind::Username.validate(&name)?;
        Ok(Self(name))
    }
}

impl FromStr for Username {
    type Err = field::Invalid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Password of a [`User`].
#[derive(AsRef, Clone, Debug, Eq, PartialEq)]
#[as_ref(str)]
pub struct Password(String);

impl Password {
    /// Creates a new [`Password`] if the given `password` passes
    /// [`field::Kind::Password`] validation.
    ///
    /// # Errors
    ///
    /// If the `password` is too short.
    pub fn new(password: impl Into<String>) -> Result<Self, field::Invalid> {
        let password = password.into();
        field::Kind::Password.validate(&password)?;
        Ok(Self(password))
    }
}

impl FromStr for Password {
    type Err = field::Invalid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// [`bcrypt`] hash of a [`User`]'s [`Password`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes the provided [`Password`] with a random salt.
    ///
    /// # Errors
    ///
    /// If the `cost` is out of the range [`bcrypt`] accepts.
    pub fn new(password: &Password, cost: u32) -> Result<Self, HashError> {
        let password: &str = password.as_ref();
        bcrypt::hash(password, cost).map(Self).map_err(HashError)
    }

    /// Checks whether this [`PasswordHash`] was computed from the provided
    /// [`Password`].
    ///
    /// Malformed hashes never match.
    #[must_use]
    pub fn matches(&self, password: &Password) -> bool {
        let password: &str = password.as_ref();
        bcrypt::verify(password, &self.0).unwrap_or(false)
    }
}

/// Error of hashing a [`Password`].
#[derive(Debug, Display, Error)]
#[display("Failed to hash a password: {_0}")]
pub struct HashError(bcrypt::BcryptError);

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Password, PasswordHash, Username};

    #[test]
    fn username_requires_three_chars() {
        assert!(Username::new("al").is_err());
        assert_eq!(Username::new("ali").unwrap().to_string(), "ali");
        assert!("alice".parse::<Username>().is_ok());
    }

    #[test]
    fn password_requires_six_chars() {
        assert!(Password::new("12345").is_err());
        assert!(Password::new("123456").is_ok());
    }

    #[test]
    fn password_hash_matches_only_its_password() {
        let password = Password::new("secret123").unwrap();
        let hash = PasswordHash::new(&password, 4 /* bcrypt minimum cost */).unwrap();

        assert!(hash.matches(&password));
        assert!(!hash.matches(&Password::new("secret124").unwrap()));
        assert_ne!(hash.to_string(), "secret123");
    }

    #[test]
    fn password_hash_is_salted() {
        let password = Password::new("secret123").unwrap();

        assert_ne!(
            PasswordHash::new(&password, 4 /* bcrypt minimum cost */).unwrap(),
            PasswordHash::new(&password, 4 /* bcrypt minimum cost */).unwrap(),
        );
    }
}
