//! [`Session`] definitions.

use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// Claims of a signed, client-held [`User`] session.
///
/// Nothing is stored on the server: a [`Token`] carrying these claims is
/// valid as long as its signature verifies and it hasn't expired.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    pub user_id: user::Id,

    /// [`DateTime`] when this [`Session`] expires.
    ///
    /// [`DateTime`]: common::DateTime
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

/// Signed representation of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
pub struct Token(String);

impl Token {
    /// Wraps the provided `token` freshly signed by this crate.
    pub(crate) fn signed(token: String) -> Self {
        Self(token)
    }

    /// Wraps the provided `token` as it came from a client, without verifying
    /// it.
    ///
    /// Only [`AuthorizeUserSession`] tells whether it is a valid one.
    ///
    /// [`AuthorizeUserSession`]: crate::command::AuthorizeUserSession
    #[must_use]
    pub fn unverified(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

/// [`DateTime`] of a [`Session`] expiration.
///
/// [`DateTime`]: common::DateTime
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;
