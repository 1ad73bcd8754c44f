//! Validation of user-submitted text fields.

use std::fmt;

use derive_more::Error;

/// Kind of a user-submitted text field.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    /// `User` name used to log in.
    Username,

    /// `User` password.
    Password,

    /// Name of a `Joke`.
    JokeName,

    /// Content of a `Joke`.
    JokeContent,
}

impl Kind {
    /// Returns the minimum length (in [`char`]s) of a valid field of this
    /// [`Kind`].
    #[must_use]
    pub const fn min_len(self) -> usize {
        match self {
            Self::Username | Self::JokeName => 3,
            Self::Password => 6,
            Self::JokeContent => 10,
        }
    }

    /// Validates the provided `value` as a field of this [`Kind`].
    ///
    /// # Errors
    ///
    /// With [`Invalid`] describing why the `value` was rejected.
    pub fn validate(self, value: impl AsRef<str>) -> Result<(), Invalid> {
        if value.as_ref().chars().count() < self.min_len() {
            return Err(Invalid {
                kind: self,
                reason: Reason::TooShort,
            });
        }
        Ok(())
    }
}

/// Reason of a field being rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reason {
    /// Field is shorter than [`Kind::min_len()`].
    TooShort,
}

/// Rejection of a field value.
///
/// Displays as a message suitable for showing next to the field.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub struct Invalid {
    /// [`Kind`] of the rejected field.
    pub kind: Kind,

    /// [`Reason`] the field was rejected for.
    pub reason: Reason,
}

impl Invalid {
    /// Returns a human-readable message describing this rejection.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match (self.kind, self.reason) {
            (Kind::Username, Reason::TooShort) => "That username is too short",
            (Kind::Password, Reason::TooShort) => "That password is too short",
            (Kind::JokeName, Reason::TooShort) => {
                "That joke's name is too short"
            }
            (Kind::JokeContent, Reason::TooShort) => "That joke is too short",
        }
    }
}

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod spec {
    use super::{Invalid, Kind, Reason};

    const KINDS: [Kind; 4] =
        [Kind::Username, Kind::Password, Kind::JokeName, Kind::JokeContent];

    #[test]
    fn rejects_shorter_than_min_len() {
        for kind in KINDS {
            for len in 0..kind.min_len() {
                assert_eq!(
                    kind.validate("x".repeat(len)),
                    Err(Invalid {
                        kind,
                        reason: Reason::TooShort,
                    }),
                    "{kind:?} of length {len}",
                );
            }
        }
    }

    #[test]
    fn accepts_min_len_and_longer() {
        for kind in KINDS {
            for len in kind.min_len()..kind.min_len() + 20 {
                assert_eq!(
                    kind.validate("x".repeat(len)),
                    Ok(()),
                    "{kind:?} of length {len}",
                );
            }
        }
    }

    #[test]
    fn min_lengths() {
        assert_eq!(Kind::Username.min_len(), 3);
        assert_eq!(Kind::Password.min_len(), 6);
        assert_eq!(Kind::JokeName.min_len(), 3);
        assert_eq!(Kind::JokeContent.min_len(), 10);
    }

    #[test]
    fn counts_chars_not_bytes() {
        // 2 chars, 4 bytes.
        assert!(Kind::Username.validate("жж").is_err());
        assert!(Kind::Username.validate("жжж").is_ok());
    }

    #[test]
    fn does_not_normalize() {
        assert!(Kind::Username.validate("   ").is_ok());
        assert!(Kind::JokeContent.validate(" a        ").is_ok());
    }

    #[test]
    fn messages() {
        let too_short = |kind| {
            Invalid {
                kind,
                reason: Reason::TooShort,
            }
            .to_string()
        };

        assert_eq!(too_short(Kind::Username), "That username is too short");
        assert_eq!(too_short(Kind::Password), "That password is too short");
        assert_eq!(
            too_short(Kind::JokeName),
            "That joke's name is too short",
        );
        assert_eq!(too_short(Kind::JokeContent), "That joke is too short");
    }
}
