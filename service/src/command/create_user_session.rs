//! [`Command`] for creating a [`Session`].

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{session::Token, Password, Username};
use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`].
#[derive(Debug, From)]
pub enum CreateUserSession {
    /// Create a new [`Session`] by [`User`] credentials.
    ByCredentials {
        /// [`Username`] of a [`User`].
        username: user::Username,

        /// [`Password`] of a [`User`].
        password: SecretBox<user::Password>,
    },

    /// Create a new [`Session`] by [`User`] ID.
    ///
    /// Used right after registration, when the credentials are known to be
    /// valid.
    ByUserId(user::Id),
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Token`] of the created [`Session`].
    pub token: session::Token,

    /// [`User`] whose [`Session`] has been created.
    pub user: User,

    /// [`DateTime`] when the [`Session`] expires.
    pub expires_at: session::ExpirationDateTime,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Username>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use CreateUserSession as Cmd;
        use ExecutionError as E;

        let user = match cmd {
            Cmd::ByCredentials { username, password } => {
                let user = self
                    .database()
                    .execute(Select(By::new(&username)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::WrongCredentials)
                    .map_err(tracerr::wrap!())?;

                if !user.password_hash.matches(password.expose_secret()) {
                    return Err(tracerr::new!(E::WrongCredentials));
                }

                user
            }
            Cmd::ByUserId(user_id) => self
                .database()
                .execute(Select(By::new(user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::UserNotExists(user_id))
                .map_err(tracerr::wrap!())?,
        };

        let expires_at =
            (DateTime::now() + self.config().session_lifetime).coerce();
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &Session {
                user_id: user.id,
                expires_at,
            },
            &self.config().jwt_encoding_key,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(Output {
            token: session::Token::signed(token),
            user,
            expires_at,
        })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    JsonWebTokenEncodeError(jsonwebtoken::errors::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`CreateUserSession::ByCredentials`] contains wrong credentials.
    #[display("Username/Password combination is incorrect")]
    WrongCredentials,
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use secrecy::SecretBox;

    use crate::{
        command::CreateUser,
        domain::user::{self, Password, Username},
        infra::Memory,
        Command as _, Service,
    };

    use super::{CreateUserSession, ExecutionError};

    const DAY: u64 = 60 * 60 * 24;

    fn secret(password: &str) -> SecretBox<Password> {
        SecretBox::new(Box::new(Password::new(password).unwrap()))
    }

    async fn registered(service: &Service<Memory>) -> user::Id {
        service
            .execute(CreateUser {
                username: Username::new("kody").unwrap(),
                password: secret("twixrox"),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn creates_session_by_credentials() {
        let service = Service::<Memory>::for_tests();
        let user_id = registered(&service).await;

        let out = service
            .execute(CreateUserSession::ByCredentials {
                username: Username::new("kody").unwrap(),
                password: secret("twixrox"),
            })
            .await
            .unwrap();

        assert_eq!(out.user.id, user_id);
        assert!(!out.expires_at.is_past());
        assert!(!(out.expires_at - Duration::from_secs(29 * DAY)).is_past());
        assert!((out.expires_at - Duration::from_secs(31 * DAY)).is_past());
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let service = Service::<Memory>::for_tests();
        drop(registered(&service).await);

        let err = service
            .execute(CreateUserSession::ByCredentials {
                username: Username::new("kody").unwrap(),
                password: secret("twixrox!"),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::WrongCredentials),
            "unexpected error: {err}",
        );
    }

    #[tokio::test]
    async fn rejects_unknown_username() {
        let service = Service::<Memory>::for_tests();

        let err = service
            .execute(CreateUserSession::ByCredentials {
                username: Username::new("nobody").unwrap(),
                password: secret("twixrox"),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::WrongCredentials),
            "unexpected error: {err}",
        );
    }

    #[tokio::test]
    async fn creates_session_by_user_id() {
        let service = Service::<Memory>::for_tests();
        let user_id = registered(&service).await;

        let out = service
            .execute(CreateUserSession::ByUserId(user_id))
            .await
            .unwrap();
        assert_eq!(out.user.id, user_id);

        let err = service
            .execute(CreateUserSession::ByUserId(user::Id::new()))
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::UserNotExists(_)),
            "unexpected error: {err}",
        );
    }
}
