//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Password, Username};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`User`].
#[derive(Debug)]
pub struct CreateUser {
    /// [`Username`] of a new [`User`].
    pub username: user::Username,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'l> Database<
            Select<By<Option<User>, &'l user::Username>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser { username, password } = cmd;

        let password_hash = user::PasswordHash::new(
            password.expose_secret(),
            self.config().password_hash_cost,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existing = tx
            .execute(Select(By::new(&username)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::UsernameOccupied(username)));
        }

        let user = User {
            id: user::Id::new(),
            username,
            password_hash,
            created_at: DateTime::now().coerce(),
        };

        // Concurrent registrations may both pass the check above, so the
        // unique constraint has the final word.
        let inserted = tx.execute(Insert(user.clone())).await;
        if let Err(e) = &inserted {
            if e.as_ref()
                .is_unique_violation(user::Username::UNIQUE_CONSTRAINT)
            {
                return Err(tracerr::new!(E::UsernameOccupied(user.username)));
            }
        }
        inserted
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(user.id = %user.id, "registered new `User`");

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Password`] hashing error.
    #[display("{_0}")]
    PasswordHash(user::HashError),

    /// [`Username`] is already occupied.
    #[display("User with username `{_0}` already exists")]
    #[from(ignore)]
    UsernameOccupied(#[error(not(source))] user::Username),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};
    use secrecy::SecretBox;

    use crate::{
        domain::{
            user::{Password, Username},
            User,
        },
        infra::{memory::Lagging, Database as _, Memory},
        Command as _, Service,
    };

    use super::{CreateUser, ExecutionError};

    fn create_user(username: &str, password: &str) -> CreateUser {
        CreateUser {
            username: Username::new(username).unwrap(),
            password: SecretBox::new(Box::new(Password::new(password).unwrap())),
        }
    }

    #[tokio::test]
    async fn registers_user_with_hashed_password() {
        let service = Service::<Memory>::for_tests();

        let user = service
            .execute(create_user("kody", "twixrox"))
            .await
            .unwrap();

        assert_eq!(user.username.to_string(), "kody");
        assert!(user.password_hash.matches(&Password::new("twixrox").unwrap()));
        assert_ne!(user.password_hash.to_string(), "twixrox");

        let stored: Option<User> = service
            .database()
            .execute(Select(By::<Option<User>, _>::new(&user.username)))
            .await
            .unwrap();
        assert_eq!(stored.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn rejects_occupied_username() {
        let service = Service::<Memory>::for_tests();

        let first = service
            .execute(create_user("kody", "twixrox"))
            .await
            .unwrap();
        let err = service
            .execute(create_user("kody", "another1"))
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::UsernameOccupied(u) if u.to_string() == "kody",
            ),
            "unexpected error: {err}",
        );
        assert_eq!(
            err.as_ref().to_string(),
            "User with username `kody` already exists",
        );

        let stored: Option<User> = service
            .database()
            .execute(Select(By::<Option<User>, _>::new(&first.username)))
            .await
            .unwrap();
        assert_eq!(stored.map(|u| u.id), Some(first.id));
    }

    #[tokio::test]
    async fn reports_occupied_username_when_losing_race() {
        let service = Service::<Lagging>::for_tests();
        let concurrent = Service::new(
            service.config().clone(),
            service.database().storage.clone(),
        );
        let winner = concurrent
            .execute(create_user("kody", "twixrox"))
            .await
            .unwrap();

        let err = service
            .execute(create_user("kody", "another1"))
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::UsernameOccupied(u) if u.to_string() == "kody",
            ),
            "unexpected error: {err}",
        );
        let stored: Option<User> = concurrent
            .database()
            .execute(Select(By::<Option<User>, _>::new(&winner.username)))
            .await
            .unwrap();
        assert_eq!(stored.map(|u| u.id), Some(winner.id));
    }
}
