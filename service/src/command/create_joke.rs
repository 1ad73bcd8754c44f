//! [`Command`] for creating a new [`Joke`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::joke::{Content, Name};
use crate::{
    domain::{joke, user, Joke, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Joke`] on behalf of a [`User`].
#[derive(Clone, Debug)]
pub struct CreateJoke {
    /// ID of the [`User`] submitting the [`Joke`].
    pub jokester_id: user::Id,

    /// [`Name`] of a new [`Joke`].
    pub name: joke::Name,

    /// [`Content`] of a new [`Joke`].
    pub content: joke::Content,
}

impl<Db> Command<CreateJoke> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<Joke>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Joke;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateJoke) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateJoke {
            jokester_id,
            name,
            content,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        drop(
            tx.execute(Select(By::new(jokester_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::JokesterNotExists(jokester_id))
                .map_err(tracerr::wrap!())?,
        );

        let joke = Joke {
            id: joke::Id::new(),
            name,
            content,
            jokester_id,
            created_at: DateTime::now().coerce(),
        };

        let inserted = tx.execute(Insert(joke.clone())).await;
        if let Err(e) = &inserted {
            if e.as_ref().is_foreign_key_violation(Joke::JOKESTER_CONSTRAINT) {
                return Err(tracerr::new!(E::JokesterNotExists(jokester_id)));
            }
        }
        inserted
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(
            joke.id = %joke.id,
            jokester.id = %jokester_id,
            "created new `Joke`",
        );

        Ok(joke)
    }
}

/// Error of [`CreateJoke`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] submitting the [`Joke`] does not exist.
    #[display("Jokester `User(id: {_0})` does not exist")]
    #[from(ignore)]
    JokesterNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};
    use secrecy::SecretBox;

    use crate::{
        command::CreateUser,
        domain::{
            joke::{self, Content, Name},
            user::{self, Password, Username},
            Joke,
        },
        infra::{memory::Lagging, Database as _, Memory},
        Command as _, Service,
    };

    use super::{CreateJoke, ExecutionError};

    fn create_joke(jokester_id: user::Id) -> CreateJoke {
        CreateJoke {
            jokester_id,
            name: Name::new("Road worker").unwrap(),
            content: Content::new(
                "I never wanted to believe that my Dad was stealing from his \
                 job as a road worker. But when I got home, all the signs \
                 were there.",
            )
            .unwrap(),
        }
    }

    #[tokio::test]
    async fn creates_joke_of_existing_user() {
        let service = Service::<Memory>::for_tests();
        let user = service
            .execute(CreateUser {
                username: Username::new("kody").unwrap(),
                password: SecretBox::new(Box::new(
                    Password::new("twixrox").unwrap(),
                )),
            })
            .await
            .unwrap();

        let joke = service.execute(create_joke(user.id)).await.unwrap();

        assert_eq!(joke.jokester_id, user.id);
        let stored: Option<Joke> = service
            .database()
            .execute(Select(By::<Option<Joke>, _>::new(joke.id)))
            .await
            .unwrap();
        let stored = stored.unwrap();
        assert_eq!(stored.name.to_string(), "Road worker");
        assert_eq!(stored.jokester_id, user.id);
    }

    #[tokio::test]
    async fn rejects_unknown_jokester() {
        let service = Service::<Memory>::for_tests();

        let err = service
            .execute(create_joke(user::Id::new()))
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::JokesterNotExists(_)),
            "unexpected error: {err}",
        );
    }

    #[tokio::test]
    async fn reports_missing_jokester_removed_after_check() {
        let service = Service::<Lagging>::for_tests();
        let removed = Service::new(
            service.config().clone(),
            service.database().snapshot.clone(),
        )
        .execute(CreateUser {
            username: Username::new("kody").unwrap(),
            password: SecretBox::new(Box::new(
                Password::new("twixrox").unwrap(),
            )),
        })
        .await
        .unwrap();

        let err = service
            .execute(create_joke(removed.id))
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::JokesterNotExists(id) if *id == removed.id,
            ),
            "unexpected error: {err}",
        );
        let latest: Vec<Joke> = service
            .database()
            .storage
            .execute(Select(By::<Vec<Joke>, _>::new(joke::Latest {
                limit: 5,
            })))
            .await
            .unwrap();
        assert!(latest.is_empty());
    }
}
