//! In-memory [`Database`] implementation.
//!
//! Enforces the same constraints as the Postgres schema does, so the
//! business logic observes the same failures. Transactions are not
//! isolated: [`Transact`] returns the same store and [`Commit`] is a no-op.

use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use common::operations::{By, Commit, Insert, Select, Transact};
use derive_more::{Display, Error as StdError};
use tokio::sync::RwLock;
use tracerr::Traced;

use crate::{
    domain::{joke, user, Joke, User},
    infra::{database, Database},
};

/// In-memory [`Database`].
///
/// Clones share the same underlying storage.
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<RwLock<State>>);

/// Stored data of a [`Memory`] database.
#[derive(Debug, Default)]
struct State {
    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,

    /// Stored [`Joke`]s.
    jokes: HashMap<joke::Id, Joke>,
}

/// [`Memory`] database error.
#[derive(Clone, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint violation.
    #[display("Unique constraint `{_0}` violated")]
    UniqueViolation(#[error(not(source))] &'static str),

    /// Foreign key constraint violation.
    #[display("Foreign key constraint `{_0}` violated")]
    ForeignKeyViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks whether this [`Error`] is a violation of the unique
    /// `constraint`.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: &str) -> bool {
        matches!(self, Self::UniqueViolation(c) if *c == constraint)
    }

    /// Checks whether this [`Error`] is a violation of the foreign key
    /// `constraint`.
    #[must_use]
    pub fn is_foreign_key_violation(&self, constraint: &str) -> bool {
        matches!(self, Self::ForeignKeyViolation(c) if *c == constraint)
    }
}

impl From<Error> for Traced<database::Error> {
    fn from(e: Error) -> Self {
        tracerr::new!(database::Error::Memory(e))
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.0.read().await.users.get(by.as_inner()).cloned())
    }
}

impl<'l> Database<Select<By<Option<User>, &'l user::Username>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        let username = by.into_inner();
        Ok(self
            .0
            .read()
            .await
            .users
            .values()
            .find(|u| &u.username == username)
            .cloned())
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.0.write().await;
        if state.users.contains_key(&user.id) {
            return Err(Error::UniqueViolation("users_pkey").into());
        }
        if state.users.values().any(|u| u.username == user.username) {
            return Err(
                Error::UniqueViolation(user::Username::UNIQUE_CONSTRAINT)
                    .into(),
            );
        }
        drop(state.users.insert(user.id, user));
        Ok(())
    }
}

impl Database<Select<By<Option<Joke>, joke::Id>>> for Memory {
    type Ok = Option<Joke>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Joke>, joke::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.0.read().await.jokes.get(by.as_inner()).cloned())
    }
}

impl Database<Select<By<Vec<Joke>, joke::Latest>>> for Memory {
    type Ok = Vec<Joke>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Joke>, joke::Latest>>,
    ) -> Result<Self::Ok, Self::Err> {
        let joke::Latest { limit } = by.into_inner();

        let mut jokes =
            self.0.read().await.jokes.values().cloned().collect::<Vec<_>>();
        jokes.sort_by_key(|j| Reverse(j.created_at));
        jokes.truncate(limit.into());
        Ok(jokes)
    }
}

impl Database<Insert<Joke>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(joke): Insert<Joke>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.0.write().await;
        if state.jokes.contains_key(&joke.id) {
            return Err(Error::UniqueViolation("jokes_pkey").into());
        }
        if !state.users.contains_key(&joke.jokester_id) {
            return Err(
                Error::ForeignKeyViolation(Joke::JOKESTER_CONSTRAINT).into()
            );
        }
        drop(state.jokes.insert(joke.id, joke));
        Ok(())
    }
}

/// [`Memory`] database whose reads see an outdated `snapshot` while writes
/// go to the actual `storage`.
///
/// Reproduces another transaction changing data between a check and a
/// write.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub(crate) struct Lagging {
    /// Storage [`Select`]s are answered from.
    pub(crate) snapshot: Memory,

    /// Storage [`Insert`]s go to.
    pub(crate) storage: Memory,
}

#[cfg(test)]
impl Database<Transact> for Lagging {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

#[cfg(test)]
impl Database<Commit> for Lagging {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, op: Commit) -> Result<Self::Ok, Self::Err> {
        self.storage.execute(op).await
    }
}

#[cfg(test)]
impl<Op> Database<Select<Op>> for Lagging
where
    Memory: Database<Select<Op>, Err = Traced<database::Error>>,
{
    type Ok = <Memory as Database<Select<Op>>>::Ok;
    type Err = Traced<database::Error>;

    async fn execute(&self, op: Select<Op>) -> Result<Self::Ok, Self::Err> {
        self.snapshot.execute(op).await
    }
}

#[cfg(test)]
impl<T> Database<Insert<T>> for Lagging
where
    Memory: Database<Insert<T>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, op: Insert<T>) -> Result<Self::Ok, Self::Err> {
        self.storage.execute(op).await
    }
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Insert, Select},
        DateTime,
    };

    use crate::{
        domain::{
            joke,
            user::{self, Password, PasswordHash, Username},
            Joke, User,
        },
        infra::Database as _,
    };

    use super::Memory;

    fn user(name: &str) -> User {
        User {
            id: user::Id::new(),
            username: Username::new(name).unwrap(),
            password_hash: PasswordHash::new(
                &Password::new("twixrox").unwrap(),
                4 /* bcrypt minimum cost */,
            )
            .unwrap(),
            created_at: DateTime::now().coerce(),
        }
    }

    fn joke(jokester_id: user::Id) -> Joke {
        Joke {
            id: joke::Id::new(),
            name: joke::Name::new("Frisbee").unwrap(),
            content: joke::Content::new("It kept getting bigger.").unwrap(),
            jokester_id,
            created_at: DateTime::now().coerce(),
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_username_on_insert() {
        let db = Memory::default();
        db.execute(Insert(user("kody"))).await.unwrap();

        let err = db.execute(Insert(user("kody"))).await.unwrap_err();

        assert!(err.as_ref().is_unique_violation(Username::UNIQUE_CONSTRAINT));
        assert!(!err.as_ref().is_foreign_key_violation(
            Joke::JOKESTER_CONSTRAINT,
        ));
    }

    #[tokio::test]
    async fn rejects_joke_of_unknown_jokester() {
        let db = Memory::default();

        let err = db.execute(Insert(joke(user::Id::new()))).await.unwrap_err();

        assert!(err.as_ref().is_foreign_key_violation(
            Joke::JOKESTER_CONSTRAINT,
        ));
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let db = Memory::default();
        let kody = user("kody");
        let id = kody.id;

        db.clone().execute(Insert(kody)).await.unwrap();

        let found: Option<User> =
            db.execute(Select(By::<Option<User>, _>::new(id))).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(id));
    }
}
