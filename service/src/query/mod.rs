//! [`Query`] definition.

pub mod joke;
pub mod jokes;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, W, B> Query<DatabaseQuery<By<W, B>>> for Service<Db>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        DatabaseQuery(by): DatabaseQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        command::{CreateJoke, CreateUser},
        domain::{
            joke::{self, Content, Name},
            user::{self, Password, Username},
        },
        infra::Memory,
        query, Query as _, Service,
    };

    async fn jokester(service: &Service<Memory>) -> user::Id {
        service
            .execute(CreateUser {
                username: Username::new("kody").unwrap(),
                password: SecretBox::new(Box::new(
                    Password::new("twixrox").unwrap(),
                )),
            })
            .await
            .unwrap()
            .id
    }

    async fn tell(
        service: &Service<Memory>,
        jokester_id: user::Id,
        name: &str,
    ) -> joke::Id {
        service
            .execute(CreateJoke {
                jokester_id,
                name: Name::new(name).unwrap(),
                content: Content::new(format!("{name}, but funnier")).unwrap(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn selects_joke_by_id() {
        let service = Service::<Memory>::for_tests();
        let jokester_id = jokester(&service).await;
        let id = tell(&service, jokester_id, "Frisbee").await;

        let joke = service
            .execute(query::joke::ById::by(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(joke.name.to_string(), "Frisbee");
        assert_eq!(joke.content.to_string(), "Frisbee, but funnier");

        let missing = service
            .execute(query::joke::ById::by(joke::Id::new()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn selects_latest_jokes_newest_first() {
        let service = Service::<Memory>::for_tests();
        let jokester_id = jokester(&service).await;
        let mut ids = Vec::new();
        for name in ["First", "Second", "Third"] {
            ids.push(tell(&service, jokester_id, name).await);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let latest = service
            .execute(query::jokes::Latest::by(joke::Latest { limit: 2 }))
            .await
            .unwrap();

        assert_eq!(
            latest.iter().map(|j| j.id).collect::<Vec<_>>(),
            [ids[2], ids[1]],
        );
    }
}
