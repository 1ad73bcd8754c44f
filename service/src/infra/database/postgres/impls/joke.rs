//! [`Joke`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{joke, Joke},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Converts the provided [`Row`] of the `jokes` table into a [`Joke`].
fn from_row(row: &Row) -> Joke {
    Joke {
        id: row.get("id"),
        name: row.get("name"),
        content: row.get("content"),
        jokester_id: row.get("jokester_id"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Joke>, joke::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Joke>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Joke>, joke::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, content, jokester_id, created_at \
            FROM jokes \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Joke>, joke::Latest>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Joke>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Joke>, joke::Latest>>,
    ) -> Result<Self::Ok, Self::Err> {
        let limit = i64::from(by.into_inner().limit);

        const SQL: &str = "\
            SELECT id, name, content, jokester_id, created_at \
            FROM jokes \
            ORDER BY created_at DESC \
            LIMIT $1::INT8";
        Ok(self
            .query(SQL, &[&limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Joke>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(joke): Insert<Joke>,
    ) -> Result<Self::Ok, Self::Err> {
        let Joke {
            id,
            name,
            content,
            jokester_id,
            created_at,
        } = joke;

        const SQL: &str = "\
            INSERT INTO jokes (id, name, content, jokester_id, created_at) \
            VALUES ($1::UUID, $2::VARCHAR, $3::TEXT, $4::UUID, \
                    $5::TIMESTAMPTZ)";
        let _ = self
            .exec(SQL, &[&id, &name, &content, &jokester_id, &created_at])
            .await
            .map_err(tracerr::wrap!())?;
        Ok(())
    }
}
