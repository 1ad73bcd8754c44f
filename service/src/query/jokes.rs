//! [`Query`] collection related to multiple [`Joke`]s.

use common::operations::By;

use crate::domain::{joke, Joke};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries the most recently created [`Joke`]s, newest first.
pub type Latest = DatabaseQuery<By<Vec<Joke>, joke::Latest>>;
