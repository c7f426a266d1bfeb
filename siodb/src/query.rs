//! Query API types.
use std::{
    io::{Read, Write},
    marker::PhantomData,
};

use crate::{
    FromRow, Result, Row,
    connection::Connection,
    fetch::Rows,
    net::Socket,
    row::{RowNotFound, RowResult},
};

/// Entrypoint of the query API.
pub fn query<SQL, S, R>(sql: SQL, conn: &mut Connection<S>) -> Query<'_, SQL, S, R>
where
    S: Read + Write,
{
    Query { sql, conn, _p: PhantomData }
}

/// Same as [`query`] with [`Row`] as the output.
pub fn query_row<SQL, S>(sql: SQL, conn: &mut Connection<S>) -> Query<'_, SQL, S, Row>
where
    S: Read + Write,
{
    Query { sql, conn, _p: PhantomData }
}

/// Same as [`query`] with [`Row`] as the output, intended for [`Query::execute`].
pub fn execute<SQL, S>(sql: SQL, conn: &mut Connection<S>) -> Query<'_, SQL, S, Row>
where
    S: Read + Write,
{
    Query { sql, conn, _p: PhantomData }
}

/// The query API.
#[derive(Debug)]
#[must_use = "query is not sent until one of the fetch or execute method is called"]
pub struct Query<'c, SQL, S: Read + Write = Socket, R = Row> {
    sql: SQL,
    conn: &'c mut Connection<S>,
    _p: PhantomData<R>,
}

impl<'c, SQL, S, R> Query<'c, SQL, S, R>
where
    SQL: AsRef<str>,
    S: Read + Write,
{
    /// Fetch rows as an [`Iterator`].
    ///
    /// Rows left unread when the iterator is dropped are discarded.
    pub fn fetch(self) -> Result<Fetch<'c, S, R>> {
        let rows = self.conn.query(self.sql.as_ref())?;
        Ok(Fetch { rows, _p: PhantomData })
    }

    /// Fetch all rows into [`Vec`].
    pub fn fetch_all(self) -> Result<Vec<R>>
    where
        R: FromRow,
    {
        self.fetch()?.collect()
    }

    /// Fetch one row, discarding the rest.
    ///
    /// Returns [`RowNotFound`] error if the result set is empty.
    pub fn fetch_one(self) -> Result<R>
    where
        R: FromRow,
    {
        self.fetch_optional()?.ok_or_else(|| RowNotFound.into())
    }

    /// Optionally fetch one row, discarding the rest.
    pub fn fetch_optional(self) -> Result<Option<R>>
    where
        R: FromRow,
    {
        let mut fetch = self.fetch()?;
        let row = fetch.next().transpose()?;
        fetch.rows.close()?;
        Ok(row)
    }

    /// Execute statement and return number of rows affected.
    pub fn execute(self) -> Result<RowResult> {
        self.conn.execute(self.sql.as_ref())
    }
}

/// Rows decoded with [`FromRow`].
#[derive(Debug)]
pub struct Fetch<'c, S: Read + Write = Socket, R = Row> {
    rows: Rows<'c, S>,
    _p: PhantomData<R>,
}

impl<'c, S: Read + Write, R> Fetch<'c, S, R> {
    /// Returns the underlying result set.
    pub fn rows(&self) -> &Rows<'c, S> {
        &self.rows
    }

    /// Discard the remaining rows.
    pub fn close(self) -> Result<u64> {
        self.rows.close()
    }
}

impl<S: Read + Write, R: FromRow> Iterator for Fetch<'_, S, R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rows.next_row() {
            Ok(Some(row)) => Some(R::from_row(row).map_err(Into::into)),
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
