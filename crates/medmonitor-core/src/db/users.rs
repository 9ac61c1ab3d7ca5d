//! User database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::medications::integer_or;
use super::{Database, DbResult};
use crate::models::{NewUser, User};

/// SELECT list for a user row. A non-numeric age reads back as 0.
fn user_columns() -> String {
    format!("id, name, {}", integer_or("age", 0))
}

impl Database {
    /// Insert a validated user, returning the store-assigned ID.
    pub fn insert_user(&self, user: &NewUser) -> DbResult<i64> {
        self.conn.execute(
            "INSERT INTO users (name, age) VALUES (?1, ?2)",
            params![user.name(), user.age()],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, "inserted user");
        Ok(id)
    }

    /// Get a user by ID.
    pub fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", user_columns()),
                [id],
                user_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Search users whose name contains `query`, ignoring case.
    ///
    /// `%` and `_` in the query match literally. An empty query matches every
    /// user. Case folding follows SQLite's LIKE, which folds ASCII only.
    pub fn search_users(&self, query: &str) -> DbResult<Vec<User>> {
        let pattern = format!("%{}%", escape_like(query));
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE name LIKE ?1 ESCAPE '\'
            ORDER BY id
            "#,
            user_columns()
        ))?;

        let rows = stmt.query_map([pattern], user_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List all users in insertion order.
    pub fn list_users(&self) -> DbResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM users ORDER BY id", user_columns()))?;

        let rows = stmt.query_map([], user_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
    })
}

fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
