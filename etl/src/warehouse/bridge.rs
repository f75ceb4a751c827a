use sqlx::SqliteConnection;

use crate::error::EtlResult;

/// Association tables resolving many-to-many relationships between dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeTable {
    FilmActor,
    FilmCategory,
}

impl BridgeTable {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FilmActor => "bridge_film_actor",
            Self::FilmCategory => "bridge_film_category",
        }
    }

    /// Column referencing the dimension on the other side of the film.
    const fn other_key(&self) -> &'static str {
        match self {
            Self::FilmActor => "actor_key",
            Self::FilmCategory => "category_key",
        }
    }
}

/// Deletes every row of both bridge tables.
pub(crate) async fn clear_bridges(conn: &mut SqliteConnection) -> EtlResult<()> {
    for bridge in [BridgeTable::FilmActor, BridgeTable::FilmCategory] {
        sqlx::query(&format!("delete from {}", bridge.name()))
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Inserts `(film_key, other_key)` pairs into `bridge`.
pub(crate) async fn insert_bridge_rows(
    conn: &mut SqliteConnection,
    bridge: BridgeTable,
    rows: &[(i64, i64)],
) -> EtlResult<()> {
    let insert_sql = format!(
        "insert into {} (film_key, {}) values (?, ?)",
        bridge.name(),
        bridge.other_key()
    );

    for &(film_key, other_key) in rows {
        sqlx::query(&insert_sql)
            .bind(film_key)
            .bind(other_key)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}
