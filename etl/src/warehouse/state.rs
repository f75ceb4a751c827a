use chrono::NaiveDateTime;
use sqlx::SqliteConnection;

use crate::error::EtlResult;

/// Returns the watermark stored for `table`, or `None` when the table was never synchronized.
pub(crate) async fn load_watermark(
    conn: &mut SqliteConnection,
    table: &str,
) -> EtlResult<Option<NaiveDateTime>> {
    let watermark = sqlx::query_scalar(
        "select last_sync_timestamp from sync_state where table_name = ?",
    )
    .bind(table)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(watermark)
}

/// Creates or overwrites the watermark of `table`.
pub(crate) async fn store_watermark(
    conn: &mut SqliteConnection,
    table: &str,
    watermark: NaiveDateTime,
) -> EtlResult<()> {
    sqlx::query(
        r#"
        insert into sync_state (table_name, last_sync_timestamp)
        values (?, ?)
        on conflict (table_name) do update set last_sync_timestamp = excluded.last_sync_timestamp
        "#,
    )
    .bind(table)
    .bind(watermark)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Deletes every stored watermark.
pub(crate) async fn clear_watermarks(conn: &mut SqliteConnection) -> EtlResult<()> {
    sqlx::query("delete from sync_state")
        .execute(&mut *conn)
        .await?;

    Ok(())
}
