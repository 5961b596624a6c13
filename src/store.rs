//! Persistence primitives over `entries`, `tags` and `entries_tags`.
//!
//! Every function takes a plain connection so callers can run several of them
//! inside one transaction. Nothing here enforces domain rules; lookups report
//! absence as `None` and inserts are get-or-create.

use chrono::Utc;
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use crate::models::{Entry, Tag};

/// One row of the entries → junction → tags join.
#[derive(FromRow)]
struct EntryTagRow {
    entry_id: String,
    entry_name: String,
    tag_name: String,
    tag_value: String,
}

#[derive(FromRow)]
struct EntryRow {
    entry_id: String,
    name: String,
}

pub async fn find_entry_id(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<String>, sqlx::Error> {
    let id: Option<(String,)> = sqlx::query_as("SELECT entry_id FROM entries WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id.map(|(id,)| id))
}

pub async fn find_tag_id(
    conn: &mut SqliteConnection,
    name: &str,
    value: &str,
) -> Result<Option<String>, sqlx::Error> {
    let id: Option<(String,)> =
        sqlx::query_as("SELECT tag_id FROM tags WHERE name = ? AND value = ?")
            .bind(name)
            .bind(value)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(id.map(|(id,)| id))
}

pub async fn insert_entry(conn: &mut SqliteConnection, name: &str) -> Result<String, sqlx::Error> {
    if let Some(id) = find_entry_id(conn, name).await? {
        return Ok(id);
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO entries (entry_id, name, created_at) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await?;
    tracing::info!(entry = name, "created entry");
    Ok(id)
}

pub async fn insert_tag(
    conn: &mut SqliteConnection,
    name: &str,
    value: &str,
) -> Result<String, sqlx::Error> {
    if let Some(id) = find_tag_id(conn, name, value).await? {
        return Ok(id);
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO tags (tag_id, name, value, created_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await?;
    Ok(id)
}

pub async fn junction_exists(
    conn: &mut SqliteConnection,
    entry_id: &str,
    tag_id: &str,
) -> Result<bool, sqlx::Error> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM entries_tags WHERE entry_id = ? AND tag_id = ?")
            .bind(entry_id)
            .bind(tag_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(count.0 > 0)
}

pub async fn insert_junction(
    conn: &mut SqliteConnection,
    entry_id: &str,
    tag_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO entries_tags (entry_id, tag_id) VALUES (?, ?)")
        .bind(entry_id)
        .bind(tag_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn remove_junction(
    conn: &mut SqliteConnection,
    entry_id: &str,
    tag_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM entries_tags WHERE entry_id = ? AND tag_id = ?")
        .bind(entry_id)
        .bind(tag_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Removes the entry's junction rows, then the entry itself. Tag rows stay.
pub async fn delete_entry(conn: &mut SqliteConnection, entry_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM entries_tags WHERE entry_id = ?")
        .bind(entry_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM entries WHERE entry_id = ?")
        .bind(entry_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn list_entry_tags(
    conn: &mut SqliteConnection,
    entry_id: &str,
) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT t.name, t.value
        FROM entries_tags et
        JOIN tags t ON t.tag_id = et.tag_id
        WHERE et.entry_id = ?
        ORDER BY et.rowid
        "#,
    )
    .bind(entry_id)
    .fetch_all(&mut *conn)
    .await
}

/// Entries that hold at least one tag, grouped from an inner join.
pub async fn list_all_entries(conn: &mut SqliteConnection) -> Result<Vec<Entry>, sqlx::Error> {
    let rows: Vec<EntryTagRow> = sqlx::query_as(
        r#"
        SELECT e.entry_id, e.name AS entry_name, t.name AS tag_name, t.value AS tag_value
        FROM entries e
        JOIN entries_tags et ON et.entry_id = e.entry_id
        JOIN tags t ON t.tag_id = et.tag_id
        ORDER BY e.rowid, et.rowid
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut entries: Vec<Entry> = Vec::new();
    for row in rows {
        let tag = Tag::new(row.tag_name, row.tag_value);
        match entries.last_mut() {
            Some(last) if last.id.as_deref() == Some(row.entry_id.as_str()) => last.tags.push(tag),
            _ => entries.push(Entry {
                id: Some(row.entry_id),
                name: row.entry_name,
                tags: vec![tag],
            }),
        }
    }
    Ok(entries)
}

/// Every stored entry with its tags, including entries that have none.
pub async fn dump_entries(conn: &mut SqliteConnection) -> Result<Vec<Entry>, sqlx::Error> {
    let rows: Vec<EntryRow> = sqlx::query_as("SELECT entry_id, name FROM entries ORDER BY rowid")
        .fetch_all(&mut *conn)
        .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let tags = list_entry_tags(conn, &row.entry_id).await?;
        entries.push(Entry {
            id: Some(row.entry_id),
            name: row.name,
            tags,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Connection;

    async fn memory_conn() -> SqliteConnection {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&mut conn).await.unwrap();
        conn
    }

    async fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
        let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        row.0
    }

    #[tokio::test]
    async fn insert_entry_is_get_or_create() {
        let mut conn = memory_conn().await;
        assert_eq!(find_entry_id(&mut conn, "web01").await.unwrap(), None);

        let first = insert_entry(&mut conn, "web01").await.unwrap();
        let second = insert_entry(&mut conn, "web01").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(count(&mut conn, "entries").await, 1);
        assert_eq!(find_entry_id(&mut conn, "web01").await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn insert_tag_is_keyed_by_name_and_value() {
        let mut conn = memory_conn().await;
        let a = insert_tag(&mut conn, "os", "linux").await.unwrap();
        let b = insert_tag(&mut conn, "os", "linux").await.unwrap();
        let c = insert_tag(&mut conn, "os", "freebsd").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(count(&mut conn, "tags").await, 2);
        assert_eq!(find_tag_id(&mut conn, "os", "freebsd").await.unwrap(), Some(c));
        assert_eq!(find_tag_id(&mut conn, "os", "plan9").await.unwrap(), None);
    }

    #[tokio::test]
    async fn junction_insert_and_remove_are_idempotent() {
        let mut conn = memory_conn().await;
        let entry = insert_entry(&mut conn, "web01").await.unwrap();
        let tag = insert_tag(&mut conn, "rack", "a3").await.unwrap();

        insert_junction(&mut conn, &entry, &tag).await.unwrap();
        insert_junction(&mut conn, &entry, &tag).await.unwrap();
        assert!(junction_exists(&mut conn, &entry, &tag).await.unwrap());
        assert_eq!(count(&mut conn, "entries_tags").await, 1);

        remove_junction(&mut conn, &entry, &tag).await.unwrap();
        remove_junction(&mut conn, &entry, &tag).await.unwrap();
        assert!(!junction_exists(&mut conn, &entry, &tag).await.unwrap());
    }

    #[tokio::test]
    async fn entry_tags_come_back_in_attachment_order() {
        let mut conn = memory_conn().await;
        let entry = insert_entry(&mut conn, "web01").await.unwrap();
        for (name, value) in [("zone", "eu"), ("os", "linux"), ("rack", "a3")] {
            let tag = insert_tag(&mut conn, name, value).await.unwrap();
            insert_junction(&mut conn, &entry, &tag).await.unwrap();
        }

        let names: Vec<String> = list_entry_tags(&mut conn, &entry)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, ["zone", "os", "rack"]);
    }

    #[tokio::test]
    async fn delete_entry_keeps_shared_tag_rows() {
        let mut conn = memory_conn().await;
        let web = insert_entry(&mut conn, "web01").await.unwrap();
        let db = insert_entry(&mut conn, "db01").await.unwrap();
        let tag = insert_tag(&mut conn, "os", "linux").await.unwrap();
        insert_junction(&mut conn, &web, &tag).await.unwrap();
        insert_junction(&mut conn, &db, &tag).await.unwrap();

        delete_entry(&mut conn, &web).await.unwrap();

        assert_eq!(find_entry_id(&mut conn, "web01").await.unwrap(), None);
        assert_eq!(count(&mut conn, "entries_tags").await, 1);
        assert_eq!(count(&mut conn, "tags").await, 1);
    }

    #[tokio::test]
    async fn list_all_entries_groups_rows_and_skips_untagged() {
        let mut conn = memory_conn().await;
        let web = insert_entry(&mut conn, "web01").await.unwrap();
        insert_entry(&mut conn, "bare").await.unwrap();
        let db = insert_entry(&mut conn, "db01").await.unwrap();
        for (entry, name, value) in [(&web, "os", "linux"), (&db, "os", "linux"), (&web, "rack", "a3")] {
            let tag = insert_tag(&mut conn, name, value).await.unwrap();
            insert_junction(&mut conn, entry, &tag).await.unwrap();
        }

        let entries = list_all_entries(&mut conn).await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["web01", "db01"]);
        assert_eq!(
            entries[0].tags,
            vec![Tag::new("os", "linux"), Tag::new("rack", "a3")]
        );

        let all = dump_entries(&mut conn).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|e| e.name == "bare" && e.tags.is_empty()));
    }
}
