//! Domain operations over entries and their tags.
//!
//! Each public operation runs in a single transaction, so the
//! remove-then-insert sequence of an overwrite is never observed half done.
//! Mutating operations take the write lock up front with `BEGIN IMMEDIATE`;
//! concurrent writers wait on the busy timeout.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::error::AppError;
use crate::models::{Entry, NewEntry, Tag};
use crate::store;

async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

/// Current state of `name`; an unknown name yields an entry with no tags.
async fn load_entry(conn: &mut SqliteConnection, name: &str) -> Result<Entry, AppError> {
    let Some(id) = store::find_entry_id(conn, name).await? else {
        return Ok(Entry::unknown(name));
    };
    let tags = store::list_entry_tags(conn, &id).await?;
    Ok(Entry {
        id: Some(id),
        name: name.to_string(),
        tags,
    })
}

async fn require_entry_id(conn: &mut SqliteConnection, name: &str) -> Result<String, AppError> {
    store::find_entry_id(conn, name)
        .await?
        .ok_or_else(|| AppError::EntryNotFound(Some(name.to_string())))
}

/// Attaches `tag` to an existing entry, detaching any other value held under
/// the same tag name first.
async fn attach_tag(conn: &mut SqliteConnection, name: &str, tag: &Tag) -> Result<Entry, AppError> {
    let entry_id = require_entry_id(conn, name).await?;

    for existing in store::list_entry_tags(conn, &entry_id).await? {
        if existing.name != tag.name || existing.value == tag.value {
            continue;
        }
        if let Some(old_id) = store::find_tag_id(conn, &existing.name, &existing.value).await? {
            tracing::debug!(
                entry = name,
                tag = %existing.name,
                old = %existing.value,
                new = %tag.value,
                "overwriting tag value"
            );
            store::remove_junction(conn, &entry_id, &old_id).await?;
        }
    }

    let tag_id = store::insert_tag(conn, &tag.name, &tag.value).await?;
    store::insert_junction(conn, &entry_id, &tag_id).await?;

    load_entry(conn, name).await
}

async fn create_in(conn: &mut SqliteConnection, new: &NewEntry) -> Result<Entry, AppError> {
    if let Some(dup) = new.duplicate_tag_name() {
        return Err(AppError::DuplicateTag(dup.to_string()));
    }

    store::insert_entry(conn, &new.name).await?;
    let mut entry = load_entry(conn, &new.name).await?;
    for tag in &new.tags {
        entry = attach_tag(conn, &new.name, tag).await?;
    }
    Ok(entry)
}

/// Get-or-create `new.name`, then add each of its tags with overwrite semantics.
pub async fn create_entry(pool: &SqlitePool, new: &NewEntry) -> Result<Entry, AppError> {
    let mut tx = begin_write(pool).await?;
    let entry = create_in(&mut tx, new).await?;
    tx.commit().await?;
    Ok(entry)
}

/// Creates every entry in `entries` in one transaction; nothing is kept if
/// any of them is rejected.
pub async fn import_entries(pool: &SqlitePool, entries: &[NewEntry]) -> Result<usize, AppError> {
    let mut tx = begin_write(pool).await?;
    for new in entries {
        create_in(&mut tx, new).await?;
    }
    tx.commit().await?;
    tracing::info!(count = entries.len(), "imported entries");
    Ok(entries.len())
}

pub async fn add_tag_to_entry(pool: &SqlitePool, name: &str, tag: &Tag) -> Result<Entry, AppError> {
    let mut tx = begin_write(pool).await?;
    let entry = attach_tag(&mut tx, name, tag).await?;
    tx.commit().await?;
    Ok(entry)
}

/// Like [`add_tag_to_entry`], for requests that also name the tag in the path.
pub async fn add_named_tag(
    pool: &SqlitePool,
    name: &str,
    tag_name: &str,
    tag: &Tag,
) -> Result<Entry, AppError> {
    if tag.name != tag_name {
        return Err(AppError::TagNameMismatch {
            path: tag_name.to_string(),
            body: tag.name.clone(),
        });
    }
    add_tag_to_entry(pool, name, tag).await
}

/// Detaches the tag called `tag_name` if the entry holds one. Never fails for
/// an absent tag; returns the entry as it stands afterwards.
pub async fn remove_tag_from_entry(
    pool: &SqlitePool,
    name: &str,
    tag_name: &str,
) -> Result<Entry, AppError> {
    let mut tx = begin_write(pool).await?;
    let current = load_entry(&mut tx, name).await?;

    if let (Some(entry_id), Some(tag)) = (current.id.as_deref(), current.tag(tag_name)) {
        if let Some(tag_id) = store::find_tag_id(&mut tx, &tag.name, &tag.value).await? {
            store::remove_junction(&mut tx, entry_id, &tag_id).await?;
            tracing::info!(entry = name, tag = tag_name, "removed tag");
        }
    }

    let entry = load_entry(&mut tx, name).await?;
    tx.commit().await?;
    Ok(entry)
}

/// Deletes the entry and its associations, returning its state just before.
///
/// An entry whose current state carries no tags counts as not found.
pub async fn delete_entry(pool: &SqlitePool, name: &str) -> Result<Entry, AppError> {
    let mut tx = begin_write(pool).await?;
    let before = load_entry(&mut tx, name).await?;
    if before.tags.is_empty() {
        return Err(AppError::EntryNotFound(Some(name.to_string())));
    }
    let entry_id = require_entry_id(&mut tx, name).await?;

    store::delete_entry(&mut tx, &entry_id).await?;
    tx.commit().await?;
    tracing::info!(entry = name, "deleted entry");
    Ok(before)
}

/// Never fails for an unknown name: the result simply has no tags.
pub async fn get_entry(pool: &SqlitePool, name: &str) -> Result<Entry, AppError> {
    let mut conn = pool.acquire().await?;
    load_entry(&mut conn, name).await
}

/// Every entry holding at least one tag; fails when there are none at all.
pub async fn get_all_entries(pool: &SqlitePool) -> Result<Vec<Entry>, AppError> {
    let mut conn = pool.acquire().await?;
    let entries = store::list_all_entries(&mut conn).await?;
    if entries.is_empty() {
        return Err(AppError::EntryNotFound(None));
    }
    Ok(entries)
}

pub async fn list_entry_tags(pool: &SqlitePool, name: &str) -> Result<Vec<Tag>, AppError> {
    let mut conn = pool.acquire().await?;
    let entry_id = require_entry_id(&mut conn, name).await?;
    Ok(store::list_entry_tags(&mut conn, &entry_id).await?)
}

pub async fn get_entry_tag(pool: &SqlitePool, name: &str, tag_name: &str) -> Result<Tag, AppError> {
    let tags = list_entry_tags(pool, name).await?;
    tags.into_iter()
        .find(|t| t.name == tag_name)
        .ok_or_else(|| AppError::TagNotFound {
            entry: name.to_string(),
            tag: tag_name.to_string(),
        })
}

/// All stored entries, tagged or not.
pub async fn export_entries(pool: &SqlitePool) -> Result<Vec<Entry>, AppError> {
    let mut conn = pool.acquire().await?;
    Ok(store::dump_entries(&mut conn).await?)
}
