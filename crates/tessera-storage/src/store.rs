//! SQLite-backed entity store

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use tessera_items::{
    Bookmark, EntityStore, Item, ItemError, ItemKind, ItemScope, PinnedTab, Profile, SessionKey,
    Space, Tab,
};

use crate::database::Database;
use crate::error::StorageError;

const ITEM_COLUMNS: &str = "id, owner, title, url, favicon, position, created_at, updated_at";

fn table_for(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Bookmark => "bookmarks",
        ItemKind::Tab => "tabs",
        ItemKind::PinnedTab => "pinned_tabs",
    }
}

fn owner_column(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Bookmark | ItemKind::Tab => "space_id",
        ItemKind::PinnedTab => "profile_id",
    }
}

/// `SELECT` over one item table with the owner column aliased to `owner`
fn select_items(kind: ItemKind) -> String {
    format!(
        "SELECT {cols} FROM (SELECT id, {owner} AS owner, title, url, favicon, position, \
         created_at, updated_at FROM {table})",
        cols = ITEM_COLUMNS,
        owner = owner_column(kind),
        table = table_for(kind),
    )
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_uuid(table: &'static str, value: &str) -> crate::Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| StorageError::CorruptRow {
        table,
        reason: format!("bad id {:?}: {}", value, e),
    })
}

/// Raw columns of an item row, before ids are parsed
struct ItemRow {
    id: String,
    owner: Option<String>,
    title: String,
    url: String,
    favicon: Option<Vec<u8>>,
    position: i64,
    created_at: String,
    updated_at: String,
}

impl ItemRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            title: row.get(2)?,
            url: row.get(3)?,
            favicon: row.get(4)?,
            position: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn into_item(self, kind: ItemKind) -> crate::Result<Item> {
        let table = table_for(kind);
        let id = parse_uuid(table, &self.id)?;
        let owner = self
            .owner
            .as_deref()
            .map(|owner| parse_uuid(table, owner))
            .transpose()?;
        let created_at = parse_timestamp(&self.created_at);
        let updated_at = parse_timestamp(&self.updated_at);

        let space_id = || {
            owner.ok_or_else(|| StorageError::CorruptRow {
                table,
                reason: format!("{} has no space", self.id),
            })
        };

        Ok(match kind {
            ItemKind::Bookmark => Item::Bookmark(Bookmark {
                id,
                space_id: space_id()?,
                title: self.title,
                url: self.url,
                favicon: self.favicon,
                position: self.position,
                created_at,
                updated_at,
            }),
            ItemKind::Tab => Item::Tab(Tab {
                id,
                space_id: space_id()?,
                title: self.title,
                url: self.url,
                favicon: self.favicon,
                position: self.position,
                created_at,
                updated_at,
            }),
            ItemKind::PinnedTab => Item::PinnedTab(PinnedTab {
                id,
                profile_id: owner,
                title: self.title,
                url: self.url,
                favicon: self.favicon,
                position: self.position,
                created_at,
                updated_at,
            }),
        })
    }
}

fn owner_value(item: &Item) -> Option<String> {
    match item {
        Item::Bookmark(b) => Some(b.space_id.to_string()),
        Item::Tab(t) => Some(t.space_id.to_string()),
        Item::PinnedTab(p) => p.profile_id.map(|id| id.to_string()),
    }
}

fn write_item(conn: &Connection, item: &Item) -> crate::Result<()> {
    let kind = item.kind();
    let sql = format!(
        "INSERT OR REPLACE INTO {table}
         (id, {owner}, title, url, favicon, position, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        table = table_for(kind),
        owner = owner_column(kind),
    );

    conn.execute(
        &sql,
        rusqlite::params![
            item.id().to_string(),
            owner_value(item),
            item.title(),
            item.url(),
            item.favicon(),
            item.position(),
            item.created_at().to_rfc3339(),
            item.updated_at().to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn erase_item(conn: &Connection, key: &SessionKey) -> crate::Result<()> {
    conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", table_for(key.kind)),
        [key.id.to_string()],
    )?;
    Ok(())
}

/// [`EntityStore`] over the Tessera SQLite schema
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn query_items(
        &self,
        kind: ItemKind,
        filter: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> crate::Result<Vec<Item>> {
        let rows: Vec<ItemRow> = self.db.with_connection(|conn| {
            let sql = format!(
                "{} {} ORDER BY position, created_at",
                select_items(kind),
                filter
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params, ItemRow::read)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            match row.into_item(kind) {
                Ok(item) => items.push(item),
                Err(e) => tracing::warn!(kind = %kind, error = %e, "Skipping corrupt item row"),
            }
        }
        Ok(items)
    }
}

impl SqliteStore {
    /// `UPDATE` one column of an existing row, skipping rows that already
    /// hold `value`
    fn update_column(
        &self,
        key: &SessionKey,
        column: &'static str,
        value: &dyn rusqlite::ToSql,
    ) -> crate::Result<bool> {
        let updated = self.db.with_connection(|conn| {
            let sql = format!(
                "UPDATE {table} SET {column} = ?1, updated_at = ?2 \
                 WHERE id = ?3 AND {column} IS NOT ?1",
                table = table_for(key.kind),
                column = column,
            );
            Ok(conn.execute(
                &sql,
                rusqlite::params![value, Utc::now().to_rfc3339(), key.id.to_string()],
            )?)
        })?;
        Ok(updated > 0)
    }
}

impl Clone for SqliteStore {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl EntityStore for SqliteStore {
    fn load_items(&self, kind: ItemKind, scope: ItemScope) -> tessera_items::Result<Vec<Item>> {
        let items = match (kind, scope) {
            (_, ItemScope::All) => self.query_items(kind, "", &[])?,
            (ItemKind::PinnedTab, ItemScope::Space(_)) => Vec::new(),
            (_, ItemScope::Space(space_id)) => {
                self.query_items(kind, "WHERE owner = ?1", &[&space_id.to_string()])?
            }
            (ItemKind::PinnedTab, ItemScope::Profile(Some(profile_id))) => {
                self.query_items(kind, "WHERE owner = ?1", &[&profile_id.to_string()])?
            }
            (ItemKind::PinnedTab, ItemScope::Profile(None)) => {
                self.query_items(kind, "WHERE owner IS NULL", &[])?
            }
            (_, ItemScope::Profile(Some(profile_id))) => self.query_items(
                kind,
                "WHERE owner IN (SELECT id FROM spaces WHERE profile_id = ?1)",
                &[&profile_id.to_string()],
            )?,
            (_, ItemScope::Profile(None)) => self.query_items(
                kind,
                "WHERE owner IN (SELECT id FROM spaces WHERE profile_id IS NULL)",
                &[],
            )?,
        };
        Ok(items)
    }

    fn load_item(&self, key: &SessionKey) -> tessera_items::Result<Option<Item>> {
        let row = self.db.with_connection(|conn| {
            let sql = format!("{} WHERE id = ?1", select_items(key.kind));
            let row = conn
                .query_row(&sql, [key.id.to_string()], ItemRow::read)
                .optional()?;
            Ok(row)
        })?;

        Ok(row.map(|row| row.into_item(key.kind)).transpose()?)
    }

    fn save(&self, item: &Item) -> tessera_items::Result<()> {
        self.db.with_connection(|conn| write_item(conn, item))?;
        tracing::debug!(item = %item.key(), "Saved item");
        Ok(())
    }

    fn update_title(&self, key: &SessionKey, title: &str) -> tessera_items::Result<bool> {
        Ok(self.update_column(key, "title", &title)?)
    }

    fn update_url(&self, key: &SessionKey, url: &str) -> tessera_items::Result<bool> {
        Ok(self.update_column(key, "url", &url)?)
    }

    fn update_favicon(&self, key: &SessionKey, bytes: &[u8]) -> tessera_items::Result<bool> {
        Ok(self.update_column(key, "favicon", &bytes)?)
    }

    fn delete_item(&self, key: &SessionKey) -> tessera_items::Result<()> {
        self.db.with_connection(|conn| erase_item(conn, key))?;
        tracing::info!(item = %key, "Deleted item");
        Ok(())
    }

    fn replace_item(&self, old: &SessionKey, new: &Item) -> tessera_items::Result<()> {
        self.db.transaction(|conn| {
            write_item(conn, new)?;
            erase_item(conn, old)
        })?;
        tracing::info!(from = %old, to = %new.key(), "Replaced item");
        Ok(())
    }

    fn list_profiles(&self) -> tessera_items::Result<Vec<Profile>> {
        let rows: Vec<(String, String, String, String)> = self.db.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, color, created_at FROM profiles ORDER BY created_at")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        let mut profiles = Vec::with_capacity(rows.len());
        for (id, name, color, created_at) in rows {
            profiles.push(Profile {
                id: parse_uuid("profiles", &id)?,
                name,
                color,
                created_at: parse_timestamp(&created_at),
            });
        }
        Ok(profiles)
    }

    fn list_spaces(&self) -> tessera_items::Result<Vec<Space>> {
        let rows: Vec<(String, String, Option<String>, i64, String)> =
            self.db.with_connection(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, profile_id, position, created_at FROM spaces
                     ORDER BY position, created_at",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })?;

        let mut spaces = Vec::with_capacity(rows.len());
        for (id, name, profile_id, position, created_at) in rows {
            spaces.push(Space {
                id: parse_uuid("spaces", &id)?,
                name,
                profile_id: profile_id
                    .as_deref()
                    .map(|id| parse_uuid("spaces", id))
                    .transpose()?,
                position,
                created_at: parse_timestamp(&created_at),
            });
        }
        Ok(spaces)
    }

    fn save_profile(&self, profile: &Profile) -> tessera_items::Result<()> {
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO profiles (id, name, color, created_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, color = excluded.color",
                rusqlite::params![
                    profile.id.to_string(),
                    profile.name,
                    profile.color,
                    profile.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })?;
        Ok(())
    }

    fn save_space(&self, space: &Space) -> tessera_items::Result<()> {
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO spaces (id, name, profile_id, position, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name,
                     profile_id = excluded.profile_id, position = excluded.position",
                rusqlite::params![
                    space.id.to_string(),
                    space.name,
                    space.profile_id.map(|id| id.to_string()),
                    space.position,
                    space.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })?;
        Ok(())
    }

    fn delete_profile(&self, id: Uuid) -> tessera_items::Result<()> {
        // Spaces fall back to no profile and pinned tabs cascade
        self.db.with_connection(|conn| {
            conn.execute("DELETE FROM profiles WHERE id = ?1", [id.to_string()])?;
            Ok(())
        })?;
        tracing::info!(profile_id = %id, "Deleted profile");
        Ok(())
    }
}
