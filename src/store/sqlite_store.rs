//! Embedded SQLite store implementing both persistence seams.
use anyhow::Context;
use async_trait::async_trait;
use bitcoin::hashes::Hash;
use bitcoin::BlockHash;
use rusqlite::{params, Connection, OptionalExtension};
use std::{path::PathBuf, str::FromStr};
use tokio::task;

use crate::block::Block;
use crate::store::{BlockStore, StateStore};

/// Schema:
///   state(key TEXT PRIMARY KEY, value TEXT NOT NULL)
///   blocks(header_hash TEXT PRIMARY KEY,   -- hex of raw hash bytes
///          reversed_hex TEXT NOT NULL,     -- display/lookup key
///          height INTEGER NOT NULL,
///          prev_hash TEXT)                 -- optional chain link
///
/// State keys used:
///  - api_synced : "0" | "1"
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Creates/initializes the SQLite file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let conn = Connection::open(&path)
            .with_context(|| format!("open sqlite at {}", path.display()))?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;

            CREATE TABLE IF NOT EXISTS state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS blocks (
                header_hash  TEXT PRIMARY KEY,
                reversed_hex TEXT NOT NULL,
                height       INTEGER NOT NULL,
                prev_hash    TEXT
            );

            CREATE INDEX IF NOT EXISTS blocks_reversed_hex ON blocks(reversed_hex);
            "#,
        )?;
        Ok(Self { path })
    }

    fn kv_get(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
        let mut stmt = conn.prepare("SELECT value FROM state WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            let v: String = row.get(0)?;
            Ok(Some(v))
        } else {
            Ok(None)
        }
    }

    fn kv_set(conn: &Connection, key: &str, val: &str) -> anyhow::Result<()> {
        conn.execute(
            "INSERT INTO state(key,value) VALUES(?1,?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, val],
        )?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn api_synced(&self) -> anyhow::Result<bool> {
        let path = self.path.clone();
        task::spawn_blocking(move || {
            let conn = Connection::open(path)?;
            Ok(Self::kv_get(&conn, "api_synced")?.as_deref() == Some("1"))
        })
        .await?
    }

    async fn set_api_synced(&self, synced: bool) -> anyhow::Result<()> {
        let path = self.path.clone();
        task::spawn_blocking(move || {
            let conn = Connection::open(path)?;
            Self::kv_set(&conn, "api_synced", if synced { "1" } else { "0" })
        })
        .await?
    }
}

#[async_trait]
impl BlockStore for SqliteStore {
    async fn insert(&self, block: &Block) -> anyhow::Result<()> {
        let path = self.path.clone();
        let block = block.clone();
        task::spawn_blocking(move || {
            let conn = Connection::open(path)?;
            conn.execute(
                "INSERT INTO blocks(header_hash, reversed_hex, height, prev_hash)
                 VALUES(?1, ?2, ?3, ?4)
                 ON CONFLICT(header_hash) DO NOTHING",
                params![
                    hex::encode(block.header_hash.to_byte_array()),
                    block.reversed_hex(),
                    block.height,
                    block.previous.map(|p| p.to_string()),
                ],
            )?;
            Ok(())
        })
        .await?
    }

    async fn count(&self) -> anyhow::Result<u64> {
        let path = self.path.clone();
        task::spawn_blocking(move || {
            let conn = Connection::open(path)?;
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM blocks", [], |row| row.get(0))?;
            Ok(n as u64)
        })
        .await?
    }

    async fn block_by_reversed_hex(&self, hex: &str) -> anyhow::Result<Option<Block>> {
        let path = self.path.clone();
        let hex = hex.to_string();
        task::spawn_blocking(move || {
            let conn = Connection::open(path)?;
            let mut stmt = conn.prepare(
                "SELECT reversed_hex, height, prev_hash FROM blocks WHERE reversed_hex = ?1",
            )?;
            let row = stmt
                .query_row(params![hex], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                })
                .optional()?;

            match row {
                Some((reversed, height, prev)) => {
                    let header_hash =
                        BlockHash::from_str(&reversed).context("parse stored reversed hex")?;
                    let previous = prev
                        .map(|p| BlockHash::from_str(&p))
                        .transpose()
                        .context("parse stored prev hash")?;
                    Ok(Some(Block {
                        header_hash,
                        height,
                        previous,
                    }))
                }
                None => Ok(None),
            }
        })
        .await?
    }
}
