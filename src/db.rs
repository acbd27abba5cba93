//! SQLite persistence for the track catalog and user preferences.
//!
//! Two tables: `track` holds the imported catalog, `preference` holds the
//! user preference signals consulted by the enricher. Schema management
//! beyond these two tables is out of scope.

use anyhow::{bail, Context, Result};
use log::{info, trace};
use rusqlite::Connection;
use std::path::Path;

use crate::catalog::Track;
use crate::enrich::PreferenceTrack;

/// Open (creating if needed) the catalog database and ensure the schema.
pub fn connect(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open catalog database at {}", db_path.display()))?;
    ensure_schema(&conn)?;
    Ok(conn)
}

fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS track (
            id           INTEGER PRIMARY KEY,
            track_name   TEXT    NOT NULL,
            artist_name  TEXT    NOT NULL,
            valence      REAL    NOT NULL,
            energy       REAL    NOT NULL,
            danceability REAL    NOT NULL,
            acousticness REAL    NOT NULL,
            tempo        REAL    NOT NULL,
            popularity   INTEGER NOT NULL
        )",
        (),
    )
    .context("Failed to create track table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS preference (
            id          INTEGER PRIMARY KEY,
            user_id     TEXT    NOT NULL,
            track_name  TEXT    NOT NULL,
            artist_name TEXT    NOT NULL,
            popularity  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL
        )",
        (),
    )
    .context("Failed to create preference table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_preference_user ON preference(user_id, updated_at)",
        (),
    )
    .context("Failed to create preference index")?;

    Ok(())
}

/// Import a full catalog, replacing any previous one when `force` is set.
/// Refuses to clobber an existing catalog otherwise.
pub fn init_catalog(conn: &mut Connection, tracks: &[Track], force: bool) -> Result<()> {
    let existing = count_tracks(conn)?;
    if existing > 0 {
        if !force {
            bail!("catalog already holds {existing} tracks; pass --force to replace it");
        }
        conn.execute("DELETE FROM track", ())
            .context("Failed to clear existing catalog")?;
    }

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO track
             (track_name, artist_name, valence, energy, danceability, acousticness, tempo, popularity)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for track in tracks {
            stmt.execute((
                &track.track_name,
                &track.artist_name,
                track.valence,
                track.energy,
                track.danceability,
                track.acousticness,
                track.tempo,
                track.popularity,
            ))
            .with_context(|| format!("Failed to insert track {:?}", track.track_name))?;
        }
    }
    tx.commit().context("Failed to commit catalog import")?;

    info!("Imported {} tracks into the catalog", tracks.len());
    Ok(())
}

/// Load the full catalog in insertion order.
pub fn load_tracks(conn: &Connection) -> Result<Vec<Track>> {
    let mut stmt = conn
        .prepare(
            "SELECT track_name, artist_name, valence, energy, danceability,
                    acousticness, tempo, popularity
             FROM track ORDER BY id",
        )
        .context("Failed to prepare catalog query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(Track {
                track_name: row.get(0)?,
                artist_name: row.get(1)?,
                valence: row.get(2)?,
                energy: row.get(3)?,
                danceability: row.get(4)?,
                acousticness: row.get(5)?,
                tempo: row.get(6)?,
                popularity: row.get(7)?,
            })
        })
        .context("Failed to query catalog")?;

    let mut tracks = Vec::new();
    for track in rows {
        tracks.push(track.context("Failed to read catalog row")?);
    }
    trace!("Loaded {} catalog tracks", tracks.len());
    Ok(tracks)
}

pub fn count_tracks(conn: &Connection) -> Result<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM track", [], |row| row.get(0))
        .context("Failed to count catalog tracks")?;
    Ok(count as usize)
}

/// Record one preference track for a user.
pub fn add_preference(
    conn: &Connection,
    user_id: &str,
    track_name: &str,
    artist_name: &str,
    popularity: u8,
) -> Result<()> {
    conn.execute(
        "INSERT INTO preference (user_id, track_name, artist_name, popularity, updated_at)
         VALUES (?1, ?2, ?3, ?4, strftime('%s', 'now'))",
        (user_id, track_name, artist_name, popularity),
    )
    .with_context(|| format!("Failed to record preference for user {user_id}"))?;
    Ok(())
}

/// Up to `limit` most-recently-updated preference tracks for a user.
/// Insertion order breaks same-second ties.
pub fn fetch_preferences(
    conn: &Connection,
    user_id: &str,
    limit: usize,
) -> Result<Vec<PreferenceTrack>> {
    let mut stmt = conn
        .prepare(
            "SELECT track_name, artist_name, popularity FROM preference
             WHERE user_id = ?1
             ORDER BY updated_at DESC, id DESC
             LIMIT ?2",
        )
        .context("Failed to prepare preference query")?;

    let rows = stmt
        .query_map((user_id, limit as i64), |row| {
            Ok(PreferenceTrack {
                track_name: row.get(0)?,
                artist_name: row.get(1)?,
                popularity: row.get(2)?,
            })
        })
        .context("Failed to query preferences")?;

    let mut preferences = Vec::new();
    for preference in rows {
        preferences.push(preference.context("Failed to read preference row")?);
    }
    Ok(preferences)
}
