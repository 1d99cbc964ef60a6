use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::models::{join_numbers, parse_numbers, Draw};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    date     TEXT PRIMARY KEY,
    numbers  TEXT NOT NULL
);
";

const STORED_SEPARATOR: char = '-';

/// Resolves a configured database path against the working directory.
pub fn db_path(configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        return configured.to_path_buf();
    }
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push(configured);
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory {:?}", parent))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("Cannot open database {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA).context("Migration failed")?;
    Ok(())
}

/// Returns `false` when a draw with the same date is already stored.
pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let changed = conn
        .execute(
            "INSERT OR IGNORE INTO draws (date, numbers) VALUES (?1, ?2)",
            rusqlite::params![draw.date, join_numbers(&draw.numbers, STORED_SEPARATOR)],
        )
        .context("Insert failed")?;
    Ok(changed > 0)
}

/// Most recent draws first; `index` starts at 1 for the latest draw.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt =
        conn.prepare("SELECT date, numbers FROM draws ORDER BY date DESC LIMIT ?1")?;
    let rows = stmt
        .query_map([limit], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .enumerate()
        .map(|(i, (date, raw))| {
            let numbers = parse_numbers(&raw, STORED_SEPARATOR)
                .with_context(|| format!("Corrupted draw {}", date))?;
            Ok(Draw::new(i as u32 + 1, date, numbers))
        })
        .collect()
}

pub fn fetch_history(conn: &Connection) -> Result<Vec<Draw>> {
    let n = count_draws(conn)?;
    fetch_last_draws(conn, n)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draw(date: &str) -> Draw {
        Draw::new(0, date, vec![1, 2, 3, 4, 5, 6])
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_count() {
        let conn = memory_db();
        assert_eq!(count_draws(&conn).unwrap(), 0);

        insert_draw(&conn, &test_draw("2024-01-01")).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = memory_db();

        let inserted = insert_draw(&conn, &test_draw("2024-01-01")).unwrap();
        assert!(inserted);
        let inserted = insert_draw(&conn, &test_draw("2024-01-01")).unwrap();
        assert!(!inserted);
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_fetch_order_and_index() {
        let conn = memory_db();

        insert_draw(&conn, &test_draw("2024-01-01")).unwrap();
        insert_draw(&conn, &Draw::new(0, "2024-01-05", vec![40, 7, 12, 3, 33, 21])).unwrap();
        insert_draw(&conn, &test_draw("2024-01-03")).unwrap();

        let draws = fetch_last_draws(&conn, 10).unwrap();
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[0].date, "2024-01-05");
        assert_eq!(draws[0].index, 1);
        assert_eq!(draws[0].numbers, vec![3, 7, 12, 21, 33, 40]);
        assert_eq!(draws[1].date, "2024-01-03");
        assert_eq!(draws[2].date, "2024-01-01");
        assert_eq!(draws[2].index, 3);
    }

    #[test]
    fn test_fetch_history_returns_everything() {
        let conn = memory_db();
        for day in 1..=12 {
            insert_draw(&conn, &test_draw(&format!("2024-02-{:02}", day))).unwrap();
        }
        let history = fetch_history(&conn).unwrap();
        assert_eq!(history.len(), 12);
        assert_eq!(history[0].date, "2024-02-12");
    }

    #[test]
    fn test_db_path_resolution() {
        let absolute = Path::new("/var/lib/lotopt.db");
        assert_eq!(db_path(absolute), absolute.to_path_buf());
        let relative = db_path(Path::new("data/lotopt.db"));
        assert!(relative.ends_with("data/lotopt.db"));
    }
}
