use std::collections::HashSet;

use anyhow::Context;
use rusqlite::Connection;

/// Embedded schema migrations, applied in order.
const MIGRATIONS: &[(&str, &str)] = &[
    ("001_init.sql", include_str!("../../migrations/001_init.sql")),
    (
        "002_booking_notes.sql",
        include_str!("../../migrations/002_booking_notes.sql"),
    ),
];

fn applied_migrations(conn: &Connection) -> anyhow::Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM _migrations")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()
        .context("failed to read applied migrations")?;
    Ok(names)
}

/// Applies every pending migration. Each one commits together with its
/// `_migrations` record, so a failed migration leaves no trace.
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    let applied = applied_migrations(conn)?;
    let pending = MIGRATIONS
        .iter()
        .filter(|(name, _)| !applied.contains(*name));

    for (name, sql) in pending {
        let tx = conn
            .unchecked_transaction()
            .with_context(|| format!("failed to begin migration: {name}"))?;
        tx.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;
        tx.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;
        tx.commit()
            .with_context(|| format!("failed to commit migration: {name}"))?;

        tracing::info!(migration = name, "applied migration");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let applied = applied_migrations(&conn).unwrap();
        assert_eq!(applied.len(), MIGRATIONS.len());
        assert!(applied.contains("001_init.sql"));
    }

    #[test]
    fn test_schema_rejects_inverted_booking() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO users (id, full_name, email, api_token) VALUES ('u', 'U', 'u@x', 't');
             INSERT INTO facilities (id, owner_id, name, price_per_hour, address_line1, city,
                 state, pincode, created_at, updated_at)
             VALUES ('f', 'u', 'F', 100, 'l1', 'c', 's', 'p', '2030-01-01 00:00:00',
                 '2030-01-01 00:00:00');",
        )
        .unwrap();

        let inverted = conn.execute(
            "INSERT INTO bookings (id, user_id, facility_id, start_time, end_time, amount,
                 created_at, updated_at)
             VALUES ('b', 'u', 'f', '2030-01-01 12:00:00', '2030-01-01 10:00:00', 0,
                 '2030-01-01 00:00:00', '2030-01-01 00:00:00')",
            [],
        );
        assert!(inverted.is_err());
    }
}
