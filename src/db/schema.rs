/// Schema for the record cache and the sync cursor.
///
/// `search_name` is the case-folded name. `height`/`weight` are NULL for
/// basic records. Categories and abilities are
/// comma-joined slugs, stats a JSON array.
pub const SCHEMA: &str = r#"
PRAGMA journal_mode=WAL;

CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    search_name TEXT NOT NULL,
    source_url TEXT NOT NULL,
    categories TEXT,
    height INTEGER,
    weight INTEGER,
    abilities TEXT,
    stats TEXT,
    audio_url TEXT,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_records_search_name ON records(search_name);

-- Named integer values (the background cursor)
CREATE TABLE IF NOT EXISTS sync_state (
    key TEXT PRIMARY KEY,
    value INTEGER NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
