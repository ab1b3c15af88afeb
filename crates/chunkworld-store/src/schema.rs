//! Chunk store database schema.

/// SQL to create the chunks table.
pub const CREATE_CHUNKS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS chunks (
    id        TEXT PRIMARY KEY,
    width     INTEGER NOT NULL,
    height    INTEGER NOT NULL,
    data      BLOB NOT NULL,
    last_used INTEGER
)
";
