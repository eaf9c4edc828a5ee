//! V001: node_state table.

pub const MIGRATION_SQL: &str = r#"
-- One row per decomposition node. Rows are never updated.
CREATE TABLE IF NOT EXISTS node_state (
    node_key TEXT PRIMARY KEY,
    depth INTEGER NOT NULL,
    member_count INTEGER NOT NULL,
    indices BLOB NOT NULL,
    mask BLOB NOT NULL,
    p_values BLOB NOT NULL,
    created_at INTEGER NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_node_state_depth
    ON node_state(depth);
"#;
