mod history_repository;

pub use history_repository::SqliteAuditStore;

/// SQLite stores integers as i64; versions and counts are u32 in the domain.
pub(crate) fn to_u32(value: i64, column: &str) -> anyhow::Result<u32> {
    u32::try_from(value).map_err(|_| anyhow::anyhow!("{} out of range: {}", column, value))
}
