//! Engine-wide tunables. There is no dynamic reconfiguration after `open`.

/// Configuration consumed by [`crate::db::Database::open`].
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Whether `Pager::flush` calls `fsync` on the data file after draining
    /// the dirty list. Disabling this relies on the WAL alone for durability.
    pub sync_on_flush: bool,
    /// Extension appended to the data file path to derive the WAL path.
    pub wal_extension: &'static str,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sync_on_flush: true,
            wal_extension: "wal",
        }
    }
}
