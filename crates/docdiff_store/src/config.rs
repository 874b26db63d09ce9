//! Store configuration.

/// Options for opening and writing store files.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Whether block checksums are verified on read.
    pub verify_checksums: bool,

    /// Whether the writer compresses document bodies.
    pub compress_bodies: bool,

    /// Whether the writer syncs the file after every commit.
    pub sync_on_commit: bool,

    /// Largest payload a block may declare; anything larger is corruption.
    pub max_block_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            compress_bodies: false,
            sync_on_commit: true,
            max_block_size: 64 * 1024 * 1024, // 64 MB
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether checksums are verified on read.
    #[must_use]
    pub const fn verify_checksums(mut self, value: bool) -> Self {
        self.verify_checksums = value;
        self
    }

    /// Sets whether bodies are compressed on write.
    #[must_use]
    pub const fn compress_bodies(mut self, value: bool) -> Self {
        self.compress_bodies = value;
        self
    }

    /// Sets whether commits are synced.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Sets the largest accepted block payload.
    #[must_use]
    pub const fn max_block_size(mut self, size: u32) -> Self {
        self.max_block_size = size;
        self
    }
}
