use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store write failed: {0}")]
    Write(String),
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Write(value.to_string())
    }
}

/// Opaque blob storage for the saved game. Implementations own the medium;
/// the engine only hands over bytes.
pub trait BlobStore {
    fn read_blob(&self) -> Option<Vec<u8>>;
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blob: Option<Vec<u8>>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            blob: Some(bytes.into()),
            writes: 0,
        }
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl BlobStore for MemoryStore {
    fn read_blob(&self) -> Option<Vec<u8>> {
        self.blob.clone()
    }

    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        self.blob = Some(bytes.to_vec());
        self.writes += 1;
        Ok(())
    }
}
