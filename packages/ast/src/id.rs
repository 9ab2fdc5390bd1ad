use crc32fast::Hasher;

/// Generate document ID from file path using CRC32
pub fn get_document_id(path: &str) -> String {
    let mut buff = String::from(path);
    if !path.starts_with("file://") {
        buff = format!("file://{}", buff);
    }

    let mut hasher = Hasher::new();
    hasher.update(buff.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential ID generator for tree nodes within a document
#[derive(Clone)]
pub struct IdGenerator {
    seed: String, // Document ID (CRC32)
    count: u32,   // Sequential counter
}

impl IdGenerator {
    pub fn new(path: &str) -> Self {
        Self {
            seed: get_document_id(path),
            count: 0,
        }
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    /// Get document ID seed
    pub fn seed(&self) -> &str {
        &self.seed
    }
}
