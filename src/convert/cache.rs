//! In-memory cache of encoded images, keyed by source content.
//!
//! Lives for the process only. Two requests whose sources hash the same
//! and ask for the same size share one encoded PNG, so the second one
//! skips rendering and encoding.

use std::sync::Arc;

use dashmap::DashMap;

/// A 256-bit blake3 content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash a byte slice.
    #[inline]
    pub fn of(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Convert to hex string (for debugging/display).
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

/// Everything that determines the encoded output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub content: ContentHash,
    pub size: u32,
    /// `f32::to_bits` of the reference width.
    reference_width: u32,
}

impl CacheKey {
    pub fn new(source: &[u8], size: u32, reference_width: f32) -> Self {
        Self {
            content: ContentHash::of(source),
            size,
            reference_width: reference_width.to_bits(),
        }
    }
}

/// Read-through cache in front of the render/encode steps.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<CacheKey, Arc<Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<Vec<u8>>> {
        self.entries.get(key).map(|r| Arc::clone(r.value()))
    }

    pub fn insert(&self, key: CacheKey, png: Vec<u8>) -> Arc<Vec<u8>> {
        let png = Arc::new(png);
        self.entries.insert(key, Arc::clone(&png));
        png
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
