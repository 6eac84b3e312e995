//! Registry of playable audio resources.
//!
//! Each registered blob gets a handle with a URL-like key. Handles stay live
//! until released; `live_count` exposes leaks.

use std::collections::HashMap;

use tracing::debug;

use crate::types::AudioBlob;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AudioHandle {
    id: u64,
    url: String,
    mime: String,
}

impl AudioHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }
}

#[derive(Debug, Default)]
pub struct ResourcePool {
    live: HashMap<u64, Vec<u8>>,
    next_id: u64,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, blob: AudioBlob) -> AudioHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.live.insert(id, blob.bytes);
        let handle = AudioHandle {
            id,
            url: format!("blob:audio-fx/{id}"),
            mime: blob.mime,
        };
        debug!(url = %handle.url, "audio resource created");
        handle
    }

    /// Frees the bytes behind `handle`. Releasing twice is harmless.
    pub fn release(&mut self, handle: &AudioHandle) {
        if self.live.remove(&handle.id).is_some() {
            debug!(url = %handle.url, "audio resource released");
        }
    }

    pub fn bytes(&self, handle: &AudioHandle) -> Option<&[u8]> {
        self.live.get(&handle.id).map(Vec::as_slice)
    }

    pub fn is_live(&self, handle: &AudioHandle) -> bool {
        self.live.contains_key(&handle.id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
