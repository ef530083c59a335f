//! Growable byte-buffer heap objects (spec §3.2), backing the encoding,
//! compression, and crypto builtin trampolines (`pseudo-runtime::builtins`).

pub struct BytesObj {
    data: Vec<u8>,
}

impl BytesObj {
    pub fn new() -> Self {
        BytesObj { data: Vec::new() }
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        BytesObj { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn push(&mut self, byte: u8) {
        self.data.push(byte);
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }
}

impl Default for BytesObj {
    fn default() -> Self {
        Self::new()
    }
}
