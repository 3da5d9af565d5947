//! Pooled JSON request bodies
//!
//! Bodies are encoded into buffers taken from a process-wide pool. The
//! encoded bytes are split off and frozen so the request can own them
//! without copying; dropping the [`RequestBody`] clears the remaining
//! buffer and hands it back. Once the request has released its share, the
//! next `reserve` on that buffer reclaims the whole allocation.

use crate::errors::AgentError;
use bytes::{BufMut, Bytes, BytesMut};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::Serialize;

const INITIAL_CAPACITY: usize = 512;
const MAX_POOLED: usize = 1024;

static POOL: Lazy<Mutex<Vec<BytesMut>>> = Lazy::new(|| Mutex::new(Vec::new()));

fn acquire() -> BytesMut {
    let mut buf = POOL.lock().pop().unwrap_or_default();
    buf.reserve(INITIAL_CAPACITY);
    buf
}

fn release(mut buf: BytesMut) {
    buf.clear();
    let mut pool = POOL.lock();
    if pool.len() < MAX_POOLED {
        pool.push(buf);
    }
}

/// JSON body backed by a pooled buffer. Returned to the pool on drop.
#[derive(Debug)]
pub struct RequestBody {
    buf: BytesMut,
    payload: Bytes,
}

impl RequestBody {
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Self, AgentError> {
        let mut writer = acquire().writer();
        let result = serde_json::to_writer(&mut writer, value);
        let mut buf = writer.into_inner();

        if let Err(e) = result {
            release(buf);
            return Err(e.into());
        }

        let payload = buf.split().freeze();
        Ok(Self { buf, payload })
    }

    /// Encoded bytes, shared with the buffer
    pub fn payload(&self) -> Bytes {
        self.payload.clone()
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

impl Drop for RequestBody {
    fn drop(&mut self) {
        self.payload = Bytes::new();
        release(std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_json() {
        let body = RequestBody::encode(&json!({"user_account": "a", "password": "b"})).unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(&body.payload()).unwrap();
        assert_eq!(decoded["user_account"], "a");
        assert!(!body.is_empty());
    }

    #[test]
    fn test_released_buffers_are_cleared() {
        for i in 0..8 {
            let body = RequestBody::encode(&json!({ "name": format!("playlist {i}") })).unwrap();
            assert!(body.len() > 0);
        }
        assert!(POOL.lock().iter().all(|buf| buf.is_empty()));
    }

    #[test]
    fn test_payload_outlives_body() {
        let payload = {
            let body = RequestBody::encode(&json!({"is_favorited": true})).unwrap();
            body.payload()
        };
        assert_eq!(&payload[..], br#"{"is_favorited":true}"#);
    }
}
