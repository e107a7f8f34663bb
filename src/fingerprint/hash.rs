//! MD5 primitives over canonical JSON payloads.

use md5::{Digest as _, Md5};
use serde::Serialize;

use crate::error::{FlowError, Result};
use crate::graph::Edge;
use crate::task::{Task, TaskInfo};

/// A 16-byte MD5 digest.
pub type Digest = [u8; 16];

/// MD5 of raw bytes.
pub fn hash_bytes(bytes: &[u8]) -> Digest {
    Md5::digest(bytes).into()
}

/// MD5 of a UTF-8 string.
pub fn hash_str(s: &str) -> Digest {
    hash_bytes(s.as_bytes())
}

/// MD5 of the canonical JSON form of `value`.
///
/// The value is converted to a `serde_json::Value` first so object keys are
/// written in sorted order. `subject` names the value in the error.
pub fn hash_json<T: Serialize + ?Sized>(subject: &str, value: &T) -> Result<Digest> {
    let canonical = serde_json::to_value(value)
        .and_then(|v| serde_json::to_vec(&v))
        .map_err(|e| FlowError::Fingerprint {
            subject: subject.to_string(),
            message: e.to_string(),
        })?;
    Ok(hash_bytes(&canonical))
}

/// Hash of a task's identity attributes.
pub fn hash_task(task: &Task) -> Result<Digest> {
    hash_json(&format!("task '{}'", task.name()), task.info())
}

#[derive(Serialize)]
struct EdgePayload<'a> {
    upstream: &'a TaskInfo,
    downstream: &'a TaskInfo,
    key: Option<&'a str>,
}

/// Hash of an edge: both endpoint definitions and the key.
pub fn hash_edge(edge: &Edge) -> Result<Digest> {
    let payload = EdgePayload {
        upstream: edge.upstream.info(),
        downstream: edge.downstream.info(),
        key: edge.key.as_deref(),
    };
    hash_json(&format!("edge {}", edge), &payload)
}

/// Combine a hash with the keyed hashes of its neighbors.
///
/// Neighbors are sorted first, so the result does not depend on edge order.
pub fn fold(current: &Digest, mut neighbors: Vec<(Option<&str>, Digest)>) -> Result<Digest> {
    neighbors.sort();
    let neighbors: Vec<(Option<&str>, String)> = neighbors
        .into_iter()
        .map(|(key, digest)| (key, hex::encode(digest)))
        .collect();
    hash_json("neighbor hashes", &(hex::encode(current), neighbors))
}

/// MD5 of a raw digest.
pub fn rehash(digest: &Digest) -> Digest {
    hash_bytes(digest)
}

/// Byte-wise XOR, repeating the shorter operand as needed.
///
/// The result has the length of the longer operand.
pub fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    long.iter().zip(short.iter().cycle()).map(|(x, y)| x ^ y).collect()
}
