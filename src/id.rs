//! Task identifier generation

use rand::RngCore;
use rand::rngs::OsRng;
use std::fmt::Write;

use crate::types::TaskId;

/// Number of random bytes backing an identifier (two hex chars each)
const ID_BYTES: usize = 8;

/// Generate a new task identifier.
///
/// Identifiers are 16 lowercase hex characters drawn from the operating
/// system's secure random source. With 64 bits of entropy, collisions within
/// a single in-memory store are not a practical concern, so uniqueness is
/// not re-checked at insertion.
pub fn new_task_id() -> TaskId {
    let mut bytes = [0u8; ID_BYTES];
    OsRng.fill_bytes(&mut bytes);

    let mut id = String::with_capacity(ID_BYTES * 2);
    for byte in bytes {
        // Writing into a String cannot fail
        let _ = write!(id, "{byte:02x}");
    }

    TaskId::new(id)
}
