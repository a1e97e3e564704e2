use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Random suffix length in bytes (16 hex characters).
const SUFFIX_BYTES: usize = 8;

/// Generates a transfer id of the form `tx_<unix-millis>_<hex>`.
///
/// The random suffix keeps ids unique across transfers started within
/// the same millisecond.
pub fn generate_transfer_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let mut bytes = [0u8; SUFFIX_BYTES];
    rand::thread_rng().fill(&mut bytes);
    format!("tx_{millis}_{}", hex::encode(bytes))
}
