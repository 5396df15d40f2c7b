// ============================
// crates/backend-lib/src/auth/token_generator.rs
// ============================
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
/** Token identifier generation
Every minted token carries a `jti` that is also the key of its store
record. Identifiers come from OS entropy so collisions are negligible. */
use rand::{rngs::OsRng, RngCore};

/// Default identifier size in bytes (16 bytes = 128 bits of entropy)
const DEFAULT_JTI_BYTES: usize = 16;

/** Generate a fresh token identifier
# Returns
A base64 URL-safe encoded string without padding */
pub fn generate_jti() -> String {
    generate_jti_with_size(DEFAULT_JTI_BYTES)
}

/** Generate a token identifier with the given amount of entropy
# Arguments
* `bytes` - The size of the random identifier in bytes */
fn generate_jti_with_size(bytes: usize) -> String {
    let mut buffer = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}
