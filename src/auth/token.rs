use base64ct::{Base64UrlUnpadded, Encoding};
use rand::RngCore;
use rand::rngs::OsRng;

const TOKEN_BYTES: usize = 32;

/// Opaque URL-safe token with 256 bits of entropy, used for sessions and
/// password resets. Collisions are negligible, uniqueness is still backed by
/// the primary key on the respective table.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}
