use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Default PBKDF2 iteration count. Stored per user, so it can be raised for
/// new registrations without invalidating existing records.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

const SALT_BYTES: usize = 32;
const DIGEST_BYTES: usize = 32;

/// PBKDF2-HMAC-SHA256 password hashing. Pure: no storage access, no state
/// beyond the OS RNG used for salts.
pub struct PasswordHasher;

impl PasswordHasher {
    /// Fresh salt from the OS CSPRNG, hex-encoded (256 bits of entropy).
    pub fn generate_salt() -> String {
        let mut bytes = [0u8; SALT_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Deterministic digest of (password, salt, iterations).
    pub fn hash(password: &str, salt: &str, iterations: u32) -> String {
        let mut digest = [0u8; DIGEST_BYTES];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut digest);
        hex::encode(digest)
    }

    /// Recomputes and compares in constant time with respect to content.
    pub fn verify(password: &str, salt: &str, iterations: u32, digest: &str) -> bool {
        let computed = Self::hash(password, salt, iterations);
        computed.as_bytes().ct_eq(digest.as_bytes()).into()
    }
}
