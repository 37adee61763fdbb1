use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::CryptoError;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

/// PHC algorithm identifier.
const SCHEME: &str = "pbkdf2-sha256";

/// Hash a password into a PHC string:
/// `$pbkdf2-sha256$i=<rounds>,l=32$<salt>$<hash>` (base64, no padding).
pub fn hash_password(password: &str, rounds: u32) -> Result<String, CryptoError> {
    if rounds == 0 {
        return Err(CryptoError::InvalidRounds(rounds));
    }
    let salt = generate_salt();
    let hash = derive(password, &salt, rounds);
    Ok(format!(
        "${SCHEME}$i={rounds},l={HASH_LENGTH}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    ))
}

/// Check `password` against a string produced by [`hash_password`].
/// The iteration count is read from the stored hash.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, CryptoError> {
    let mut parts = stored.split('$');
    let (Some(""), Some(scheme), Some(params), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(CryptoError::MalformedHash);
    };
    if scheme != SCHEME {
        return Err(CryptoError::UnsupportedScheme(scheme.to_string()));
    }
    let rounds = parse_rounds(params)?;
    if rounds == 0 {
        return Err(CryptoError::InvalidRounds(rounds));
    }
    let salt = STANDARD_NO_PAD
        .decode(salt)
        .map_err(|_| CryptoError::MalformedHash)?;
    let expected = STANDARD_NO_PAD
        .decode(hash)
        .map_err(|_| CryptoError::MalformedHash)?;
    if expected.len() != HASH_LENGTH {
        return Err(CryptoError::MalformedHash);
    }

    let actual = derive(password, &salt, rounds);
    Ok(actual.as_slice().ct_eq(expected.as_slice()).into())
}

/// Run the same PBKDF2 work as [`verify_password`] without a stored
/// hash, so a login for a missing account costs as much as a real one.
pub fn burn_verify(password: &str, rounds: u32) {
    let _ = derive(password, &[0u8; SALT_LENGTH], rounds.max(1));
}

/// Reads `i=<rounds>` out of the PHC parameter list.
fn parse_rounds(params: &str) -> Result<u32, CryptoError> {
    params
        .split(',')
        .find_map(|kv| kv.strip_prefix("i="))
        .and_then(|raw| raw.parse().ok())
        .ok_or(CryptoError::MalformedHash)
}

fn derive(password: &str, salt: &[u8], rounds: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut out);
    out
}

fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}
