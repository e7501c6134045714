use rand::{rngs::OsRng, RngCore};

/// Random bytes per code; hex doubles it to 128 characters.
pub const CODE_BYTES: usize = 64;

/// Mints a fresh verification code from the OS CSPRNG.
///
/// No collision check happens here: the store's primary key on `code`
/// rejects the astronomically unlikely duplicate.
pub fn generate_code() -> String {
    let mut buf = [0u8; CODE_BYTES];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}
