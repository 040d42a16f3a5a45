//! Password obfuscation of the payload.
//!
//! The password is hashed with BLAKE3 and the 32 digest bytes are XORed over
//! the data in a cycle that starts at digest byte 1, not 0. Applying the
//! transform twice with the same password restores the input, so there is no
//! separate decrypt.
//!
//! This is **not** a secure cipher. The keystream depends on the password
//! alone and is identical for every archive encrypted with it, so one known
//! plaintext (or two ciphertexts under the same password) gives the keystream
//! away. The salt stored alongside only detects a wrong password.

const DIGEST_LEN: usize = blake3::OUT_LEN;

/// Endless keystream derived from a password
#[derive(Clone)]
pub struct Keystream {
    digest: [u8; DIGEST_LEN],
    index: usize,
}

impl Keystream {
    pub fn new(password: &[u8]) -> Keystream {
        Keystream {
            digest: *blake3::hash(password).as_bytes(),
            index: 1,
        }
    }
}

impl Iterator for Keystream {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let byte = self.digest[self.index];
        self.index = (self.index + 1) % DIGEST_LEN;
        Some(byte)
    }
}

/// XOR `data` in place with the keystream for `password`
pub fn apply_keystream(data: &mut [u8], password: &[u8]) {
    for (byte, key) in data.iter_mut().zip(Keystream::new(password)) {
        *byte ^= key;
    }
}
