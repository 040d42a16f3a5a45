use tape_core::{apply_keystream, Entry, Header, SALT_LEN};

use crate::compress::decompress;
use crate::Error;

/// A fully decoded container: the entry table plus the uncompressed data
/// section every file entry points into.
#[derive(Debug)]
pub struct Container {
    header: Header,
    data: Vec<u8>,
}

impl Container {
    /// Parse, decrypt and decompress `bytes`. Every file range is checked
    /// against the data section before this returns.
    pub fn from_bytes(bytes: &[u8], password: Option<&str>) -> Result<Container, Error> {
        let (header, payload) = Header::parse(bytes)?;
        let trailing = bytes.len() - header.encoded_len() - payload.len();
        if trailing > 0 {
            tracing::warn!("ignoring {} bytes after the payload", trailing);
        }
        tracing::debug!(
            "tape {} with {} entries, {} byte {} payload",
            header.version,
            header.entries.len(),
            payload.len(),
            header.compression
        );

        let compressed = match (&header.salt, password) {
            (Some(_), None) => return Err(Error::PasswordRequired),
            (None, Some(_)) => return Err(Error::UnexpectedPassword),
            (None, None) => payload.to_vec(),
            (Some(salt), Some(password)) => {
                let mut plain = payload.to_vec();
                apply_keystream(&mut plain, password.as_bytes());
                if plain.get(..SALT_LEN) != Some(&salt[..]) {
                    return Err(Error::WrongPassword);
                }
                plain.split_off(SALT_LEN)
            }
        };

        let data = match decompress(header.compression, &compressed) {
            Ok(data) => data,
            // A salt collision lets a wrong password through to here
            Err(Error::CorruptPayload { .. }) if header.is_encrypted() => {
                return Err(Error::WrongPassword)
            }
            Err(err) => return Err(err),
        };

        header.check_extents(&data)?;
        if data.len() as u64 != header.full_size() {
            tracing::debug!(
                "data section is {} bytes, entries cover {}",
                data.len(),
                header.full_size()
            );
        }

        Ok(Container { header, data })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn entries(&self) -> &[Entry] {
        &self.header.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.header.entries
    }

    /// The uncompressed data section
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes of a file entry. Directories yield an empty slice.
    pub fn entry_data(&self, entry: &Entry) -> Result<&[u8], Error> {
        Ok(entry.data(&self.data)?)
    }
}
