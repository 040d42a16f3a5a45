//! Whole-payload compression dispatch.
//!
//! Each method turns the complete data section into one compressed blob and
//! back. There is no framing per file; decoding any file means decoding all
//! of them.
#[cfg(feature = "compress")]
use std::io::{self, Read, Write};

use tape_core::CompressionMethod;

use crate::Error;

/// `LzmaOptions` preset used for writing
#[cfg(feature = "compress")]
const LZMA_PRESET: u32 = 6;

/// Props byte, dictionary size and uncompressed size ahead of the raw stream
#[cfg(feature = "compress")]
const LZMA_HEADER_SIZE: usize = 1 + 4 + 8;

pub fn compress(method: CompressionMethod, data: &[u8]) -> Result<Vec<u8>, Error> {
    tracing::debug!("compressing {} bytes with {}", data.len(), method);
    let compressed = match method {
        CompressionMethod::None => Ok(data.to_vec()),
        #[cfg(feature = "compress")]
        CompressionMethod::Zlib => zlib_compress(data),
        #[cfg(feature = "compress")]
        CompressionMethod::Lzma => lzma_compress(data),
        #[cfg(feature = "compress")]
        CompressionMethod::Bzip2 => bzip2_compress(data),
        #[cfg(not(feature = "compress"))]
        other => return Err(Error::UnsupportedMethod(other)),
    }
    .map_err(crate::wrap_io_err!("Compress payload"))?;
    tracing::debug!("compressed to {} bytes", compressed.len());
    Ok(compressed)
}

/// Reverse [`compress`]. Any failure of the backend on malformed input is
/// reported as [`Error::CorruptPayload`].
pub fn decompress(method: CompressionMethod, data: &[u8]) -> Result<Vec<u8>, Error> {
    tracing::debug!("decompressing {} bytes with {}", data.len(), method);
    match method {
        CompressionMethod::None => Ok(data.to_vec()),
        #[cfg(feature = "compress")]
        CompressionMethod::Zlib => zlib_decompress(data),
        #[cfg(feature = "compress")]
        CompressionMethod::Lzma => lzma_decompress(data),
        #[cfg(feature = "compress")]
        CompressionMethod::Bzip2 => bzip2_decompress(data),
        #[cfg(not(feature = "compress"))]
        other => return Err(Error::UnsupportedMethod(other)),
    }
    .map_err(|source| Error::CorruptPayload { method, source })
}

#[cfg(feature = "compress")]
fn zlib_compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(feature = "compress")]
fn zlib_decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    flate2::read::ZlibDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(feature = "compress")]
fn bzip2_compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::best());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(feature = "compress")]
fn bzip2_decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    bzip2::read::BzDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

/// Raw LZMA stream with an end marker, preceded by the fields of the classic
/// `.lzma` header so that the stream can be decoded without outside state.
#[cfg(feature = "compress")]
fn lzma_compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let options = lzma_rust2::LzmaOptions::with_preset(LZMA_PRESET);

    let mut out = Vec::with_capacity(LZMA_HEADER_SIZE + data.len() / 2);
    out.push(options.get_props());
    out.extend_from_slice(&options.dict_size.to_le_bytes());
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());

    let mut writer = lzma_rust2::LzmaWriter::new_no_header(&mut out, &options, true)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    writer.write_all(data)?;
    writer
        .finish()
        .map_err(|e| io::Error::other(e.to_string()))?;
    Ok(out)
}

#[cfg(feature = "compress")]
fn lzma_decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    if data.len() < LZMA_HEADER_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "LZMA header too short",
        ));
    }
    let (header, stream) = data.split_at(LZMA_HEADER_SIZE);
    let props = header[0];
    let mut dict_size = [0; 4];
    dict_size.copy_from_slice(&header[1..5]);
    let mut size = [0; 8];
    size.copy_from_slice(&header[5..13]);
    let size = u64::from_le_bytes(size);

    let mut reader = lzma_rust2::LzmaReader::new_with_props(
        stream,
        size,
        props,
        u32::from_le_bytes(dict_size),
        None,
    )
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

    // The size field is untrusted; only reserve what the input could plausibly hold
    let mut out = Vec::with_capacity(usize::try_from(size).unwrap_or(0).min(data.len() * 8));
    reader.read_to_end(&mut out)?;
    if out.len() as u64 != size {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("LZMA stream decoded to {} bytes, expected {}", out.len(), size),
        ));
    }
    Ok(out)
}

#[cfg(all(test, feature = "compress"))]
mod tests {
    use tape_core::CompressionMethod;

    use super::{compress, decompress};
    use crate::Error;

    fn sample() -> Vec<u8> {
        b"the quick brown fox jumps over the lazy dog\n".repeat(200)
    }

    #[test]
    fn methods_shrink_repetitive_data() {
        let data = sample();
        for method in [
            CompressionMethod::Zlib,
            CompressionMethod::Lzma,
            CompressionMethod::Bzip2,
        ] {
            let packed = compress(method, &data).unwrap();
            assert!(packed.len() < data.len() / 4, "{} did not compress", method);
            assert_eq!(decompress(method, &packed).unwrap(), data);
        }
    }

    #[test]
    fn none_is_identity() {
        let data = sample();
        assert_eq!(compress(CompressionMethod::None, &data).unwrap(), data);
        assert_eq!(decompress(CompressionMethod::None, &data).unwrap(), data);
    }

    #[test]
    fn empty_input() {
        for method in CompressionMethod::ALL {
            let packed = compress(method, b"").unwrap();
            assert!(decompress(method, &packed).unwrap().is_empty());
        }
    }

    #[test]
    fn garbage_is_corrupt_payload() {
        let garbage = [0x5Au8; 64];
        for method in [
            CompressionMethod::Zlib,
            CompressionMethod::Lzma,
            CompressionMethod::Bzip2,
        ] {
            match decompress(method, &garbage) {
                Err(Error::CorruptPayload { method: m, .. }) => assert_eq!(m, method),
                other => panic!("{}: expected CorruptPayload, got {:?}", method, other.map(|v| v.len())),
            }
        }
    }
}
