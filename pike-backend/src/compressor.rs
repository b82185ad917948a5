//! Payload compression for cache backends.
//!
//! Two distinct layers use compression in this workspace:
//!
//! - The [`Compressor`] trait here compresses the *whole serialized value*
//!   a [`Backend`](crate::Backend) writes to storage, independent of its
//!   contents. It is selected once per backend and applied uniformly.
//! - Callers that need to keep more than one encoding of the same payload
//!   around simultaneously (for example an HTTP response body stored as both
//!   gzip and brotli so either can be served without a serve-time
//!   recompression) use the free functions in this module directly instead
//!   of going through a single backend-wide [`Compressor`].
//!
//! Both layers are built on the same two crates: `flate2` for gzip and
//! `brotli` for brotli.

use thiserror::Error;

/// Error produced by a compression or decompression operation.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// Compressing the payload failed.
    #[error("compression failed: {0}")]
    Compress(String),
    /// Decompressing the payload failed, typically because the bytes are not
    /// valid output of the expected codec.
    #[error("decompression failed: {0}")]
    Decompress(String),
}

/// Compresses and decompresses whole backend values.
///
/// Implementations must round-trip: `decompress(compress(data)?)? == data`.
pub trait Compressor: Send + Sync {
    /// Compress `data`, returning the compressed bytes.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;
    /// Decompress `data`, returning the original bytes.
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;
}

/// A [`Compressor`] that performs no compression.
///
/// This is the default for backends that don't configure one.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCompressor;

impl Compressor for PassthroughCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        Ok(data.to_vec())
    }
}

/// Gzip-encodes a byte buffer.
///
/// `level <= 0` selects the default compression level, matching the
/// behavior of the reference implementation this crate's dispatcher is
/// modeled on.
#[cfg(feature = "gzip")]
pub fn gzip_encode(data: &[u8], level: i32) -> Result<Vec<u8>, CompressionError> {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let level = if level <= 0 {
        Compression::default()
    } else {
        Compression::new(level as u32)
    };
    let mut encoder = GzEncoder::new(Vec::new(), level);
    encoder
        .write_all(data)
        .map_err(|err| CompressionError::Compress(err.to_string()))?;
    encoder
        .finish()
        .map_err(|err| CompressionError::Compress(err.to_string()))
}

/// Gzip-decodes a byte buffer.
#[cfg(feature = "gzip")]
pub fn gzip_decode(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|err| CompressionError::Decompress(err.to_string()))?;
    Ok(out)
}

/// Brotli-encodes a byte buffer.
///
/// `quality == 0` selects quality 9, matching the reference implementation.
/// Window size uses the brotli crate's default (22).
#[cfg(feature = "brotli")]
pub fn brotli_encode(data: &[u8], quality: u32) -> Result<Vec<u8>, CompressionError> {
    use std::io::Write;

    let quality = if quality == 0 { 9 } else { quality };
    let mut out = Vec::new();
    {
        let params = brotli::enc::BrotliEncoderParams {
            quality: quality as i32,
            ..Default::default()
        };
        let mut writer = brotli::CompressorWriter::with_params(&mut out, 4096, &params);
        writer
            .write_all(data)
            .map_err(|err| CompressionError::Compress(err.to_string()))?;
        writer
            .flush()
            .map_err(|err| CompressionError::Compress(err.to_string()))?;
    }
    Ok(out)
}

/// Brotli-decodes a byte buffer.
#[cfg(feature = "brotli")]
pub fn brotli_decode(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    use std::io::Read;

    let mut decoder = brotli::Decompressor::new(data, 4096);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|err| CompressionError::Decompress(err.to_string()))?;
    Ok(out)
}

/// A [`Compressor`] backed by gzip, for whole-value backend compression.
#[cfg(feature = "gzip")]
#[derive(Debug, Clone, Copy)]
pub struct GzipCompressor {
    level: u32,
}

#[cfg(feature = "gzip")]
impl GzipCompressor {
    /// Creates a compressor using the default gzip level.
    pub fn new() -> Self {
        Self { level: 0 }
    }

    /// Creates a compressor using an explicit gzip level (0 = default).
    pub fn with_level(level: u32) -> Self {
        Self { level }
    }
}

#[cfg(feature = "gzip")]
impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "gzip")]
impl Compressor for GzipCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        gzip_encode(data, self.level as i32)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        gzip_decode(data)
    }
}

/// A [`Compressor`] backed by brotli, for whole-value backend compression.
#[cfg(feature = "brotli")]
#[derive(Debug, Clone, Copy)]
pub struct BrotliCompressor {
    quality: u32,
}

#[cfg(feature = "brotli")]
impl BrotliCompressor {
    /// Creates a compressor using the default brotli quality (9).
    pub fn new() -> Self {
        Self { quality: 0 }
    }

    /// Creates a compressor using an explicit brotli quality (0 = default).
    pub fn with_quality(quality: u32) -> Self {
        Self { quality }
    }
}

#[cfg(feature = "brotli")]
impl Default for BrotliCompressor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "brotli")]
impl Compressor for BrotliCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        brotli_encode(data, self.quality)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        brotli_decode(data)
    }
}

/// A [`Compressor`] backed by zstd, for whole-value backend compression.
#[cfg(feature = "zstd")]
#[derive(Debug, Clone, Copy)]
pub struct ZstdCompressor {
    level: i32,
}

#[cfg(feature = "zstd")]
impl ZstdCompressor {
    /// Creates a compressor using the default zstd level (3).
    pub fn new() -> Self {
        Self { level: 3 }
    }

    /// Creates a compressor using an explicit zstd level.
    pub fn with_level(level: i32) -> Self {
        Self { level }
    }
}

#[cfg(feature = "zstd")]
impl Default for ZstdCompressor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "zstd")]
impl Compressor for ZstdCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        zstd::stream::encode_all(data, self.level)
            .map_err(|err| CompressionError::Compress(err.to_string()))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        zstd::stream::decode_all(data).map_err(|err| CompressionError::Decompress(err.to_string()))
    }
}
