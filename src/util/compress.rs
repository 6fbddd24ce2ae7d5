use crate::{Compression, Error, Result};

use brotli::{CompressorWriter as BrotliEncoder, Decompressor as BrotliDecoder};
use flate2::{read::GzDecoder, write::GzEncoder};
use zstd::{Decoder as ZSTDDecoder, Encoder as ZSTDEncoder};

use std::io::{Cursor, Read, Write};

/// Wraps `writer` in an encoder that applies `compression` to everything
/// written through it.
///
/// The encoder finalizes its stream when it is dropped, so drop the returned
/// writer (or let it go out of scope) before reading the compressed output.
/// For [`Compression::None`] the writer is passed through untouched.
///
/// # Arguments
/// * `compression` - Compression to apply
/// * `writer` - Destination for the compressed bytes
///
/// # Errors
/// Will return [`Error::UnsupportedCompression`] for [`Compression::Unknown`]
/// and [`Error::Codec`] if the zstd encoder cannot be created.
///
/// # Example
/// ```rust
/// # use s2tiles::{util::compress, Compression};
/// # use std::io::Write;
/// let mut output = Vec::<u8>::new();
///
/// {
///     let mut writer = compress(Compression::GZip, &mut output).unwrap();
///     writer.write_all(b"tile payload").unwrap();
///     writer.flush().unwrap();
/// } // encoder dropped here, finalizing the gzip stream
/// ```
pub fn compress<'a>(
    compression: Compression,
    writer: &'a mut impl Write,
) -> Result<Box<dyn Write + 'a>> {
    match compression {
        Compression::Unknown => Err(Error::UnsupportedCompression(compression)),
        Compression::None => Ok(Box::new(writer)),
        Compression::GZip => Ok(Box::new(GzEncoder::new(
            writer,
            flate2::Compression::default(),
        ))),
        Compression::Brotli => Ok(Box::new(BrotliEncoder::new(writer, 4096, 11, 24))),
        Compression::ZStd => Ok(Box::new(
            ZSTDEncoder::new(writer, 0)
                .map_err(Error::Codec)?
                .auto_finish(),
        )),
    }
}

/// Compresses a byte slice in one call.
///
/// This is the form the archive engine uses for tile payloads and metadata:
/// bytes in, compressed bytes out, with the encoder flushed and finalized
/// before returning. [`Compression::None`] yields the input unchanged.
///
/// # Arguments
/// * `compression` - Compression to apply
/// * `data` - Bytes to compress
///
/// # Errors
/// Will return [`Error::UnsupportedCompression`] for [`Compression::Unknown`]
/// and [`Error::Codec`] if the codec fails while encoding.
#[allow(clippy::module_name_repetitions)]
pub fn compress_all(compression: Compression, data: &[u8]) -> Result<Vec<u8>> {
    let mut destination = Vec::<u8>::new();

    {
        let mut writer = compress(compression, &mut destination)?;

        writer.write_all(data).map_err(Error::Codec)?;

        writer.flush().map_err(Error::Codec)?;
    }

    Ok(destination)
}

/// Wraps a reader of compressed bytes in a decoder, so that reading from the
/// result yields the decompressed bytes.
///
/// For [`Compression::None`] the reader is passed through untouched.
///
/// # Arguments
/// * `compression` - Compression the underlying bytes are encoded with
/// * `compressed_data` - Reader over the compressed bytes
///
/// # Errors
/// Will return [`Error::UnsupportedCompression`] for [`Compression::Unknown`]
/// and [`Error::Codec`] if the zstd decoder cannot be created.
///
/// # Example
/// ```rust
/// # use s2tiles::{util::{compress_all, decompress}, Compression};
/// # use std::io::Read;
/// # let data = compress_all(Compression::GZip, b"tile payload").unwrap();
/// let mut data_reader = std::io::Cursor::new(data);
///
/// let mut reader = decompress(Compression::GZip, &mut data_reader).unwrap();
///
/// let mut destination = Vec::<u8>::new();
/// reader.read_to_end(&mut destination).unwrap();
///
/// assert_eq!(destination, b"tile payload");
/// ```
pub fn decompress<'a>(
    compression: Compression,
    compressed_data: &'a mut impl Read,
) -> Result<Box<dyn Read + 'a>> {
    match compression {
        Compression::Unknown => Err(Error::UnsupportedCompression(compression)),
        Compression::None => Ok(Box::new(compressed_data)),
        Compression::GZip => Ok(Box::new(GzDecoder::new(compressed_data))),
        Compression::Brotli => Ok(Box::new(BrotliDecoder::new(compressed_data, 4096))),
        Compression::ZStd => Ok(Box::new(
            ZSTDDecoder::new(compressed_data).map_err(Error::Codec)?,
        )),
    }
}

/// Decompresses a byte slice in one call.
///
/// This is the counterpart of [`compress_all`] used by the archive engine
/// after a ranged read: the slice must hold exactly the bytes recorded on
/// disk for the tile or metadata blob.
///
/// # Arguments
/// * `compression` - Compression the bytes are encoded with
/// * `data` - Bytes to decompress
///
/// # Errors
/// Will return [`Error::UnsupportedCompression`] for [`Compression::Unknown`]
/// and [`Error::Codec`] if the bytes are not a valid stream for the given
/// compression kind (or the zstd decoder cannot be created).
pub fn decompress_all(compression: Compression, data: &[u8]) -> Result<Vec<u8>> {
    let mut data_reader = Cursor::new(data);

    let mut reader = decompress(compression, &mut data_reader)?;

    let mut destination = Vec::<u8>::new();

    reader.read_to_end(&mut destination).map_err(Error::Codec)?;

    Ok(destination)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::*;

    const DATA: &[u8] = br#"{"type":"FeatureCollection","features":[]}"#;

    #[test]
    fn test_unknown() {
        assert!(matches!(
            compress_all(Compression::Unknown, DATA),
            Err(Error::UnsupportedCompression(Compression::Unknown))
        ));
        assert!(matches!(
            decompress_all(Compression::Unknown, DATA),
            Err(Error::UnsupportedCompression(Compression::Unknown))
        ));
    }

    #[test]
    fn test_none_is_identity() {
        assert_eq!(compress_all(Compression::None, DATA).unwrap(), DATA);
        assert_eq!(decompress_all(Compression::None, DATA).unwrap(), DATA);
    }

    #[test]
    fn test_gzip_round_trip() {
        let compressed = compress_all(Compression::GZip, DATA).unwrap();

        assert_ne!(compressed, DATA);
        assert_eq!(decompress_all(Compression::GZip, &compressed).unwrap(), DATA);
    }

    #[test]
    fn test_brotli_round_trip() {
        let compressed = compress_all(Compression::Brotli, DATA).unwrap();

        assert_eq!(
            decompress_all(Compression::Brotli, &compressed).unwrap(),
            DATA
        );
    }

    #[test]
    fn test_zstd_round_trip() {
        let compressed = compress_all(Compression::ZStd, DATA).unwrap();

        assert_eq!(decompress_all(Compression::ZStd, &compressed).unwrap(), DATA);
    }

    #[test]
    fn test_gzip_rejects_garbage() {
        assert!(matches!(
            decompress_all(Compression::GZip, b"definitely not gzip"),
            Err(Error::Codec(_))
        ));
    }
}
