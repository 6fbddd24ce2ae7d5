pub use compression::*;

mod compression;

use deku::bitvec::{BitVec, BitView};
use deku::prelude::*;

use crate::Error;

/// The `"S2"` magic as a little-endian `u16` (`0x53`, `0x32`).
pub const MAGIC: u16 = 0x3253;

/// Current version of the archive format.
pub const VERSION: u16 = 1;

/// Size of the fixed header region at the start of every archive (in bytes).
pub const HEADER_BYTES: u64 = 131_072;

/// Size of the fixed header preamble (in bytes).
pub const PREAMBLE_BYTES: usize = 10;

/// Byte offset at which the compressed metadata blob is stored.
pub const METADATA_OFFSET: u64 = PREAMBLE_BYTES as u64;

/// Maximum size of the compressed metadata blob (in bytes).
///
/// The blob has to share the header region with the 10-byte preamble.
pub const MAX_METADATA_BYTES: usize = HEADER_BYTES as usize - PREAMBLE_BYTES;

/// A structure representing the fixed 10-byte preamble of an `S2Tiles` header.
///
/// The remainder of the 128 KiB header region holds the compressed metadata
/// blob, which the preamble only describes by length.
#[derive(DekuRead, DekuWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[deku(endian = "little")]
pub struct Header {
    /// Archive magic; always [`MAGIC`] in valid archives.
    pub magic: u16,

    /// Version of the archive format (currently 1)
    pub version: u16,

    /// Maximum zoom of all tiles this archive is laid out for.
    ///
    /// This value sizes the leaf directories, so it cannot change after the
    /// first tile has been written.
    pub max_zoom: u8,

    /// Compression of tile payloads and the metadata blob.
    pub compression: Compression,

    /// Length (in bytes) of the compressed metadata blob at
    /// [`METADATA_OFFSET`].
    pub metadata_length: u32,
}

impl Header {
    /// Constructs a header preamble with the current [`MAGIC`] and
    /// [`VERSION`].
    pub const fn new(max_zoom: u8, compression: Compression, metadata_length: u32) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            max_zoom,
            compression,
            metadata_length,
        }
    }

    /// Parses a header preamble from the first bytes of an archive.
    ///
    /// # Errors
    /// Will return [`Error::BadMagic`] if the archive does not start with the
    /// `"S2"` magic and [`Error::Header`] if the preamble cannot be decoded.
    pub fn decode(input: &[u8]) -> crate::Result<Self> {
        let (_, header) = Self::read(input.view_bits(), ())?;

        if header.magic != MAGIC {
            return Err(Error::BadMagic);
        }

        Ok(header)
    }

    /// Encodes the header preamble into its 10-byte on-disk form.
    ///
    /// # Errors
    /// Will return [`Error::Header`] if the preamble cannot be encoded.
    pub fn encode(&self) -> crate::Result<Vec<u8>> {
        let mut bit_vec = BitVec::with_capacity(8 * PREAMBLE_BYTES);
        self.write(&mut bit_vec, ())?;

        Ok(bit_vec.as_raw_slice().to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::*;

    #[test]
    fn test_encode() {
        let bytes = Header::new(9, Compression::None, 17).encode().unwrap();

        assert_eq!(
            bytes,
            vec![0x53, 0x32, 0x01, 0x00, 0x09, 0x01, 0x11, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_decode() {
        let bytes = [0x53, 0x32, 0x01, 0x00, 0x0e, 0x02, 0x2a, 0x00, 0x00, 0x00];

        let header = Header::decode(&bytes).unwrap();

        assert_eq!(header.magic, MAGIC);
        assert_eq!(header.version, 1);
        assert_eq!(header.max_zoom, 14);
        assert_eq!(header.compression, Compression::GZip);
        assert_eq!(header.metadata_length, 42);
    }

    #[test]
    fn test_round_trip() {
        let header = Header::new(30, Compression::Brotli, 131_062);

        let decoded = Header::decode(&header.encode().unwrap()).unwrap();

        assert_eq!(decoded, header);
    }

    #[test]
    fn test_bad_magic() {
        let bytes = [0x00u8; 10];

        assert!(matches!(Header::decode(&bytes), Err(Error::BadMagic)));
    }

    #[test]
    fn test_metadata_capacity() {
        // preamble and metadata blob together fill the header region exactly
        assert_eq!(MAX_METADATA_BYTES as u64 + METADATA_OFFSET, HEADER_BYTES);
        assert_eq!(MAX_METADATA_BYTES, 131_062);
    }
}
