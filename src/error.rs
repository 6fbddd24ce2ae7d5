use thiserror::Error;

use crate::header::MAX_METADATA_BYTES;
use crate::Compression;

/// A specialized [`Result`](std::result::Result) type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors that can occur while reading or writing an `S2Tiles` archive.
///
/// A missing tile is never an error; lookups for absent coordinates return
/// [`None`] (or `false`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The first two bytes of the archive are not the `"S2"` magic.
    #[error("not an S2Tiles archive (bad magic)")]
    BadMagic,

    /// The header records a metadata length of zero.
    #[error("archive has no metadata")]
    MissingMetadata,

    /// The compressed metadata does not fit into the header region.
    #[error("compressed metadata is {0} bytes, which exceeds the {MAX_METADATA_BYTES} byte header capacity")]
    MetadataTooLarge(usize),

    /// A codec was requested that this archive cannot dispatch to.
    #[error("unsupported compression kind: {0:?}")]
    UnsupportedCompression(Compression),

    /// A compression or decompression call failed.
    #[error("codec failure")]
    Codec(#[source] std::io::Error),

    /// An I/O operation on the underlying byte store failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The header preamble could not be encoded or decoded.
    #[error("header codec failure")]
    Header(#[from] deku::DekuError),

    /// A byte offset no longer fits into the 48 bits of a node record.
    #[error("offset {0:#x} exceeds the 48-bit limit of a node record")]
    OffsetOverflow(u64),

    /// A compressed tile payload is too large for the 32-bit length field.
    #[error("tile payload is {0} bytes, which exceeds the 32-bit length field")]
    TileTooLarge(usize),

    /// The coordinate does not exist within the archive's zoom range.
    #[error("tile {x}/{y} does not exist at zoom {zoom}")]
    InvalidCoordinate {
        /// Requested zoom level.
        zoom: u8,
        /// Requested x coordinate.
        x: u64,
        /// Requested y coordinate.
        y: u64,
    },

    /// The integer does not identify one of the six S2 faces.
    #[error("{0} is not a valid S2 face (expected 0..=5)")]
    InvalidFace(u8),
}
