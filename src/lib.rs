//! # `S2Tiles`
//!
//! A low level implementation of the `S2Tiles` archive format, a single-file
//! container for pyramidal tile data addressable by web-mercator (zoom, x, y)
//! or S2 (face, zoom, x, y) coordinates, based on the [`std::io::Read`],
//! [`std::io::Write`] and [`std::io::Seek`] traits.
//!
//! The archive is cloud-optimized: its directory index is a depth-bounded
//! quad-trie of fixed-size node records, so any tile is reachable with a
//! small, bounded number of ranged reads. Tile payloads are opaque bytes
//! (commonly vector MVT or encoded raster) and are compressed with the
//! archive's configured [`Compression`].
//!
//! ## Examples
//!
//! ### Building an archive in memory
//! ```rust
//! use s2tiles::{Compression, S2Tiles};
//! use std::io::Cursor;
//!
//! fn main() -> s2tiles::Result<()> {
//!     let mut archive = S2Tiles::new(Cursor::new(Vec::new()), 4, Compression::None)?;
//!
//!     archive.put_tile(0, 0, 0, b"tile payload")?;
//!     archive.commit(br#"{"name":"demo"}"#, None)?;
//!
//!     assert_eq!(archive.get_tile(0, 0, 0)?, Some(b"tile payload".to_vec()));
//!     Ok(())
//! }
//! ```
//!
//! ### Writing to a file
//! ```rust
//! use s2tiles::{Compression, S2Tiles};
//!
//! fn main() -> s2tiles::Result<()> {
//!     # let dir = tempdir::TempDir::new("s2tiles")?;
//!     # let path = dir.path().join("planet.s2tiles");
//!     let mut archive = S2Tiles::open(&path, 9, Compression::GZip)?;
//!
//!     archive.put_tile(9, 22, 9, b"hello world")?;
//!     archive.commit(br#"{"metadata":true}"#, None)?;
//!     Ok(())
//! }
//! ```
//!
//! ### Storing tiles on all six S2 faces
//! ```rust
//! use s2tiles::{Compression, Face, S2Tiles};
//! use std::io::Cursor;
//!
//! fn main() -> s2tiles::Result<()> {
//!     let mut archive = S2Tiles::new(Cursor::new(Vec::new()), 8, Compression::None)?;
//!
//!     archive.put_tile_s2(Face::Face3, 2, 1, 1, b"face three")?;
//!
//!     assert!(archive.has_tile_s2(Face::Face3, 2, 1, 1)?);
//!     assert!(!archive.has_tile_s2(Face::Face4, 2, 1, 1)?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![allow(clippy::must_use_candidate)]

mod directory;
mod error;
mod face;
mod header;
mod s2tiles;

/// Utilities for reading and writing `S2Tiles` archives.
pub mod util;

pub use self::s2tiles::S2Tiles;
pub use directory::{directory_size, Node};
pub use error::{Error, Result};
pub use face::Face;
pub use header::{Compression, Header};

/// The MIME type of `S2Tiles` archives.
pub const MIME_TYPE: &str = "application/vnd.s2tiles";
