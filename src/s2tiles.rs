use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::Path;

use duplicate::duplicate_item;

#[cfg(feature = "async")]
use futures::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

use crate::directory::{directory_size, Node, NODE_BYTES, ROOT_DIR_BYTES, TILE_DATA_OFFSET};
use crate::header::{Header, HEADER_BYTES, MAX_METADATA_BYTES, METADATA_OFFSET, PREAMBLE_BYTES};
use crate::util::{compress_all, decompress_all, tile_path};
use crate::{Compression, Error, Face, Result};

/// A structure representing an `S2Tiles` archive.
///
/// The archive owns its random-access byte store `S` (any
/// [`Read`] + [`Write`] + [`Seek`] for the blocking API, or the
/// corresponding `futures::io` traits for the `_async` variants), the
/// append cursor, and the cached header state. All operations are serialized
/// through `&mut self`; a single archive handle must not be shared between
/// concurrent callers.
///
/// Tiles are addressed either by web-mercator coordinates through the short
/// accessors ([`get_tile`](Self::get_tile), [`put_tile`](Self::put_tile),
/// [`has_tile`](Self::has_tile), which hard-wire [`Face::Face0`]) or by a
/// full S2 coordinate through the `_s2` accessors.
#[derive(Debug)]
pub struct S2Tiles<S> {
    /// Maximum zoom of all tiles this archive is laid out for.
    ///
    /// This sizes the leaf directories and cannot change once tiles have
    /// been written.
    pub max_zoom: u8,

    /// Compression applied to tile payloads and the metadata blob.
    pub compression: Compression,

    store: S,

    /// Next byte offset at which payloads and leaf directories are appended.
    cursor: u64,

    metadata_length: u32,

    /// Whether the cached header state is authoritative (fresh archives and
    /// archives whose header has been parsed).
    setup: bool,

    metadata: Option<Vec<u8>>,
}

/// Returns `true` if the coordinate exists on a single face at `zoom`.
fn in_bounds(max_zoom: u8, zoom: u8, x: u64, y: u64) -> bool {
    if zoom > max_zoom {
        return false;
    }

    match 1u64.checked_shl(u32::from(zoom)) {
        Some(extent) => x < extent && y < extent,
        None => false,
    }
}

impl<S> S2Tiles<S> {
    /// Consumes the archive and returns the underlying byte store.
    pub fn into_store(self) -> S {
        self.store
    }
}

impl S2Tiles<File> {
    /// Opens the archive at `path`, creating and initializing it if it does
    /// not exist (an existing empty file counts as absent).
    ///
    /// For a newly created archive `max_zoom` and `compression` become the
    /// archive configuration. For an existing archive they only serve write
    /// operations issued before the first read; the first read operation
    /// parses the header and replaces them with the on-disk values.
    ///
    /// # Errors
    /// Will return [`Err`] if the file cannot be opened or the
    /// initialization writes fail.
    pub fn open(path: impl AsRef<Path>, max_zoom: u8, compression: Compression) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        let length = file.metadata()?.len();

        if length == 0 {
            return Self::new(file, max_zoom, compression);
        }

        Ok(Self {
            max_zoom,
            compression,
            store: file,
            cursor: u64::max(length, TILE_DATA_OFFSET),
            metadata_length: 0,
            setup: false,
            metadata: None,
        })
    }
}

#[duplicate_item(
    cfg_async                  async    add_await(code) SeekFrom                 RTraits                                                   from_store          ensure_setup         get_metadata         has_tile         has_tile_s2         get_tile         get_tile_s2         walk         read_node         read_section;
    [cfg(all())]               []       [code]          [std::io::SeekFrom]      [Read + Seek]                                             [from_store]        [ensure_setup]       [get_metadata]       [has_tile]       [has_tile_s2]       [get_tile]       [get_tile_s2]       [walk]       [read_node]       [read_section];
    [cfg(feature = "async")]   [async]  [code.await]    [futures::io::SeekFrom]  [AsyncRead + AsyncReadExt + AsyncSeekExt + Send + Unpin]  [from_async_store]  [ensure_setup_async] [get_metadata_async] [has_tile_async] [has_tile_s2_async] [get_tile_async] [get_tile_s2_async] [walk_async] [read_node_async] [read_section_async];
)]
#[cfg_async]
impl<S: RTraits> S2Tiles<S> {
    /// Opens an existing archive from a random-access byte store.
    ///
    /// The header is parsed eagerly, so the returned archive already knows
    /// its maximum zoom, compression and metadata length. Read-only stores
    /// (e.g. HTTP range readers) are sufficient for all read operations.
    ///
    /// # Errors
    /// Will return [`Err`] if the store cannot be read, the archive does not
    /// start with the `"S2"` magic or the header preamble is malformed.
    pub async fn from_store(mut store: S) -> Result<Self> {
        let length = add_await([store.seek(SeekFrom::End(0))])?;

        let mut archive = Self {
            max_zoom: 0,
            compression: Compression::Unknown,
            store,
            cursor: u64::max(length, TILE_DATA_OFFSET),
            metadata_length: 0,
            setup: false,
            metadata: None,
        };

        add_await([archive.ensure_setup()])?;

        Ok(archive)
    }

    /// Parses the header preamble once and caches its fields.
    async fn ensure_setup(&mut self) -> Result<()> {
        if self.setup {
            return Ok(());
        }

        let preamble = add_await([self.read_section(0, PREAMBLE_BYTES)])?;
        let header = Header::decode(&preamble)?;

        self.max_zoom = header.max_zoom;
        self.compression = header.compression;
        self.metadata_length = header.metadata_length;
        self.setup = true;

        Ok(())
    }

    /// Returns the decompressed metadata blob.
    ///
    /// The blob is opaque to the archive; producers conventionally store
    /// JSON. The result is cached, so repeated calls do not touch the store.
    ///
    /// # Errors
    /// Will return [`Error::MissingMetadata`] if no metadata has been
    /// committed, [`Error::BadMagic`] if the archive header is invalid and
    /// [`Err`] for store or codec failures.
    pub async fn get_metadata(&mut self) -> Result<Vec<u8>> {
        add_await([self.ensure_setup()])?;

        if let Some(metadata) = &self.metadata {
            return Ok(metadata.clone());
        }

        if self.metadata_length == 0 {
            return Err(Error::MissingMetadata);
        }

        let compressed =
            add_await([self.read_section(METADATA_OFFSET, self.metadata_length as usize)])?;
        let metadata = decompress_all(self.compression, &compressed)?;

        self.metadata = Some(metadata.clone());

        Ok(metadata)
    }

    /// Returns `true` if the archive contains a tile at the web-mercator
    /// coordinate (face 0).
    ///
    /// # Errors
    /// See [`has_tile_s2`](Self::has_tile_s2).
    pub async fn has_tile(&mut self, zoom: u8, x: u64, y: u64) -> Result<bool> {
        add_await([self.has_tile_s2(Face::Face0, zoom, x, y)])
    }

    /// Returns `true` if the archive contains a tile at the given S2
    /// coordinate.
    ///
    /// Coordinates outside the archive's zoom range are reported as absent.
    ///
    /// # Errors
    /// Will return [`Err`] if the header is invalid or the store fails.
    pub async fn has_tile_s2(&mut self, face: Face, zoom: u8, x: u64, y: u64) -> Result<bool> {
        add_await([self.ensure_setup()])?;

        if !in_bounds(self.max_zoom, zoom, x, y) {
            return Ok(false);
        }

        let Some(slot) = add_await([self.walk(face, zoom, x, y)])? else {
            return Ok(false);
        };

        let node = add_await([self.read_node(slot)])?;

        Ok(!node.is_absent())
    }

    /// Returns the payload of the tile at the web-mercator coordinate
    /// (face 0), decompressed.
    ///
    /// # Errors
    /// See [`get_tile_s2`](Self::get_tile_s2).
    pub async fn get_tile(&mut self, zoom: u8, x: u64, y: u64) -> Result<Option<Vec<u8>>> {
        add_await([self.get_tile_s2(Face::Face0, zoom, x, y)])
    }

    /// Returns the payload of the tile at the given S2 coordinate,
    /// decompressed with the archive's compression.
    ///
    /// Will return [`Ok`] with a value of [`None`] if no tile exists at the
    /// coordinate; a missing tile is not an error.
    ///
    /// # Errors
    /// Will return [`Err`] if the header is invalid, the store fails or the
    /// payload cannot be decompressed.
    pub async fn get_tile_s2(
        &mut self,
        face: Face,
        zoom: u8,
        x: u64,
        y: u64,
    ) -> Result<Option<Vec<u8>>> {
        add_await([self.ensure_setup()])?;

        if !in_bounds(self.max_zoom, zoom, x, y) {
            return Ok(None);
        }

        let Some(slot) = add_await([self.walk(face, zoom, x, y)])? else {
            return Ok(None);
        };

        let node = add_await([self.read_node(slot)])?;

        if node.is_absent() {
            return Ok(None);
        }

        let payload = add_await([self.read_section(node.offset, node.length as usize)])?;

        decompress_all(self.compression, &payload).map(Some)
    }

    /// Walks the directory trie without creating anything and returns the
    /// byte position of the terminal slot, or [`None`] as soon as a missing
    /// leaf directory proves the tile absent.
    async fn walk(&mut self, face: Face, zoom: u8, x: u64, y: u64) -> Result<Option<u64>> {
        let path = tile_path(zoom, x, y);
        let last = path.len() - 1;

        let mut pos = HEADER_BYTES + u64::from(face) * ROOT_DIR_BYTES;

        for (depth, &slot) in path.iter().enumerate() {
            pos += slot * NODE_BYTES;

            if depth == last {
                break;
            }

            // at a multiple-of-five maxzoom the deepest level of the current
            // directory holds the tile node itself, not a leaf pointer
            if self.max_zoom % 5 == 0
                && zoom == self.max_zoom
                && depth + 1 == last
                && path[last] == 0
            {
                break;
            }

            let node = add_await([self.read_node(pos)])?;

            if node.is_absent() {
                return Ok(None);
            }

            pos = node.offset;
        }

        Ok(Some(pos))
    }

    /// Reads the node record at an absolute byte position.
    async fn read_node(&mut self, pos: u64) -> Result<Node> {
        add_await([self.store.seek(SeekFrom::Start(pos))])?;

        let mut buf = [0; NODE_BYTES as usize];
        add_await([self.store.read_exact(&mut buf)])?;

        Ok(Node::from_bytes(&buf))
    }

    /// Reads `length` bytes starting at an absolute byte offset.
    async fn read_section(&mut self, offset: u64, length: usize) -> Result<Vec<u8>> {
        add_await([self.store.seek(SeekFrom::Start(offset))])?;

        let mut buf = vec![0; length];
        add_await([self.store.read_exact(&mut buf)])?;

        Ok(buf)
    }
}

#[duplicate_item(
    cfg_async                  async    add_await(code) SeekFrom                 WTraits                                                                                          new          put_tile         put_tile_s2         commit         walk_create         write_node         write_section         read_node;
    [cfg(all())]               []       [code]          [std::io::SeekFrom]      [Read + Write + Seek]                                                                            [new]        [put_tile]       [put_tile_s2]       [commit]       [walk_create]       [write_node]       [write_section]       [read_node];
    [cfg(feature = "async")]   [async]  [code.await]    [futures::io::SeekFrom]  [AsyncRead + AsyncReadExt + AsyncWrite + AsyncWriteExt + AsyncSeekExt + Send + Unpin]            [new_async]  [put_tile_async] [put_tile_s2_async] [commit_async] [walk_create_async] [write_node_async] [write_section_async] [read_node_async];
)]
#[cfg_async]
impl<S: WTraits> S2Tiles<S> {
    /// Initializes a fresh archive in `store`.
    ///
    /// The header region and the six per-face root directories are
    /// zero-filled and the append cursor is positioned behind them. Any
    /// previous content of the store within that range is overwritten.
    ///
    /// # Errors
    /// Will return [`Err`] if the initialization writes fail.
    #[allow(clippy::cast_possible_truncation)]
    pub async fn new(store: S, max_zoom: u8, compression: Compression) -> Result<Self> {
        let mut archive = Self {
            max_zoom,
            compression,
            store,
            cursor: TILE_DATA_OFFSET,
            metadata_length: 0,
            setup: true,
            metadata: None,
        };

        add_await([archive.write_section(0, &vec![0; TILE_DATA_OFFSET as usize])])?;

        Ok(archive)
    }

    /// Stores a tile at the web-mercator coordinate (face 0).
    ///
    /// # Errors
    /// See [`put_tile_s2`](Self::put_tile_s2).
    pub async fn put_tile(&mut self, zoom: u8, x: u64, y: u64, data: &[u8]) -> Result<()> {
        add_await([self.put_tile_s2(Face::Face0, zoom, x, y, data)])
    }

    /// Stores a tile at the given S2 coordinate.
    ///
    /// The payload is compressed with the archive's compression and appended
    /// at the cursor; missing leaf directories along the coordinate's path
    /// are allocated on the way down. The node record is written last, so an
    /// interrupted call can only orphan payload bytes, never leave a
    /// dangling reference.
    ///
    /// Writing the same coordinate again repoints its node record at the new
    /// payload; the old payload bytes remain in the file.
    ///
    /// # Errors
    /// Will return [`Error::InvalidCoordinate`] for coordinates outside the
    /// archive's zoom range and [`Err`] for codec or store failures.
    pub async fn put_tile_s2(
        &mut self,
        face: Face,
        zoom: u8,
        x: u64,
        y: u64,
        data: &[u8],
    ) -> Result<()> {
        if !in_bounds(self.max_zoom, zoom, x, y) {
            return Err(Error::InvalidCoordinate { zoom, x, y });
        }

        let payload = compress_all(self.compression, data)?;
        let length =
            u32::try_from(payload.len()).map_err(|_| Error::TileTooLarge(payload.len()))?;

        let offset = self.cursor;
        add_await([self.write_section(offset, &payload)])?;
        self.cursor += u64::from(length);

        let slot = add_await([self.walk_create(face, zoom, x, y)])?;

        add_await([self.write_node(slot, Node { offset, length })])
    }

    /// Writes the header preamble and the metadata blob.
    ///
    /// An optional `compression` override replaces the archive compression
    /// before the metadata is compressed and recorded. Committing is
    /// intended to be the terminal step of producing an archive, but may be
    /// repeated; the latest commit wins.
    ///
    /// # Errors
    /// Will return [`Error::MetadataTooLarge`] if the compressed metadata
    /// does not fit into the header region, and [`Err`] for codec or store
    /// failures.
    #[allow(clippy::cast_possible_truncation)]
    pub async fn commit(&mut self, metadata: &[u8], compression: Option<Compression>) -> Result<()> {
        if let Some(compression) = compression {
            self.compression = compression;
        }

        let compressed = compress_all(self.compression, metadata)?;

        if compressed.len() > MAX_METADATA_BYTES {
            return Err(Error::MetadataTooLarge(compressed.len()));
        }

        let header = Header::new(self.max_zoom, self.compression, compressed.len() as u32);

        add_await([self.write_section(0, &header.encode()?)])?;
        add_await([self.write_section(METADATA_OFFSET, &compressed)])?;
        add_await([self.store.flush()])?;

        self.metadata_length = compressed.len() as u32;
        self.metadata = Some(metadata.to_vec());
        self.setup = true;

        Ok(())
    }

    /// Walks the directory trie towards the terminal slot of a coordinate,
    /// allocating missing leaf directories at the append cursor.
    ///
    /// Existing leaf pointers are never rewritten, which keeps the trie
    /// acyclic.
    #[allow(clippy::cast_possible_truncation)]
    async fn walk_create(&mut self, face: Face, zoom: u8, x: u64, y: u64) -> Result<u64> {
        let path = tile_path(zoom, x, y);
        let last = path.len() - 1;

        let mut pos = HEADER_BYTES + u64::from(face) * ROOT_DIR_BYTES;

        for (depth, &slot) in path.iter().enumerate() {
            pos += slot * NODE_BYTES;

            if depth == last {
                break;
            }

            // at a multiple-of-five maxzoom the deepest level of the current
            // directory holds the tile node itself, not a leaf pointer
            if self.max_zoom % 5 == 0
                && zoom == self.max_zoom
                && depth + 1 == last
                && path[last] == 0
            {
                break;
            }

            let node = add_await([self.read_node(pos)])?;

            if node.is_absent() {
                let size = directory_size(5 * (depth as u8 + 1), self.max_zoom);

                let dir_offset = self.cursor;
                add_await([self.write_section(dir_offset, &vec![0; size as usize])])?;
                self.cursor += size;

                let leaf = Node {
                    offset: dir_offset,
                    length: size as u32,
                };
                add_await([self.write_node(pos, leaf)])?;

                pos = dir_offset;
            } else {
                pos = node.offset;
            }
        }

        Ok(pos)
    }

    /// Writes a node record at an absolute byte position.
    async fn write_node(&mut self, pos: u64, node: Node) -> Result<()> {
        let buf = node.to_bytes()?;

        add_await([self.write_section(pos, &buf)])
    }

    /// Writes `data` starting at an absolute byte offset, extending the
    /// store with zero padding if the offset lies past its current end.
    async fn write_section(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        add_await([self.store.seek(SeekFrom::Start(offset))])?;
        add_await([self.store.write_all(data)])?;

        Ok(())
    }
}
