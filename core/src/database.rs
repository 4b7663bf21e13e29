//! Append-only replay database with random access.
//!
//! A database file starts with a fixed-capacity lookup table (LUT): a
//! `u64` entry count followed by [`MAX_ENTRIES`] reserved `i64` slots,
//! each holding the absolute byte offset of one zlib-compressed entry.
//! The header space is zero-filled at creation so appends never shift the
//! file body; the cost is an ~8MB minimum file size.
//!
//! Appends commit in three phases: compressed payload, then the offset
//! slot, then the entry count at byte 0. A crash between phases leaves
//! the count at its old value and the partial entry is simply invisible
//! on the next load.
//!
//! Every operation opens its own file handle and releases it on return.
//! The LUT is read once at load and cached, so a long-lived reader does
//! not observe entries appended by another instance after its own open.
//! Single-writer exclusivity is the caller's responsibility.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use hashbrown::HashSet;

use crate::error::{Error, Result};

/// Maximum number of entries in a database, fixed by the on-disk LUT size.
pub const MAX_ENTRIES: usize = 1_000_000;

/// Count prefix plus the reserved offset slots.
const HEADER_BYTES: u64 = 8 + (MAX_ENTRIES as u64) * 8;

/// Disk-block-aligned chunk size used when zero-filling a new file.
const FILL_CHUNK: usize = 4096;

/// Schema adapter the database engine is generic over.
///
/// One implementation per entry schema describes how to read a header, a
/// unique id and a full entry from a decompressed stream, and how to
/// write an entry. The engine itself never inspects entry contents, and
/// distinct schema versions are distinct implementing types so that a
/// reader/writer pair agree on layout by construction.
pub trait DatabaseEntry: Sized {
    /// Metadata at the front of an entry, readable without the payload.
    type Header;

    fn read_header<R: Read>(reader: &mut R) -> Result<Self::Header>;

    /// Cheap prefix-only read of the entry's unique id; must stop after
    /// the identifying fields rather than decode the whole entry.
    fn read_uid<R: Read>(reader: &mut R) -> Result<String>;

    fn read_entry<R: Read>(reader: &mut R) -> Result<Self>;

    fn write_entry<W: Write>(&self, writer: &mut W) -> Result<()>;
}

/// Append-only, random-access store of compressed replay entries.
pub struct ReplayDatabase<E> {
    path: PathBuf,
    lut: Vec<i64>,
    _entry: PhantomData<E>,
}

impl<E: DatabaseEntry> ReplayDatabase<E> {
    /// Open the database at `path`, creating it if absent.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        if path.exists() { Self::load(path) } else { Self::create(path) }
    }

    /// Create a fresh database; fails if `path` already exists.
    pub fn create<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            return Err(Error::AlreadyExists(path));
        }
        create_database_file(&path)?;
        log::info!("created database at {}", path.display());
        Ok(Self { path, lut: Vec::new(), _entry: PhantomData })
    }

    /// Load an existing database; fails if `path` does not exist.
    pub fn load<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(Error::NotFound(path));
        }
        let lut = load_lookup_table(&path)?;
        log::info!("loaded database at {} with {} entries", path.display(), lut.len());
        Ok(Self { path, lut, _entry: PhantomData })
    }

    /// Compress and append one entry.
    ///
    /// The entry count at byte 0 is written last: a crash mid-append
    /// leaves the database valid with the previous count.
    pub fn add_entry(&mut self, entry: &E) -> Result<()> {
        if self.is_full() {
            log::error!("database at {} is full", self.path.display());
            return Err(Error::DatabaseFull);
        }
        if !self.path.exists() {
            return Err(Error::NotFound(self.path.clone()));
        }

        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let previous_end = file.seek(SeekFrom::End(0))?;

        // Phase 1: compressed payload at the end of the file
        let mut encoder =
            ZlibEncoder::new(BufWriter::new(&mut file), Compression::best());
        entry.write_entry(&mut encoder)?;
        encoder.finish()?.flush()?;

        // Phase 2: offset into its reserved LUT slot
        let offset = previous_end as i64;
        file.seek(SeekFrom::Start(8 + (self.lut.len() as u64) * 8))?;
        file.write_i64::<LittleEndian>(offset)?;

        // Phase 3: advance the entry count
        file.seek(SeekFrom::Start(0))?;
        file.write_u64::<LittleEndian>((self.lut.len() + 1) as u64)?;

        self.lut.push(offset);
        log::debug!("entry {} written at offset {offset}", self.lut.len() - 1);
        Ok(())
    }

    /// Read back the full entry at `index`.
    pub fn get_entry(&self, index: usize) -> Result<E> {
        E::read_entry(&mut self.entry_reader(index)?)
    }

    /// Read only the header of the entry at `index`.
    pub fn get_header(&self, index: usize) -> Result<E::Header> {
        E::read_header(&mut self.entry_reader(index)?)
    }

    /// Read only the unique id of the entry at `index`.
    pub fn get_entry_uid(&self, index: usize) -> Result<String> {
        E::read_uid(&mut self.entry_reader(index)?)
    }

    /// Collect the unique ids of all entries.
    ///
    /// Unreadable entries are skipped with a warning so one corrupt entry
    /// does not abort a bulk scan.
    pub fn get_all_uids(&self) -> HashSet<String> {
        let mut uids = HashSet::with_capacity(self.lut.len());
        for index in 0..self.lut.len() {
            match self.get_entry_uid(index) {
                Ok(uid) => {
                    uids.insert(uid);
                }
                Err(err) => log::warn!("skipping unreadable entry {index}: {err}"),
            }
        }
        uids
    }

    /// Number of committed entries.
    pub fn size(&self) -> usize {
        self.lut.len()
    }

    /// Whether the lookup table has reached its on-disk capacity.
    pub fn is_full(&self) -> bool {
        self.lut.len() >= MAX_ENTRIES
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decompressing reader positioned at the entry's first byte.
    fn entry_reader(&self, index: usize) -> Result<ZlibDecoder<BufReader<File>>> {
        let offset = *self.lut.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.lut.len(),
        })?;
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset as u64))?;
        Ok(ZlibDecoder::new(BufReader::new(file)))
    }
}

/// Zero-fill the count prefix and every reserved LUT slot.
fn create_database_file(path: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    let zeros = [0_u8; FILL_CHUNK];
    let mut remaining = HEADER_BYTES as usize;
    while remaining > 0 {
        let chunk = remaining.min(FILL_CHUNK);
        file.write_all(&zeros[..chunk])?;
        remaining -= chunk;
    }
    file.flush()?;
    Ok(())
}

/// Read the committed entry count and that many offsets.
fn load_lookup_table(path: &Path) -> Result<Vec<i64>> {
    let mut reader = BufReader::new(File::open(path)?);
    let count = reader.read_u64::<LittleEndian>()?;
    if count > MAX_ENTRIES as u64 {
        return Err(Error::CorruptData(format!(
            "entry count {count} exceeds table capacity"
        )));
    }
    let mut lut = Vec::with_capacity(count as usize);
    for _ in 0..count {
        lut.push(reader.read_i64::<LittleEndian>()?);
    }
    Ok(lut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Codec;
    use tempfile::tempdir;

    /// Minimal schema: a name and a payload blob.
    #[derive(Debug, Clone, PartialEq)]
    struct Blob {
        name: String,
        payload: Vec<u8>,
    }

    impl DatabaseEntry for Blob {
        type Header = String;

        fn read_header<R: Read>(reader: &mut R) -> Result<Self::Header> {
            String::decode(reader)
        }

        fn read_uid<R: Read>(reader: &mut R) -> Result<String> {
            String::decode(reader)
        }

        fn read_entry<R: Read>(reader: &mut R) -> Result<Self> {
            Ok(Self {
                name: String::decode(reader)?,
                payload: Vec::decode(reader)?,
            })
        }

        fn write_entry<W: Write>(&self, writer: &mut W) -> Result<()> {
            self.name.encode(writer)?;
            self.payload.encode(writer)
        }
    }

    fn blob(name: &str, size: usize) -> Blob {
        Blob {
            name: name.to_string(),
            payload: (0..size).map(|i| (i % 251) as u8).collect(),
        }
    }

    #[test]
    fn test_create_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.rdb");

        let db = ReplayDatabase::<Blob>::create(&path).unwrap();
        assert_eq!(db.size(), 0);
        assert!(!db.is_full());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), HEADER_BYTES);

        // Create refuses an existing file, load accepts it
        assert!(matches!(
            ReplayDatabase::<Blob>::create(&path),
            Err(Error::AlreadyExists(_))
        ));
        assert_eq!(ReplayDatabase::<Blob>::load(&path).unwrap().size(), 0);
    }

    #[test]
    fn test_load_missing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.rdb");
        assert!(matches!(
            ReplayDatabase::<Blob>::load(&path),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = tempdir().unwrap();
        let mut db = ReplayDatabase::<Blob>::open(dir.path().join("t.rdb")).unwrap();

        let first = blob("alpha", 4096);
        let second = blob("beta", 100);
        db.add_entry(&first).unwrap();
        db.add_entry(&second).unwrap();

        assert_eq!(db.size(), 2);
        assert_eq!(db.get_entry(0).unwrap(), first);
        assert_eq!(db.get_entry(1).unwrap(), second);
        assert_eq!(db.get_header(1).unwrap(), "beta");
        assert_eq!(db.get_entry_uid(0).unwrap(), "alpha");
    }

    #[test]
    fn test_reopen_sees_committed_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.rdb");

        let first = blob("alpha", 512);
        {
            let mut db = ReplayDatabase::<Blob>::open(&path).unwrap();
            db.add_entry(&first).unwrap();
        }

        let db = ReplayDatabase::<Blob>::load(&path).unwrap();
        assert_eq!(db.size(), 1);
        assert_eq!(db.get_entry(0).unwrap(), first);
    }

    #[test]
    fn test_index_out_of_range() {
        let dir = tempdir().unwrap();
        let mut db = ReplayDatabase::<Blob>::open(dir.path().join("t.rdb")).unwrap();
        db.add_entry(&blob("only", 16)).unwrap();

        assert!(matches!(
            db.get_entry(1),
            Err(Error::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_full_database_rejects_append() {
        let dir = tempdir().unwrap();
        let mut db = ReplayDatabase::<Blob>::open(dir.path().join("t.rdb")).unwrap();

        // Simulate a full table rather than writing a million entries
        db.lut = vec![0; MAX_ENTRIES];
        assert!(db.is_full());
        assert!(matches!(db.add_entry(&blob("x", 1)), Err(Error::DatabaseFull)));
    }

    #[test]
    fn test_get_all_uids() {
        let dir = tempdir().unwrap();
        let mut db = ReplayDatabase::<Blob>::open(dir.path().join("t.rdb")).unwrap();
        db.add_entry(&blob("alpha", 32)).unwrap();
        db.add_entry(&blob("beta", 32)).unwrap();
        db.add_entry(&blob("alpha", 64)).unwrap(); // duplicate uid

        let uids = db.get_all_uids();
        assert_eq!(uids.len(), 2);
        assert!(uids.contains("alpha") && uids.contains("beta"));
    }

    #[test]
    fn test_torn_append_is_invisible() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.rdb");

        let first = blob("alpha", 256);
        {
            let mut db = ReplayDatabase::<Blob>::open(&path).unwrap();
            db.add_entry(&first).unwrap();
        }

        // A payload written without its offset/count updates (crash between
        // commit phases) must not surface on the next load.
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        }

        let db = ReplayDatabase::<Blob>::load(&path).unwrap();
        assert_eq!(db.size(), 1);
        assert_eq!(db.get_entry(0).unwrap(), first);
    }

    #[test]
    fn test_corrupt_count_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.rdb");
        ReplayDatabase::<Blob>::create(&path).unwrap();

        {
            let mut file = OpenOptions::new().write(true).open(&path).unwrap();
            file.write_u64::<LittleEndian>(MAX_ENTRIES as u64 + 1).unwrap();
        }

        assert!(matches!(
            ReplayDatabase::<Blob>::load(&path),
            Err(Error::CorruptData(_))
        ));
    }

    #[test]
    fn test_corrupt_entry_skipped_in_uid_scan() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.rdb");

        let mut db = ReplayDatabase::<Blob>::open(&path).unwrap();
        db.add_entry(&blob("alpha", 64)).unwrap();
        db.add_entry(&blob("beta", 64)).unwrap();

        // Stomp the second entry's compressed stream
        let offset = db.lut[1] as u64;
        {
            let mut file = OpenOptions::new().write(true).open(&path).unwrap();
            file.seek(SeekFrom::Start(offset)).unwrap();
            file.write_all(&[0xFF; 8]).unwrap();
        }

        let db = ReplayDatabase::<Blob>::load(&path).unwrap();
        let uids = db.get_all_uids();
        assert_eq!(uids.len(), 1);
        assert!(uids.contains("alpha"));
    }

    #[test]
    fn test_zlib_entry_after_uncompressed_header() {
        // The engine relies on a zlib stream starting mid-file, after the
        // uncompressed LUT region; exercise that directly.
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.zlib");
        let padding = 293_usize;
        let payload: Vec<u8> = (0..8192_u32).flat_map(u32::to_le_bytes).collect();

        {
            let mut file = BufWriter::new(File::create(&path).unwrap());
            file.write_all(&vec![0; padding]).unwrap();
            let mut encoder = ZlibEncoder::new(&mut file, Compression::best());
            encoder.write_all(&payload).unwrap();
            encoder.finish().unwrap().flush().unwrap();
        }

        let mut file = File::open(&path).unwrap();
        file.seek(SeekFrom::Start(padding as u64)).unwrap();
        let mut decoder = ZlibDecoder::new(BufReader::new(file));
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, payload);
    }
}
