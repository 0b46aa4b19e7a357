// A `Reader`/`Writer` pair so `TokenDatabase::snapshot_write`/`snapshot_read`
// (and the controller's block-header-plus-TDB snapshot one layer up) don't
// care whether the snapshot lands in an in-memory buffer or a file: tests
// and the in-process squash path use `MemWriter`/`MemReader`, the `ledgerdb`
// binary's `--snapshot-out`/`--snapshot-in` flags use `FileWriter`/
// `FileReader`.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Cursor, Read, Result, Seek, Write},
    path::PathBuf,
    sync::Arc,
};

pub trait Reader: Read + Seek + Send + Sized {
    fn try_clone_independent(&self) -> Result<Self>;
}

pub trait Writer: Write + Seek + Send + Sized {
    type PairedReader: Reader;
    /// Finishes the write and hands back a reader positioned at the start
    /// of what was just written, so a snapshot can be taken and verified
    /// by reading it straight back without a round trip through storage.
    fn try_into_reader(self) -> Result<Self::PairedReader>;
}

// MemReader/MemWriter

pub struct MemReader {
    mem: Cursor<Arc<[u8]>>,
}

impl MemReader {
    fn new(mem: Arc<[u8]>) -> Self {
        Self { mem: Cursor::new(mem) }
    }
}

impl From<Vec<u8>> for MemReader {
    fn from(vec: Vec<u8>) -> Self {
        Self::new(Arc::from(vec))
    }
}

impl Read for MemReader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.mem.read(buf)
    }
}

impl Seek for MemReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> Result<u64> {
        self.mem.seek(pos)
    }
}

impl Reader for MemReader {
    fn try_clone_independent(&self) -> Result<Self> {
        Ok(Self::new(self.mem.get_ref().clone()))
    }
}

pub struct MemWriter {
    mem: Cursor<Vec<u8>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self { mem: Cursor::new(Vec::new()) }
    }
}

impl Default for MemWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for MemWriter {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.mem.write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.mem.flush()
    }
}

impl Seek for MemWriter {
    fn seek(&mut self, pos: std::io::SeekFrom) -> Result<u64> {
        self.mem.seek(pos)
    }
}

impl Writer for MemWriter {
    type PairedReader = MemReader;

    fn try_into_reader(self) -> Result<Self::PairedReader> {
        let rc: Arc<[u8]> = Arc::from(self.mem.into_inner());
        Ok(MemReader { mem: Cursor::new(rc) })
    }
}

// FileReader/FileWriter

pub struct FileReader {
    file: BufReader<File>,
    path: PathBuf,
}

impl FileReader {
    pub fn try_open_existing(path: PathBuf) -> Result<Self> {
        let file = File::open(&path)?;
        Ok(Self { file: BufReader::new(file), path })
    }
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for FileReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> Result<u64> {
        self.file.seek(pos)
    }
}

impl Reader for FileReader {
    fn try_clone_independent(&self) -> Result<Self> {
        FileReader::try_open_existing(self.path.clone())
    }
}

pub struct FileWriter {
    file: BufWriter<File>,
    path: PathBuf,
}

impl FileWriter {
    /// Snapshots are taken once per write, never appended to, so creation
    /// refuses to clobber a path that already holds one.
    pub fn try_create_non_existing(path: PathBuf) -> Result<Self> {
        let file = std::fs::OpenOptions::new().write(true).create_new(true).open(&path)?;
        Ok(Self { file: BufWriter::new(file), path })
    }
}

impl Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush()
    }
}

impl Seek for FileWriter {
    fn seek(&mut self, pos: std::io::SeekFrom) -> Result<u64> {
        self.file.seek(pos)
    }
}

impl Writer for FileWriter {
    type PairedReader = FileReader;

    fn try_into_reader(self) -> Result<Self::PairedReader> {
        let Self { mut file, path } = self;
        // The written bytes must be on disk before anything reopens the
        // path, not just sitting in the BufWriter or the OS page cache.
        file.flush()?;
        file.into_inner()?.sync_all()?;
        FileReader::try_open_existing(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ledgerdb-store-ioutil-test-{label}-{}", std::process::id()))
    }

    #[test]
    fn file_writer_round_trips_through_file_reader() {
        let path = scratch_path("roundtrip");
        let _ = std::fs::remove_file(&path);

        let mut w = FileWriter::try_create_non_existing(path.clone()).unwrap();
        w.write_all(b"snapshot payload").unwrap();
        let mut r = w.try_into_reader().unwrap();

        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"snapshot payload");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn file_writer_refuses_to_overwrite_an_existing_snapshot() {
        let path = scratch_path("no-clobber");
        let _ = std::fs::remove_file(&path);
        FileWriter::try_create_non_existing(path.clone()).unwrap();

        let err = FileWriter::try_create_non_existing(path.clone()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn file_reader_try_clone_independent_reopens_the_same_path() {
        let path = scratch_path("clone");
        let _ = std::fs::remove_file(&path);
        let mut w = FileWriter::try_create_non_existing(path.clone()).unwrap();
        w.write_all(b"abc").unwrap();
        let mut r = w.try_into_reader().unwrap();
        r.seek(std::io::SeekFrom::Start(1)).unwrap();

        let mut clone = r.try_clone_independent().unwrap();
        let mut out = Vec::new();
        clone.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abc", "a fresh clone reopens from the start, not from the original's cursor");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn mem_writer_round_trips_through_mem_reader() {
        let mut w = MemWriter::new();
        w.write_all(b"hello").unwrap();
        let mut r = w.try_into_reader().unwrap();
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello");
    }
}
