//! File-backed disk manager.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use oxbow_common::constants::PAGE_SIZE;
use oxbow_common::types::PageId;
use parking_lot::Mutex;

use super::DiskManager;

/// Disk manager backed by a single database file.
///
/// Pages live at offset `page_id * page_size`. The file grows as pages
/// are written; reads past the current end of file return zeroed pages,
/// matching the contents a never-written page is defined to have.
pub struct FileDiskManager {
    /// Path to the database file.
    path: PathBuf,
    /// File handle, serialized by a mutex.
    file: Mutex<File>,
    /// Page size in bytes.
    page_size: usize,
}

impl FileDiskManager {
    /// Opens or creates a database file.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::open_with_page_size(path, PAGE_SIZE)
    }

    /// Opens or creates a database file with a custom page size.
    pub fn open_with_page_size(path: impl AsRef<Path>, page_size: usize) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            page_size,
        })
    }

    /// Returns the path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Flushes all buffered writes to stable storage.
    pub fn sync(&self) -> io::Result<()> {
        self.file.lock().sync_all()
    }

    fn offset_of(&self, page_id: PageId) -> u64 {
        page_id.as_u64() * self.page_size as u64
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> io::Result<()> {
        debug_assert_eq!(buf.len(), self.page_size);
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(self.offset_of(page_id)))?;

        match file.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                // Page beyond the current file end: defined to be zeroes.
                tracing::debug!(page_id = %page_id, "read past end of file, zero-filling");
                buf.fill(0);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn write_page(&self, page_id: PageId, data: &[u8]) -> io::Result<()> {
        debug_assert_eq!(data.len(), self.page_size);
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(self.offset_of(page_id)))?;
        file.write_all(data)
    }
}

impl std::fmt::Debug for FileDiskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDiskManager")
            .field("path", &self.path)
            .field("page_size", &self.page_size)
            .finish()
    }
}
