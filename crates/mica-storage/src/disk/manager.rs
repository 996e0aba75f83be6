//! Disk manager trait and its file-backed implementation.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use mica_common::PageId;
use parking_lot::Mutex;
use tracing::trace;

use super::error::{DiskError, DiskResult};

/// Random-access page I/O consumed by the buffer pool.
///
/// All operations are synchronous; implementations serialize file access
/// internally so the trait is usable behind `&self` from any thread.
pub trait DiskManager: Send + Sync {
    /// Reads the page into `buf`. Bytes past end-of-file read as zero:
    /// pages are allocated lazily and may be fetched before they were ever
    /// written out.
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> DiskResult<()>;

    /// Writes one page of data at the page's offset.
    fn write_page(&self, page_id: PageId, data: &[u8]) -> DiskResult<()>;

    /// Marks the page as deallocated. Space reclamation is deferred; the
    /// offset may be rewritten by a later allocation of the same id.
    fn deallocate_page(&self, page_id: PageId) -> DiskResult<()>;

    /// Flushes buffered writes to durable storage.
    fn sync(&self) -> DiskResult<()>;

    /// Page size this manager was configured with.
    fn page_size(&self) -> usize;
}

/// File-backed [`DiskManager`] over a single database file.
///
/// Pages live at `page_id * page_size`. A `Mutex` around the file handle
/// serializes the seek + I/O pairs.
pub struct FileDiskManager {
    file: Mutex<File>,
    path: PathBuf,
    page_size: usize,
}

impl FileDiskManager {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>, page_size: usize) -> DiskResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        Ok(Self {
            file: Mutex::new(file),
            path,
            page_size,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn page_offset(&self, page_id: PageId) -> DiskResult<u64> {
        if !page_id.is_valid() {
            return Err(DiskError::invalid_page_id(page_id));
        }
        Ok(page_id.file_offset(self.page_size))
    }

    fn check_buf(&self, len: usize) -> DiskResult<()> {
        if len != self.page_size {
            return Err(DiskError::size_mismatch(self.page_size, len));
        }
        Ok(())
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> DiskResult<()> {
        let offset = self.page_offset(page_id)?;
        self.check_buf(buf.len())?;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            let n = file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        // The tail of a page that was never written out reads as zero.
        buf[filled..].fill(0);

        trace!(page_id = %page_id, filled, "read page");
        Ok(())
    }

    fn write_page(&self, page_id: PageId, data: &[u8]) -> DiskResult<()> {
        let offset = self.page_offset(page_id)?;
        self.check_buf(data.len())?;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;

        trace!(page_id = %page_id, "wrote page");
        Ok(())
    }

    fn deallocate_page(&self, page_id: PageId) -> DiskResult<()> {
        self.page_offset(page_id)?;
        trace!(page_id = %page_id, "deallocated page");
        Ok(())
    }

    fn sync(&self) -> DiskResult<()> {
        self.file.lock().sync_all()?;
        Ok(())
    }

    fn page_size(&self) -> usize {
        self.page_size
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
