use std::{fs::File, io::Write, path::Path};

use crate::SealingWrite;

/// Sequential file writer. `seal()` flushes and syncs the file, after which
/// further writes fail.
pub struct FileWriter {
    file: Option<File>,
}

impl FileWriter {
    pub fn new(file: File) -> FileWriter {
        FileWriter { file: Some(file) }
    }

    /// Creates a new file at `path`; fails if the file already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<FileWriter> {
        Ok(FileWriter::new(File::create_new(path)?))
    }

    fn sealed() -> std::io::Error {
        std::io::Error::other("file writer is already sealed")
    }
}

impl SealingWrite for FileWriter {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.file.as_mut().ok_or_else(Self::sealed)?.write_all(buf)
    }

    fn seal(&mut self) -> std::io::Result<()> {
        let mut file = self.file.take().ok_or_else(Self::sealed)?;
        file.flush()?;
        file.sync_all()
    }
}
