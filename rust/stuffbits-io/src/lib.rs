//! Output abstraction used to persist packed bit streams.
//!
//! `SealingWrite` is a sequential writer with a `seal()` operation that commits
//! the written bytes. Implemented for in-memory buffers and files.

pub mod file;
pub mod memory;

pub use file::FileWriter;

/// A trait for sequential writing with explicit sealing semantics.
///
/// Data is appended with [`write_all`](SealingWrite::write_all) and committed with
/// [`seal`](SealingWrite::seal). Either all bytes of a `write_all` call are written,
/// or an error is returned.
pub trait SealingWrite: Send {
    /// Appends the entire buffer to previously written data.
    ///
    /// # Errors
    ///
    /// Fails if the underlying storage reports an I/O error or the writer has
    /// already been sealed.
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// Flushes and commits everything written so far. Once sealed, the writer
    /// rejects further writes.
    fn seal(&mut self) -> std::io::Result<()>;
}

impl<T> SealingWrite for Box<T>
where
    T: SealingWrite + ?Sized,
{
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.as_mut().write_all(buf)
    }

    fn seal(&mut self) -> std::io::Result<()> {
        self.as_mut().seal()
    }
}
