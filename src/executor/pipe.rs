use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::unistd;

/// The descriptor pair joining stage `i` (writer) to stage `i + 1` (reader).
///
/// Both ends are close-on-exec so a sibling stage never keeps a pipe open
/// by accident. Each end is released once, either explicitly after it was
/// handed to a child or when the endpoint is dropped.
#[derive(Debug)]
pub struct PipeEndpoint {
    read: Option<OwnedFd>,
    write: Option<OwnedFd>,
}

impl PipeEndpoint {
    pub fn create() -> Result<Self, Errno> {
        let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC)?;
        Ok(PipeEndpoint {
            read: Some(read),
            write: Some(write),
        })
    }

    pub fn read_fd(&self) -> Option<RawFd> {
        self.read.as_ref().map(AsRawFd::as_raw_fd)
    }

    pub fn write_fd(&self) -> Option<RawFd> {
        self.write.as_ref().map(AsRawFd::as_raw_fd)
    }

    pub fn close_read(&mut self) {
        self.read.take();
    }

    pub fn close_write(&mut self) {
        self.write.take();
    }

    pub fn is_closed(&self) -> bool {
        self.read.is_none() && self.write.is_none()
    }

    /// Descriptors still held by this process.
    pub fn open_fds(&self) -> impl Iterator<Item = RawFd> + '_ {
        self.read_fd().into_iter().chain(self.write_fd())
    }
}
