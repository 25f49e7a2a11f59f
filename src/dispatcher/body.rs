use crate::handler::Body;
use std::fmt;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The request body exceeded the configured limit.
///
/// Carried inside the `io::Error` returned by the body reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyTooLarge {
    pub limit: u64,
}

impl BodyTooLarge {
    /// True if `err` was produced by the body limiter.
    #[must_use]
    pub fn is_body_too_large(err: &io::Error) -> bool {
        err.get_ref().is_some_and(|inner| inner.is::<BodyTooLarge>())
    }

    fn into_io(self) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, self)
    }
}

impl fmt::Display for BodyTooLarge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request body exceeds {} bytes", self.limit)
    }
}

impl std::error::Error for BodyTooLarge {}

/// Reader that fails once more than `limit` bytes are available.
///
/// Exactly `limit` bytes read cleanly to EOF. The shared flag lets the
/// dispatcher see the violation after the handler returns.
pub(crate) struct LimitedBody {
    inner: Body,
    remaining: u64,
    limit: u64,
    tripped: Arc<AtomicBool>,
}

impl LimitedBody {
    pub(crate) fn new(inner: Body, limit: u64, tripped: Arc<AtomicBool>) -> Self {
        Self {
            inner,
            remaining: limit,
            limit,
            tripped,
        }
    }

    fn trip(&self) -> io::Error {
        self.tripped.store(true, Ordering::Release);
        BodyTooLarge { limit: self.limit }.into_io()
    }
}

impl Read for LimitedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.tripped.load(Ordering::Acquire) {
            return Err(BodyTooLarge { limit: self.limit }.into_io());
        }
        if buf.is_empty() {
            return Ok(0);
        }
        if self.remaining == 0 {
            // Any further byte means the limit was exceeded.
            let mut probe = [0u8; 1];
            return match self.inner.read(&mut probe)? {
                0 => Ok(0),
                _ => Err(self.trip()),
            };
        }
        let max = usize::try_from(self.remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = self.inner.read(&mut buf[..max])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}
