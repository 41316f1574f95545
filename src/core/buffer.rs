//! Fixed-size message buffers
//!
//! A [`Buffer`] holds exactly one formatted log line. Its last byte is
//! reserved for the line terminator, so a truncated message can always be
//! closed with a newline.

use std::fmt;

/// Diagnostic identity of a pooled buffer (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(pub u32);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-capacity byte block owned by exactly one of: the free list, the
/// spew queue, a producer thread's stream, or the consumer's current batch.
///
/// Buffers are moved, never shared, so that ownership rule is enforced by
/// the type system rather than by convention.
pub struct Buffer {
    id: BufferId,
    data: Box<[u8]>,
    len: usize,
}

impl Buffer {
    pub(crate) fn new(id: BufferId, size: usize) -> Self {
        Self {
            id,
            data: vec![0u8; size].into_boxed_slice(),
            len: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total size, including the reserved newline slot.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn payload_capacity(&self) -> usize {
        self.data.len() - 1
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    /// Copy as much of `bytes` as fits in the payload area.
    /// Returns the number of bytes copied.
    pub(crate) fn append(&mut self, bytes: &[u8]) -> usize {
        let room = self.payload_capacity() - self.len;
        let n = bytes.len().min(room);
        self.data[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        n
    }

    /// Make the content end in exactly one newline added by us.
    ///
    /// Content that already ends in `\n` is left alone; otherwise the newline
    /// goes into the reserved slot, which `append` never fills.
    pub(crate) fn terminate_line(&mut self) {
        if self.len > 0 && self.data[self.len - 1] == b'\n' {
            return;
        }
        self.data[self.len] = b'\n';
        self.len += 1;
    }

    pub(crate) fn writer(&mut self) -> BufferWriter<'_> {
        BufferWriter {
            buffer: self,
            truncated: false,
            newline_deferred: false,
        }
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// `fmt::Write` adapter that silently truncates at the buffer's payload
/// capacity.
///
/// Truncation happens on a UTF-8 character boundary, and once anything has
/// been cut every later write is discarded so the line never resumes
/// mid-sentence. It never reports an error, so formatting always runs to
/// completion without touching memory past the buffer.
///
/// A final `\n` that only overflows into the reserved slot is not a cut:
/// it is deferred to [`Buffer::terminate_line`], which puts it there.
pub(crate) struct BufferWriter<'a> {
    buffer: &'a mut Buffer,
    truncated: bool,
    newline_deferred: bool,
}

impl BufferWriter<'_> {
    #[inline]
    pub(crate) fn truncated(&self) -> bool {
        self.truncated
    }
}

impl fmt::Write for BufferWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.truncated {
            return Ok(());
        }
        let room = self.buffer.payload_capacity() - self.buffer.len();
        if s.len() <= room {
            self.buffer.append(s.as_bytes());
            return Ok(());
        }
        if s.len() == room + 1 && s.ends_with('\n') && !self.newline_deferred {
            self.buffer.append(&s.as_bytes()[..room]);
            if self.buffer.as_bytes().last() == Some(&b'\n') {
                self.truncated = true;
            } else {
                self.newline_deferred = true;
            }
            return Ok(());
        }

        let mut cut = room;
        while cut > 0 && !s.is_char_boundary(cut) {
            cut -= 1;
        }
        self.buffer.append(&s.as_bytes()[..cut]);
        self.truncated = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    #[test]
    fn test_append_respects_payload_capacity() {
        let mut buf = Buffer::new(BufferId(1), 8);
        assert_eq!(buf.payload_capacity(), 7);
        assert_eq!(buf.append(b"0123456789"), 7);
        assert_eq!(buf.as_bytes(), b"0123456");
    }

    #[test]
    fn test_terminate_line_uses_reserved_slot() {
        let mut buf = Buffer::new(BufferId(1), 8);
        buf.append(b"0123456789");
        buf.terminate_line();
        assert_eq!(buf.as_bytes(), b"0123456\n");
        assert_eq!(buf.len(), buf.capacity());
    }

    #[test]
    fn test_terminate_line_never_doubles() {
        let mut buf = Buffer::new(BufferId(1), 16);
        buf.append(b"hello\n");
        buf.terminate_line();
        assert_eq!(buf.as_bytes(), b"hello\n");
    }

    #[test]
    fn test_terminate_empty_buffer() {
        let mut buf = Buffer::new(BufferId(1), 4);
        buf.terminate_line();
        assert_eq!(buf.as_bytes(), b"\n");
    }

    #[test]
    fn test_writer_truncates_on_char_boundary() {
        let mut buf = Buffer::new(BufferId(1), 6);
        let mut w = buf.writer();
        // 'é' is two bytes; "abcé" is 5 bytes but only 5 fit, "abcéé" would not
        write!(w, "abcéé").unwrap();
        assert!(w.truncated());
        assert_eq!(std::str::from_utf8(buf.as_bytes()).unwrap(), "abcé");
    }

    #[test]
    fn test_writer_stops_after_truncation() {
        let mut buf = Buffer::new(BufferId(1), 5);
        let mut w = buf.writer();
        write!(w, "abc").unwrap();
        write!(w, "ééé").unwrap();
        write!(w, "z").unwrap();
        assert!(w.truncated());
        assert_eq!(buf.as_bytes(), b"abc");
    }

    #[test]
    fn test_newline_into_reserved_slot_is_not_truncation() {
        let mut buf = Buffer::new(BufferId(1), 8);
        let mut w = buf.writer();
        write!(w, "1234567").unwrap();
        write!(w, "\n").unwrap();
        assert!(!w.truncated());
        buf.terminate_line();
        assert_eq!(buf.as_bytes(), b"1234567\n");

        let mut buf = Buffer::new(BufferId(1), 8);
        let mut w = buf.writer();
        write!(w, "1234{}\n", 567).unwrap();
        assert!(!w.truncated());
        buf.terminate_line();
        assert_eq!(buf.as_bytes(), b"1234567\n");
    }

    #[test]
    fn test_anything_after_deferred_newline_is_truncation() {
        let mut buf = Buffer::new(BufferId(1), 8);
        let mut w = buf.writer();
        write!(w, "1234567\n").unwrap();
        assert!(!w.truncated());
        write!(w, "\n").unwrap();
        assert!(w.truncated());

        let mut buf = Buffer::new(BufferId(1), 8);
        let mut w = buf.writer();
        write!(w, "1234567\nx").unwrap();
        assert!(w.truncated());
        buf.terminate_line();
        assert_eq!(buf.as_bytes(), b"1234567\n");
    }

    #[test]
    fn test_clear_resets_length_only() {
        let mut buf = Buffer::new(BufferId(3), 8);
        buf.append(b"stale");
        buf.clear();
        assert!(buf.is_empty());
        buf.append(b"ok");
        assert_eq!(buf.as_bytes(), b"ok");
        assert_eq!(buf.id(), BufferId(3));
    }
}
