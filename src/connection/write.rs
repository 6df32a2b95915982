use std::io::{self, Write};
use std::sync::atomic::Ordering;
use std::thread;

use super::Connection;
use crate::error::Result;
use crate::frame::{Frame, OpCode};

impl Connection {
    /// Encode and send one frame.
    ///
    /// Writers are serialized, so frames never interleave on the wire.
    /// Once the connection is closed only the close frame itself gets
    /// through; anything else is dropped silently.
    pub(crate) fn write_frame(&self, frame: &Frame) -> Result<()> {
        let buf = frame.encode(self.pool())?;
        let ret = self.write_bytes(buf.read(), frame.opcode == OpCode::Close);
        self.pool().release(buf);
        ret
    }

    /// Send bytes which are not a frame, i.e. the handshake response.
    pub(crate) fn write_raw(&self, data: &[u8]) -> Result<()> { self.write_bytes(data, false) }

    fn write_bytes(&self, data: &[u8], closing: bool) -> Result<()> {
        let _guard = self.inner.write_lock.lock();

        if !closing && !self.inner.open.load(Ordering::Acquire) {
            return Ok(());
        }

        match &self.inner.transform {
            Some(transform) => {
                let mut wrapped = Vec::with_capacity(data.len());
                transform.lock().wrap(data, &mut wrapped)?;
                self.write_all(&wrapped)?;
            }
            None => self.write_all(data)?,
        }
        Ok(())
    }

    /// Blocking write on a non-blocking socket.
    fn write_all(&self, mut data: &[u8]) -> io::Result<()> {
        while !data.is_empty() {
            match (&self.inner.stream).write(data) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => data = &data[n..],
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::yield_now(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
