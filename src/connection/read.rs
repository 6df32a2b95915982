use std::io::{self, Read};
use std::mem;
use std::sync::atomic::Ordering;

use log::{debug, trace, warn};

use super::state::ReadState;
use super::Connection;
use crate::buffer::{Buffer, STANDARD_SIZE};
use crate::error::{FrameError, HandshakeError, Result};
use crate::frame::{close, peek_frame_len, Frame, OpCode};
use crate::handshake;

/// Room left for new bytes on each read.
const MIN_READ: usize = 1024;

enum Fill {
    Data,
    Empty,
    Eof,
}

impl Connection {
    /// Run one read cycle.
    ///
    /// Performs a single read from the socket, completes the handshake if
    /// it is still pending, then decodes and dispatches every complete
    /// frame. Bytes of an incomplete request or frame are kept for the
    /// next cycle.
    ///
    /// Does nothing if the connection is closed, or if another cycle is
    /// already running.
    pub fn read_cycle(&self) {
        if !self.is_open() {
            return;
        }

        let mut state = match self.inner.read_state.try_lock() {
            Some(state) => state,
            None => return,
        };

        let carry = mem::take(&mut state.carry);
        let mut buf = self.pool().allocate(self.read_size(&carry));
        buf.put(&carry);

        if let Err(e) = self.read_cycle_inner(&mut state, &mut buf) {
            self.fail(e);
        }

        self.pool().release(buf);
    }

    fn read_size(&self, carry: &[u8]) -> usize {
        let mut size = carry.len() + MIN_READ;
        if self.is_handshaked() {
            if let Some((head, total)) = peek_frame_len(carry) {
                if head.length.to_num() <= self.inner.max_frame_size as u64 {
                    size = size.max(total as usize);
                }
            }
        }
        size
    }

    fn read_cycle_inner(&self, state: &mut ReadState, buf: &mut Buffer) -> Result<()> {
        match self.fill(buf)? {
            Fill::Data => {}
            Fill::Empty if buf.is_empty() => return Ok(()),
            Fill::Empty => {}
            Fill::Eof => {
                self.close(close::NORMAL, "EOF");
                return Ok(());
            }
        }

        if !self.is_handshaked() && !self.handshake(state, buf)? {
            return Ok(());
        }

        while self.is_open() {
            let len = match peek_frame_len(buf.read()) {
                Some((head, _)) => head.length.to_num(),
                None => break,
            };
            if len > self.inner.max_frame_size as u64 {
                return Err(FrameError::TooLarge(len).into());
            }

            match Frame::decode(buf) {
                Some(frame) => self.dispatch(frame)?,
                None => break,
            }
        }

        if self.is_open() && !buf.is_empty() {
            state.carry = buf.read().to_vec();
        }
        Ok(())
    }

    /// Returns `true` once the connection is upgraded.
    fn handshake(&self, state: &mut ReadState, buf: &mut Buffer) -> Result<bool> {
        match handshake::accept(buf.read()) {
            Ok(accepted) => {
                self.write_raw(accepted.response.as_bytes())?;
                buf.advance_rd_pos(accepted.consumed);
                self.inner.handshaked.store(true, Ordering::Release);
                debug!("conn[{}]: handshake done", self.id());
                self.handler().on_open(self);
                Ok(true)
            }
            Err(HandshakeError::NotEnoughData) if buf.rd_left() < STANDARD_SIZE => {
                state.carry = buf.read().to_vec();
                Ok(false)
            }
            Err(HandshakeError::NotEnoughData) => Err(HandshakeError::NotEnoughCapacity.into()),
            Err(HandshakeError::SecWebSocketKey) => {
                warn!("conn[{}]: reject handshake: missing key", self.id());
                self.close(close::PROTOCOL_ERROR, "missing Sec-WebSocket-Key");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn dispatch(&self, frame: Frame) -> Result<()> {
        // fragmented messages are not reassembled
        if !frame.fin {
            trace!("conn[{}]: drop fragment {:?}", self.id(), frame.opcode);
            return Ok(());
        }

        match frame.opcode {
            OpCode::Text => self
                .handler()
                .on_text(self, &String::from_utf8_lossy(frame.payload)),
            OpCode::Binary => self.handler().on_binary(self, frame.payload),
            OpCode::Close => self.close(close::NORMAL, "Client Close"),
            OpCode::Ping => self.write_frame(&Frame::control(OpCode::Pong, frame.payload))?,
            opcode => trace!("conn[{}]: ignore {:?}", self.id(), opcode),
        }
        Ok(())
    }

    /// Single read into `buf`, through the transform if there is one.
    fn fill(&self, buf: &mut Buffer) -> Result<Fill> {
        let transform = match &self.inner.transform {
            Some(transform) => transform,
            None => return Ok(self.read_once(buf)?),
        };

        let mut raw = self.pool().acquire();
        let ret = self.read_once(&mut raw);
        if !matches!(ret, Ok(Fill::Data)) {
            self.pool().release(raw);
            return Ok(ret?);
        }

        let mut plain = Vec::new();
        let unwrapped = transform.lock().unwrap(raw.read(), &mut plain);
        self.pool().release(raw);
        unwrapped?;

        if plain.len() > buf.wr_left() {
            let mut grown = self.pool().allocate(buf.rd_left() + plain.len());
            grown.put(buf.read());
            self.pool().release(mem::replace(buf, grown));
        }
        buf.put(&plain);
        Ok(Fill::Data)
    }

    fn read_once(&self, buf: &mut Buffer) -> io::Result<Fill> {
        loop {
            match (&self.inner.stream).read(buf.write()) {
                Ok(0) => return Ok(Fill::Eof),
                Ok(n) => {
                    buf.advance_wr_pos(n);
                    return Ok(Fill::Data);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(Fill::Empty),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}
