//! Byte-range reads and writes.
//!
//! Single calls map to one request each and may come back short; that is not
//! an error. [`Connection::read_to_end`] and [`Connection::write_all`] loop in
//! chunks of the configured `io_chunk_size`.

use fskitty_proto::{ItemId, Request, Response};
use tracing::trace;

use crate::connection::unexpected_reply;
use crate::ids::check_item_id;
use crate::{Connection, VfsError};

impl Connection {
    /// Reads up to `len` bytes of file `item_id` at `offset`.
    ///
    /// Reading at or past end of file returns an empty buffer. `len` is
    /// clamped to the configured chunk size.
    pub fn read(&self, item_id: ItemId, offset: u64, len: u64) -> Result<Vec<u8>, VfsError> {
        let session = self.session()?;
        self.track(check_item_id(item_id))?;
        let len = len.min(self.chunk_size() as u64);

        let response = self.send(&session, Request::Read { item_id, offset, len })?;
        let data = self.track(match response {
            Response::Read(Ok(data)) if data.len() as u64 > len => Err(VfsError::io(format!(
                "backend returned {} bytes for a {len}-byte read of item {item_id}",
                data.len()
            ))),
            Response::Read(result) => result.map_err(VfsError::from),
            other => Err(unexpected_reply("read", &other)),
        })?;

        self.stats_handle().record_read(data.len());
        trace!(item_id, offset, len, returned = data.len(), "read");
        Ok(data)
    }

    /// Writes `data` to file `item_id` at `offset` and returns how many bytes
    /// the backend accepted, which may be fewer than `data.len()`.
    ///
    /// At most one chunk is sent.
    pub fn write(&self, item_id: ItemId, offset: u64, data: &[u8]) -> Result<u64, VfsError> {
        let session = self.session()?;
        self.track(check_item_id(item_id))?;
        let chunk = &data[..data.len().min(self.chunk_size())];
        self.track(
            offset
                .checked_add(chunk.len() as u64)
                .map(|_| ())
                .ok_or_else(|| VfsError::invalid_argument("write range overflows u64")),
        )?;

        let response = self.send(
            &session,
            Request::Write {
                item_id,
                offset,
                data: chunk.to_vec(),
            },
        )?;
        let written = self.track(match response {
            Response::Write(Ok(n)) if n > chunk.len() as u64 => Err(VfsError::io(format!(
                "backend claims {n} bytes written but only {} were sent",
                chunk.len()
            ))),
            Response::Write(result) => result.map_err(VfsError::from),
            other => Err(unexpected_reply("write", &other)),
        })?;

        self.stats_handle().record_write(written);
        trace!(item_id, offset, requested = data.len(), written, "write");
        Ok(written)
    }

    /// Reads the whole file, one chunk at a time, until the backend returns no data.
    pub fn read_to_end(&self, item_id: ItemId) -> Result<Vec<u8>, VfsError> {
        let chunk = self.chunk_size() as u64;
        let mut contents = Vec::new();
        loop {
            let data = self.read(item_id, contents.len() as u64, chunk)?;
            if data.is_empty() {
                return Ok(contents);
            }
            contents.extend_from_slice(&data);
        }
    }

    /// Writes all of `data` at `offset`, re-issuing writes for whatever the
    /// backend did not accept. A write that accepts nothing is an I/O error.
    pub fn write_all(&self, item_id: ItemId, offset: u64, data: &[u8]) -> Result<(), VfsError> {
        if data.is_empty() {
            // Still distinguish a missing session or a bad ID from success.
            self.session()?;
            return self.track(check_item_id(item_id));
        }

        let mut done = 0usize;
        while done < data.len() {
            let position = offset
                .checked_add(done as u64)
                .ok_or_else(|| VfsError::invalid_argument("write range overflows u64"));
            let position = self.track(position)?;
            let written = self.write(item_id, position, &data[done..])?;
            if written == 0 {
                return self.track(Err(VfsError::io(format!(
                    "backend accepted 0 bytes at offset {position} of item {item_id}"
                ))));
            }
            done += written as usize;
        }
        Ok(())
    }
}
