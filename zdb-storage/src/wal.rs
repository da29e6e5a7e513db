//! Write-ahead log: a 12-byte header followed by framed SET/DELETE records,
//! each protected by a CRC32C checksum. Replay is fail-fast — the first
//! corrupt record aborts the scan rather than skipping past it.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Error, Result};

const MAGIC: &[u8; 4] = b"ZDB1";
const VERSION: u32 = 1;
pub const HEADER_SIZE: u64 = 12;

const OP_SET: u8 = 1;
const OP_DELETE: u8 = 2;

/// Receives decoded operations during `Wal::replay`.
pub trait WalHandler {
    fn on_set(&mut self, key: u64, value: &[u8]) -> Result<()>;
    fn on_delete(&mut self, key: u64) -> Result<()>;
}

impl<F> WalHandler for F
where
    F: FnMut(WalOp<'_>) -> Result<()>,
{
    fn on_set(&mut self, key: u64, value: &[u8]) -> Result<()> {
        self(WalOp::Set { key, value })
    }

    fn on_delete(&mut self, key: u64) -> Result<()> {
        self(WalOp::Delete { key })
    }
}

/// A decoded WAL operation, handed to closures implementing [`WalHandler`].
pub enum WalOp<'a> {
    Set { key: u64, value: &'a [u8] },
    Delete { key: u64 },
}

pub struct Wal {
    file: File,
}

impl Wal {
    /// Open (creating if absent) the WAL at `path`, verifying or writing its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        let mut wal = Wal { file };
        wal.ensure_header()?;
        Ok(wal)
    }

    fn ensure_header(&mut self) -> Result<()> {
        let len = self.file.metadata()?.len();
        if len == 0 {
            let mut header = [0u8; HEADER_SIZE as usize];
            header[0..4].copy_from_slice(MAGIC);
            header[4..8].copy_from_slice(&VERSION.to_le_bytes());
            let crc = crc32c::crc32c(&header[0..8]);
            header[8..12].copy_from_slice(&crc.to_le_bytes());
            self.file.seek(SeekFrom::Start(0))?;
            self.file.write_all(&header)?;
            return Ok(());
        }
        if len < HEADER_SIZE {
            return Err(Error::BadHeader);
        }
        let mut header = [0u8; HEADER_SIZE as usize];
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_exact(&mut header)?;
        if &header[0..4] != MAGIC {
            return Err(Error::BadHeader);
        }
        let version = u32::from_le_bytes(header[4..8].try_into().unwrap());
        if version != VERSION {
            return Err(Error::BadHeader);
        }
        let expected_crc = u32::from_le_bytes(header[8..12].try_into().unwrap());
        if crc32c::crc32c(&header[0..8]) != expected_crc {
            return Err(Error::BadHeader);
        }
        Ok(())
    }

    /// Append a SET record, returning the file offset it starts at.
    pub fn append_set(&mut self, key: u64, value: &[u8]) -> Result<u64> {
        let key_bytes = key.to_le_bytes();
        let len_bytes = (value.len() as u32).to_le_bytes();

        let mut crc_input = Vec::with_capacity(1 + 8 + 4 + value.len());
        crc_input.push(OP_SET);
        crc_input.extend_from_slice(&key_bytes);
        crc_input.extend_from_slice(&len_bytes);
        crc_input.extend_from_slice(value);
        let crc = crc32c::crc32c(&crc_input);

        let offset = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&[OP_SET])?;
        self.file.write_all(&key_bytes)?;
        self.file.write_all(&len_bytes)?;
        self.file.write_all(&crc.to_le_bytes())?;
        self.file.write_all(value)?;
        Ok(offset)
    }

    /// Append a DELETE record, returning the file offset it starts at.
    pub fn append_delete(&mut self, key: u64) -> Result<u64> {
        let key_bytes = key.to_le_bytes();
        let mut crc_input = Vec::with_capacity(1 + 8);
        crc_input.push(OP_DELETE);
        crc_input.extend_from_slice(&key_bytes);
        let crc = crc32c::crc32c(&crc_input);

        let offset = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&[OP_DELETE])?;
        self.file.write_all(&key_bytes)?;
        self.file.write_all(&crc.to_le_bytes())?;
        Ok(offset)
    }

    /// Replay every record from just past the header, dispatching to `handler`.
    ///
    /// Stops cleanly at EOF between records. A short read inside a record
    /// surfaces [`Error::UnexpectedEndOfFile`] without invoking the handler
    /// for that record.
    pub fn replay(&mut self, handler: &mut dyn WalHandler) -> Result<()> {
        self.file.seek(SeekFrom::Start(HEADER_SIZE))?;
        let mut sets = 0u64;
        let mut deletes = 0u64;

        let result = (|| -> Result<()> {
            loop {
                let record_start = self.file.stream_position()?;
                let mut op_buf = [0u8; 1];
                let n = self.file.read(&mut op_buf)?;
                if n == 0 {
                    break;
                }
                match op_buf[0] {
                    OP_SET => {
                        let key_buf = self.read_mandatory::<8>()?;
                        let len_buf = self.read_mandatory::<4>()?;
                        let crc_buf = self.read_mandatory::<4>()?;
                        let len = u32::from_le_bytes(len_buf) as usize;
                        let mut payload = vec![0u8; len];
                        self.read_exact_mandatory(&mut payload)?;

                        let expected_crc = u32::from_le_bytes(crc_buf);
                        let mut crc_input = Vec::with_capacity(13 + len);
                        crc_input.push(OP_SET);
                        crc_input.extend_from_slice(&key_buf);
                        crc_input.extend_from_slice(&len_buf);
                        crc_input.extend_from_slice(&payload);
                        if crc32c::crc32c(&crc_input) != expected_crc {
                            return Err(Error::BadChecksum {
                                offset: record_start,
                            });
                        }

                        let key = u64::from_le_bytes(key_buf);
                        handler.on_set(key, &payload)?;
                        sets += 1;
                    }
                    OP_DELETE => {
                        let key_buf = self.read_mandatory::<8>()?;
                        let crc_buf = self.read_mandatory::<4>()?;
                        let expected_crc = u32::from_le_bytes(crc_buf);
                        let mut crc_input = Vec::with_capacity(9);
                        crc_input.push(OP_DELETE);
                        crc_input.extend_from_slice(&key_buf);
                        if crc32c::crc32c(&crc_input) != expected_crc {
                            return Err(Error::BadChecksum {
                                offset: record_start,
                            });
                        }

                        let key = u64::from_le_bytes(key_buf);
                        handler.on_delete(key)?;
                        deletes += 1;
                    }
                    other => return Err(Error::InvalidWalOp { op: other }),
                }
            }
            Ok(())
        })();

        match &result {
            Ok(()) => info!(sets, deletes, "wal replay complete"),
            Err(err) => warn!(%err, sets, deletes, "wal replay aborted"),
        }
        result
    }

    fn read_mandatory<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact_mandatory(&mut buf)?;
        Ok(buf)
    }

    fn read_exact_mandatory(&mut self, buf: &mut [u8]) -> Result<()> {
        self.file.read_exact(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::UnexpectedEndOfFile
            } else {
                Error::Io(e)
            }
        })
    }

    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }
}
