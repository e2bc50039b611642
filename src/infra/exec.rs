//! # Execution Data Module / 执行数据模块
//!
//! Reads JaCoCo execution data files (`jacoco.exec`) and replays their content
//! as session boundaries and probe records to a [`RecordVisitor`].
//!
//! 读取 JaCoCo 执行数据文件（`jacoco.exec`），并将其内容作为会话边界和探针记录
//! 重放给 [`RecordVisitor`]。
//!
//! ## Format / 格式
//!
//! A sequence of blocks, each introduced by a one-byte type. Integers are
//! big-endian; strings are Java `DataOutput::writeUTF` (u16 byte length and
//! modified UTF-8); probe arrays are a varint length followed by bits packed
//! LSB-first.
//!
//! | type   | block          | payload                                   |
//! |--------|----------------|-------------------------------------------|
//! | `0x01` | header         | magic `0xC0C0`, version `0x1007`          |
//! | `0x10` | session info   | id, start millis (i64), dump millis (i64) |
//! | `0x11` | execution data | class id (i64), class name, probes        |
//! | `0x20` | command ok     | none, ends the stream                     |

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::core::models::{ExecutionData, SessionInfo};
use crate::core::session::{RecordVisitor, SessionError};

pub const BLOCK_HEADER: u8 = 0x01;
pub const BLOCK_SESSION_INFO: u8 = 0x10;
pub const BLOCK_EXECUTION_DATA: u8 = 0x11;
pub const BLOCK_CMD_OK: u8 = 0x20;

pub const MAGIC_NUMBER: u16 = 0xC0C0;
pub const FORMAT_VERSION: u16 = 0x1007;

/// Upper bound of the buffer reserved before a probe array's bytes arrive.
const PACKED_CHUNK: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to open execution data file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid execution data file")]
    InvalidFormat,
    #[error("incompatible execution data version {found:#06x}, expected {expected:#06x}")]
    IncompatibleVersion { found: u16, expected: u16 },
    #[error("unknown block type {0:#04x}")]
    UnknownBlock(u8),
    #[error("execution data ends in the middle of a block")]
    Truncated,
    #[error("malformed variable-length integer")]
    VarIntOverflow,
    #[error("string is not valid modified UTF-8")]
    InvalidString(#[from] std::string::FromUtf8Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Supplies the records of one execution data file.
/// 提供一个执行数据文件中的记录。
pub trait ExecutionRecordSource {
    /// Reads the whole file at `path`, replaying every record to `visitor`.
    /// The file is closed before this returns, whether or not reading succeeded.
    fn read_records(
        &self,
        path: &Path,
        visitor: &mut dyn RecordVisitor,
    ) -> Result<(), DecodeError>;
}

/// [`ExecutionRecordSource`] for `jacoco.exec` files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecFileReader;

impl ExecutionRecordSource for ExecFileReader {
    fn read_records(
        &self,
        path: &Path,
        visitor: &mut dyn RecordVisitor,
    ) -> Result<(), DecodeError> {
        let file = File::open(path).map_err(|source| DecodeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        ExecDataReader::new(BufReader::new(file)).read(visitor)
    }
}

/// Block decoder over any byte stream.
pub struct ExecDataReader<R> {
    input: R,
    first_block: bool,
}

impl<R: Read> ExecDataReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            first_block: true,
        }
    }

    /// Decodes blocks until the stream ends or a command-ok block is found.
    pub fn read(&mut self, visitor: &mut dyn RecordVisitor) -> Result<(), DecodeError> {
        while let Some(block) = self.next_block_type()? {
            if self.first_block && block != BLOCK_HEADER {
                return Err(DecodeError::InvalidFormat);
            }
            self.first_block = false;

            match block {
                BLOCK_HEADER => self.read_header()?,
                BLOCK_SESSION_INFO => {
                    let id = self.read_utf()?;
                    let start = self.read_i64()?;
                    let dump = self.read_i64()?;
                    visitor.on_session_boundary(SessionInfo { id, start, dump });
                }
                BLOCK_EXECUTION_DATA => {
                    let id = self.read_i64()? as u64;
                    let name = self.read_utf()?;
                    let probes = self.read_boolean_array()?;
                    visitor.on_probe_record(ExecutionData { id, name, probes })?;
                }
                BLOCK_CMD_OK => return Ok(()),
                other => return Err(DecodeError::UnknownBlock(other)),
            }
        }
        Ok(())
    }

    fn next_block_type(&mut self) -> Result<Option<u8>, DecodeError> {
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn read_header(&mut self) -> Result<(), DecodeError> {
        if self.read_u16()? != MAGIC_NUMBER {
            return Err(DecodeError::InvalidFormat);
        }
        let version = self.read_u16()?;
        if version != FORMAT_VERSION {
            return Err(DecodeError::IncompatibleVersion {
                found: version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(())
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        self.input.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::Truncated,
            _ => DecodeError::Io(e),
        })
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_i64(&mut self) -> Result<i64, DecodeError> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf)?;
        Ok(i64::from_be_bytes(buf))
    }

    fn read_var_int(&mut self) -> Result<u32, DecodeError> {
        let mut value = 0u32;
        let mut shift = 0;
        loop {
            let byte = self.read_u8()?;
            value |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift > 28 {
                return Err(DecodeError::VarIntOverflow);
            }
        }
    }

    fn read_utf(&mut self) -> Result<String, DecodeError> {
        let len = usize::from(self.read_u16()?);
        let mut bytes = vec![0u8; len];
        self.fill(&mut bytes)?;
        Ok(String::from_utf8(decode_modified_utf8(bytes))?)
    }

    /// The declared length is untrusted, so the packed bytes are read as they
    /// arrive instead of being allocated up front.
    fn read_boolean_array(&mut self) -> Result<Vec<bool>, DecodeError> {
        let len = self.read_var_int()? as usize;
        let packed_len = len.div_ceil(8);
        let mut packed = Vec::with_capacity(packed_len.min(PACKED_CHUNK));
        Read::by_ref(&mut self.input)
            .take(packed_len as u64)
            .read_to_end(&mut packed)?;
        if packed.len() < packed_len {
            return Err(DecodeError::Truncated);
        }
        Ok((0..len)
            .map(|i| packed[i / 8] & (1 << (i % 8)) != 0)
            .collect())
    }
}

/// Converts modified UTF-8 to standard UTF-8. NUL arrives as `C0 80` and a
/// supplementary character as two three-byte surrogates (CESU-8).
/// Anything else is passed through for `String::from_utf8` to validate.
fn decode_modified_utf8(bytes: Vec<u8>) -> Vec<u8> {
    if !bytes.iter().any(|&b| b == 0xC0 || b == 0xED) {
        return bytes;
    }
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i..] {
            [0xC0, 0x80, ..] => {
                out.push(0);
                i += 2;
            }
            [
                0xED,
                high @ 0xA0..=0xAF,
                high_low @ 0x80..=0xBF,
                0xED,
                low @ 0xB0..=0xBF,
                low_low @ 0x80..=0xBF,
                ..,
            ] => {
                let high = surrogate(high, high_low);
                let low = surrogate(low, low_low);
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                match char::from_u32(code) {
                    Some(c) => {
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                        i += 6;
                    }
                    None => {
                        out.push(bytes[i]);
                        i += 1;
                    }
                }
            }
            _ => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    out
}

/// Value of the three-byte sequence `ED b1 b2`.
fn surrogate(b1: u8, b2: u8) -> u32 {
    0xD000 | (u32::from(b1 & 0x3F) << 6) | u32::from(b2 & 0x3F)
}

/// Block encoder, the inverse of [`ExecDataReader`]. Used to produce fixtures.
pub struct ExecDataWriter<W: Write> {
    output: BufWriter<W>,
}

impl<W: Write> ExecDataWriter<W> {
    /// Creates a writer and emits the file header.
    pub fn new(output: W) -> io::Result<Self> {
        let mut writer = Self {
            output: BufWriter::new(output),
        };
        writer.write_header()?;
        Ok(writer)
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        self.output.write_all(&[BLOCK_HEADER])?;
        self.output.write_all(&MAGIC_NUMBER.to_be_bytes())?;
        self.output.write_all(&FORMAT_VERSION.to_be_bytes())
    }

    pub fn write_session_info(&mut self, info: &SessionInfo) -> io::Result<()> {
        self.output.write_all(&[BLOCK_SESSION_INFO])?;
        self.write_utf(&info.id)?;
        self.output.write_all(&info.start.to_be_bytes())?;
        self.output.write_all(&info.dump.to_be_bytes())
    }

    pub fn write_execution_data(&mut self, data: &ExecutionData) -> io::Result<()> {
        self.output.write_all(&[BLOCK_EXECUTION_DATA])?;
        self.output.write_all(&data.id.to_be_bytes())?;
        self.write_utf(&data.name)?;
        self.write_boolean_array(&data.probes)
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.output.flush()?;
        self.output.into_inner().map_err(|e| e.into_error())
    }

    fn write_utf(&mut self, value: &str) -> io::Result<()> {
        let mut bytes = Vec::with_capacity(value.len());
        for c in value.chars() {
            if c == '\0' {
                bytes.extend_from_slice(&[0xC0, 0x80]);
            } else if u32::from(c) > 0xFFFF {
                let mut units = [0u16; 2];
                for &unit in c.encode_utf16(&mut units).iter() {
                    bytes.extend_from_slice(&[
                        0xE0 | (unit >> 12) as u8,
                        0x80 | ((unit >> 6) & 0x3F) as u8,
                        0x80 | (unit & 0x3F) as u8,
                    ]);
                }
            } else {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
        let len = u16::try_from(bytes.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string too long"))?;
        self.output.write_all(&len.to_be_bytes())?;
        self.output.write_all(&bytes)
    }

    fn write_var_int(&mut self, mut value: u32) -> io::Result<()> {
        while value & !0x7F != 0 {
            self.output.write_all(&[0x80 | (value & 0x7F) as u8])?;
            value >>= 7;
        }
        self.output.write_all(&[value as u8])
    }

    fn write_boolean_array(&mut self, probes: &[bool]) -> io::Result<()> {
        let len = u32::try_from(probes.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many probes"))?;
        self.write_var_int(len)?;
        for chunk in probes.chunks(8) {
            let byte = chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, hit)| if *hit { acc | (1 << i) } else { acc });
            self.output.write_all(&[byte])?;
        }
        Ok(())
    }
}
