//! PostgreSQL v3 wire protocol subset.
//!
//! Frontend frames are read straight off an `AsyncRead`; backend frames are
//! encoded into a [`BytesMut`] that the connection flushes once per
//! statement. All integers are big-endian.

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::{ProtocolError, ProtocolResult};
use crate::catalog::Column;
use crate::storage::Row;

/// Protocol version 3.0.
pub const PROTOCOL_VERSION: u32 = 196608;

/// Version code of an SSLRequest startup frame.
pub const SSL_REQUEST_CODE: u32 = 80877103;

/// Byte sent back to refuse TLS.
pub const SSL_REFUSED: u8 = b'N';

/// The first frame a client sends: no tag, only length and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupMessage {
    pub version: u32,
    /// `key\0value\0` pairs, e.g. `user` and `database`.
    pub parameters: Vec<(String, String)>,
}

impl StartupMessage {
    pub fn is_ssl_request(&self) -> bool {
        self.version == SSL_REQUEST_CODE
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A tagged frame sent by the client after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendMessage {
    /// `'Q'`: a simple query.
    Query(String),
    /// `'X'`: the client is closing.
    Terminate,
    /// Any other tag; its payload is discarded.
    Other { tag: u8 },
}

/// Read a startup frame.
pub async fn read_startup<R>(reader: &mut R, max_message_size: usize) -> ProtocolResult<StartupMessage>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u32().await?;
    if len < 8 {
        return Err(ProtocolError::InvalidLength(len));
    }
    check_size(len, max_message_size)?;
    let version = reader.read_u32().await?;
    let payload = read_payload(reader, len as usize - 8).await?;

    Ok(StartupMessage {
        version,
        parameters: parse_parameters(&payload),
    })
}

/// Read one tagged frame. Returns `None` on a clean end of stream between
/// frames.
pub async fn read_frontend<R>(reader: &mut R, max_message_size: usize) -> ProtocolResult<Option<FrontendMessage>>
where
    R: AsyncRead + Unpin,
{
    let mut tag = [0u8; 1];
    if reader.read(&mut tag).await? == 0 {
        return Ok(None);
    }
    let tag = tag[0];

    let len = reader.read_u32().await?;
    if len < 4 {
        return Err(ProtocolError::InvalidLength(len));
    }
    check_size(len, max_message_size)?;
    let payload = read_payload(reader, len as usize - 4).await?;

    let message = match tag {
        b'Q' => {
            let text = payload.strip_suffix(&[0]).unwrap_or(&payload[..]);
            FrontendMessage::Query(String::from_utf8_lossy(text).into_owned())
        }
        b'X' => FrontendMessage::Terminate,
        tag => FrontendMessage::Other { tag },
    };
    Ok(Some(message))
}

fn check_size(len: u32, max: usize) -> ProtocolResult<()> {
    let len = len as usize;
    if len > max {
        return Err(ProtocolError::FrameTooLarge { len, max });
    }
    Ok(())
}

async fn read_payload<R>(reader: &mut R, n: usize) -> ProtocolResult<BytesMut>
where
    R: AsyncRead + Unpin,
{
    let mut payload = BytesMut::zeroed(n);
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

fn parse_parameters(payload: &[u8]) -> Vec<(String, String)> {
    let mut fields = payload
        .split(|b| *b == 0)
        .map(|s| String::from_utf8_lossy(s).into_owned());
    let mut parameters = Vec::new();
    while let (Some(key), Some(value)) = (fields.next(), fields.next()) {
        if key.is_empty() {
            break;
        }
        parameters.push((key, value));
    }
    parameters
}

/// Column metadata in a RowDescription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescription {
    pub name: String,
    pub table_oid: i32,
    pub column_number: i16,
    pub type_oid: i32,
    pub type_len: i16,
    pub type_modifier: i32,
    pub format: i16,
}

impl FieldDescription {
    /// Describe output column `position` (0-based). Fails past column 32767,
    /// the largest number an `int16` attribute field can carry.
    pub fn from_column(column: &Column, position: usize) -> ProtocolResult<Self> {
        Ok(Self {
            name: column.name.clone(),
            table_oid: 0,
            column_number: int16("column number", position + 1)?,
            type_oid: column.kind.pg_oid(),
            type_len: column.kind.pg_len(),
            type_modifier: -1,
            format: 0,
        })
    }
}

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMessage {
    AuthenticationOk,
    ReadyForQuery,
    RowDescription(Vec<FieldDescription>),
    /// Text-format values, one per column.
    DataRow(Vec<String>),
    CommandComplete(String),
}

impl BackendMessage {
    pub fn row_description(columns: &[Column]) -> ProtocolResult<Self> {
        columns
            .iter()
            .enumerate()
            .map(|(i, c)| FieldDescription::from_column(c, i))
            .collect::<ProtocolResult<Vec<_>>>()
            .map(BackendMessage::RowDescription)
    }

    pub fn data_row(row: &Row) -> Self {
        BackendMessage::DataRow(row.values.iter().map(|v| v.to_string()).collect())
    }

    pub fn tag(&self) -> u8 {
        match self {
            BackendMessage::AuthenticationOk => b'R',
            BackendMessage::ReadyForQuery => b'Z',
            BackendMessage::RowDescription(_) => b'T',
            BackendMessage::DataRow(_) => b'D',
            BackendMessage::CommandComplete(_) => b'C',
        }
    }

    /// Append this frame to `buf`. On error `buf` is left as it was.
    pub fn encode(&self, buf: &mut BytesMut) -> ProtocolResult<()> {
        let frame_start = buf.len();
        let result = self.encode_frame(buf);
        if result.is_err() {
            buf.truncate(frame_start);
        }
        result
    }

    fn encode_frame(&self, buf: &mut BytesMut) -> ProtocolResult<()> {
        buf.put_u8(self.tag());
        let start = buf.len();
        buf.put_u32(0);

        match self {
            BackendMessage::AuthenticationOk => buf.put_i32(0),
            BackendMessage::ReadyForQuery => buf.put_u8(b'I'),
            BackendMessage::RowDescription(fields) => {
                buf.put_i16(int16("field count", fields.len())?);
                for field in fields {
                    put_cstr(buf, &field.name);
                    buf.put_i32(field.table_oid);
                    buf.put_i16(field.column_number);
                    buf.put_i32(field.type_oid);
                    buf.put_i16(field.type_len);
                    buf.put_i32(field.type_modifier);
                    buf.put_i16(field.format);
                }
            }
            BackendMessage::DataRow(values) => {
                buf.put_i16(int16("value count", values.len())?);
                for value in values {
                    buf.put_i32(int32("value length", value.len())?);
                    buf.put_slice(value.as_bytes());
                }
            }
            BackendMessage::CommandComplete(status) => put_cstr(buf, status),
        }

        let len = int32("frame length", buf.len() - start)?;
        buf[start..start + 4].copy_from_slice(&len.to_be_bytes());
        Ok(())
    }
}

fn int16(field: &'static str, value: usize) -> ProtocolResult<i16> {
    i16::try_from(value).map_err(|_| ProtocolError::FieldOverflow { field, value })
}

fn int32(field: &'static str, value: usize) -> ProtocolResult<i32> {
    i32::try_from(value).map_err(|_| ProtocolError::FieldOverflow { field, value })
}

fn put_cstr(buf: &mut BytesMut, s: &str) {
    buf.put_slice(s.as_bytes());
    buf.put_u8(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn encoded(message: BackendMessage) -> Vec<u8> {
        let mut buf = BytesMut::new();
        message.encode(&mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn test_encode_authentication_ok() {
        assert_eq!(encoded(BackendMessage::AuthenticationOk), vec![b'R', 0, 0, 0, 8, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_ready_for_query() {
        assert_eq!(encoded(BackendMessage::ReadyForQuery), vec![b'Z', 0, 0, 0, 5, b'I']);
    }

    #[test]
    fn test_encode_command_complete() {
        let mut expected = vec![b'C', 0, 0, 0, 13];
        expected.extend_from_slice(b"SELECT 2\0");
        assert_eq!(encoded(BackendMessage::CommandComplete("SELECT 2".into())), expected);
    }

    #[test]
    fn test_encode_row_description() {
        let message = BackendMessage::row_description(&[Column::integer("id"), Column::text("email")]).unwrap();
        let bytes = encoded(message);

        let mut expected = vec![b'T', 0, 0, 0, 51, 0, 2];
        expected.extend_from_slice(b"id\0");
        expected.extend_from_slice(&0i32.to_be_bytes());
        expected.extend_from_slice(&1i16.to_be_bytes());
        expected.extend_from_slice(&20i32.to_be_bytes());
        expected.extend_from_slice(&8i16.to_be_bytes());
        expected.extend_from_slice(&(-1i32).to_be_bytes());
        expected.extend_from_slice(&0i16.to_be_bytes());
        expected.extend_from_slice(b"email\0");
        expected.extend_from_slice(&0i32.to_be_bytes());
        expected.extend_from_slice(&2i16.to_be_bytes());
        expected.extend_from_slice(&25i32.to_be_bytes());
        expected.extend_from_slice(&(-1i16).to_be_bytes());
        expected.extend_from_slice(&(-1i32).to_be_bytes());
        expected.extend_from_slice(&0i16.to_be_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_encode_data_row() {
        let bytes = encoded(BackendMessage::data_row(&row![7i64, "ab", true]));
        let mut expected = vec![b'D', 0, 0, 0, 22, 0, 3];
        expected.extend_from_slice(&[0, 0, 0, 1, b'7']);
        expected.extend_from_slice(&[0, 0, 0, 2, b'a', b'b']);
        expected.extend_from_slice(&[0, 0, 0, 1, b't']);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_encode_rejects_oversized_counts() {
        let mut buf = BytesMut::new();
        BackendMessage::ReadyForQuery.encode(&mut buf).unwrap();

        let wide = BackendMessage::DataRow(vec![String::new(); 40_000]);
        let err = wide.encode(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::FieldOverflow { field: "value count", value: 40_000 }
        ));
        assert_eq!(&buf[..], &[b'Z', 0, 0, 0, 5, b'I']);

        let columns = vec![Column::integer("c"); 40_000];
        assert!(matches!(
            BackendMessage::row_description(&columns),
            Err(ProtocolError::FieldOverflow { field: "column number", value: 32_768 })
        ));
    }

    #[tokio::test]
    async fn test_read_startup() {
        let mut frame = vec![0, 0, 0, 0];
        frame.extend_from_slice(&PROTOCOL_VERSION.to_be_bytes());
        frame.extend_from_slice(b"user\0alice\0database\0demo\0\0");
        let len = frame.len() as u32;
        frame[..4].copy_from_slice(&len.to_be_bytes());

        let startup = read_startup(&mut frame.as_slice(), 1024).await.unwrap();
        assert_eq!(startup.version, PROTOCOL_VERSION);
        assert!(!startup.is_ssl_request());
        assert_eq!(startup.parameter("user"), Some("alice"));
        assert_eq!(startup.parameter("database"), Some("demo"));
    }

    #[tokio::test]
    async fn test_read_ssl_request() {
        let frame = [0, 0, 0, 8, 0x04, 0xd2, 0x16, 0x2f];
        let startup = read_startup(&mut &frame[..], 1024).await.unwrap();
        assert!(startup.is_ssl_request());
        assert!(startup.parameters.is_empty());
    }

    #[tokio::test]
    async fn test_read_query_strips_nul() {
        let mut input: &[u8] = b"Q\0\0\0\x0eSELECT 1;\0X\0\0\0\x04";
        assert_eq!(
            read_frontend(&mut input, 1024).await.unwrap(),
            Some(FrontendMessage::Query("SELECT 1;".into()))
        );
        assert_eq!(read_frontend(&mut input, 1024).await.unwrap(), Some(FrontendMessage::Terminate));
        assert_eq!(read_frontend(&mut input, 1024).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_other_tag() {
        let mut input: &[u8] = b"P\0\0\0\x06ab";
        assert_eq!(
            read_frontend(&mut input, 1024).await.unwrap(),
            Some(FrontendMessage::Other { tag: b'P' })
        );
    }

    #[tokio::test]
    async fn test_frame_limits() {
        let mut too_large: &[u8] = b"Q\0\x10\0\x05x";
        assert!(matches!(
            read_frontend(&mut too_large, 1 << 20).await,
            Err(ProtocolError::FrameTooLarge { len: 1048581, max: 1048576 })
        ));

        let mut too_short: &[u8] = b"Q\0\0\0\x03";
        assert!(matches!(read_frontend(&mut too_short, 1024).await, Err(ProtocolError::InvalidLength(3))));

        let mut truncated: &[u8] = b"Q\0\0\0\x10SEL";
        let err = read_frontend(&mut truncated, 1024).await.unwrap_err();
        assert!(err.is_disconnect());
    }
}
