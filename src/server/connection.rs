//! Per-client connection handling.

use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::error::{ProtocolError, ProtocolResult};
use super::protocol::{read_frontend, read_startup, BackendMessage, FrontendMessage, SSL_REFUSED};
use crate::catalog::Column;
use crate::executor::{select_status, QueryExecutor, ResultSink};
use crate::storage::Row;

/// Serve one client until it disconnects, errors, or `shutdown` fires.
#[instrument(name = "connection", skip_all, fields(peer = %peer))]
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    executor: QueryExecutor,
    max_message_size: usize,
    shutdown: CancellationToken,
) {
    info!("connection accepted");
    let mut connection = Connection::new(stream, executor, max_message_size);

    let result = tokio::select! {
        result = connection.run() => result,
        _ = shutdown.cancelled() => {
            debug!("closing for shutdown");
            Ok(())
        }
    };

    match result {
        Ok(()) => info!("connection closed"),
        Err(e) if e.is_disconnect() => info!("client disconnected"),
        Err(e) => error!(error = %e, "connection failed"),
    }
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    executor: QueryExecutor,
    max_message_size: usize,
    out: BytesMut,
}

impl Connection {
    fn new(stream: TcpStream, executor: QueryExecutor, max_message_size: usize) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
            executor,
            max_message_size,
            out: BytesMut::with_capacity(4096),
        }
    }

    async fn run(&mut self) -> ProtocolResult<()> {
        self.startup().await?;

        while let Some(message) = read_frontend(&mut self.reader, self.max_message_size).await? {
            match message {
                FrontendMessage::Query(sql) => self.simple_query(&sql)?,
                FrontendMessage::Terminate => {
                    debug!("client sent terminate");
                    return Ok(());
                }
                FrontendMessage::Other { tag } => {
                    warn!(tag = %char::from(tag), "unsupported frontend message");
                    BackendMessage::CommandComplete(format!("unsupported message '{}'", char::from(tag)))
                        .encode(&mut self.out)?;
                    BackendMessage::ReadyForQuery.encode(&mut self.out)?;
                }
            }
            self.flush().await?;
        }
        Ok(())
    }

    async fn startup(&mut self) -> ProtocolResult<()> {
        let startup = loop {
            let startup = read_startup(&mut self.reader, self.max_message_size).await?;
            if !startup.is_ssl_request() {
                break startup;
            }
            debug!("refusing SSL request");
            self.writer.write_all(&[SSL_REFUSED]).await?;
        };
        info!(
            version = startup.version,
            user = startup.parameter("user").unwrap_or(""),
            database = startup.parameter("database").unwrap_or(""),
            "startup complete"
        );

        BackendMessage::AuthenticationOk.encode(&mut self.out)?;
        BackendMessage::ReadyForQuery.encode(&mut self.out)?;
        self.flush().await
    }

    /// Run one statement and buffer the whole response. A frame that cannot
    /// be encoded ends the connection.
    fn simple_query(&mut self, sql: &str) -> ProtocolResult<()> {
        let mut writer = ResponseWriter {
            out: &mut self.out,
            error: None,
        };
        let outcome = self.executor.execute_into(sql, &mut writer);
        if let Some(e) = writer.error {
            return Err(e);
        }
        let status = match outcome {
            Ok(rows) => select_status(rows),
            Err(e) => {
                debug!(error = %e, rows = e.rows_sent(), "statement failed");
                e.to_string()
            }
        };
        BackendMessage::CommandComplete(status).encode(&mut self.out)?;
        BackendMessage::ReadyForQuery.encode(&mut self.out)
    }

    async fn flush(&mut self) -> ProtocolResult<()> {
        self.writer.write_all(&self.out).await?;
        self.out.clear();
        Ok(())
    }
}

/// Encodes statement output straight into the connection's send buffer.
/// After the first encoding error every later frame is dropped.
struct ResponseWriter<'a> {
    out: &'a mut BytesMut,
    error: Option<ProtocolError>,
}

impl ResponseWriter<'_> {
    fn push(&mut self, message: ProtocolResult<BackendMessage>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = message.and_then(|m| m.encode(self.out)) {
            self.error = Some(e);
        }
    }
}

impl ResultSink for ResponseWriter<'_> {
    fn begin(&mut self, columns: &[Column]) {
        self.push(BackendMessage::row_description(columns));
    }

    fn row(&mut self, row: Row) {
        self.push(Ok(BackendMessage::data_row(&row)));
    }
}
