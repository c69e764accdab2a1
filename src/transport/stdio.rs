//! Stdio transport: newline-delimited JSON over stdin/stdout.
//!
//! One process, one peer, one implicit session created at startup. Two
//! cooperating tasks:
//!
//! - **reader**: pulls `\n`-delimited frames off the input and spawns a
//!   handler task per frame, so a slow handler never stalls the read loop.
//!   EOF or a read failure initiates orderly shutdown.
//! - **writer**: drains the server's response channel and writes each
//!   envelope followed by a newline. A write failure aborts the transport.
//!
//! The transport counts as stopped only after both tasks have confirmed
//! exit; [`StdioTransport::shutdown`] resolves at that point. Requesting
//! shutdown is idempotent.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::protocol::{Implementation, ServerCapabilities};
use crate::server::{McpServer, ServerOptions};
use crate::session::{RequestContext, SessionManager};

use super::{encode_response, Transport};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Stdio transport over the process's stdin/stdout, or any injected pair of
/// streams (tests use [`tokio::io::duplex`] pipes).
pub struct StdioTransport {
    shutting_down: CancellationToken,
    stopped: CancellationToken,
    session_manager: Arc<SessionManager>,
    io: Mutex<Option<(BoxedReader, BoxedWriter)>>,
}

impl StdioTransport {
    /// A transport reading stdin and writing stdout.
    pub fn new() -> Self {
        Self {
            shutting_down: CancellationToken::new(),
            stopped: CancellationToken::new(),
            session_manager: Arc::new(SessionManager::new()),
            io: Mutex::new(None),
        }
    }

    /// A transport over caller-supplied streams.
    pub fn with_io(
        input: impl AsyncRead + Send + Unpin + 'static,
        output: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        let transport = Self::new();
        *transport.io.lock() = Some((Box::new(input), Box::new(output)));
        transport
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn run(
        &self,
        capabilities: ServerCapabilities,
        server_info: Implementation,
        options: ServerOptions,
    ) -> Result<(), RuntimeError> {
        let (input, output) = match self.io.lock().take() {
            Some(io) => io,
            None => (
                Box::new(tokio::io::stdin()) as BoxedReader,
                Box::new(tokio::io::stdout()) as BoxedWriter,
            ),
        };

        let server = Arc::new(McpServer::new(capabilities, server_info, options));
        let mut responses = server
            .take_responses()
            .expect("a freshly constructed server always has its response channel");

        // One session for the whole process lifetime.
        let session = self.session_manager.create_session();
        let ctx = RequestContext::for_session(session)
            .with_shutdown(self.shutting_down.clone())
            .with_cancellation(self.shutting_down.child_token());

        let writer_shutdown = self.shutting_down.clone();
        let mut writer_output = output;
        let writer = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = writer_shutdown.cancelled() => break,
                    received = responses.recv() => {
                        let Some(response) = received else { break };
                        let frame = encode_response(&response);
                        tracing::debug!(frame = %frame, "sending response");
                        if let Err(e) = writer_output.write_all(frame.as_bytes()).await {
                            tracing::error!(error = %e, "failed writing response, aborting writer");
                            break;
                        }
                        if let Err(e) = writer_output.write_all(b"\n").await {
                            tracing::error!(error = %e, "failed writing frame terminator, aborting writer");
                            break;
                        }
                        if let Err(e) = writer_output.flush().await {
                            tracing::error!(error = %e, "failed flushing output, aborting writer");
                            break;
                        }
                    }
                }
            }
        });

        let reader_shutdown = self.shutting_down.clone();
        let reader_server = server.clone();
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(input).lines();
            loop {
                tokio::select! {
                    _ = reader_shutdown.cancelled() => break,
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            let server = reader_server.clone();
                            let ctx = ctx.clone();
                            // Processing starts in arrival order; completion
                            // may interleave, responses correlate by id.
                            tokio::spawn(async move {
                                server.handle(ctx, line.as_bytes()).await;
                            });
                        }
                        Ok(None) => {
                            tracing::debug!("input reached EOF, initiating shutdown");
                            break;
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed reading input, initiating shutdown");
                            break;
                        }
                    }
                }
            }
        });

        let mut reader = reader;
        let mut reader_exited = false;
        tokio::select! {
            _ = self.shutting_down.cancelled() => {}
            _ = &mut reader => reader_exited = true,
        }
        // Reader exit and explicit shutdown both end up here; make sure the
        // signal is raised either way so the writer unblocks.
        self.shutting_down.cancel();

        if !reader_exited {
            let _ = reader.await;
        }
        let _ = writer.await;

        self.stopped.cancel();
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.shutting_down.cancel();
        self.stopped.cancelled().await;
        Ok(())
    }

    fn session_manager(&self) -> Arc<SessionManager> {
        self.session_manager.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt as _;

    fn capabilities() -> ServerCapabilities {
        ServerCapabilities::default()
    }

    fn server_info() -> Implementation {
        Implementation::new("TestServer", "0.0.0")
    }

    #[tokio::test]
    async fn test_ping_round_trip_and_eof_shutdown() {
        let (mut client_writer, server_input) = tokio::io::duplex(4096);
        let (server_output, client_reader) = tokio::io::duplex(4096);

        let transport = Arc::new(StdioTransport::with_io(server_input, server_output));
        let runner = {
            let transport = transport.clone();
            tokio::spawn(async move {
                transport
                    .run(capabilities(), server_info(), ServerOptions::new())
                    .await
            })
        };

        client_writer
            .write_all(b"{\"method\":\"ping\",\"params\":{},\"id\":7,\"jsonrpc\":\"2.0\"}\n")
            .await
            .unwrap();

        let mut lines = BufReader::new(client_reader).lines();
        let line = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
            .await
            .expect("response within bounded time")
            .unwrap()
            .unwrap();
        assert_eq!(line, r#"{"jsonrpc":"2.0","result":{},"id":7}"#);

        // Closing input initiates shutdown; run returns within bounded time.
        drop(client_writer);
        let result = tokio::time::timeout(Duration::from_secs(5), runner)
            .await
            .expect("transport stops after EOF")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_notification_produces_no_output() {
        let (mut client_writer, server_input) = tokio::io::duplex(4096);
        let (server_output, client_reader) = tokio::io::duplex(4096);

        let transport = Arc::new(StdioTransport::with_io(server_input, server_output));
        let runner = {
            let transport = transport.clone();
            tokio::spawn(async move {
                transport
                    .run(capabilities(), server_info(), ServerOptions::new())
                    .await
            })
        };

        client_writer
            .write_all(
                b"{\"method\":\"notifications/initialized\",\"params\":{},\"jsonrpc\":\"2.0\"}\n",
            )
            .await
            .unwrap();
        // Follow with a request so there is something to read back.
        client_writer
            .write_all(b"{\"method\":\"ping\",\"params\":{},\"id\":1,\"jsonrpc\":\"2.0\"}\n")
            .await
            .unwrap();

        let mut lines = BufReader::new(client_reader).lines();
        let line = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        // The first (and only) frame is the ping response; the notification
        // produced nothing.
        assert_eq!(line, r#"{"jsonrpc":"2.0","result":{},"id":1}"#);

        drop(client_writer);
        let _ = tokio::time::timeout(Duration::from_secs(5), runner).await;
    }

    #[tokio::test]
    async fn test_explicit_shutdown_stops_transport() {
        let (_client_writer, server_input) = tokio::io::duplex(4096);
        let (server_output, _client_reader) = tokio::io::duplex(4096);

        let transport = Arc::new(StdioTransport::with_io(server_input, server_output));
        let runner = {
            let transport = transport.clone();
            tokio::spawn(async move {
                transport
                    .run(capabilities(), server_info(), ServerOptions::new())
                    .await
            })
        };

        // Give the run loop a beat to start.
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(5), transport.shutdown())
            .await
            .expect("shutdown completes within bounded time")
            .unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), runner)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (_client_writer, server_input) = tokio::io::duplex(4096);
        let (server_output, _client_reader) = tokio::io::duplex(4096);

        let transport = Arc::new(StdioTransport::with_io(server_input, server_output));
        let runner = {
            let transport = transport.clone();
            tokio::spawn(async move {
                transport
                    .run(capabilities(), server_info(), ServerOptions::new())
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        transport.shutdown().await.unwrap();
        // A second shutdown on an already stopped transport returns promptly.
        tokio::time::timeout(Duration::from_secs(1), transport.shutdown())
            .await
            .expect("second shutdown is non-blocking")
            .unwrap();

        let _ = tokio::time::timeout(Duration::from_secs(5), runner).await;
    }

    #[tokio::test]
    async fn test_single_implicit_session() {
        let (_client_writer, server_input) = tokio::io::duplex(4096);
        let (server_output, _client_reader) = tokio::io::duplex(4096);

        let transport = Arc::new(StdioTransport::with_io(server_input, server_output));
        let runner = {
            let transport = transport.clone();
            tokio::spawn(async move {
                transport
                    .run(capabilities(), server_info(), ServerOptions::new())
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(transport.session_manager().len(), 1);

        transport.shutdown().await.unwrap();
        let _ = tokio::time::timeout(Duration::from_secs(5), runner).await;
    }
}
