use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::dispatch::Dispatcher;
use crate::gemini::parser::{MAX_REQUEST_LINE, find_line_end};
use crate::gemini::request::Request;
use crate::gemini::response::Response;
use crate::gemini::writer::ResponseWriter;

pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    dispatcher: Arc<Dispatcher>,
    read_timeout: Option<Duration>,
}

pub enum ConnectionState {
    Reading,
    Validating(String),
    Dispatching(Request),
    Writing(ResponseWriter),
    Closed,
}

/// Result of waiting for the request line.
pub enum ReadOutcome {
    /// A full line, without its terminator
    Line(String),
    /// No line terminator within the size limit
    TooLong,
    /// The peer closed before sending a full line
    Disconnected,
    /// The read deadline passed
    TimedOut,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(MAX_REQUEST_LINE + 2),
            state: ConnectionState::Reading,
            dispatcher,
            read_timeout: None,
        }
    }

    /// Closes connections whose request line does not arrive within `timeout`.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Serves the single request on this connection.
    ///
    /// The stream is always shut down before returning, even when writing
    /// the response failed; the write error is returned afterwards.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut result = Ok(());

        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => match self.read_line().await {
                    Ok(ReadOutcome::Line(line)) => {
                        self.state = ConnectionState::Validating(line);
                    }
                    Ok(ReadOutcome::TooLong) => {
                        tracing::info!("Request line exceeds {} bytes", MAX_REQUEST_LINE);
                        self.state = ConnectionState::Writing(ResponseWriter::new(
                            &Response::bad_request(),
                        ));
                    }
                    Ok(ReadOutcome::Disconnected) => {
                        tracing::debug!("Client closed before sending a request");
                    }
                    Ok(ReadOutcome::TimedOut) => {
                        tracing::info!("Timed out waiting for request line");
                    }
                    Err(e) => {
                        result = Err(e);
                    }
                },

                ConnectionState::Validating(line) => {
                    let request = Request::parse(&line);
                    tracing::info!(request = %request.raw, "Received request");

                    match self.dispatcher.validate(&request) {
                        Ok(()) => {
                            self.state = ConnectionState::Dispatching(request);
                        }
                        Err(rejection) => {
                            tracing::info!(
                                request = %request.raw,
                                reason = %rejection,
                                "Bad request"
                            );
                            self.state = ConnectionState::Writing(ResponseWriter::new(
                                &Response::bad_request(),
                            ));
                        }
                    }
                }

                ConnectionState::Dispatching(request) => {
                    let path = request.path.clone();
                    let response = self.dispatcher.dispatch(request).await;
                    tracing::info!(
                        path = %path,
                        status = response.status.code(),
                        name = response.status.name(),
                        "Response"
                    );
                    self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                }

                ConnectionState::Writing(mut writer) => {
                    if let Err(e) = writer.write_to_stream(&mut self.stream).await {
                        result = Err(e);
                    }
                }

                ConnectionState::Closed => {
                    if let Err(e) = self.stream.shutdown().await {
                        tracing::debug!(error = %e, "Shutdown failed");
                    }
                    break;
                }
            }
        }

        result
    }

    /// Waits for the request line, honoring the read deadline.
    pub async fn read_line(&mut self) -> anyhow::Result<ReadOutcome> {
        match self.read_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, self.read_line_inner()).await {
                Ok(outcome) => outcome,
                Err(_) => Ok(ReadOutcome::TimedOut),
            },
            None => self.read_line_inner().await,
        }
    }

    async fn read_line_inner(&mut self) -> anyhow::Result<ReadOutcome> {
        loop {
            if let Some(end) = find_line_end(&self.buffer) {
                // The terminator is LF or CRLF; neither counts toward the limit
                let url_len = if end > 0 && self.buffer[end - 1] == b'\r' {
                    end - 1
                } else {
                    end
                };
                if url_len > MAX_REQUEST_LINE {
                    return Ok(ReadOutcome::TooLong);
                }
                let line = self.buffer.split_to(end + 1);
                let text = String::from_utf8_lossy(&line[..url_len]);
                return Ok(ReadOutcome::Line(text.into_owned()));
            }

            // URL plus CRLF
            if self.buffer.len() >= MAX_REQUEST_LINE + 2 {
                return Ok(ReadOutcome::TooLong);
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                return Ok(ReadOutcome::Disconnected);
            }
        }
    }
}
