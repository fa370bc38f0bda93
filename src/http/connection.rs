use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::app::Application;
use crate::http::parser::{parse_http_request, ParseError, RawRequest};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

/// One client connection served by the bundled gateway.
pub struct Connection<S> {
    stream: S,
    app: Arc<Application>,
    buffer: Vec<u8>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(RawRequest),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, app: Arc<Application>) -> Self {
        Self {
            stream,
            app,
            buffer: Vec::with_capacity(4096),
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::Reading => match self.read_request().await? {
                    Some(req) => ConnectionState::Processing(req),
                    None => ConnectionState::Closed,
                },

                ConnectionState::Processing(req) => {
                    let app = Arc::clone(&self.app);
                    let head_only = req.method.eq_ignore_ascii_case("HEAD");
                    let (response, keep_alive) = Self::handle_request(app, req).await;

                    let writer = ResponseWriter::new(response);
                    let writer = if head_only { writer.without_body() } else { writer };
                    ConnectionState::Writing(writer, keep_alive)
                }

                ConnectionState::Writing(mut writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if keep_alive {
                        ConnectionState::Reading // go back for next request
                    } else {
                        ConnectionState::Closed
                    }
                }

                ConnectionState::Closed => break,
            };
        }

        Ok(())
    }

    pub async fn read_request(&mut self) -> anyhow::Result<Option<RawRequest>> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.drain(..consumed);
                    return Ok(Some(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => {
                    // Malformed request → protocol error
                    return Err(anyhow::anyhow!("HTTP parse error: {:?}", e));
                }
            }

            let mut temp = [0u8; 1024];
            let n = self.stream.read(&mut temp).await?;

            if n == 0 {
                // Client closed connection
                return Ok(None);
            }

            self.buffer.extend_from_slice(&temp[..n]);
        }
    }

    /// Runs dispatch off the async workers; handlers may block.
    async fn handle_request(app: Arc<Application>, req: RawRequest) -> (Response, bool) {
        let keep_alive = req.keep_alive();
        let method = req.method.clone();
        let target = req.target.clone();

        let outcome = tokio::task::spawn_blocking(move || app.dispatch(req.into_envelope())).await;

        match outcome {
            Ok(Ok(response)) => {
                tracing::info!(
                    method = %method,
                    path = %target,
                    status = response.code,
                    "request served"
                );
                (response, keep_alive)
            }
            Ok(Err(fault)) => {
                tracing::error!(method = %method, path = %target, error = ?fault, "unhandled fault");
                (Response::internal_error(), false)
            }
            Err(join) => {
                tracing::error!(method = %method, path = %target, error = %join, "handler panicked");
                (Response::internal_error(), false)
            }
        }
    }
}
