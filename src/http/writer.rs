use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::{Body, ChunkStream, Response};

const HTTP_VERSION: &str = "HTTP/1.1";

fn serialize_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!("{} {}\r\n", HTTP_VERSION, resp.status_line());
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in resp.headers.iter() {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    if resp.body.is_stream() {
        buf.extend_from_slice(b"Transfer-Encoding: chunked\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

/// Writes a response; streamed bodies go out with chunked encoding.
pub struct ResponseWriter {
    head: Vec<u8>,
    body: Option<Body>,
}

impl ResponseWriter {
    pub fn new(response: Response) -> Self {
        let head = serialize_head(&response);
        Self {
            head,
            body: Some(response.body),
        }
    }

    /// Sends only the head, as a reply to `HEAD`.
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    /// Sends the whole response.
    ///
    /// A stream that fails halfway cannot be turned into a status any more;
    /// the error is returned so the caller drops the connection.
    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        stream.write_all(&self.head).await?;

        match self.body.take() {
            Some(Body::Full(body)) => stream.write_all(&body).await?,
            Some(Body::Stream { first, rest }) => write_chunks(stream, first, rest).await?,
            None => {}
        }

        stream.flush().await?;
        Ok(())
    }
}

async fn write_chunks<W>(stream: &mut W, first: Option<Bytes>, rest: ChunkStream) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if let Some(chunk) = first {
        write_chunk(stream, &chunk).await?;
    }

    // Chunk producers may block; pull each one on the blocking pool.
    let mut rest = rest;
    loop {
        let (returned, next) = tokio::task::spawn_blocking(move || {
            let next = rest.next();
            (rest, next)
        })
        .await?;
        rest = returned;

        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk.map_err(|e| anyhow::anyhow!("response stream failed: {e}"))?;
        write_chunk(stream, &chunk).await?;
    }

    stream.write_all(b"0\r\n\r\n").await?;
    Ok(())
}

async fn write_chunk<W>(stream: &mut W, chunk: &[u8]) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    // A zero-length chunk would terminate the body early.
    if chunk.is_empty() {
        return Ok(());
    }
    stream.write_all(format!("{:x}\r\n", chunk.len()).as_bytes()).await?;
    stream.write_all(chunk).await?;
    stream.write_all(b"\r\n").await?;
    Ok(())
}
