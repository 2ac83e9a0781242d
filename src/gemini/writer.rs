use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::gemini::response::Response;

/// Serializes a response into its wire form.
///
/// The status line is `"<code> <meta>\r\n"`. For `20` the meta is built from
/// the media type, language and charset, and the body follows the line. Every
/// other status sends its free-text meta and no body.
///
/// CR and LF are dropped from every status line field, however the response
/// was built, so the status line is always exactly one line.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(resp.body.len() + 64);

    buf.extend_from_slice(resp.status.code().to_string().as_bytes());
    buf.push(b' ');

    if resp.status.is_success() {
        if !resp.media_type.is_empty() {
            push_field(&mut buf, &resp.media_type);
            buf.extend_from_slice(b"; ");
        }
        if !resp.language.is_empty() {
            buf.extend_from_slice(b"lang=");
            push_field(&mut buf, &resp.language);
            buf.extend_from_slice(b"; ");
        }
        buf.extend_from_slice(b"charset=");
        push_field(&mut buf, &resp.charset);
    } else {
        push_field(&mut buf, &resp.meta);
    }

    buf.extend_from_slice(b"\r\n");

    if resp.status.is_success() {
        buf.extend_from_slice(&resp.body);
    }

    buf
}

fn push_field(buf: &mut Vec<u8>, field: &str) {
    buf.extend(field.bytes().filter(|b| *b != b'\r' && *b != b'\n'));
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    /// Number of bytes this writer sends in total.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub async fn write_to_stream<S>(&mut self, stream: &mut S) -> anyhow::Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
