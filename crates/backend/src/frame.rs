//! Length-prefixed framing for the backend channel.
//!
//! Every request and every reply is one frame: a u32 big-endian byte
//! length followed by that many bytes. Chat payloads legitimately
//! contain commas and newlines, so delimiter-based framing is not an
//! option here; the length prefix keeps the channel unambiguous in
//! both directions.

use consolechat_core::error::TransportError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single frame. A rendered context is bounded by the
/// token budget, and generated text by `max_output_length`; anything
/// near this limit indicates a corrupted stream.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Write one frame.
pub async fn write_frame<W>(writer: &mut W, body: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    if body.len() > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge {
            len: body.len(),
            max: MAX_FRAME_LEN,
        });
    }
    writer
        .write_u32(body.len() as u32)
        .await
        .map_err(|e| TransportError::Send(e.to_string()))?;
    writer
        .write_all(body)
        .await
        .map_err(|e| TransportError::Send(e.to_string()))?;
    writer
        .flush()
        .await
        .map_err(|e| TransportError::Send(e.to_string()))?;
    Ok(())
}

/// Read one frame.
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let len = reader
        .read_u32()
        .await
        .map_err(|e| TransportError::Recv(e.to_string()))? as usize;
    if len > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }
    let mut body = vec![0u8; len];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|e| TransportError::Recv(e.to_string()))?;
    Ok(body)
}
