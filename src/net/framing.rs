//! Message framing for the length-prefixed protocol
//!
//! Format: [4 bytes little-endian length][payload]. The length is
//! validated against the frame cap before any allocation.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::game::constants::net::MAX_MESSAGE_SIZE;

/// Errors that can occur during message framing
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Message too large: {0} bytes (max {1})")]
    MessageTooLarge(usize, usize),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Read a length-prefixed message from a stream
pub async fn read_message<R: AsyncRead + Unpin>(stream: &mut R) -> Result<Vec<u8>, FramingError> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(FramingError::ConnectionClosed);
        }
        Err(e) => return Err(FramingError::Io(e)),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(FramingError::MessageTooLarge(len, MAX_MESSAGE_SIZE));
    }
    if len == 0 {
        return Ok(Vec::new());
    }

    let mut buf = vec![0u8; len];
    match stream.read_exact(&mut buf).await {
        Ok(_) => Ok(buf),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(FramingError::ConnectionClosed),
        Err(e) => Err(FramingError::Io(e)),
    }
}

/// Write a length-prefixed message to a stream
pub async fn write_message<W: AsyncWrite + Unpin>(
    stream: &mut W,
    data: &[u8],
) -> Result<(), FramingError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(FramingError::MessageTooLarge(data.len(), MAX_MESSAGE_SIZE));
    }

    let len_bytes = (data.len() as u32).to_le_bytes();
    stream.write_all(&len_bytes).await?;
    stream.write_all(data).await?;
    stream.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_read_write_round_trip() {
        let data = b"framed payload";
        let mut buffer = Vec::new();
        write_message(&mut buffer, data).await.unwrap();

        let mut cursor = Cursor::new(buffer);
        let result = read_message(&mut cursor).await.unwrap();
        assert_eq!(result, data);
    }

    #[tokio::test]
    async fn test_empty_message() {
        let mut buffer = Vec::new();
        write_message(&mut buffer, b"").await.unwrap();

        let mut cursor = Cursor::new(buffer);
        let result = read_message(&mut cursor).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_message_too_large() {
        let large = vec![0u8; MAX_MESSAGE_SIZE + 1];
        let mut buffer = Vec::new();
        let result = write_message(&mut buffer, &large).await;
        assert!(matches!(result, Err(FramingError::MessageTooLarge(_, _))));
    }

    #[tokio::test]
    async fn test_oversized_prefix_rejected_before_read() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&((MAX_MESSAGE_SIZE + 1) as u32).to_le_bytes());

        let mut cursor = Cursor::new(buffer);
        let result = read_message(&mut cursor).await;
        assert!(matches!(result, Err(FramingError::MessageTooLarge(_, _))));
    }

    #[tokio::test]
    async fn test_truncated_length() {
        let mut cursor = Cursor::new(vec![0u8; 2]);
        let result = read_message(&mut cursor).await;
        assert!(matches!(result, Err(FramingError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_truncated_payload() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&10u32.to_le_bytes());
        buffer.extend_from_slice(&[1, 2, 3]);

        let mut cursor = Cursor::new(buffer);
        let result = read_message(&mut cursor).await;
        assert!(matches!(result, Err(FramingError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_back_to_back_messages() {
        let messages = vec![b"first".to_vec(), b"second one".to_vec(), b"3".to_vec()];
        let mut buffer = Vec::new();
        for msg in &messages {
            write_message(&mut buffer, msg).await.unwrap();
        }

        let mut cursor = Cursor::new(buffer);
        for expected in &messages {
            assert_eq!(&read_message(&mut cursor).await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_read_reassembles_split_reads() {
        // A frame arriving in fragments, the prefix itself cut in two.
        let mut stream = tokio_test::io::Builder::new()
            .read(&[0x03, 0x00])
            .read(&[0x00, 0x00, 0xaa])
            .read(&[0xbb, 0xcc])
            .build();

        let payload = read_message(&mut stream).await.unwrap();
        assert_eq!(payload, vec![0xaa, 0xbb, 0xcc]);
    }
}
