// Length-prefixed JSON chunks for stream subscribers
use axum::body::Body;
use axum::http::{Response, StatusCode, header};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::Stream;
use serde::Serialize;

use crate::infrastructure::http_response::{JSON_CONTENT_TYPE, brotli};

/// Each message becomes one chunk: a 4-byte big-endian length followed by
/// the JSON payload, Brotli-compressed per chunk when `compress` is set.
pub fn chunked_json_stream<S, T>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let byte_stream = stream.then(move |msg| async move { serialize_chunk(msg, compress).await });

    // No Content-Encoding: chunks are compressed individually, not the body.
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn serialize_chunk<T: Serialize>(msg: T, compress: bool) -> std::io::Result<Bytes> {
    let json = serde_json::to_vec(&msg).map_err(std::io::Error::other)?;
    let payload = if compress { brotli(json).await? } else { json };

    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(payload.len() as u32);
    chunk.put_slice(&payload);
    Ok(chunk.freeze())
}

pub fn stream_from_receiver<T>(mut rx: tokio::sync::mpsc::Receiver<T>, compress: bool) -> Response<Body>
where
    T: Serialize + Send + 'static,
{
    let stream = async_stream::stream! {
        while let Some(msg) = rx.recv().await {
            yield msg;
        }
    };

    match chunked_json_stream(stream, compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_compression::tokio::bufread::BrotliDecoder;
    use serde_json::json;
    use tokio::io::AsyncReadExt;

    fn split_chunks(body: &[u8]) -> Vec<&[u8]> {
        let mut chunks = Vec::new();
        let mut rest = body;
        while rest.len() >= 4 {
            let len = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
            chunks.push(&rest[4..4 + len]);
            rest = &rest[4 + len..];
        }
        assert!(rest.is_empty());
        chunks
    }

    #[tokio::test]
    async fn test_messages_are_length_prefixed() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(json!({"type": "frames", "frames": []})).await.unwrap();
        tx.send(json!({"type": "error", "error": "boom"})).await.unwrap();
        drop(tx);

        let response = stream_from_receiver(rx, false);
        assert_eq!(response.headers()[header::TRANSFER_ENCODING], "chunked");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

        let chunks = split_chunks(&body);
        assert_eq!(chunks.len(), 2);
        let second: serde_json::Value = serde_json::from_slice(chunks[1]).unwrap();
        assert_eq!(second["error"], "boom");
    }

    #[tokio::test]
    async fn test_chunks_are_compressed_individually() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(json!({"type": "frames", "frames": [{"name": "Wind Speed"}]}))
            .await
            .unwrap();
        drop(tx);

        let response = stream_from_receiver(rx, true);
        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

        let chunks = split_chunks(&body);
        let mut decoder = BrotliDecoder::new(chunks[0]);
        let mut plain = Vec::new();
        decoder.read_to_end(&mut plain).await.unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(&plain).unwrap();
        assert_eq!(decoded["frames"][0]["name"], "Wind Speed");
    }
}
