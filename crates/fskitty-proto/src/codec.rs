//! Frame codec: length-delimited frames with `postcard` payloads.
//!
//! Transports wrap their byte stream in
//! `tokio_util::codec::Framed::new(stream, frame_codec(max_len))` and convert
//! each frame with [`encode`] / [`decode`].

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::codec::LengthDelimitedCodec;

/// Errors produced while encoding or decoding protocol messages.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// A message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[source] postcard::Error),

    /// A frame did not contain a valid message.
    #[error("failed to decode message: {0}")]
    Decode(#[source] postcard::Error),

    /// The underlying stream failed or produced an invalid frame.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream.
    #[error("connection closed by peer")]
    Closed,
}

/// Builds the length-delimited codec used on every fskitty stream.
///
/// Frames use a 4-byte big-endian length prefix. Frames longer than
/// `max_frame_len` are rejected by the codec in both directions.
pub fn frame_codec(max_frame_len: usize) -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .big_endian()
        .max_frame_length(max_frame_len)
        .new_codec()
}

/// Serializes a message into a frame payload.
pub fn encode<T: Serialize>(value: &T) -> Result<Bytes, ProtoError> {
    postcard::to_stdvec(value)
        .map(Bytes::from)
        .map_err(ProtoError::Encode)
}

/// Deserializes a frame payload.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, ProtoError> {
    postcard::from_bytes(payload).map_err(ProtoError::Decode)
}

/// Reads only the leading `id` of a [`RequestFrame`](crate::RequestFrame) payload.
///
/// Lets a server answer a request whose body it cannot decode (for example one
/// sent by a newer client) instead of leaving the caller waiting.
pub fn peek_request_id(payload: &[u8]) -> Option<u64> {
    postcard::take_from_bytes::<u64>(payload)
        .ok()
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DirEntry, ItemType, ReadDirReply, RemoteError, Request, RequestFrame, Response,
        ResponseFrame,
    };
    use bytes::BytesMut;
    use proptest::prelude::*;
    use tokio_util::codec::{Decoder, Encoder};

    #[test]
    fn test_response_frame_survives_framing() {
        let frame = ResponseFrame {
            id: 42,
            response: Response::ReadDir(Ok(ReadDirReply {
                entries: vec![DirEntry {
                    name: "hello.txt".to_string(),
                    item_id: 2,
                    item_type: ItemType::File,
                }],
                next_cursor: 0,
            })),
        };

        let mut codec = frame_codec(1024);
        let mut wire = BytesMut::new();
        codec.encode(encode(&frame).unwrap(), &mut wire).unwrap();

        let payload = codec.decode(&mut wire).unwrap().expect("complete frame");
        let decoded: ResponseFrame = decode(&payload).unwrap();
        assert_eq!(decoded, frame);
        assert!(wire.is_empty());
    }

    #[test]
    fn test_partial_frame_waits_for_more_bytes() {
        let payload = encode(&Response::Pong("pong".to_string())).unwrap();
        let mut codec = frame_codec(1024);
        let mut wire = BytesMut::new();
        codec.encode(payload, &mut wire).unwrap();

        let mut partial = wire.split_to(wire.len() - 1);
        assert!(codec.decode(&mut partial).unwrap().is_none());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut codec = frame_codec(8);
        let mut wire = BytesMut::new();
        let result = codec.encode(Bytes::from(vec![0u8; 64]), &mut wire);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_reply_keeps_code_and_message() {
        let response = Response::Delete(Err(RemoteError::new(66, "not empty")));
        let decoded: Response = decode(&encode(&response).unwrap()).unwrap();
        match decoded {
            Response::Delete(Err(err)) => {
                assert_eq!(err.code, 66);
                assert_eq!(err.message, "not empty");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_peek_request_id_ignores_body() {
        let frame = RequestFrame {
            id: 9_000_001,
            request: Request::Delete { item_id: 7 },
        };
        let mut payload = encode(&frame).unwrap().to_vec();
        // Corrupt the body; the id prefix stays readable.
        payload.truncate(payload.len() - 1);
        payload.push(0xee);
        assert_eq!(peek_request_id(&payload), Some(9_000_001));
        assert_eq!(peek_request_id(&[]), None);
    }

    #[test]
    fn test_garbage_payload_fails_to_decode() {
        let result: Result<RequestFrame, _> = decode(&[0xff, 0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(ProtoError::Decode(_))));
    }

    proptest! {
        #[test]
        fn prop_write_request_preserves_payload(
            id in any::<u64>(),
            item_id in 1u64..,
            offset in any::<u64>(),
            data in proptest::collection::vec(any::<u8>(), 0..4096),
        ) {
            let frame = RequestFrame {
                id,
                request: Request::Write { item_id, offset, data },
            };
            let decoded: RequestFrame = decode(&encode(&frame).unwrap()).unwrap();
            prop_assert_eq!(decoded, frame);
        }
    }
}
