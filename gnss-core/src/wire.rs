//! Framing: length-prefix (2 bytes BE) + UTF-8 text payload.

const LEN_SIZE: usize = 2;

/// Encode a notification into a single frame: 2 bytes BE length + UTF-8 payload.
pub fn encode_frame(text: &str) -> Result<Vec<u8>, FrameEncodeError> {
    let payload = text.as_bytes();
    let len = u16::try_from(payload.len()).map_err(|_| FrameEncodeError::TooLarge)?;
    let mut out = Vec::with_capacity(LEN_SIZE + payload.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Error encoding a notification into a frame (payload exceeds the 16-bit length field).
#[derive(Debug, thiserror::Error)]
pub enum FrameEncodeError {
    #[error("frame too large")]
    TooLarge,
}

/// Decode one frame from the front of `bytes`. Returns the payload text and the number of bytes consumed.
/// Call with partial buffer; returns error if not enough bytes (caller should try again after more data).
pub fn decode_frame(bytes: &[u8]) -> Result<(String, usize), FrameDecodeError> {
    if bytes.len() < LEN_SIZE {
        return Err(FrameDecodeError::NeedMore);
    }
    let len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    if bytes.len() < LEN_SIZE + len {
        return Err(FrameDecodeError::NeedMore);
    }
    let text = std::str::from_utf8(&bytes[LEN_SIZE..LEN_SIZE + len])?.to_owned();
    Ok((text, LEN_SIZE + len))
}

/// Error decoding a frame (need more bytes, or payload is not UTF-8).
#[derive(Debug, thiserror::Error)]
pub enum FrameDecodeError {
    #[error("need more bytes")]
    NeedMore,
    #[error("payload is not utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_payload() {
        let text = "OPERATOR_INFO:name=test\nmcc=240\nmnc=01";
        let frame = encode_frame(text).unwrap();
        assert_eq!(frame.len(), text.len() + LEN_SIZE);
        assert_eq!(&frame[..2], &(text.len() as u16).to_be_bytes());
        let (decoded, n) = decode_frame(&frame).unwrap();
        assert_eq!(n, frame.len());
        assert_eq!(decoded, text);
    }

    #[test]
    fn length_prefix_is_big_endian() {
        let text = "x".repeat(0x0102);
        let frame = encode_frame(&text).unwrap();
        assert_eq!(frame[0], 0x01);
        assert_eq!(frame[1], 0x02);
    }

    #[test]
    fn partial_read_need_more() {
        let frame = encode_frame("AIRPLANE_MODE:true").unwrap();
        assert!(matches!(decode_frame(&[]), Err(FrameDecodeError::NeedMore)));
        assert!(matches!(
            decode_frame(&frame[..1]),
            Err(FrameDecodeError::NeedMore)
        ));
        assert!(matches!(
            decode_frame(&frame[..frame.len() - 1]),
            Err(FrameDecodeError::NeedMore)
        ));
    }

    #[test]
    fn multiple_messages() {
        let a = "NO_APN_DEFINED";
        let b = "ANY_DATA_STATE:connected";
        let fa = encode_frame(a).unwrap();
        let fb = encode_frame(b).unwrap();
        let mut buf = Vec::new();
        buf.extend_from_slice(&fa);
        buf.extend_from_slice(&fb);
        let (m1, n1) = decode_frame(&buf).unwrap();
        assert_eq!(n1, fa.len());
        assert_eq!(m1, a);
        let (m2, n2) = decode_frame(&buf[n1..]).unwrap();
        assert_eq!(n2, fb.len());
        assert_eq!(m2, b);
    }

    #[test]
    fn oversized_payload_rejected() {
        let text = "y".repeat(usize::from(u16::MAX) + 1);
        assert!(matches!(
            encode_frame(&text),
            Err(FrameEncodeError::TooLarge)
        ));
    }

    #[test]
    fn non_utf8_payload_rejected() {
        let frame = [0x00, 0x02, 0xff, 0xfe];
        assert!(matches!(
            decode_frame(&frame),
            Err(FrameDecodeError::Utf8(_))
        ));
    }

    #[test]
    fn empty_payload_roundtrip() {
        let frame = encode_frame("").unwrap();
        assert_eq!(frame, vec![0, 0]);
        let (decoded, n) = decode_frame(&frame).unwrap();
        assert_eq!(n, 2);
        assert_eq!(decoded, "");
    }
}
