use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame delimiter.
pub const FLAG: u8 = 0x7E;

/// Escape marker; the following byte is XOR-ed with [`ESCAPE_XOR`].
pub const ESCAPE: u8 = 0x7D;

/// Mask applied to an escaped byte.
pub const ESCAPE_XOR: u8 = 0x20;

/// Smallest possible wire frame: two flags around an empty interior.
pub const MIN_FRAME_LEN: usize = 2;

/// Append the byte-stuffed form of `src` to `dst`.
pub fn stuff_into(src: &[u8], dst: &mut BytesMut) {
    dst.reserve(src.len() + src.len() / 8 + 1);
    for &byte in src {
        if byte == ESCAPE || byte == FLAG {
            dst.put_u8(ESCAPE);
            dst.put_u8(byte ^ ESCAPE_XOR);
        } else {
            dst.put_u8(byte);
        }
    }
}

/// Escape every `FLAG` and `ESCAPE` byte in `src`.
pub fn byte_stuff(src: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(src.len());
    stuff_into(src, &mut dst);
    dst.freeze()
}

/// Reverse [`byte_stuff`].
///
/// Fails when the input ends on an escape byte or contains a bare flag.
pub fn byte_unstuff(src: &[u8]) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(src.len());
    let mut iter = src.iter().copied().enumerate();
    while let Some((offset, byte)) = iter.next() {
        match byte {
            ESCAPE => {
                let (_, escaped) = iter.next().ok_or(FrameError::TrailingEscape)?;
                dst.put_u8(escaped ^ ESCAPE_XOR);
            }
            FLAG => return Err(FrameError::UnescapedFlag { offset }),
            other => dst.put_u8(other),
        }
    }
    Ok(dst.freeze())
}

/// Delimit a payload: `FLAG ++ stuff(payload) ++ FLAG`.
pub fn wrap_frame(payload: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(payload.len() + MIN_FRAME_LEN);
    dst.put_u8(FLAG);
    stuff_into(payload, &mut dst);
    dst.put_u8(FLAG);
    dst.freeze()
}

/// Strip the delimiters from a received frame and unstuff the interior.
///
/// The closing flag is mandatory. Devices do not always repeat the opening
/// flag, so a single leading flag is stripped only when present.
pub fn unwrap_frame(frame: &[u8]) -> Result<Bytes> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(FrameError::TooShort {
            len: frame.len(),
            min: MIN_FRAME_LEN,
        });
    }
    let Some(body) = frame.strip_suffix(&[FLAG]) else {
        return Err(FrameError::MissingFlag);
    };
    let interior = body.strip_prefix(&[FLAG]).unwrap_or(body);
    byte_unstuff(interior)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stuff_escapes_flag_and_escape() {
        let stuffed = byte_stuff(&[0x01, FLAG, 0x02, ESCAPE, 0x03]);
        assert_eq!(
            stuffed.as_ref(),
            &[0x01, ESCAPE, 0x5E, 0x02, ESCAPE, 0x5D, 0x03]
        );
    }

    #[test]
    fn stuff_passes_plain_bytes() {
        let data = b"\x04\x83\x06\x01`\xf7";
        assert_eq!(byte_stuff(data).as_ref(), data);
    }

    #[test]
    fn unstuff_roundtrip_all_byte_values() {
        let data: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();
        let stuffed = byte_stuff(&data);
        assert!(!stuffed.contains(&FLAG));
        assert_eq!(byte_unstuff(&stuffed).unwrap().as_ref(), data.as_slice());
    }

    #[test]
    fn unstuff_roundtrip_runs_of_special_bytes() {
        let data = [FLAG, FLAG, ESCAPE, ESCAPE, FLAG, ESCAPE];
        assert_eq!(byte_unstuff(&byte_stuff(&data)).unwrap().as_ref(), &data);
    }

    #[test]
    fn unstuff_empty() {
        assert!(byte_unstuff(&[]).unwrap().is_empty());
    }

    #[test]
    fn unstuff_rejects_trailing_escape() {
        let err = byte_unstuff(&[0x01, ESCAPE]).unwrap_err();
        assert_eq!(err, FrameError::TrailingEscape);
    }

    #[test]
    fn unstuff_rejects_bare_flag() {
        let err = byte_unstuff(&[0x01, FLAG, 0x02]).unwrap_err();
        assert_eq!(err, FrameError::UnescapedFlag { offset: 1 });
    }

    #[test]
    fn wrap_frame_format() {
        let payload = b"\x04\x83\x06\x01`\xf7";
        let frame = wrap_frame(payload);
        assert_eq!(frame[0], FLAG);
        assert_eq!(frame[frame.len() - 1], FLAG);
        assert_eq!(&frame[1..frame.len() - 1], payload);
    }

    #[test]
    fn unwrap_recovers_payload() {
        let payload = [0x11, FLAG, 0x22, ESCAPE];
        let frame = wrap_frame(&payload);
        assert_eq!(unwrap_frame(&frame).unwrap().as_ref(), &payload);
    }

    #[test]
    fn unwrap_accepts_missing_leading_flag() {
        let frame = wrap_frame(b"abc");
        assert_eq!(unwrap_frame(&frame[1..]).unwrap().as_ref(), b"abc");
    }

    #[test]
    fn unwrap_rejects_missing_closing_flag() {
        let err = unwrap_frame(&[FLAG, 0x01, 0x02]).unwrap_err();
        assert_eq!(err, FrameError::MissingFlag);
    }

    #[test]
    fn unwrap_rejects_short_frame_without_closing_flag() {
        assert_eq!(unwrap_frame(&[0x04, 0x01]).unwrap_err(), FrameError::MissingFlag);
    }

    #[test]
    fn unwrap_rejects_single_byte() {
        let err = unwrap_frame(&[FLAG]).unwrap_err();
        assert!(matches!(err, FrameError::TooShort { len: 1, .. }));
    }

    #[test]
    fn unwrap_empty_frame() {
        assert!(unwrap_frame(&[FLAG, FLAG]).unwrap().is_empty());
    }
}
