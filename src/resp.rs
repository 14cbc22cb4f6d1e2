//! # RESP2 Wire Codec
//!
//! Purpose: Encode commands and decode replies for the default TCP store
//! without external dependencies.
//!
//! ## Design Principles
//! 1. **Buffer Reuse**: The caller owns the scratch buffers, so steady-state
//!    round trips allocate only for the decoded payload.
//! 2. **Binary-Safe**: Bulk strings are raw bytes end to end.
//! 3. **Fail Fast**: Any framing violation is a protocol error; the
//!    connection is then discarded rather than resynchronized.
//!
//! Server error replies (`-ERR ...`) decode to [`Error::Store`] directly so
//! callers never have to unpack an error out of a success value.

use std::io::BufRead;

use crate::error::{Error, Result};
use crate::store::Reply;

/// Encodes one command as a RESP2 array of bulk strings into `out`.
pub fn encode_command(command: &str, args: &[&[u8]], out: &mut Vec<u8>) {
    out.push(b'*');
    push_decimal(out, (args.len() + 1) as u64);
    out.extend_from_slice(b"\r\n");
    encode_bulk(command.as_bytes(), out);
    for arg in args {
        encode_bulk(arg, out);
    }
}

fn encode_bulk(data: &[u8], out: &mut Vec<u8>) {
    out.push(b'$');
    push_decimal(out, data.len() as u64);
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
}

/// Reads one complete reply. `scratch` is a reusable line buffer.
pub fn read_reply<R: BufRead>(reader: &mut R, scratch: &mut Vec<u8>) -> Result<Reply> {
    read_line(reader, scratch)?;
    let (&marker, rest) = scratch.split_first().ok_or(Error::Protocol)?;
    match marker {
        b'+' => Ok(Reply::Simple(String::from_utf8_lossy(rest).into_owned())),
        b'-' => Err(Error::Store(String::from_utf8_lossy(rest).into_owned())),
        b':' => Ok(Reply::Integer(parse_int(rest)?)),
        b'$' => {
            let len = parse_int(rest)?;
            read_bulk(reader, len)
        }
        b'*' => {
            let len = parse_int(rest)?;
            read_array(reader, len, scratch)
        }
        _ => Err(Error::Protocol),
    }
}

fn read_bulk<R: BufRead>(reader: &mut R, len: i64) -> Result<Reply> {
    if len < 0 {
        // Null bulk string: the store's not-found sentinel.
        return Ok(Reply::Nil);
    }

    let mut data = vec![0u8; len as usize];
    reader.read_exact(&mut data)?;

    let mut crlf = [0u8; 2];
    reader.read_exact(&mut crlf)?;
    if crlf != *b"\r\n" {
        return Err(Error::Protocol);
    }
    Ok(Reply::Bulk(data))
}

fn read_array<R: BufRead>(reader: &mut R, len: i64, scratch: &mut Vec<u8>) -> Result<Reply> {
    if len <= 0 {
        return Ok(Reply::Array(Vec::new()));
    }
    let mut items = Vec::with_capacity(len as usize);
    for _ in 0..len {
        items.push(read_reply(reader, scratch)?);
    }
    Ok(Reply::Array(items))
}

fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> Result<()> {
    buf.clear();
    let bytes = reader.read_until(b'\n', buf)?;
    if bytes == 0 {
        return Err(Error::Protocol);
    }
    if !buf.ends_with(b"\r\n") {
        return Err(Error::Protocol);
    }
    buf.truncate(buf.len() - 2);
    Ok(())
}

fn parse_int(data: &[u8]) -> Result<i64> {
    let (negative, digits) = match data.split_first() {
        Some((&b'-', rest)) => (true, rest),
        _ => (false, data),
    };
    if digits.is_empty() {
        return Err(Error::Protocol);
    }

    let mut value: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(Error::Protocol);
        }
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(b - b'0'));
    }
    Ok(if negative { -value } else { value })
}

fn push_decimal(out: &mut Vec<u8>, mut value: u64) {
    // Digits go into a stack buffer to keep encoding allocation-free.
    let mut buf = [0u8; 20];
    let mut len = 0;
    loop {
        buf[len] = b'0' + (value % 10) as u8;
        value /= 10;
        len += 1;
        if value == 0 {
            break;
        }
    }
    for idx in (0..len).rev() {
        out.push(buf[idx]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode(input: &[u8]) -> Result<Reply> {
        let mut reader = Cursor::new(input.to_vec());
        let mut scratch = Vec::new();
        read_reply(&mut reader, &mut scratch)
    }

    #[test]
    fn encodes_command_with_args() {
        let mut buf = Vec::new();
        encode_command("SET", &[b"app:0.1:k", b"v"], &mut buf);
        assert_eq!(&buf, b"*3\r\n$3\r\nSET\r\n$9\r\napp:0.1:k\r\n$1\r\nv\r\n");
    }

    #[test]
    fn encodes_bare_command() {
        let mut buf = Vec::new();
        encode_command("PING", &[], &mut buf);
        assert_eq!(&buf, b"*1\r\n$4\r\nPING\r\n");
    }

    #[test]
    fn decodes_simple_string() {
        assert_eq!(decode(b"+PONG\r\n").unwrap(), Reply::Simple("PONG".into()));
    }

    #[test]
    fn decodes_bulk_and_nil() {
        assert_eq!(decode(b"$5\r\nhello\r\n").unwrap(), Reply::Bulk(b"hello".to_vec()));
        assert_eq!(decode(b"$-1\r\n").unwrap(), Reply::Nil);
    }

    #[test]
    fn decodes_integer() {
        assert_eq!(decode(b":-2\r\n").unwrap(), Reply::Integer(-2));
    }

    #[test]
    fn error_reply_becomes_store_error() {
        match decode(b"-ERR wrong type\r\n") {
            Err(Error::Store(message)) => assert_eq!(message, "ERR wrong type"),
            other => panic!("expected store error, got {:?}", other),
        }
    }

    #[test]
    fn decodes_array() {
        let reply = decode(b"*2\r\n$1\r\na\r\n:7\r\n").unwrap();
        assert_eq!(
            reply,
            Reply::Array(vec![Reply::Bulk(b"a".to_vec()), Reply::Integer(7)])
        );
    }

    #[test]
    fn truncated_frame_is_protocol_error() {
        assert!(matches!(decode(b"$5\r\nhel"), Err(Error::Io(_) | Error::Protocol)));
        assert!(matches!(decode(b"hello\r\n"), Err(Error::Protocol)));
    }
}
