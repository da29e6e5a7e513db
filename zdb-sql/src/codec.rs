//! Row tuple wire format: `[col_count:u16][tag:u8, payload]*`. Tag `0` is
//! `Integer` (i64 LE), tag `1` is `Text` (len:u32 LE + UTF-8 bytes).

use crate::ast::Value;
use crate::error::{Error, Result};

const TAG_INTEGER: u8 = 0;
const TAG_TEXT: u8 = 1;

pub fn encode(row: &[Value]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(row.len() as u16).to_le_bytes());
    for value in row {
        match value {
            Value::Integer(n) => {
                buf.push(TAG_INTEGER);
                buf.extend_from_slice(&n.to_le_bytes());
            }
            Value::Text(s) => {
                buf.push(TAG_TEXT);
                let bytes = s.as_bytes();
                buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                buf.extend_from_slice(bytes);
            }
        }
    }
    buf
}

pub fn decode(mut bytes: &[u8]) -> Result<Vec<Value>> {
    let col_count = read_u16(&mut bytes)? as usize;
    let mut row = Vec::with_capacity(col_count);
    for _ in 0..col_count {
        let tag = read_u8(&mut bytes)?;
        let value = match tag {
            TAG_INTEGER => {
                let n = read_i64(&mut bytes)?;
                Value::Integer(n)
            }
            TAG_TEXT => {
                let len = read_u32(&mut bytes)? as usize;
                if bytes.len() < len {
                    return Err(Error::InvalidSyntax("truncated row payload".to_string()));
                }
                let (text_bytes, rest) = bytes.split_at(len);
                let text = String::from_utf8(text_bytes.to_vec())
                    .map_err(|_| Error::InvalidSyntax("row text column is not valid UTF-8".to_string()))?;
                bytes = rest;
                Value::Text(text)
            }
            other => {
                return Err(Error::InvalidSyntax(format!("unknown row column tag {other}")));
            }
        };
        row.push(value);
    }
    Ok(row)
}

fn read_u8(bytes: &mut &[u8]) -> Result<u8> {
    if bytes.is_empty() {
        return Err(Error::InvalidSyntax("truncated row payload".to_string()));
    }
    let (head, rest) = bytes.split_at(1);
    *bytes = rest;
    Ok(head[0])
}

fn read_u16(bytes: &mut &[u8]) -> Result<u16> {
    if bytes.len() < 2 {
        return Err(Error::InvalidSyntax("truncated row payload".to_string()));
    }
    let (head, rest) = bytes.split_at(2);
    *bytes = rest;
    Ok(u16::from_le_bytes(head.try_into().unwrap()))
}

fn read_u32(bytes: &mut &[u8]) -> Result<u32> {
    if bytes.len() < 4 {
        return Err(Error::InvalidSyntax("truncated row payload".to_string()));
    }
    let (head, rest) = bytes.split_at(4);
    *bytes = rest;
    Ok(u32::from_le_bytes(head.try_into().unwrap()))
}

fn read_i64(bytes: &mut &[u8]) -> Result<i64> {
    if bytes.len() < 8 {
        return Err(Error::InvalidSyntax("truncated row payload".to_string()));
    }
    let (head, rest) = bytes.split_at(8);
    *bytes = rest;
    Ok(i64::from_le_bytes(head.try_into().unwrap()))
}
