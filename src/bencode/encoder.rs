use super::value::Value;
use std::collections::BTreeMap;

pub trait BencodeEncode {
    fn bencode(&self, buf: &mut Vec<u8>);
}

impl BencodeEncode for i64 {
    fn bencode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(b"i");

        let mut buffer = itoa::Buffer::new();
        buf.extend_from_slice(buffer.format(*self).as_bytes());
        buf.extend_from_slice(b"e");
    }
}

impl BencodeEncode for &[u8] {
    fn bencode(&self, buf: &mut Vec<u8>) {
        let mut buffer = itoa::Buffer::new();
        buf.extend_from_slice(buffer.format(self.len()).as_bytes());
        buf.extend_from_slice(b":");
        buf.extend_from_slice(self);
    }
}

impl BencodeEncode for &str {
    fn bencode(&self, buf: &mut Vec<u8>) {
        self.as_bytes().bencode(buf);
    }
}

impl BencodeEncode for Vec<u8> {
    fn bencode(&self, buf: &mut Vec<u8>) {
        self.as_slice().bencode(buf);
    }
}

/// Dictionaries are emitted in key order, which `BTreeMap` already guarantees.
impl BencodeEncode for BTreeMap<Vec<u8>, Value> {
    fn bencode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(b"d");
        for (key, value) in self {
            key.bencode(buf);
            value.bencode(buf);
        }
        buf.extend_from_slice(b"e");
    }
}

impl BencodeEncode for Value {
    fn bencode(&self, buf: &mut Vec<u8>) {
        match self {
            Value::Int(n) => n.bencode(buf),
            Value::Bytes(bytes) => bytes.bencode(buf),
            Value::List(items) => encode_list(items, buf),
            Value::Dict(dict) => dict.bencode(buf),
        }
    }
}

pub fn encode_list<T: BencodeEncode>(items: &[T], buf: &mut Vec<u8>) {
    buf.extend_from_slice(b"l");
    for item in items {
        item.bencode(buf);
    }
    buf.extend_from_slice(b"e");
}

/// Serialize a value tree into a fresh buffer
pub fn to_bytes(value: &Value) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    value.bencode(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_integer() {
        let mut buf = Vec::new();
        42i64.bencode(&mut buf);
        assert_eq!(buf, b"i42e");

        let mut buf = Vec::new();
        (-42i64).bencode(&mut buf);
        assert_eq!(buf, b"i-42e");

        let mut buf = Vec::new();
        0i64.bencode(&mut buf);
        assert_eq!(buf, b"i0e");
    }

    #[test]
    fn test_encode_bytes() {
        let mut buf = Vec::new();
        b"hello".as_slice().bencode(&mut buf);
        assert_eq!(buf, b"5:hello");

        let mut buf = Vec::new();
        b"".as_slice().bencode(&mut buf);
        assert_eq!(buf, b"0:");
    }

    #[test]
    fn test_encode_list() {
        let mut buf = Vec::new();
        encode_list(&[1i64, 2i64, 3i64], &mut buf);
        assert_eq!(buf, b"li1ei2ei3ee");
    }

    #[test]
    fn test_encode_dict_sorts_keys() {
        let mut dict = BTreeMap::new();
        dict.insert(b"foo".to_vec(), Value::Int(42));
        dict.insert(b"bar".to_vec(), Value::Int(100));

        assert_eq!(to_bytes(&Value::Dict(dict)), b"d3:bari100e3:fooi42ee");
    }

    #[test]
    fn test_encode_nested_value() {
        let mut info = BTreeMap::new();
        info.insert(b"name".to_vec(), Value::from("a.txt"));
        info.insert(b"length".to_vec(), Value::Int(3));

        let mut root = BTreeMap::new();
        root.insert(b"info".to_vec(), Value::Dict(info));
        root.insert(
            b"url-list".to_vec(),
            Value::List(vec![Value::from("http://a"), Value::from("http://b")]),
        );

        assert_eq!(
            to_bytes(&Value::Dict(root)),
            b"d4:infod6:lengthi3e4:name5:a.txte8:url-listl8:http://a8:http://bee".to_vec()
        );
    }
}
