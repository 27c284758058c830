use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};

/// Attribute header: length (2) + type (2) = 4 bytes.
pub const NLA_HDRLEN: usize = 4;

/// Attributes start on 4-byte boundaries.
pub const NLA_ALIGNTO: usize = 4;

/// Type flag: the value is itself an attribute stream.
pub const NLA_F_NESTED: u16 = 0x8000;

/// Type flag: the value is in network byte order.
pub const NLA_F_NET_BYTEORDER: u16 = 0x4000;

/// Mask selecting the attribute type from the raw type field.
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

/// Round `len` up to the attribute alignment.
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// One attribute borrowed from an attribute stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute type with flag bits masked off.
    pub kind: u16,
    /// Whether `NLA_F_NESTED` was set.
    pub nested: bool,
    /// The value bytes, without header or padding.
    pub payload: &'a [u8],
}

impl<'a> Attribute<'a> {
    pub fn u8(&self) -> Result<u8> {
        Ok(self.fixed::<1>()?[0])
    }

    pub fn u16(&self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.fixed()?))
    }

    pub fn u32(&self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.fixed()?))
    }

    pub fn u64(&self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.fixed()?))
    }

    /// Interpret the value as a string, stopping at the first NUL.
    pub fn string(&self) -> Result<&'a str> {
        let bytes = match self.payload.iter().position(|&b| b == 0) {
            Some(end) => &self.payload[..end],
            None => self.payload,
        };
        std::str::from_utf8(bytes).map_err(|_| WireError::InvalidString { kind: self.kind })
    }

    /// Decode the value as a nested attribute stream.
    pub fn nested(&self) -> AttributeDecoder<'a> {
        AttributeDecoder::new(self.payload)
    }

    fn fixed<const N: usize>(&self) -> Result<[u8; N]> {
        self.payload
            .try_into()
            .map_err(|_| WireError::InvalidWidth {
                kind: self.kind,
                expected: N,
                actual: self.payload.len(),
            })
    }
}

/// Walks an attribute stream front to back.
///
/// Yields `Err` at most once; after a malformed attribute the iterator is
/// exhausted, since nothing after a bad length prefix can be trusted.
#[derive(Debug, Clone)]
pub struct AttributeDecoder<'a> {
    buf: &'a [u8],
    failed: bool,
}

impl<'a> AttributeDecoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, failed: false }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }
}

impl<'a> Iterator for AttributeDecoder<'a> {
    type Item = Result<Attribute<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.buf.is_empty() {
            return None;
        }

        match split_attribute(self.buf) {
            Ok((attr, rest)) => {
                self.buf = rest;
                Some(Ok(attr))
            }
            Err(err) => {
                self.failed = true;
                self.buf = &[];
                Some(Err(err))
            }
        }
    }
}

fn split_attribute(buf: &[u8]) -> Result<(Attribute<'_>, &[u8])> {
    if buf.len() < NLA_HDRLEN {
        return Err(WireError::Truncated {
            what: "attribute header",
            needed: NLA_HDRLEN,
            available: buf.len(),
        });
    }

    let len = usize::from(u16::from_le_bytes([buf[0], buf[1]]));
    let raw_kind = u16::from_le_bytes([buf[2], buf[3]]);

    if len < NLA_HDRLEN {
        return Err(WireError::InvalidLength {
            what: "attribute",
            len,
        });
    }
    if len > buf.len() {
        return Err(WireError::Truncated {
            what: "attribute",
            needed: len,
            available: buf.len(),
        });
    }

    let attr = Attribute {
        kind: raw_kind & NLA_TYPE_MASK,
        nested: raw_kind & NLA_F_NESTED != 0,
        payload: &buf[NLA_HDRLEN..len],
    };
    // The final attribute may arrive without trailing padding.
    let next = nla_align(len).min(buf.len());

    Ok((attr, &buf[next..]))
}

/// Encode one attribute into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬────────────┬──────────────────┬─────────────┐
/// │ Length     │ Type       │ Value            │ Padding     │
/// │ (2B LE)    │ (2B LE)    │ (Length - 4 B)   │ (to 4B)     │
/// └────────────┴────────────┴──────────────────┴─────────────┘
/// ```
pub fn encode_attribute(kind: u16, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = NLA_HDRLEN + payload.len();
    if len > usize::from(u16::MAX) {
        return Err(WireError::TooLarge {
            what: "attribute",
            size: len,
            max: usize::from(u16::MAX),
        });
    }

    let padded = nla_align(len);
    dst.reserve(padded);
    dst.put_u16_le(len as u16);
    dst.put_u16_le(kind);
    dst.put_slice(payload);
    dst.put_bytes(0, padded - len);
    Ok(())
}

/// Builds an attribute stream.
#[derive(Debug, Default, Clone)]
pub struct AttributeEncoder {
    buf: BytesMut,
}

impl AttributeEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u8(&mut self, kind: u16, value: u8) -> &mut Self {
        self.put_fixed(kind, &[value])
    }

    pub fn put_u16(&mut self, kind: u16, value: u16) -> &mut Self {
        self.put_fixed(kind, &value.to_le_bytes())
    }

    pub fn put_u32(&mut self, kind: u16, value: u32) -> &mut Self {
        self.put_fixed(kind, &value.to_le_bytes())
    }

    pub fn put_u64(&mut self, kind: u16, value: u64) -> &mut Self {
        self.put_fixed(kind, &value.to_le_bytes())
    }

    /// Append a NUL-terminated string attribute.
    pub fn put_string(&mut self, kind: u16, value: &str) -> Result<&mut Self> {
        let mut payload = Vec::with_capacity(value.len() + 1);
        payload.extend_from_slice(value.as_bytes());
        payload.push(0);
        self.put_bytes(kind, &payload)
    }

    /// Append an attribute with an arbitrary value.
    pub fn put_bytes(&mut self, kind: u16, payload: &[u8]) -> Result<&mut Self> {
        encode_attribute(kind, payload, &mut self.buf)?;
        Ok(self)
    }

    /// Append a nested attribute whose value is built by `build`.
    pub fn put_nested<F>(&mut self, kind: u16, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut AttributeEncoder) -> Result<()>,
    {
        let mut inner = AttributeEncoder::new();
        build(&mut inner)?;
        encode_attribute(kind | NLA_F_NESTED, &inner.buf, &mut self.buf)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish the stream.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    fn put_fixed(&mut self, kind: u16, payload: &[u8]) -> &mut Self {
        // At most 8 value bytes; cannot overflow the length prefix.
        let len = NLA_HDRLEN + payload.len();
        let padded = nla_align(len);
        self.buf.reserve(padded);
        self.buf.put_u16_le(len as u16);
        self.buf.put_u16_le(kind);
        self.buf.put_slice(payload);
        self.buf.put_bytes(0, padded - len);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_fixed_width_values() {
        let mut enc = AttributeEncoder::new();
        enc.put_u8(1, 7).put_u16(2, 513).put_u32(3, 70_000).put_u64(4, u64::MAX - 1);
        let bytes = enc.finish();

        let attrs: Vec<_> = AttributeDecoder::new(&bytes)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(attrs.len(), 4);
        assert_eq!(attrs[0].u8().unwrap(), 7);
        assert_eq!(attrs[1].u16().unwrap(), 513);
        assert_eq!(attrs[2].u32().unwrap(), 70_000);
        assert_eq!(attrs[3].u64().unwrap(), u64::MAX - 1);
    }

    #[test]
    fn encoder_pads_to_four_bytes() {
        let mut enc = AttributeEncoder::new();
        enc.put_u8(1, 0xAA);
        let bytes = enc.finish();

        assert_eq!(bytes.as_ref(), &[5, 0, 1, 0, 0xAA, 0, 0, 0]);
    }

    #[test]
    fn little_endian_layout() {
        let mut enc = AttributeEncoder::new();
        enc.put_u32(3, 1);
        assert_eq!(enc.finish().as_ref(), &[8, 0, 3, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn string_attribute_strips_nul() {
        let mut enc = AttributeEncoder::new();
        enc.put_string(2, "VFS_DQUOT").unwrap();
        let bytes = enc.finish();

        let attr = AttributeDecoder::new(&bytes).next().unwrap().unwrap();
        assert_eq!(attr.kind, 2);
        assert_eq!(attr.payload.len(), "VFS_DQUOT".len() + 1);
        assert_eq!(attr.string().unwrap(), "VFS_DQUOT");
    }

    #[test]
    fn invalid_utf8_string_rejected() {
        let mut enc = AttributeEncoder::new();
        enc.put_bytes(2, &[0xFF, 0xFE, 0x00]).unwrap();
        let bytes = enc.finish();

        let attr = AttributeDecoder::new(&bytes).next().unwrap().unwrap();
        assert_eq!(attr.string(), Err(WireError::InvalidString { kind: 2 }));
    }

    #[test]
    fn nested_attributes() {
        let mut enc = AttributeEncoder::new();
        enc.put_nested(7, |groups| {
            groups.put_nested(1, |group| {
                group.put_u32(2, 21);
                group.put_string(1, "events")?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        let bytes = enc.finish();

        let outer = AttributeDecoder::new(&bytes).next().unwrap().unwrap();
        assert_eq!(outer.kind, 7);
        assert!(outer.nested);

        let group = outer.nested().next().unwrap().unwrap();
        assert_eq!(group.kind, 1);
        assert!(group.nested);

        let fields: Vec<_> = group.nested().collect::<Result<_>>().unwrap();
        assert_eq!(fields[0].u32().unwrap(), 21);
        assert_eq!(fields[1].string().unwrap(), "events");
    }

    #[test]
    fn width_mismatch_is_error() {
        let mut enc = AttributeEncoder::new();
        enc.put_u32(2, 1);
        let bytes = enc.finish();

        let attr = AttributeDecoder::new(&bytes).next().unwrap().unwrap();
        assert_eq!(
            attr.u64(),
            Err(WireError::InvalidWidth {
                kind: 2,
                expected: 8,
                actual: 4
            })
        );
    }

    #[test]
    fn truncated_header() {
        let mut dec = AttributeDecoder::new(&[8, 0, 1]);
        assert!(matches!(
            dec.next(),
            Some(Err(WireError::Truncated { needed: 4, available: 3, .. }))
        ));
        assert!(dec.next().is_none());
    }

    #[test]
    fn declared_length_exceeds_buffer() {
        let bytes = [12, 0, 1, 0, 1, 0, 0, 0];
        let mut dec = AttributeDecoder::new(&bytes);
        assert!(matches!(
            dec.next(),
            Some(Err(WireError::Truncated { needed: 12, available: 8, .. }))
        ));
        assert!(dec.next().is_none());
    }

    #[test]
    fn length_below_header_is_invalid() {
        let bytes = [2, 0, 1, 0, 0, 0, 0, 0];
        let mut dec = AttributeDecoder::new(&bytes);
        assert!(matches!(
            dec.next(),
            Some(Err(WireError::InvalidLength { len: 2, .. }))
        ));
    }

    #[test]
    fn error_stops_iteration_after_good_attributes() {
        let mut enc = AttributeEncoder::new();
        enc.put_u32(1, 5);
        let mut bytes = enc.finish().to_vec();
        bytes.extend_from_slice(&[40, 0, 2, 0]);

        let results: Vec<_> = AttributeDecoder::new(&bytes).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn final_attribute_without_padding() {
        let bytes = [5, 0, 9, 0, 0x42];
        let attr = AttributeDecoder::new(&bytes).next().unwrap().unwrap();
        assert_eq!(attr.kind, 9);
        assert_eq!(attr.u8().unwrap(), 0x42);
    }

    #[test]
    fn type_flags_masked() {
        let bytes = [4, 0, 0x03, 0xC0];
        let attr = AttributeDecoder::new(&bytes).next().unwrap().unwrap();
        assert_eq!(attr.kind, 3);
        assert!(attr.nested);
        assert!(attr.payload.is_empty());
    }

    #[test]
    fn oversized_attribute_rejected() {
        let payload = vec![0u8; usize::from(u16::MAX)];
        let mut dst = BytesMut::new();
        let err = encode_attribute(1, &payload, &mut dst).unwrap_err();
        assert!(matches!(err, WireError::TooLarge { .. }));
        assert!(dst.is_empty());
    }

    #[test]
    fn empty_stream_yields_nothing() {
        assert!(AttributeDecoder::new(&[]).next().is_none());
    }
}
