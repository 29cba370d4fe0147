use bytes::{Buf, BufMut, BytesMut};
use tracing::trace;

use super::chunk::{EncodedChunk, DESCRIPTOR_LEN_SIZE, HEADER_LEN, SIGNATURE};
use super::error::MetaError;
use super::format::{FieldKind, FormatSpec};
use super::regions::{RegionList, RegionListMut};
use super::value::Value;

/// Encoder/decoder for one metadata channel
///
/// Built once from a format descriptor and then shared by every producer and
/// reader on that channel. Holds no mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataCodec {
    spec: FormatSpec,
    chunk_len: usize,
}

impl MetadataCodec {
    pub fn new(descriptor: &str) -> Result<Self, MetaError> {
        if u32::try_from(descriptor.len()).is_err() {
            return Err(MetaError::InvalidFormatSpec {
                descriptor: descriptor.to_owned(),
                reason: "descriptor longer than a 32-bit length allows".into(),
            });
        }
        let spec = FormatSpec::parse(descriptor)?;
        let chunk_len = HEADER_LEN + spec.descriptor().len() + spec.payload_len();

        Ok(Self { spec, chunk_len })
    }

    pub fn descriptor(&self) -> &str {
        self.spec.descriptor()
    }

    pub fn fields(&self) -> &[FieldKind] {
        self.spec.fields()
    }

    /// Width of the packed values
    pub fn payload_len(&self) -> usize {
        self.spec.payload_len()
    }

    /// Length of every chunk this codec produces
    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    /// Pack `values` into a new chunk
    pub fn encode(&self, values: &[Value]) -> Result<EncodedChunk, MetaError> {
        self.check_values(values)?;

        let descriptor = self.spec.descriptor().as_bytes();
        let mut buf = BytesMut::with_capacity(self.chunk_len);
        buf.put_slice(SIGNATURE);
        buf.put_u32_le(descriptor.len() as u32);
        buf.put_slice(descriptor);
        for value in values {
            value.put(&mut buf);
        }
        debug_assert_eq!(buf.len(), self.chunk_len);

        Ok(EncodedChunk::new(buf.freeze()))
    }

    /// Encode `values` and append the chunk as the last region of `regions`
    pub fn append<R>(&self, regions: &mut R, values: &[Value]) -> Result<usize, MetaError>
    where
        R: RegionListMut + ?Sized,
    {
        let chunk = self.encode(values)?;
        let len = chunk.len();
        regions.append_region(chunk);
        trace!(len, descriptor = self.descriptor(), "metadata chunk appended");
        Ok(len)
    }

    /// Read the values back out of the last region of `regions`
    pub fn decode<R>(&self, regions: &R) -> Result<Vec<Value>, MetaError>
    where
        R: RegionList + ?Sized,
    {
        let count = regions.region_count();
        if count < 2 {
            return Err(MetaError::NoMetadataChunk { count });
        }

        let data = regions.read_region(count - 1)?;
        self.decode_chunk(&data)
    }

    /// Validate and unpack a standalone chunk
    pub fn decode_chunk(&self, data: &[u8]) -> Result<Vec<Value>, MetaError> {
        if !data.starts_with(SIGNATURE) {
            let actual = &data[..data.len().min(SIGNATURE.len())];
            return Err(MetaError::SignatureMismatch {
                expected: SIGNATURE.to_vec(),
                actual: actual.to_vec(),
            });
        }
        let mut rest = &data[SIGNATURE.len()..];

        if rest.len() < DESCRIPTOR_LEN_SIZE {
            return Err(MetaError::MalformedDescriptor {
                reason: format!(
                    "length field needs {DESCRIPTOR_LEN_SIZE} bytes, only {} left",
                    rest.len()
                ),
            });
        }
        let descriptor_len = rest.get_u32_le() as usize;
        if descriptor_len > rest.len() {
            return Err(MetaError::MalformedDescriptor {
                reason: format!(
                    "declared length {descriptor_len} exceeds the {} bytes left",
                    rest.len()
                ),
            });
        }

        let (descriptor, payload) = rest.split_at(descriptor_len);
        let descriptor =
            std::str::from_utf8(descriptor).map_err(|e| MetaError::MalformedDescriptor {
                reason: format!("descriptor is not valid UTF-8: {e}"),
            })?;

        if descriptor != self.spec.descriptor() {
            return Err(MetaError::FormatMismatch {
                expected: self.spec.descriptor().to_owned(),
                actual: descriptor.to_owned(),
            });
        }

        if payload.len() != self.spec.payload_len() {
            return Err(MetaError::TruncatedPayload {
                expected: self.spec.payload_len(),
                actual: payload.len(),
            });
        }

        let mut payload = payload;
        let values = self
            .spec
            .fields()
            .iter()
            .map(|&kind| Value::get(kind, &mut payload))
            .collect();

        Ok(values)
    }

    fn check_values(&self, values: &[Value]) -> Result<(), MetaError> {
        let fields = self.spec.fields();

        for (position, (field, value)) in fields.iter().zip(values).enumerate() {
            if value.kind() != *field {
                return Err(MetaError::ValuePack {
                    position,
                    reason: format!("expected {field}, got {} ({value})", value.kind()),
                });
            }
        }

        if values.len() != fields.len() {
            return Err(MetaError::ValuePack {
                position: values.len().min(fields.len()),
                reason: format!(
                    "descriptor {:?} takes {} values, got {}",
                    self.spec.descriptor(),
                    fields.len(),
                    values.len()
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn frame_codec() -> MetadataCodec {
        MetadataCodec::new("if").unwrap()
    }

    fn with_pixels(chunk: EncodedChunk) -> Vec<Bytes> {
        vec![Bytes::from_static(&[0u8; 16]), chunk.into_bytes()]
    }

    #[test]
    fn test_encode_layout() {
        let codec = frame_codec();
        let chunk = codec.encode(&[42i32.into(), 3.14f32.into()]).unwrap();

        assert_eq!(chunk.len(), codec.chunk_len());
        assert_eq!(chunk.len(), 11 + 4 + 2 + 8);
        assert_eq!(&chunk[..11], b"CUSTOM-META");
        assert_eq!(&chunk[11..15], &2u32.to_le_bytes());
        assert_eq!(&chunk[15..17], b"if");
        assert_eq!(&chunk[17..21], &42i32.to_le_bytes());
        assert_eq!(&chunk[21..25], &3.14f32.to_le_bytes());
    }

    #[test]
    fn test_decode_concrete_scenario() {
        let codec = frame_codec();
        let chunk = codec.encode(&[42i32.into(), 3.14f32.into()]).unwrap();
        let values = codec.decode(&with_pixels(chunk)).unwrap();

        assert_eq!(values.len(), 2);
        assert_eq!(values[0], Value::I32(42));
        let f = values[1].as_f64().unwrap();
        assert!(((f - 3.14159) / 3.14159).abs() < 1e-3);
        assert!(((f - 3.14) / 3.14).abs() < 1e-6);
    }

    #[test]
    fn test_round_trip_every_kind() {
        let codec = MetadataCodec::new("?bBhHiIqQfd").unwrap();
        let values = vec![
            Value::Bool(true),
            Value::I8(-8),
            Value::U8(200),
            Value::I16(-1600),
            Value::U16(60000),
            Value::I32(i32::MIN),
            Value::U32(u32::MAX),
            Value::I64(-1 << 40),
            Value::U64(u64::MAX - 1),
            Value::F32(-0.125),
            Value::F64(std::f64::consts::PI),
        ];
        let mut regions = vec![Bytes::from_static(b"pixels")];
        let len = codec.append(&mut regions, &values).unwrap();

        assert_eq!(len, codec.chunk_len());
        assert_eq!(regions.len(), 2);
        assert_eq!(codec.decode(&regions).unwrap(), values);
    }

    #[test]
    fn test_decode_is_idempotent() {
        let codec = frame_codec();
        let regions = with_pixels(codec.encode(&[1i32.into(), 0.5f32.into()]).unwrap());
        let first = codec.decode(&regions).unwrap();
        let second = codec.decode(&regions).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_rejects_wrong_arity() {
        let codec = frame_codec();

        let err = codec.encode(&[42i32.into()]).unwrap_err();
        assert!(matches!(err, MetaError::ValuePack { position: 1, .. }), "{err:?}");

        let err = codec
            .encode(&[42i32.into(), 1.0f32.into(), 2.0f32.into()])
            .unwrap_err();
        assert!(matches!(err, MetaError::ValuePack { position: 2, .. }), "{err:?}");

        let err = codec.encode(&[]).unwrap_err();
        assert!(matches!(err, MetaError::ValuePack { position: 0, .. }), "{err:?}");
    }

    #[test]
    fn test_encode_rejects_wrong_kind() {
        let codec = frame_codec();

        // no widening or narrowing
        let err = codec.encode(&[42i64.into(), 3.14f32.into()]).unwrap_err();
        assert!(matches!(err, MetaError::ValuePack { position: 0, .. }), "{err:?}");

        let err = codec.encode(&[42i32.into(), 3.14f64.into()]).unwrap_err();
        assert!(matches!(err, MetaError::ValuePack { position: 1, .. }), "{err:?}");
    }

    #[test]
    fn test_decode_needs_two_regions() {
        let codec = frame_codec();

        let empty: Vec<Bytes> = Vec::new();
        assert_eq!(
            codec.decode(&empty),
            Err(MetaError::NoMetadataChunk { count: 0 })
        );

        let only_pixels = vec![Bytes::from_static(&[0u8; 64])];
        assert_eq!(
            codec.decode(&only_pixels),
            Err(MetaError::NoMetadataChunk { count: 1 })
        );
    }

    #[test]
    fn test_decode_detects_corrupt_signature() {
        let codec = frame_codec();
        let mut bytes = codec
            .encode(&[42i32.into(), 3.14f32.into()])
            .unwrap()
            .to_vec();
        bytes[0] ^= 0xff;

        let err = codec.decode(&vec![vec![0u8; 4], bytes]).unwrap_err();
        match err {
            MetaError::SignatureMismatch { expected, actual } => {
                assert_eq!(expected, SIGNATURE);
                assert_eq!(actual.len(), SIGNATURE.len());
                assert_eq!(actual[0], b'C' ^ 0xff);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_decode_short_region_is_signature_mismatch() {
        let codec = frame_codec();
        let err = codec.decode_chunk(b"CUS").unwrap_err();
        assert_eq!(
            err,
            MetaError::SignatureMismatch {
                expected: SIGNATURE.to_vec(),
                actual: b"CUS".to_vec(),
            }
        );
    }

    #[test]
    fn test_decode_detects_format_skew() {
        let producer = frame_codec();
        let reader = MetadataCodec::new("ff").unwrap();
        let regions = with_pixels(producer.encode(&[42i32.into(), 3.14f32.into()]).unwrap());

        assert_eq!(
            reader.decode(&regions),
            Err(MetaError::FormatMismatch {
                expected: "ff".into(),
                actual: "if".into(),
            })
        );
    }

    #[test]
    fn test_decode_malformed_descriptor() {
        let codec = frame_codec();

        let mut missing_len = SIGNATURE.to_vec();
        missing_len.extend_from_slice(&[2, 0]);
        assert!(matches!(
            codec.decode_chunk(&missing_len),
            Err(MetaError::MalformedDescriptor { .. })
        ));

        let mut overrun = SIGNATURE.to_vec();
        overrun.extend_from_slice(&100u32.to_le_bytes());
        overrun.extend_from_slice(b"if");
        assert!(matches!(
            codec.decode_chunk(&overrun),
            Err(MetaError::MalformedDescriptor { .. })
        ));

        let mut not_utf8 = SIGNATURE.to_vec();
        not_utf8.extend_from_slice(&2u32.to_le_bytes());
        not_utf8.extend_from_slice(&[0xc3, 0x28]);
        not_utf8.extend_from_slice(&[0u8; 8]);
        assert!(matches!(
            codec.decode_chunk(&not_utf8),
            Err(MetaError::MalformedDescriptor { .. })
        ));
    }

    #[test]
    fn test_decode_payload_length_must_match() {
        let codec = frame_codec();
        let chunk = codec.encode(&[7i32.into(), 1.5f32.into()]).unwrap();

        let short = &chunk[..chunk.len() - 1];
        assert_eq!(
            codec.decode_chunk(short),
            Err(MetaError::TruncatedPayload {
                expected: 8,
                actual: 7
            })
        );

        let mut long = chunk.to_vec();
        long.push(0);
        assert_eq!(
            codec.decode_chunk(&long),
            Err(MetaError::TruncatedPayload {
                expected: 8,
                actual: 9
            })
        );
    }

    #[test]
    fn test_invalid_descriptor_fails_construction() {
        assert!(matches!(
            MetadataCodec::new("iz"),
            Err(MetaError::InvalidFormatSpec { .. })
        ));
    }

    #[test]
    fn test_codec_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MetadataCodec>();
        assert_send_sync::<EncodedChunk>();
    }
}
