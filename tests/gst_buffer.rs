//! Metadata carried on real GStreamer buffers

#![cfg(feature = "gstreamer-pipeline")]

use std::sync::Arc;

use framemeta::meta::{MetaError, MetadataCodec, RegionList, Value};
use framemeta::pipeline::{self, MetadataAttacher, MetadataInspector};
use gstreamer as gst;

fn frame(size: usize) -> gst::Buffer {
    pipeline::init().unwrap();
    gst::Buffer::with_size(size).unwrap()
}

#[test]
fn appended_memory_round_trips() {
    let codec = MetadataCodec::new("if").unwrap();
    let mut buffer = frame(640 * 480 * 3);
    let pixel_size = buffer.size();

    let len = codec
        .append(buffer.get_mut().unwrap(), &[Value::I32(42), Value::F32(3.14)])
        .unwrap();

    assert_eq!(len, codec.chunk_len());
    assert_eq!(buffer.n_memory(), 2);
    assert_eq!(buffer.size(), pixel_size + len);
    assert_eq!(buffer.region_count(), 2);

    let values = codec.decode(&*buffer).unwrap();
    assert_eq!(values, vec![Value::I32(42), Value::F32(3.14)]);

    // reading does not consume anything
    assert_eq!(codec.decode(&*buffer).unwrap(), values);
    assert_eq!(buffer.n_memory(), 2);
}

#[test]
fn single_memory_buffer_has_no_metadata() {
    let codec = MetadataCodec::new("if").unwrap();
    let buffer = frame(64);

    assert_eq!(
        codec.decode(&*buffer),
        Err(MetaError::NoMetadataChunk { count: 1 })
    );
}

#[test]
fn attacher_and_inspector_agree() {
    let codec = Arc::new(MetadataCodec::new("if").unwrap());
    let attacher = MetadataAttacher::new(codec.clone(), 0.25).unwrap();
    let inspector = MetadataInspector::new(codec);

    for n in 1..=5 {
        let mut buffer = frame(128);
        attacher.attach(buffer.make_mut()).unwrap();
        let values = inspector.inspect(&buffer).unwrap();
        assert_eq!(values, vec![Value::I32(n), Value::F32(0.25)]);
    }

    let stats = inspector.stats();
    assert_eq!(stats.decoded, 5);
    assert_eq!(stats.failed, 0);
}
