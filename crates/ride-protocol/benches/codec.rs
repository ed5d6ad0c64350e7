//! Codec benchmarks for ridecast-protocol.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ridecast_protocol::{codec, Frame};
use serde_json::json;

fn location_sample() -> Frame {
    Frame::driver_location(7, json!({"latitude": 36.7538, "longitude": 3.0588}))
}

fn bench_location_msgpack(c: &mut Criterion) {
    let frame = location_sample();
    let encoded = codec::encode(&frame).unwrap();

    let mut group = c.benchmark_group("location_msgpack");
    group.bench_function("encode", |b| b.iter(|| codec::encode(black_box(&frame))));
    group.bench_function("decode", |b| b.iter(|| codec::decode(black_box(&encoded))));
    group.finish();
}

fn bench_location_json(c: &mut Criterion) {
    let frame = location_sample();
    let text = codec::encode_json(&frame).unwrap();

    let mut group = c.benchmark_group("location_json");
    group.bench_function("encode", |b| {
        b.iter(|| codec::encode_json(black_box(&frame)))
    });
    group.bench_function("decode", |b| b.iter(|| codec::decode_json(black_box(&text))));
    group.finish();
}

fn bench_ride_event(c: &mut Criterion) {
    let frame = Frame::event(
        "user_5",
        "ride.accepted",
        json!({
            "rideId": 10,
            "status": "ACCEPTED",
            "driver": {"id": 3, "name": "Amine Haddad", "phone": "0550000000"}
        }),
    );

    c.bench_function("ride_event_roundtrip", |b| {
        b.iter(|| {
            let encoded = codec::encode(black_box(&frame)).unwrap();
            codec::decode(black_box(&encoded)).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_location_msgpack,
    bench_location_json,
    bench_ride_event
);
criterion_main!(benches);
