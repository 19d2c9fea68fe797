use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shroud_core::{
    accept_request, dispatch_request, JsonCodec, KeyConfig, Request, StandardProfile,
};

fn bench_roundtrip(c: &mut Criterion) {
    let profile = StandardProfile::with_memory_replay(KeyConfig::from_root(&[0x11; 32]));
    let payload = vec![0xA5u8; 1024];

    c.bench_function("dispatch_request_1k", |b| {
        b.iter(|| {
            let request = Request::new(black_box(payload.clone()));
            dispatch_request(&profile, &JsonCodec, request).unwrap()
        })
    });

    c.bench_function("dispatch_accept_roundtrip_1k", |b| {
        b.iter(|| {
            let request = Request::new(black_box(payload.clone()));
            let outbound = dispatch_request(&profile, &JsonCodec, request).unwrap();
            accept_request(&profile, &JsonCodec, outbound.package).unwrap()
        })
    });
}

criterion_group!(benches, bench_roundtrip);
criterion_main!(benches);
