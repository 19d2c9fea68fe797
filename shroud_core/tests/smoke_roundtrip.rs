use shroud_core::{
    accept_request, dispatch_request, JsonCodec, KeyConfig, Request, StandardProfile,
};

#[test]
#[ignore]
fn smoke_random_payload_roundtrip() {
    // Smoke harness: random payloads of growing size survive the full
    // dispatch/accept cycle. Run explicitly with --ignored.
    let profile = StandardProfile::with_memory_replay(KeyConfig::from_root(&[0x11; 32]));
    for round in 0..32u32 {
        let len = (round as usize + 1) * 37;
        let payload: Vec<u8> = (0..len).map(|_| rand::random::<u8>()).collect();
        let request = Request::new(payload.clone()).with_header("user", "smoke");
        let outbound = dispatch_request(&profile, &JsonCodec, request).expect("dispatch");
        let delivery = accept_request(&profile, &JsonCodec, outbound.package).expect("accept");
        assert_eq!(delivery.request().payload(), &payload[..]);
        assert!(delivery.mac_matches(&profile));
    }
}
