#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate tape_core;

fuzz_target!(|data: &[u8]| {
    if let Ok((header, payload)) = tape_core::Header::parse(data) {
        assert!(header.encoded_len() + payload.len() <= data.len());
        let _ = header.check_extents(payload);

        // Whatever parsed must serialize back to the same prefix
        let bytes = header.to_bytes().unwrap();
        assert_eq!(&data[..bytes.len()], &bytes[..]);
    }
});
