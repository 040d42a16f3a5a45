#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate tape;

fuzz_target!(|data: &[u8]| {
    // Built without `compress`: only method 0 decodes, others stop at
    // UnsupportedMethod
    let _ = tape::Container::from_bytes(data, None);
    let _ = tape::Container::from_bytes(data, Some("password"));
    let _ = tape::list(data);
});
