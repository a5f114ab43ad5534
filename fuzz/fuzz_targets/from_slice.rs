#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate rootwalk;

fuzz_target!(|data: &[u8]| {
    if let Ok(m) = rootwalk::Message::from_slice(data) {
        // Anything that parses must also display.
        let _ = m.to_string();
    }
});
