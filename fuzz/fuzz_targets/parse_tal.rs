#![no_main]

use libfuzzer_sys::fuzz_target;
use rpkival_lib::object::{Decoder, DerDecoder};

fuzz_target!(|data: &[u8]| {
    let _ = DerDecoder.tal("fuzz.tal", data);
});
