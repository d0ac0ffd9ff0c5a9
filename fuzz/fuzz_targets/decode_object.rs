#![no_main]

use libfuzzer_sys::fuzz_target;
use rpkival_lib::object::{Decoder, DerDecoder};

fuzz_target!(|data: &[u8]| {
    // Decoders must reject malformed input with an error, never panic.
    let dec = DerDecoder;
    if let Ok(cert) = dec.cert(data) {
        let _ = serde_json::to_string(&cert);
    }
    let _ = dec.crl(data);
    let _ = dec.mft(data);
    let _ = dec.roa(data);
    let _ = dec.gbr(data);
});
