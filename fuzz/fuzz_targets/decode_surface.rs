#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (bptc_rs::BptcFormat, u8, u8, &[u8])| {
    let (format, width, height, data) = input;

    // Small surfaces exercise the partial block clipping paths.
    let _result = bptc_rs::rgba8_from_bptc(width as u32, height as u32, data, format);
});
