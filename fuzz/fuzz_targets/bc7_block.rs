#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: [u8; 16]| {
    // Decoding must never panic and must be a pure function of the block.
    let first = bptc_rs::bc7::decode_block(&data);
    let second = bptc_rs::bc7::decode_block(&data);
    assert_eq!(first.is_ok(), second.is_ok());
    if let (Ok(first), Ok(second)) = (first, second) {
        assert_eq!(first, second);
    }
});
