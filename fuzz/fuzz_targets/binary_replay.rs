#![no_main]

use libfuzzer_sys::fuzz_target;
use replay::{Replayer, ShadowTree};

// Arbitrary words must decode to an error or a tree, never a panic.
fuzz_target!(|data: &[u8]| {
    let words: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let _ = dom::decode_batch(&words);
    let mut replayer = Replayer::new(ShadowTree::new());
    let _ = replayer.apply_binary(&words);
});
