#![no_main]
use libfuzzer_sys::fuzz_target;
use texloom_log::{ParseOptions, parse};

fuzz_target!(|data: &[u8]| {
    // Lossy conversion keeps inputs that are "almost" text in play.
    let s = String::from_utf8_lossy(data);
    let _ = parse(&s, ParseOptions::default());
    let _ = parse(&s, ParseOptions::default().ignore_duplicates(true));
});
