#![no_main]
use libfuzzer_sys::fuzz_target;
use stepwise::grammar::parse_grammar;

// Arbitrary text must either fail to parse or round-trip through Display,
// and canonicalizing a parsed grammar must never panic.
fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(grammar) = parse_grammar(src) else {
        return;
    };
    let text = grammar.to_string();
    let reparsed = parse_grammar(&text).expect("Display output must parse");
    assert_eq!(reparsed.to_string(), text);

    let _ = stepwise::canonicalize(&grammar);
});
