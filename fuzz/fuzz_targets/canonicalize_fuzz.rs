#![no_main]
use libfuzzer_sys::fuzz_target;
use stepwise::error::CanonError;
use stepwise::grammar::canonical_violations;
use stepwise::info::ParserInfos;
use stepwise::testing::{GeneratorConfig, language, random_grammar};
use stepwise::transform::{CanonicalizeConfig, Canonicalizer, discover};

fuzz_target!(|data: &[u8]| {
    if data.len() < 10 {
        return;
    }
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&data[..8]);
    let config = GeneratorConfig {
        variables: 2 + usize::from(data[8] % 10),
        terminals: 1 + usize::from(data[9] % 4),
        ..GeneratorConfig::default()
    }
    .with_seed(u64::from_le_bytes(seed));

    let Ok(grammar) = random_grammar(&config) else {
        return;
    };
    let infos = ParserInfos::full_for(&grammar);
    let canonicalizer =
        Canonicalizer::new(CanonicalizeConfig::default().with_max_iterations(Some(1_000)));
    let canonical = match canonicalizer.canonicalize(&grammar, &infos) {
        Ok(canonical) => canonical,
        Err(CanonError::Unsupported(_) | CanonError::IterationLimit(_)) => return,
        Err(err) => panic!("canonicalization failed: {err}\n{grammar}"),
    };

    assert!(canonical_violations(&canonical.grammar).is_empty());
    assert_eq!(discover(&canonical.grammar, false), Ok(None));
    if let Some(before) = language(&grammar, 500) {
        assert_eq!(language(&canonical.grammar, 2_000), Some(before));
    }
});
