use webdex_core::config::TokenizerConfig;
use webdex_core::tokenizer::Tokenizer;

#[test]
fn it_normalizes_and_stems() {
    let config = TokenizerConfig { stem: true, ..Default::default() };
    let toks = Tokenizer::new(&config).unwrap().tokenize("Running Runners RUN! The café menu.");
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    assert!(words.contains(&"menu".to_string()));
}

#[test]
fn it_filters_short_long_and_numeric() {
    let toks = Tokenizer::new(&TokenizerConfig::default())
        .unwrap()
        .tokenize("A 1999 report on extraordinary findings, vol 2");
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    assert_eq!(words, vec!["report", "on", "findings", "vol"]);
}

#[test]
fn admission_is_deterministic() {
    let t = Tokenizer::new(&TokenizerConfig::default()).unwrap();
    for raw in ["Cat", "x", "12345", "monumental", "mat,", ""] {
        let first = t.admit(raw);
        for _ in 0..5 {
            assert_eq!(t.admit(raw), first);
        }
    }
}

#[test]
fn positions_follow_the_unfiltered_sequence() {
    let toks = Tokenizer::new(&TokenizerConfig::default())
        .unwrap()
        .tokenize("the cat sat on the mat");
    assert_eq!(
        toks,
        vec![
            ("the".to_string(), 0),
            ("cat".to_string(), 1),
            ("sat".to_string(), 2),
            ("on".to_string(), 3),
            ("the".to_string(), 4),
            ("mat".to_string(), 5),
        ]
    );
}
