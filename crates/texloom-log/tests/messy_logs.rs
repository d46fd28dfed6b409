use texloom_log::{Level, ParseOptions, parse};

fn noise() -> texloom_log::ProcessedLog {
    let input = include_str!("fixtures/latexmk_noise.txt");
    parse(input, ParseOptions::default().ignore_duplicates(true))
}

#[test]
fn test_latexmk_noise_error() {
    let log = noise();
    assert_eq!(log.errors.len(), 1, "{:#?}", log.errors);

    let error = &log.errors[0];
    assert_eq!(error.message, "Undefined control sequence.");
    assert_eq!(error.line, Some(14));
    assert_eq!(error.file.as_deref(), Some("./chapter1.tex"));
    assert!(error.content.contains("{R}"));
}

#[test]
fn test_latexmk_noise_warnings() {
    let log = noise();
    let summary: Vec<_> = log
        .warnings
        .iter()
        .map(|w| (w.file.as_deref(), w.line))
        .collect();
    assert_eq!(
        summary,
        [
            (Some("./chapter2.tex"), Some(9)),
            (Some("./main.tex"), None),
            (Some("./main.tex"), None),
        ]
    );
    assert!(log.warnings[1].message.contains("or use package `bookmark'."));
}

#[test]
fn test_latexmk_noise_typesetting() {
    let log = noise();
    assert_eq!(log.typesetting.len(), 1);
    let badbox = &log.typesetting[0];
    assert_eq!(badbox.level, Level::Typesetting);
    assert_eq!(badbox.line, Some(20));
    assert_eq!(badbox.file.as_deref(), Some("./chapter2.tex"));
}

#[test]
fn test_latexmk_info_is_not_a_file() {
    // `(Info)` and `(preloaded format=pdflatex)` must not be taken for files,
    // otherwise every diagnostic would be attributed to them.
    let log = noise();
    for diagnostic in log.errors.iter().chain(&log.warnings).chain(&log.typesetting) {
        let file = diagnostic.file.as_deref().unwrap_or_default();
        assert!(file.ends_with(".tex"), "unexpected file {file:?}");
    }
}
