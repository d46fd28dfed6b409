use texloom_log::{Diagnostic, Level, ParseOptions, ProcessedLog, parse};

#[test]
fn test_undefined_control_sequence_end_to_end() {
    let log = parse(
        "! Undefined control sequence.\nl.12 \\foo",
        ParseOptions::default().ignore_duplicates(true),
    );

    assert_eq!(log.errors.len(), 1);
    assert!(log.warnings.is_empty());
    assert!(log.typesetting.is_empty());
    assert_eq!(log.errors[0].line, Some(12));
    assert_eq!(log.errors[0].message, "Undefined control sequence.");
}

#[test]
fn test_serialized_shape() {
    let log = parse(
        "(./a.tex\n! Missing $ inserted.\nl.3 x^2\n)",
        ParseOptions::default(),
    );
    let value = serde_json::to_value(&log).unwrap();

    assert_eq!(value["errors"][0]["level"], "error");
    assert_eq!(value["errors"][0]["line"], 3);
    assert_eq!(value["errors"][0]["file"], "./a.tex");
    assert!(value["warnings"].as_array().unwrap().is_empty());

    let back: ProcessedLog = serde_json::from_value(value).unwrap();
    assert_eq!(back, log);
}

#[test]
fn test_missing_line_and_file_are_omitted() {
    let log = parse("LaTeX Warning: Unused global option(s).", ParseOptions::default());
    let value = serde_json::to_value(&log.warnings[0]).unwrap();
    assert!(value.get("line").is_none());
    assert!(value.get("file").is_none());

    let back: Diagnostic = serde_json::from_value(value).unwrap();
    assert_eq!(back.level, Level::Warning);
    assert_eq!(back.line, None);
}

#[test]
fn test_markers_interleaved_across_groups_keep_relative_order() {
    let mut input = String::new();
    for i in 1..=20 {
        if i % 2 == 0 {
            input.push_str(&format!("! Error number {i}.\nl.{i} x\n"));
        } else {
            input.push_str(&format!("LaTeX Warning: Warning number {i} on input line {i}.\n"));
        }
    }
    let log = parse(&input, ParseOptions::default());

    let error_lines: Vec<_> = log.errors.iter().filter_map(|d| d.line).collect();
    let warning_lines: Vec<_> = log.warnings.iter().filter_map(|d| d.line).collect();
    assert_eq!(error_lines, (1..=20).filter(|i| i % 2 == 0).collect::<Vec<u32>>());
    assert_eq!(warning_lines, (1..=20).filter(|i| i % 2 == 1).collect::<Vec<u32>>());
}
