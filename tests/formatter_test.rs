use std::path::Path;

use loxpad::{
    driver::DriverError,
    formatter::{BasicFormatter, ErrorFormatter, PrettyFormatter},
    session::{LoxSession, RuntimeSession},
};

fn syntax_error(source: &str) -> DriverError {
    LoxSession::new()
        .compile(source)
        .expect_err("Source should not compile")
        .into()
}

#[test]
fn test_basic_formatter_is_one_line() {
    let error = syntax_error("fun (;");
    assert_eq!(BasicFormatter.format_error(&error), error.to_string());
    assert!(error.to_string().starts_with("[line 1] SyntaxError: "));
}

#[test]
fn test_pretty_formatter_names_code_and_file() {
    let source = "print 1;\nfun (;";
    let error = syntax_error(source);
    let report = PrettyFormatter::new(source, Path::new("demo.lox"))
        .with_color(false)
        .format_error(&error);
    assert!(report.contains("PA001"), "{report}");
    assert!(report.contains("Syntax error"), "{report}");
    assert!(report.contains("demo.lox"), "{report}");
}

#[test]
fn test_pretty_formatter_handles_end_of_input() {
    let source = "var x = (";
    let error = syntax_error(source);
    let report = PrettyFormatter::new(source, Path::new("demo.lox"))
        .with_color(false)
        .format_error(&error);
    assert!(report.contains("Incomplete statement"), "{report}");
}

#[test]
fn test_not_ready_has_no_source() {
    let report = PrettyFormatter::new("", Path::new("demo.lox"))
        .with_color(false)
        .format_error(&DriverError::NotReady);
    assert_eq!(report, DriverError::NotReady.to_string());
}
