use color_eyre::eyre::Result;
use loxpad::{
    boundary::{is_skippable, split_units, Boundary},
    session::{LoxSession, RuntimeSession, SessionError, Value, Variables},
};

#[tokio::test]
async fn test_output_is_drained_exactly_once() -> Result<()> {
    let mut session = LoxSession::bootstrap().await?;
    session.execute("print 1; print \"two\";").await?;
    assert_eq!(session.take_output().await?, "1\ntwo\n");
    assert_eq!(session.take_output().await?, "");
    Ok(())
}

#[tokio::test]
async fn test_clear_output_drops_pending_text() -> Result<()> {
    let mut session = LoxSession::new();
    session.execute("print 1;").await?;
    session.clear_output().await?;
    session.execute("print 2;").await?;
    assert_eq!(session.take_output().await?, "2\n");
    Ok(())
}

#[tokio::test]
async fn test_variables_are_classified() -> Result<()> {
    let mut session = LoxSession::new();
    let source = r#"
        var answer = 42;
        var ratio = 2.5;
        var name = "lox";
        var flag = true;
        var nothing = nil;
        fun greet() {}
        class Point {}
        var origin = Point();
        var _hidden = 1;
    "#;
    session.execute(source).await?;

    let mut expected = Variables::new();
    expected.insert("answer".into(), Value::Int(42));
    expected.insert("ratio".into(), Value::Float(2.5));
    expected.insert("name".into(), Value::Str("lox".into()));
    expected.insert("flag".into(), Value::Bool(true));
    expected.insert("nothing".into(), Value::Null);
    expected.insert("greet".into(), Value::Tag("<class 'function'>".into()));
    expected.insert("Point".into(), Value::Tag("<class 'class'>".into()));
    expected.insert("origin".into(), Value::Tag("<class 'Point'>".into()));

    assert_eq!(session.variables().await?, expected);
    Ok(())
}

#[tokio::test]
async fn test_native_is_hidden_until_rebound() -> Result<()> {
    let mut session = LoxSession::new();
    session.execute("var now = clock;").await?;
    let variables = session.variables().await?;
    assert!(!variables.contains_key("clock"));
    assert_eq!(
        variables.get("now"),
        Some(&Value::Tag("<class 'native function'>".into()))
    );

    session.execute("var clock = 5;").await?;
    assert_eq!(session.variables().await?.get("clock"), Some(&Value::Int(5)));
    Ok(())
}

#[tokio::test]
async fn test_self_referential_initializer_is_rejected() -> Result<()> {
    let mut session = LoxSession::new();
    let error = session
        .execute("var a = 1;\n{\n  var a = a;\n}")
        .await
        .expect_err("Local initializer reads itself");
    let SessionError::Syntax(error) = error else {
        panic!("Expected a syntax error");
    };
    assert_eq!(error.code, "RA001");
    assert_eq!(error.line, 3);
    assert!(!error.incomplete);
    assert_eq!(
        error.to_string(),
        "[line 3] SyntaxError: Can't read local variable in its own initializer."
    );
    Ok(())
}

#[tokio::test]
async fn test_deep_recursion_runs() -> Result<()> {
    let mut session = LoxSession::new();
    session
        .execute("fun c(n) { if (n == 0) return 0; return 1 + c(n - 1); }\nprint c(100);")
        .await?;
    assert_eq!(session.take_output().await?, "100\n");
    Ok(())
}

#[tokio::test]
async fn test_globals_persist_across_units() -> Result<()> {
    let mut session = LoxSession::new();
    session.execute("var x = 1;").await?;
    session.execute("x = x + 41;").await?;
    assert_eq!(session.variables().await?.get("x"), Some(&Value::Int(42)));
    Ok(())
}

#[tokio::test]
async fn test_runtime_error_reports_unit_line() -> Result<()> {
    let mut session = LoxSession::new();
    let error = session
        .execute("print 1;\nprint 1/0;")
        .await
        .expect_err("Division by zero fails");
    let SessionError::Runtime(failure) = error else {
        panic!("Expected a runtime failure");
    };
    assert_eq!(failure.line, 2);
    assert_eq!(failure.code, "RT010");
    assert_eq!(failure.to_string(), "[line 2] RuntimeError: Division by zero.");
    assert_eq!(session.take_output().await?, "1\n");
    Ok(())
}

#[tokio::test]
async fn test_syntax_error_does_not_execute() -> Result<()> {
    let mut session = LoxSession::new();
    let error = session
        .execute("print 1; print );")
        .await
        .expect_err("Unit does not parse");
    assert!(matches!(error, SessionError::Syntax(ref e) if !e.incomplete));
    assert_eq!(session.take_output().await?, "");
    Ok(())
}

#[test]
fn test_boundary_check() {
    let session = LoxSession::new();
    assert_eq!(Boundary::check(&session, "var x = ("), Ok(Boundary::Incomplete));
    assert_eq!(
        Boundary::check(&session, "var x = (\n  1"),
        Ok(Boundary::Incomplete)
    );
    assert_eq!(
        Boundary::check(&session, "var x = (\n  1\n); print x;"),
        Ok(Boundary::Complete)
    );
    let error = Boundary::check(&session, "fun (;").expect_err("Genuine syntax error");
    assert!(!error.incomplete);
    assert_eq!(error.line, 1);
}

#[test]
fn test_deep_nesting_is_not_incomplete() {
    let session = LoxSession::new();
    let closed = format!("print {}1{};", "(".repeat(500), ")".repeat(500));
    let error = Boundary::check(&session, &closed).expect_err("Nesting limit");
    assert_eq!(error.code, "PA008");
    assert!(!error.incomplete);

    let open = "(".repeat(500);
    let error = Boundary::check(&session, &open).expect_err("Nesting limit");
    assert_eq!(error.code, "PA008");
    assert!(!error.incomplete);
}

#[test]
fn test_skippable_lines() {
    assert!(is_skippable(""));
    assert!(is_skippable("   \t"));
    assert!(is_skippable("  // comment"));
    assert!(!is_skippable("print 1; // trailing comment"));
}

#[test]
fn test_split_units() -> Result<()> {
    let session = LoxSession::new();
    let source = "// header\nvar a = 1;\n\nfun f() {\n  return a;\n}\nprint f();\n";
    let units = split_units(&session, source)?;
    let lines: Vec<_> = units
        .iter()
        .map(|unit| (unit.first_line, unit.last_line))
        .collect();
    assert_eq!(lines, vec![(1, 1), (3, 5), (6, 6)]);
    assert_eq!(units[1].text, "fun f() {\n  return a;\n}");
    assert_eq!(&source[units[1].offset as usize..][..units[1].text.len()], units[1].text);
    Ok(())
}

#[test]
fn test_split_units_reports_trailing_unit() {
    let session = LoxSession::new();
    let error = split_units(&session, "print 1;\nfun f() {\n  print 2;")
        .expect_err("Function body is never closed");
    assert!(error.incomplete);
    assert_eq!(error.line, 3);
}

#[test]
fn test_value_serializes_untagged() -> Result<()> {
    let mut variables = Variables::new();
    variables.insert("a".into(), Value::Int(1));
    variables.insert("b".into(), Value::Float(0.5));
    variables.insert("c".into(), Value::Null);
    variables.insert("d".into(), Value::Tag("<class 'function'>".into()));
    variables.insert(
        "e".into(),
        Value::List(vec![Value::Bool(true), Value::Str("x".into())]),
    );
    let json = serde_json::to_string(&variables)?;
    assert_eq!(
        json,
        r#"{"a":1,"b":0.5,"c":null,"d":"<class 'function'>","e":[true,"x"]}"#
    );

    let back: Variables = serde_json::from_str(&json)?;
    assert_eq!(back.get("a"), Some(&Value::Int(1)));
    assert_eq!(back.get("b"), Some(&Value::Float(0.5)));
    assert_eq!(back.get("d"), Some(&Value::Str("<class 'function'>".into())));
    Ok(())
}
