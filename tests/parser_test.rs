use color_eyre::eyre::Result;
use loxpad::parser::{
    expression::{ExpressionAtomKind, ExpressionNode, InfixOperator, InfixShortCircuitOperator},
    statement::Statement,
    ParserError, ParserErrorKind, Parser, MAX_NESTING,
};

fn parse_error(source: &str) -> ParserError {
    Parser::new(source)
        .parse()
        .expect_err("Source should fail to parse")
}

fn assert_incomplete(source: &str) {
    let error = parse_error(source);
    assert!(
        error.is_incomplete(),
        "Expected {source:?} to be incomplete but got {error:?}"
    );
}

fn assert_fatal(source: &str) {
    let error = parse_error(source);
    assert!(
        !error.is_incomplete(),
        "Expected {source:?} to be a genuine syntax error but got {error:?}"
    );
}

#[test]
fn smoke_test() -> Result<()> {
    let program = Parser::new("").parse()?;
    assert!(program.is_empty());
    Ok(())
}

#[test]
fn test_declarations() -> Result<()> {
    let source = r#"
        var a = 1;
        fun add(x, y) { return x + y; }
        class Point {
            init(x, y) { this.x = x; this.y = y; }
            sum() { return this.x + this.y; }
        }
        print add(a, Point(1, 2).sum());
    "#;
    let program = Parser::new(source).parse()?;
    assert_eq!(program.len(), 4);
    assert!(matches!(program.get_statement(0), Some(Statement::VariableDecl(_))));
    assert!(matches!(program.get_statement(1), Some(Statement::FunctionDecl(_))));
    match program.get_statement(2) {
        Some(Statement::ClassDecl(decl)) => {
            assert_eq!(decl.name.name, "Point");
            assert_eq!(decl.methods.len(), 2);
        }
        other => panic!("Expected a class declaration but got {other:?}"),
    }
    assert!(matches!(program.get_statement(3), Some(Statement::Print(_))));
    Ok(())
}

#[test]
fn test_precedence() -> Result<()> {
    let expr = Parser::new("1 + 2 * 3").parse_expression()?;
    let ExpressionNode::Infix { operator, lhs, rhs } = expr.get_root() else {
        panic!("Expected an infix root");
    };
    assert_eq!(*operator, InfixOperator::Add);
    assert!(matches!(
        expr.get_node(*lhs),
        Some(ExpressionNode::Atom(atom)) if atom.kind == ExpressionAtomKind::Number(1.0)
    ));
    assert!(matches!(
        expr.get_node(*rhs),
        Some(ExpressionNode::Infix {
            operator: InfixOperator::Multiply,
            ..
        })
    ));
    Ok(())
}

#[test]
fn test_associativity() -> Result<()> {
    let expr = Parser::new("a - b - c").parse_expression()?;
    let ExpressionNode::Infix { lhs, rhs, .. } = expr.get_root() else {
        panic!("Expected an infix root");
    };
    assert!(matches!(expr.get_node(*lhs), Some(ExpressionNode::Infix { .. })));
    assert!(matches!(expr.get_node(*rhs), Some(ExpressionNode::Atom(_))));

    let expr = Parser::new("a = b = c").parse_expression()?;
    let ExpressionNode::InfixAssignment { lhs, rhs } = expr.get_root() else {
        panic!("Expected an assignment root");
    };
    assert_eq!(lhs.name, "a");
    assert!(matches!(
        expr.get_node(*rhs),
        Some(ExpressionNode::InfixAssignment { .. })
    ));

    let expr = Parser::new("a or b and c").parse_expression()?;
    let ExpressionNode::InfixShortCircuit { operator, rhs, .. } = expr.get_root() else {
        panic!("Expected a logical root");
    };
    assert_eq!(*operator, InfixShortCircuitOperator::Or);
    assert!(matches!(
        expr.get_node(*rhs),
        Some(ExpressionNode::InfixShortCircuit {
            operator: InfixShortCircuitOperator::And,
            ..
        })
    ));

    let expr = Parser::new("-a.b()").parse_expression()?;
    assert!(matches!(expr.get_root(), ExpressionNode::Prefix { .. }));
    Ok(())
}

#[test]
fn test_assignment_targets() -> Result<()> {
    let expr = Parser::new("a = b = 1").parse_expression()?;
    assert!(matches!(expr.get_root(), ExpressionNode::InfixAssignment { .. }));

    let expr = Parser::new("point.x = 1").parse_expression()?;
    assert!(matches!(expr.get_root(), ExpressionNode::Set { .. }));

    let error = parse_error("1 = 2;");
    assert_eq!(error.kind, ParserErrorKind::InvalidAssignmentTarget);
    Ok(())
}

#[test]
fn test_spans_cover_statement() -> Result<()> {
    let source = "print 1 +\n  2;";
    let program = Parser::new(source).parse()?;
    let span = program
        .get_statement(0)
        .map(|stmt| stmt.get_span())
        .expect("One statement");
    assert_eq!(&source[span.range()], source);
    Ok(())
}

#[test]
fn test_incomplete_sources() {
    assert_incomplete("var x = (");
    assert_incomplete("var x = (\n  1");
    assert_incomplete("var x = 1");
    assert_incomplete("print");
    assert_incomplete("fun f() {");
    assert_incomplete("fun f(a,");
    assert_incomplete("class A {");
    assert_incomplete("if (true)");
    assert_incomplete("while (x < 3) {\n  x = x + 1;");
    assert_incomplete("for (var i = 0; i < 3;");
    assert_incomplete("print \"hello");
    assert_incomplete("{ { }");
}

#[test]
fn test_fatal_sources() {
    assert_fatal("fun (;");
    assert_fatal("var 1 = 2;");
    assert_fatal("print );");
    assert_fatal("1 = 2;");
    assert_fatal("return 1;");
    assert_fatal("print this;");
    assert_fatal("print @;");
    assert_fatal("}");
}

#[test]
fn test_error_codes() {
    assert_eq!(parse_error("var x = (").code(), "PA003");
    assert_eq!(parse_error("fun (;").code(), "PA001");
    assert_eq!(parse_error("print );").code(), "PA002");
    assert_eq!(parse_error("return;").code(), "PA005");
    assert_eq!(parse_error("print \"abc").code(), "LX002");
}

#[test]
fn test_too_many_arguments() {
    let arguments = vec!["1"; 256].join(", ");
    let error = parse_error(&format!("f({arguments});"));
    assert_eq!(error.kind, ParserErrorKind::TooManyArguments(255));
}

#[test]
fn test_nesting_limit() -> Result<()> {
    let depth = MAX_NESTING as usize;
    let shallow = format!("print {}1{};", "(".repeat(depth / 2), ")".repeat(depth / 2));
    assert_eq!(Parser::new(&shallow).parse()?.len(), 1);

    let sources = [
        format!("print {}1{};", "(".repeat(depth), ")".repeat(depth)),
        "(".repeat(depth * 10),
        format!("{}{}", "{".repeat(depth), "}".repeat(depth)),
        format!("{}print 1;", "if (true) ".repeat(depth)),
        format!("{}{}", "fun f() {".repeat(depth), "}".repeat(depth)),
        format!("print {}1;", "-".repeat(depth)),
    ];
    for source in sources.iter() {
        let error = parse_error(source);
        assert_eq!(error.kind, ParserErrorKind::TooDeeplyNested(MAX_NESTING));
        assert_eq!(error.code(), "PA008");
        assert_fatal(source);
    }
    Ok(())
}
