#[cfg(test)]
mod tests {
    use crate::expr::Expr;
    use crate::stmt::{Stmt, StmtParser};
    use crate::token::Tokenizer;

    fn parse_program(src: &str) -> Vec<Stmt> {
        let tokens = Tokenizer::tokenize(src).unwrap();
        StmtParser::new(&tokens).parse_program().unwrap().statements
    }

    #[test]
    fn test_define_and_expr() {
        let stmts = parse_program("xs := []int{1, 2}\nxs[1]");
        assert_eq!(stmts.len(), 2);
        assert!(matches!(&stmts[0], Stmt::Define { names, .. } if names == &["xs".to_string()]));
        assert_eq!(stmts[1], Stmt::Expr(Expr::index(Expr::ident("xs"), Expr::int(1))));
    }

    #[test]
    fn test_comma_ok_define() {
        let stmts = parse_program(r#"v, ok := m["k"]"#);
        match &stmts[0] {
            Stmt::Define { names, value } => {
                assert_eq!(names, &["v".to_string(), "ok".to_string()]);
                assert_eq!(value, &Expr::index(Expr::ident("m"), Expr::str("k")));
            }
            other => panic!("expected define, got {:?}", other),
        }
    }

    #[test]
    fn test_const_decl() {
        let stmts = parse_program("const c = \"abc\"; c[0]");
        assert_eq!(
            stmts[0],
            Stmt::Const {
                name: "c".to_string(),
                value: Expr::str("abc")
            }
        );
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn test_multiline_composite_statement() {
        let src = "m := map[string]int{\n  \"x\": 1,\n  \"y\": 2,\n}\n\n;m[\"y\"]\n";
        let stmts = parse_program(src);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[1].to_string(), r#"m["y"]"#);
    }

    #[test]
    fn test_statement_display() {
        let stmts = parse_program("a, b := f(); const k = 'x'");
        assert_eq!(stmts[0].to_string(), "a, b := f()");
        assert_eq!(stmts[1].to_string(), "const k = 'x'");
    }

    #[test]
    fn test_enhanced_error_points_into_expression() {
        let src = "x := 1\ny := xs[1 2]";
        let (tokens, spans) = Tokenizer::tokenize_enhanced_with_spans(src).unwrap();
        let err = StmtParser::new_with_spans(&tokens, &spans)
            .parse_program_with_enhanced_errors(src)
            .unwrap_err();
        let span = err.span.unwrap();
        assert_eq!(span.start.line, 2);
        assert_eq!(span.start.column, 11);
    }

    #[test]
    fn test_errors() {
        for src in ["const = 1", "const c 1", "x :=", "a, := 1"] {
            let tokens = Tokenizer::tokenize(src).unwrap();
            assert!(StmtParser::new(&tokens).parse_program().is_err(), "expected error for {:?}", src);
        }
    }
}
