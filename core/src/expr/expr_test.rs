#[cfg(test)]
mod tests {
    use crate::ast::Parser;
    use crate::expr::{Expr, Literal};
    use crate::token::Tokenizer;

    fn roundtrip(src: &str) -> String {
        let tokens = Tokenizer::tokenize(src).unwrap();
        Parser::new(&tokens).parse().unwrap().to_string()
    }

    #[test]
    fn test_display_matches_source() {
        for src in [
            "xs[1]",
            "[3]int{10, 20, 30}[1]",
            r#"map[string]int{"x": 1}["y"]"#,
            "(*p)[i]",
            "&[...]bool{true}",
            "f(a, -1)[0]",
            "[]*int{}",
        ] {
            assert_eq!(roundtrip(src), src);
        }
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(Expr::Lit(Literal::Char('a')).to_string(), "'a'");
        assert_eq!(Expr::Lit(Literal::Float(1.0)).to_string(), "1.0");
        assert_eq!(Expr::Lit(Literal::Imag(2.0)).to_string(), "2i");
        assert_eq!(Expr::str("a\"b").to_string(), r#""a\"b""#);
    }

    #[test]
    fn test_unparen() {
        let expr = Expr::Paren(Box::new(Expr::Paren(Box::new(Expr::ident("x")))));
        assert_eq!(expr.unparen(), &Expr::ident("x"));
    }
}
