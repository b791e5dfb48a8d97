#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::ast::Parser;
    use crate::compile::{
        CollectingSink, CompileErrorKind, CompileOptions, CompileResult, CompiledExpr, Comp, Constant, ExprFn,
        ResultType,
    };
    use crate::expr::{Expr, IndexNode};
    use crate::rt::{Env, RtResult, RuntimeError};
    use crate::token::Tokenizer;
    use crate::typ::RType;
    use crate::val::{HostFn, Lookup, MapValue, Value};

    fn parse(src: &str) -> Expr {
        let (tokens, spans) = Tokenizer::tokenize_enhanced_with_spans(src).unwrap();
        Parser::new_with_spans(&tokens, &spans).parse_with_enhanced_errors(src).unwrap()
    }

    fn index_node(src: &str) -> IndexNode {
        match parse(src) {
            Expr::Index(node) => node,
            other => panic!("expected index expression, got {:?}", other),
        }
    }

    struct Fixture {
        comp: Comp,
        env: Env,
        sink: CollectingSink,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_options(CompileOptions::default())
        }

        fn with_options(options: CompileOptions) -> Self {
            let sink = CollectingSink::new();
            Self {
                comp: Comp::with_options(options).with_sink(Arc::new(sink.clone())),
                env: Env::new(),
                sink,
            }
        }

        fn var(&mut self, name: &str, ty: RType, value: Value) {
            let slot = self.comp.declare_var(name, ty);
            self.env.set(slot, value);
        }

        fn compile(&self, src: &str) -> CompileResult<CompiledExpr> {
            self.comp.compile_index(&index_node(src))
        }

        fn eval(&mut self, src: &str) -> RtResult<Value> {
            let compiled = self.compile(src).unwrap();
            compiled.eval(&mut self.env)
        }

        fn lookup(&mut self, src: &str) -> RtResult<Lookup> {
            let compiled = self.compile(src).unwrap();
            compiled.eval_comma_ok(&mut self.env)
        }

        fn error(&self, src: &str) -> (CompileErrorKind, String) {
            let err = self.compile(src).unwrap_err();
            (err.kind, err.message)
        }
    }

    fn strings(items: &[&str]) -> Value {
        Value::slice(items.iter().map(|s| Value::string(s)).collect())
    }

    fn ints(items: &[i64]) -> Value {
        Value::array(items.iter().map(|v| Value::Int(*v)).collect())
    }

    #[test]
    fn test_constant_array_folds() {
        let fx = Fixture::new();
        let compiled = fx.compile("[3]int{10, 20, 30}[1]").unwrap();
        assert!(compiled.is_const());
        assert_eq!(compiled.ty(), &RType::Int);
        assert_eq!(compiled.constant_ref(), Some(&Constant::Typed(Value::Int(20))));
    }

    #[test]
    fn test_folding_disabled() {
        let mut fx = Fixture::with_options(CompileOptions::without_folding());
        let compiled = fx.compile("[3]int{10, 20, 30}[1]").unwrap();
        assert!(!compiled.is_const());
        assert_eq!(compiled.eval(&mut fx.env), Ok(Value::Int(20)));
    }

    #[test]
    fn test_constant_out_of_range_left_unfolded() {
        let mut fx = Fixture::new();
        let compiled = fx.compile("[3]int{1, 2, 3}[5]").unwrap();
        assert!(!compiled.is_const());
        assert_eq!(
            compiled.eval(&mut fx.env),
            Err(RuntimeError::IndexOutOfRange { index: 5, len: 3 })
        );
        // negative constants behave the same way
        assert_eq!(
            fx.eval("[3]int{1, 2, 3}[-1]"),
            Err(RuntimeError::IndexOutOfRange { index: -1, len: 3 })
        );
    }

    #[test]
    fn test_slice_dynamic_index() {
        let mut fx = Fixture::new();
        fx.var("s", RType::slice(RType::String), strings(&["a", "bb", "ccc"]));
        fx.var("j", RType::Int, Value::Int(1));

        let compiled = fx.compile("s[j]").unwrap();
        assert!(matches!(compiled.with_fun(), ExprFn::String(_)));
        assert_eq!(compiled.eval(&mut fx.env), Ok(Value::string("bb")));

        fx.env.set(1, Value::Int(3));
        assert_eq!(
            compiled.eval(&mut fx.env),
            Err(RuntimeError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_slice_constant_index() {
        let mut fx = Fixture::new();
        fx.var("s", RType::slice(RType::String), strings(&["a", "bb", "ccc"]));
        assert_eq!(fx.eval("s[2]"), Ok(Value::string("ccc")));
        assert_eq!(fx.eval("s[0x0]"), Ok(Value::string("a")));
        assert_eq!(fx.eval("s[1.0]"), Ok(Value::string("bb")));
    }

    #[test]
    fn test_named_constant_index() {
        let mut fx = Fixture::new();
        fx.var("xs", RType::array(3, RType::Int), ints(&[4, 5, 6]));
        fx.comp.declare_const("k", CompiledExpr::constant(RType::Uint8, Value::Uint8(2)));
        assert_eq!(fx.eval("xs[k]"), Ok(Value::Int(6)));
    }

    #[test]
    fn test_element_kinds_are_specialized() {
        let mut fx = Fixture::new();
        fx.var("a", RType::slice(RType::Uint16), Value::slice(vec![Value::Uint16(7)]));
        fx.var("b", RType::slice(RType::Float32), Value::slice(vec![Value::Float32(0.5)]));
        fx.var("c", RType::slice(RType::slice(RType::Int)), Value::slice(vec![Value::slice(vec![])]));
        fx.var("d", RType::array(1, RType::Bool), Value::array(vec![Value::Bool(true)]));

        assert!(matches!(fx.compile("a[0]").unwrap().with_fun(), ExprFn::Uint16(_)));
        assert!(matches!(fx.compile("b[0]").unwrap().with_fun(), ExprFn::Float32(_)));
        assert!(matches!(fx.compile("c[0]").unwrap().with_fun(), ExprFn::Generic(_)));
        assert!(matches!(fx.compile("d[0]").unwrap().with_fun(), ExprFn::Bool(_)));
        assert_eq!(fx.eval("c[0]"), Ok(Value::slice(vec![])));
    }

    #[test]
    fn test_map_lookup() {
        let mut fx = Fixture::new();
        let map: MapValue = [(Value::string("a"), Value::Int(1))].into_iter().collect();
        fx.var("m", RType::map(RType::String, RType::Int), Value::map(map));

        let compiled = fx.compile("m[\"z\"]").unwrap();
        assert_eq!(compiled.result_type(), &ResultType::CommaOk(RType::Int));
        assert_eq!(compiled.result_type().to_string(), "(int, bool)");
        assert_eq!(compiled.eval_comma_ok(&mut fx.env), Ok(Lookup::absent(Value::Int(0))));
        assert_eq!(fx.lookup("m[\"a\"]"), Ok(Lookup::found(Value::Int(1))));

        fx.var("k", RType::String, Value::string("a"));
        assert_eq!(fx.lookup("m[k]"), Ok(Lookup::found(Value::Int(1))));
    }

    #[test]
    fn test_nil_map_is_empty() {
        let mut fx = Fixture::new();
        fx.var("m", RType::map(RType::Int, RType::String), Value::Map(None));
        assert_eq!(fx.lookup("m[3]"), Ok(Lookup::absent(Value::string(""))));
    }

    #[test]
    fn test_constant_map_literal_folds_to_lookup() {
        let fx = Fixture::new();
        let compiled = fx.compile("map[string]int{\"a\": 1}[\"a\"]").unwrap();
        assert!(compiled.is_const());
        assert_eq!(
            compiled.constant_ref(),
            Some(&Constant::Lookup(Lookup::found(Value::Int(1))))
        );
    }

    #[test]
    fn test_comma_ok_operand_contributes_value() {
        let mut fx = Fixture::new();
        let map: MapValue = [(Value::string("a"), Value::Int(1))].into_iter().collect();
        fx.var("m", RType::map(RType::String, RType::Int), Value::map(map));
        fx.var("xs", RType::slice(RType::Int), Value::slice(vec![Value::Int(5), Value::Int(6)]));
        assert_eq!(fx.eval("xs[m[\"a\"]]"), Ok(Value::Int(6)));
    }

    #[test]
    fn test_pointer_to_array() {
        let mut fx = Fixture::new();
        let arr = RType::array(3, RType::Int);
        fx.var("p", RType::pointer(arr.clone()), Value::pointer_to(ints(&[1, 2, 3])));
        fx.var("q", RType::pointer(arr), Value::Pointer(None));
        fx.var("i", RType::Int, Value::Int(2));

        assert_eq!(fx.eval("p[i]"), Ok(Value::Int(3)));
        assert_eq!(fx.eval("p[0]"), Ok(Value::Int(1)));
        assert_eq!(fx.eval("q[i]"), Err(RuntimeError::NilDereference));
        // nil dereference wins over the bounds check
        assert_eq!(fx.eval("q[10]"), Err(RuntimeError::NilDereference));
    }

    #[test]
    fn test_pointer_to_slice_is_not_indexable() {
        let mut fx = Fixture::new();
        fx.var("p", RType::pointer(RType::slice(RType::Int)), Value::Pointer(None));
        let (kind, msg) = fx.error("p[0]");
        assert_eq!(kind, CompileErrorKind::InvalidOperation);
        assert_eq!(msg, "invalid operation: p[0] (type *[]int does not support indexing)");
    }

    #[test]
    fn test_string_bytes() {
        let mut fx = Fixture::new();
        let compiled = fx.compile("\"héllo\"[1]").unwrap();
        assert!(compiled.is_const());
        assert_eq!(compiled.ty(), &RType::Uint8);
        assert_eq!(compiled.const_value(), Some(Value::Uint8(0xC3)));

        fx.var("s", RType::String, Value::string("abc"));
        fx.var("i", RType::Int, Value::Int(2));
        assert_eq!(fx.eval("s[0]"), Ok(Value::Uint8(b'a')));
        assert_eq!(fx.eval("\"xyz\"[i]"), Ok(Value::Uint8(b'z')));
        assert_eq!(fx.eval("s[i]"), Ok(Value::Uint8(b'c')));
        assert_eq!(fx.eval("s[3]"), Err(RuntimeError::IndexOutOfRange { index: 3, len: 3 }));
        assert!(matches!(fx.compile("s[i]").unwrap().with_fun(), ExprFn::Uint8(_)));
    }

    #[test]
    fn test_evaluation_order() {
        let calls: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let mut fx = Fixture::new();
        let log = calls.clone();
        fx.comp.declare_func(HostFn::new("obj", vec![], RType::slice(RType::Int), move |_, _| {
            log.lock().unwrap().push("obj");
            Ok(Value::slice(vec![Value::Int(1), Value::Int(2)]))
        }));
        let log = calls.clone();
        fx.comp.declare_func(HostFn::new("idx", vec![], RType::Int, move |_, _| {
            log.lock().unwrap().push("idx");
            Ok(Value::Int(1))
        }));

        assert_eq!(fx.eval("obj()[idx()]"), Ok(Value::Int(2)));
        assert_eq!(*calls.lock().unwrap(), vec!["obj", "idx"]);
    }

    #[test]
    fn test_unindexable_object() {
        let mut fx = Fixture::new();
        fx.var("x", RType::Int, Value::Int(1));
        let err = fx.compile("x[0]").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::InvalidOperation);
        assert_eq!(err.message, "invalid operation: x[0] (type int does not support indexing)");
        assert!(err.span.is_some());
        assert_eq!(fx.sink.errors(), vec![err]);
    }

    #[test]
    fn test_index_type_errors() {
        let mut fx = Fixture::new();
        fx.var("s", RType::slice(RType::Int), Value::slice(vec![]));
        fx.var("u", RType::Uint8, Value::Uint8(0));
        fx.var("m", RType::map(RType::String, RType::Int), Value::Map(None));
        fx.var("i", RType::Int, Value::Int(0));

        assert_eq!(
            fx.error("s[u]"),
            (CompileErrorKind::TypeError, "non-integer slice index: u <uint8>".to_string())
        );
        assert_eq!(
            fx.error("s[\"a\"]"),
            (
                CompileErrorKind::TypeError,
                "cannot convert \"a\" (untyped string constant) to int".to_string()
            )
        );
        assert_eq!(fx.error("s[1.5]").0, CompileErrorKind::TypeError);
        assert_eq!(
            fx.error("m[i]"),
            (CompileErrorKind::TypeError, "cannot use i <int> as <string> in map index".to_string())
        );
        assert_eq!(fx.error("m[1]").0, CompileErrorKind::TypeError);
        assert_eq!(fx.sink.errors().len(), 5);
    }

    #[test]
    fn test_undefined_operand() {
        let fx = Fixture::new();
        let (kind, msg) = fx.error("nope[0]");
        assert_eq!(kind, CompileErrorKind::Undefined);
        assert_eq!(msg, "undefined: nope");
    }
}
