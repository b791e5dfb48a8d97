#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::compile::{CollectingSink, CompileErrorKind, CompileOptions};
    use crate::interp::{EvalError, Evaluated, Interp};
    use crate::rt::RuntimeError;
    use crate::typ::RType;
    use crate::val::{HostFn, Lookup, Value};

    fn last(interp: &mut Interp, src: &str) -> Evaluated {
        interp.eval_line(src).unwrap().pop().unwrap()
    }

    #[test]
    fn test_define_and_index() {
        let mut interp = Interp::new();
        let results = interp
            .eval_line("s := []string{\"a\", \"bb\", \"ccc\"}\nj := 1\ns[j]")
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Evaluated::Bound(vec!["s".to_string()]));
        assert_eq!(
            results[2],
            Evaluated::Value {
                value: Value::string("bb"),
                ty: RType::String
            }
        );
        assert_eq!(results[2].to_string(), "bb\t// string");
    }

    #[test]
    fn test_comma_ok_define() {
        let mut interp = Interp::new();
        interp.eval_line("m := map[string]int{\"a\": 1}").unwrap();
        interp.eval_line("v, ok := m[\"z\"]").unwrap();
        assert_eq!(interp.eval("v"), Ok(Value::Int(0)));
        assert_eq!(interp.eval("ok"), Ok(Value::Bool(false)));

        interp.eval_line("v, ok := m[\"a\"]").unwrap();
        assert_eq!(interp.eval("v"), Ok(Value::Int(1)));
        assert_eq!(interp.eval("ok"), Ok(Value::Bool(true)));

        match last(&mut interp, "m[\"a\"]") {
            Evaluated::Pair { lookup, ty } => {
                assert_eq!(lookup, Lookup::found(Value::Int(1)));
                assert_eq!(ty, RType::Int);
            }
            other => panic!("expected a pair, got {:?}", other),
        }
    }

    #[test]
    fn test_comma_ok_requires_map_index() {
        let mut interp = Interp::new();
        let err = interp.eval_line("a, b := []int{1}[0]").unwrap_err();
        match err {
            EvalError::Compile(err) => {
                assert_eq!(err.kind, CompileErrorKind::TypeError);
                assert!(err.message.starts_with("assignment mismatch"));
            }
            other => panic!("expected compile error, got {:?}", other),
        }
    }

    #[test]
    fn test_const_stays_untyped() {
        let mut interp = Interp::new();
        interp.eval_line("const big = 300").unwrap();
        assert!(interp.compile("big").unwrap().is_untyped());
        // converts to the index type at the use site
        assert_eq!(
            interp.eval("[301]int{}[big]"),
            Ok(Value::Int(0))
        );
        assert_eq!(interp.eval("uint16(big)"), Ok(Value::Uint16(300)));
    }

    #[test]
    fn test_const_requires_constant() {
        let mut interp = Interp::new();
        interp.define_var("x", RType::Int, Value::Int(1));
        let err = interp.eval_line("const c = []int{x}[0]").unwrap_err();
        assert!(matches!(err, EvalError::Compile(_)));
    }

    #[test]
    fn test_define_sees_previous_binding() {
        let mut interp = Interp::new();
        interp.eval_line("x := []int{5, 6}").unwrap();
        interp.eval_line("x := x[1]").unwrap();
        assert_eq!(interp.eval("x"), Ok(Value::Int(6)));
        assert_eq!(interp.compile("x").unwrap().ty(), &RType::Int);
    }

    #[test]
    fn test_pointer_to_array() {
        let mut interp = Interp::new();
        interp.eval_line("p := &[3]int{1, 2, 3}").unwrap();
        assert_eq!(interp.eval("p[2]"), Ok(Value::Int(3)));
        interp.define_var("q", RType::pointer(RType::array(3, RType::Int)), Value::Pointer(None));
        assert_eq!(
            interp.eval("q[0]"),
            Err(EvalError::Runtime(RuntimeError::NilDereference))
        );
    }

    #[test]
    fn test_host_function() {
        let mut interp = Interp::new();
        interp.define_func(HostFn::new(
            "words",
            vec![],
            RType::slice(RType::String),
            |_, _| Ok(Value::slice(vec![Value::string("alpha"), Value::string("beta")])),
        ));
        assert_eq!(interp.eval("words()[1]"), Ok(Value::string("beta")));
        assert_eq!(interp.eval("words()[1][0]"), Ok(Value::Uint8(b'b')));
    }

    #[test]
    fn test_errors_are_reported_to_sink() {
        let sink = CollectingSink::new();
        let mut interp = Interp::new().with_sink(Arc::new(sink.clone()));
        interp.define_var("n", RType::Int, Value::Int(3));
        assert!(matches!(interp.eval_line("n[0]"), Err(EvalError::Compile(_))));
        assert!(matches!(interp.eval_line("n["), Err(EvalError::Parse(_))));
        assert_eq!(sink.errors().len(), 1);
        assert_eq!(sink.errors()[0].kind, CompileErrorKind::InvalidOperation);
    }

    #[test]
    fn test_runtime_error_stops_line() {
        let mut interp = Interp::with_options(CompileOptions::without_folding());
        let err = interp.eval_line("a := 1\n[]int{}[0]\nb := 2").unwrap_err();
        assert_eq!(
            err,
            EvalError::Runtime(RuntimeError::IndexOutOfRange { index: 0, len: 0 })
        );
        assert!(interp.compile("a").is_ok());
        assert!(interp.compile("b").is_err());
    }

    #[test]
    fn test_blank_identifier() {
        let mut interp = Interp::new();
        let results = interp.eval_line("_, ok := map[int]int{}[1]").unwrap();
        assert_eq!(results, vec![Evaluated::Bound(vec!["ok".to_string()])]);
        assert!(interp.compile("_").is_err());
    }

    #[test]
    fn test_json_output() {
        let mut interp = Interp::new();
        let results = interp.eval_line("[]uint8{7}[0]\nmap[string]bool{}[\"x\"]").unwrap();
        let json = serde_json::to_string(&results).unwrap();
        assert_eq!(
            json,
            r#"[{"value":7,"type":"uint8"},{"value":false,"found":false,"type":"bool"}]"#
        );
    }
}
