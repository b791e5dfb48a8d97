mod tests {
    use crate::*;
    use std::io::Write;

    #[test]
    fn test_sanitize_path_allows_simple_relative() {
        let p = sanitize_path("foo/bar.fx").expect("relative path should be allowed");
        assert_eq!(p, PathBuf::from("foo/bar.fx"));
    }

    #[test]
    fn test_sanitize_path_rejects_parent_dir() {
        let err = sanitize_path("foo/../bar.fx").unwrap_err();
        assert!(err.to_string().contains("Parent directory components"));
    }

    #[cfg(unix)]
    #[test]
    fn test_sanitize_path_allows_absolute_unix() {
        let p = sanitize_path("/etc/passwd").expect("absolute path should be allowed");
        assert_eq!(p, PathBuf::from("/etc/passwd"));
    }

    #[test]
    fn test_cli_args_accepts_simple_file() {
        let args = CliArgs::try_parse_from(["fastx", "a.fx"]).expect("should parse");
        assert!(args.command.is_none());
        assert_eq!(args.file.as_deref(), Some(Path::new("a.fx")));
        assert!(!args.no_fold);
    }

    #[test]
    fn test_cli_args_rejects_parent_dir_file() {
        assert!(CliArgs::try_parse_from(["fastx", "../a.fx"]).is_err());
    }

    #[test]
    fn test_cli_args_eval() {
        let args = CliArgs::try_parse_from([
            "fastx", "eval", "xs[1]", "--let", "xs=[]int{1, 2}", "--json", "--no-fold",
        ])
        .expect("should parse");
        assert!(args.no_fold);
        match args.command {
            Some(Commands::Eval { source, lets, json }) => {
                assert_eq!(source, "xs[1]");
                assert_eq!(lets, vec!["xs=[]int{1, 2}".to_string()]);
                assert!(json);
            }
            other => panic!("expected eval command, got {:?}", other),
        }
    }

    #[test]
    fn test_split_let() {
        assert_eq!(split_let("m = map[string]int{}").unwrap(), ("m", "map[string]int{}"));
        assert_eq!(split_let("s=\"a=b\"").unwrap(), ("s", "\"a=b\""));
        assert!(split_let("noequals").is_err());
        assert!(split_let("1x=2").is_err());
        assert!(split_let("a b=2").is_err());
    }

    #[test]
    fn test_env_toggle() {
        assert!(env_toggle_enabled("1"));
        assert!(env_toggle_enabled("fastx_core=trace"));
        assert!(!env_toggle_enabled(" "));
        assert!(!env_toggle_enabled("off"));
        assert!(!env_toggle_enabled("FALSE"));
    }

    #[test]
    fn test_filter_expr_from() {
        assert_eq!(filter_expr_from("true"), None);
        assert_eq!(filter_expr_from(" fastx_core=debug "), Some("fastx_core=debug".to_string()));
    }

    #[test]
    fn test_load_options() {
        let defaults = load_options(None, false).unwrap();
        assert!(defaults.fold_constants);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[compile]\nfold_mode = \"typed\"").unwrap();
        let options = load_options(Some(file.path()), true).unwrap();
        assert!(!options.fold_constants);
        assert_eq!(options.fold_mode, fastx_core::FoldMode::Typed);
    }

    #[test]
    fn test_load_options_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[compile]\nfold_constants = \"maybe\"").unwrap();
        let err = load_options(Some(file.path()), false).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_multiline_detection() {
        use crate::repl::should_continue_multiline;
        assert!(should_continue_multiline("[]int{1,\n"));
        assert!(!should_continue_multiline("[]int{1}[0]\n"));
        assert!(!should_continue_multiline("\"{\"[0]\n"));
        assert!(should_continue_multiline("x := 1 \\"));
    }
}
