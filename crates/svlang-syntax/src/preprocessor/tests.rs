use indoc::indoc;

use svlang_core::diagnostics::DiagnosticKind;
use svlang_core::source::SourceManager;
use svlang_core::Diagnostics;

use super::*;

fn preprocess(text: &str) -> (PreprocessResult, Diagnostics, SourceManager) {
    preprocess_with(text, &PreprocessorOptions::default())
}

fn preprocess_with(
    text: &str,
    options: &PreprocessorOptions,
) -> (PreprocessResult, Diagnostics, SourceManager) {
    let mut sm = SourceManager::new();
    let root = sm.add_buffer("test.sv", text);
    let mut diags = Diagnostics::new();
    let result = Preprocessor::new(&mut sm, &mut diags, root, options).run();
    (result, diags, sm)
}

fn rebuild(result: &PreprocessResult, sm: &SourceManager) -> String {
    result.tokens.iter().map(|t| t.text(sm).to_string()).collect()
}

fn significant<'a>(
    result: &'a PreprocessResult,
    sm: &'a SourceManager,
) -> Vec<(SyntaxKind, String)> {
    result
        .tokens
        .iter()
        .filter(|t| !t.is_trivia() && t.kind != SyntaxKind::Eof)
        .map(|t| (t.kind, t.text(sm).to_string()))
        .collect()
}

#[test]
fn directive_free_stream_is_untouched() {
    let text = "module m;\n  wire w = 1'b0;\nendmodule\n";
    let (result, diags, sm) = preprocess(text);
    assert!(diags.is_empty());
    assert_eq!(rebuild(&result, &sm), text);

    // Idempotence: preprocessing the rebuilt text yields the same kinds.
    let (again, _, sm2) = preprocess(&rebuild(&result, &sm));
    let kinds: Vec<_> = result.tokens.iter().map(|t| t.kind).collect();
    let kinds2: Vec<_> = again.tokens.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, kinds2);
    let _ = sm2;
}

#[test]
fn object_macro_expands() {
    let text = "`define WIDTH 8\nint w = `WIDTH;\n";
    let (result, diags, sm) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    assert_eq!(
        rebuild(&result, &sm),
        "`define WIDTH 8\nint w = 8;\n"
    );
}

#[test]
fn function_macro_with_default_argument() {
    let text = "`define F(x,y=3) x+y\nint i = `F(1);\n";
    let (result, diags, sm) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());

    let sig = significant(&result, &sm);
    let tail: Vec<&str> = sig.iter().map(|(_, t)| t.as_str()).collect();
    assert_eq!(tail, vec!["int", "i", "=", "1", "+", "3", ";"]);
}

#[test]
fn missing_argument_without_default_is_diagnosed() {
    let text = "`define F(x,y) x+y\nint i = `F(1);\n";
    let (_, diags, _) = preprocess(text);
    assert_eq!(diags.of_kind(DiagnosticKind::MissingMacroArg).count(), 1);
}

#[test]
fn extra_arguments_are_diagnosed() {
    let text = "`define F(x) x\nint i = `F(1, 2);\n";
    let (_, diags, _) = preprocess(text);
    assert_eq!(diags.of_kind(DiagnosticKind::TooManyMacroArgs).count(), 1);
}

#[test]
fn recursive_macro_emits_inner_name_verbatim() {
    let text = "`define A `A + 1\nint i = `A;\n";
    let (result, _, sm) = preprocess(text);
    let sig = significant(&result, &sm);
    // The inner `A must remain a directive token rather than loop forever.
    assert!(
        sig.iter()
            .any(|(k, t)| *k == SyntaxKind::Directive && t == "`A")
    );
}

#[test]
fn token_paste_relexes() {
    let text = "`define CAT(a,b) a``b\nint `CAT(foo,bar);\n";
    let (result, diags, sm) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    let sig = significant(&result, &sm);
    assert!(sig.contains(&(SyntaxKind::Ident, "foobar".to_string())));
    assert!(!sig.iter().any(|(_, t)| t == "foo" || t == "bar"));
}

#[test]
fn failed_paste_is_diagnosed_and_tokens_kept() {
    let text = "`define BAD(a) a``+\nint i = `BAD(x) 1;\n";
    let (result, diags, sm) = preprocess(text);
    assert_eq!(diags.of_kind(DiagnosticKind::MacroPasteFailed).count(), 1);
    let sig = significant(&result, &sm);
    assert!(sig.contains(&(SyntaxKind::Ident, "x".to_string())));
    assert!(sig.contains(&(SyntaxKind::Plus, "+".to_string())));
}

#[test]
fn stringification_produces_string_literal() {
    let text = "`define S(x) `\"x`\"\nstring s = `S(abc);\n";
    let (result, diags, sm) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    let token = result
        .tokens
        .iter()
        .find(|t| t.kind == SyntaxKind::StringLiteral)
        .expect("stringified literal");
    assert_eq!(token.text(&sm), "\"abc\"");
    assert_eq!(token.value, Some(TokenValue::Str("abc".to_string())));
}

#[test]
fn expansion_chain_points_at_usage() {
    let text = "`define A 1\n`define B `A\nint i = `B;\n";
    let (result, _, sm) = preprocess(text);
    let one = result
        .tokens
        .iter()
        .find(|t| t.kind == SyntaxKind::IntLiteral && t.text(&sm) == "1")
        .expect("expanded token");
    let chain: Vec<_> = sm.expansion_chain(one.expansion.unwrap()).collect();
    assert_eq!(chain.len(), 2);
    // Innermost first: `A inside B's body, then `B at the usage site.
    assert_eq!(sm.text_slice(chain[0].name_span), "`A");
    assert_eq!(sm.text_slice(chain[1].name_span), "`B");
}

#[test]
fn disabled_region_preserves_bytes() {
    let text = indoc! {"
        `ifdef FOO
        wire a;
        `else
        wire b;
        `endif
    "};
    let (result, diags, sm) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    assert_eq!(rebuild(&result, &sm), text);

    let sig = significant(&result, &sm);
    let texts: Vec<&str> = sig.iter().map(|(_, t)| t.as_str()).collect();
    assert_eq!(texts, vec!["wire", "b", ";"]);
    assert!(
        result
            .tokens
            .iter()
            .any(|t| t.kind == SyntaxKind::DisabledText)
    );
}

#[test]
fn elsif_chain_takes_first_defined() {
    let text = indoc! {"
        `define B 1
        `ifdef A
        int a;
        `elsif B
        int b;
        `elsif C
        int c;
        `else
        int d;
        `endif
    "};
    let (result, diags, sm) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    assert_eq!(rebuild(&result, &sm), text);
    let texts: Vec<String> = significant(&result, &sm)
        .into_iter()
        .map(|(_, t)| t)
        .collect();
    assert_eq!(texts, vec!["int", "b", ";"]);
}

#[test]
fn nested_conditionals_skip_as_a_unit() {
    let text = indoc! {"
        `ifdef A
        `ifdef B
        int x;
        `endif
        int y;
        `endif
        int z;
    "};
    let (result, diags, sm) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    assert_eq!(rebuild(&result, &sm), text);
    let texts: Vec<String> = significant(&result, &sm)
        .into_iter()
        .map(|(_, t)| t)
        .collect();
    assert_eq!(texts, vec!["int", "z", ";"]);
}

#[test]
fn unbalanced_and_unterminated_conditionals() {
    let (_, diags, _) = preprocess("`endif\n");
    assert_eq!(
        diags.of_kind(DiagnosticKind::UnbalancedConditional).count(),
        1
    );

    let (_, diags, _) = preprocess("`ifdef FOO\nint x;\n");
    assert_eq!(
        diags.of_kind(DiagnosticKind::MissingEndIfDirective).count(),
        1
    );
}

#[test]
fn undef_and_undefineall() {
    let text = "`define A 1\n`undef A\n`ifdef A\nint a;\n`endif\n";
    let (result, diags, sm) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    assert!(significant(&result, &sm).is_empty());

    let (_, diags, _) = preprocess("`undef NEVER\n");
    assert_eq!(diags.of_kind(DiagnosticKind::UnknownMacro).count(), 1);
}

#[test]
fn redefinition_with_different_body_warns() {
    let text = "`define A 1\n`define A 2\n";
    let (_, diags, _) = preprocess(text);
    assert_eq!(diags.of_kind(DiagnosticKind::MacroRedefinition).count(), 1);

    // Identical redefinition is fine.
    let text = "`define A 1\n`define A 1\n";
    let (_, diags, _) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
}

#[test]
fn builtin_macros_cannot_be_touched() {
    let (_, diags, _) = preprocess("`define __LINE__ 5\n");
    assert_eq!(diags.of_kind(DiagnosticKind::InvalidMacroName).count(), 1);
}

#[test]
fn line_builtin_reports_current_line() {
    let text = "int a;\nint i = `__LINE__;\n";
    let (result, diags, sm) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    let sig = significant(&result, &sm);
    assert!(sig.contains(&(SyntaxKind::IntLiteral, "2".to_string())));
}

#[test]
fn unknown_directive_skips_line() {
    let text = "`bogus stuff here\nint i;\n";
    let (result, diags, sm) = preprocess(text);
    assert_eq!(diags.of_kind(DiagnosticKind::UnknownDirective).count(), 1);
    let texts: Vec<String> = significant(&result, &sm)
        .into_iter()
        .map(|(_, t)| t)
        .collect();
    assert_eq!(texts, vec!["int", "i", ";"]);
}

#[test]
fn default_nettype_is_tracked_by_position() {
    let text = "wire a;\n`default_nettype none\nwire b;\n`default_nettype tri\nwire c;\n";
    let (result, diags, _) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    // Significant tokens: wire a ; | wire b ; | wire c ;
    assert_eq!(result.default_nettype.at(0), DefaultNetType::Wire);
    assert_eq!(result.default_nettype.at(3), DefaultNetType::None);
    assert_eq!(result.default_nettype.at(6), DefaultNetType::Tri);
}

#[test]
fn timescale_parses_both_spellings() {
    let (result, diags, _) = preprocess("`timescale 10ns / 1ps\n");
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    assert_eq!(
        result.time_scale,
        Some(TimeScale {
            unit: TimeScaleValue {
                magnitude: 10,
                unit: TimeUnit::Nanoseconds
            },
            precision: TimeScaleValue {
                magnitude: 1,
                unit: TimeUnit::Picoseconds
            },
        })
    );

    let (result, diags, _) = preprocess("`timescale 1 us / 100 ns\n");
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    assert_eq!(result.time_scale.unwrap().unit.unit, TimeUnit::Microseconds);

    let (_, diags, _) = preprocess("`timescale 1ps / 1ns\n");
    assert_eq!(diags.of_kind(DiagnosticKind::InvalidTimescale).count(), 1);

    let (_, diags, _) = preprocess("`timescale banana\n");
    assert_eq!(diags.of_kind(DiagnosticKind::InvalidTimescale).count(), 1);
}

#[test]
fn begin_keywords_demotes_new_keywords() {
    let text = indoc! {r#"
        `begin_keywords "1364-2001"
        int logic;
        `end_keywords
        logic l;
    "#};
    let (result, diags, sm) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    let sig = significant(&result, &sm);
    // Inside the region `logic` is an identifier; outside it is a keyword.
    assert_eq!(sig[1], (SyntaxKind::Ident, "logic".to_string()));
    assert_eq!(sig[3], (SyntaxKind::KwLogic, "logic".to_string()));
}

#[test]
fn end_keywords_without_begin_is_diagnosed() {
    let (_, diags, _) = preprocess("`end_keywords\n");
    assert_eq!(
        diags.of_kind(DiagnosticKind::MismatchedEndKeywords).count(),
        1
    );
}

#[test]
fn include_splices_file_contents() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("defs.svh"), "`define W 4\n").unwrap();

    let options = PreprocessorOptions {
        include_dirs: vec![dir.path().to_path_buf()],
        ..Default::default()
    };
    let text = "`include \"defs.svh\"\nint w = `W;\n";
    let (result, diags, sm) = preprocess_with(text, &options);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    let sig = significant(&result, &sm);
    let texts: Vec<&str> = sig.iter().map(|(_, t)| t.as_str()).collect();
    assert_eq!(texts, vec!["int", "w", "=", "4", ";"]);
}

#[test]
fn missing_include_is_diagnosed() {
    let (_, diags, _) = preprocess("`include \"nope.svh\"\n");
    assert_eq!(diags.of_kind(DiagnosticKind::IncludeNotFound).count(), 1);
}

#[test]
fn predefines_are_visible() {
    let options = PreprocessorOptions {
        predefines: vec![("SIM".to_string(), "1".to_string())],
        ..Default::default()
    };
    let text = "`ifdef SIM\nint sim = `SIM;\n`endif\n";
    let (result, diags, sm) = preprocess_with(text, &options);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    let texts: Vec<String> = significant(&result, &sm)
        .into_iter()
        .map(|(_, t)| t)
        .collect();
    assert_eq!(texts, vec!["int", "sim", "=", "1", ";"]);
}

#[test]
fn line_directive_overrides_reporting() {
    let text = "`line 100 \"orig.sv\" 0\nint i;\n";
    let (result, diags, sm) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    let int_token = result
        .tokens
        .iter()
        .find(|t| t.kind == SyntaxKind::KwInt)
        .unwrap();
    let loc = sm.resolve(int_token.span);
    assert_eq!(loc.name, "orig.sv");
    assert_eq!(loc.line, 100);
}

#[test]
fn multi_line_define_with_continuation() {
    let text = "`define M(x) x + \\\n  x\nint i = `M(2);\n";
    let (result, diags, sm) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    let texts: Vec<String> = significant(&result, &sm)
        .into_iter()
        .map(|(_, t)| t)
        .collect();
    assert_eq!(texts, vec!["int", "i", "=", "2", "+", "2", ";"]);
}

#[test]
fn macro_args_respect_nested_delimiters() {
    let text = "`define ID(x) x\nint i = `ID({a, b}[0]);\n";
    let (result, diags, sm) = preprocess(text);
    assert!(diags.is_empty(), "{:?}", diags.as_slice());
    let texts: Vec<String> = significant(&result, &sm)
        .into_iter()
        .map(|(_, t)| t)
        .collect();
    assert_eq!(
        texts,
        vec!["int", "i", "=", "{", "a", ",", "b", "}", "[", "0", "]", ";"]
    );
}
