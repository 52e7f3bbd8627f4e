use indoc::indoc;

use svlang_core::diagnostics::{DiagnosticKind, Diagnostics};
use svlang_core::source::SourceManager;

use crate::Error;
use crate::cst::{SyntaxKind, SyntaxNode};
use crate::preprocessor::{Preprocessor, PreprocessorOptions};
use crate::token::Token;

use super::{GuessKind, Parse, Parser};

fn tokenize(text: &str) -> (Vec<Token>, Diagnostics, SourceManager) {
    let mut sm = SourceManager::new();
    let root = sm.add_buffer("test.sv", text);
    let mut diags = Diagnostics::new();
    let options = PreprocessorOptions::default();
    let result = Preprocessor::new(&mut sm, &mut diags, root, &options).run();
    (result.tokens, diags, sm)
}

fn pipeline(text: &str) -> (Parse, Diagnostics, SourceManager) {
    let (tokens, mut diags, sm) = tokenize(text);
    let parse = super::parse_compilation_unit(&sm, &tokens).expect("within fuel limits");
    diags.merge_buffered(parse.diagnostics.clone());
    (parse, diags, sm)
}

fn parse_expr_text(text: &str) -> (Parse, Diagnostics, SourceManager) {
    let (tokens, mut diags, sm) = tokenize(text);
    let parse = super::parse_expression(&sm, &tokens).expect("within fuel limits");
    diags.merge_buffered(parse.diagnostics.clone());
    (parse, diags, sm)
}

fn assert_roundtrip(text: &str) {
    let (parse, _, _) = pipeline(text);
    assert_eq!(parse.root().text().to_string(), text, "round-trip failed");
}

fn find_nodes(root: &SyntaxNode, kind: SyntaxKind) -> Vec<SyntaxNode> {
    root.descendants().filter(|n| n.kind() == kind).collect()
}

#[test]
fn tree_shape_of_a_net_declaration() {
    let (parse, diags, _) = pipeline("wire w;\n");
    assert!(diags.is_empty());
    insta::assert_snapshot!(crate::rewriter::dump_tree(&parse.root()), @r#"
    CompilationUnit
      NetDecl
        KwWire "wire"
        Whitespace " "
        ImplicitType
        Declarator
          Ident "w"
        Semicolon ";"
      Newline "\n"
    "#);
}

#[test]
fn empty_input() {
    let (parse, diags, _) = pipeline("");
    assert!(diags.is_empty());
    assert_eq!(parse.root().kind(), SyntaxKind::CompilationUnit);
}

#[test]
fn roundtrip_simple_module() {
    assert_roundtrip(indoc! {"
        // top module
        module m;
          wire foo;  /* one net */
          assign foo = 1, foo = 'z;
        endmodule
    "});
}

#[test]
fn roundtrip_survives_errors() {
    // Garbage between members is preserved as skipped trivia.
    let text = "module m; ??? wire w; endmodule\n";
    let (parse, diags, _) = pipeline(text);
    assert!(diags.has_errors());
    assert_eq!(parse.root().text().to_string(), text);
}

#[test]
fn roundtrip_with_disabled_region_and_macros() {
    assert_roundtrip(indoc! {"
        `define W 4
        `ifdef UNSET
        module skipped; endmodule
        `endif
        module kept;
          wire [3:0] w;
        endmodule
    "});
}

#[test]
fn seed_assign_parses_clean() {
    let (parse, diags, _) =
        pipeline("module m; wire foo; assign foo = 1, foo = 'z; endmodule\n");
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(find_nodes(&root, SyntaxKind::NetDecl).len(), 1);
    let assigns = find_nodes(&root, SyntaxKind::AssignItem);
    assert_eq!(assigns.len(), 2);
}

#[test]
fn missing_semicolon_yields_synthetic_token() {
    let text = "module m\nwire w;\nendmodule\n";
    let (parse, diags, _) = pipeline(text);
    assert!(
        diags
            .of_kind(DiagnosticKind::ExpectedToken)
            .next()
            .is_some()
    );
    // The tree still round-trips: the missing ';' is zero-width.
    assert_eq!(parse.root().text().to_string(), text);
    assert_eq!(
        find_nodes(&parse.root(), SyntaxKind::ModuleDecl).len(),
        1
    );
}

#[test]
fn skipped_tokens_become_trivia() {
    let text = "module m; wire w; 123 wire v; endmodule\n";
    let (parse, diags, _) = pipeline(text);
    assert!(diags.has_errors());
    let root = parse.root();
    assert_eq!(find_nodes(&root, SyntaxKind::NetDecl).len(), 2);
    assert_eq!(root.text().to_string(), text);
}

#[test]
fn precedence_mul_binds_tighter_than_add() {
    let (parse, diags, _) = parse_expr_text("a + b * c");
    assert!(!diags.has_errors());
    let root = parse.root();
    let top = root
        .children()
        .find(|n| n.kind() == SyntaxKind::BinaryExpr)
        .expect("binary expr");
    // Top node is the addition; its right operand is the multiplication.
    let inner: Vec<_> = top
        .children()
        .filter(|n| n.kind() == SyntaxKind::BinaryExpr)
        .collect();
    assert_eq!(inner.len(), 1);
    assert_eq!(inner[0].text().to_string(), "b * c");
}

#[test]
fn power_is_right_associative() {
    let (parse, _, _) = parse_expr_text("a ** b ** c");
    let top = parse
        .root()
        .children()
        .find(|n| n.kind() == SyntaxKind::BinaryExpr)
        .unwrap();
    let inner: Vec<_> = top
        .children()
        .filter(|n| n.kind() == SyntaxKind::BinaryExpr)
        .collect();
    assert_eq!(inner[0].text().to_string(), "b ** c");
}

#[test]
fn conditional_and_concat_and_replication() {
    let (parse, diags, _) = parse_expr_text("en ? {2{a, b}} : {c, d[3:0]}");
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(find_nodes(&root, SyntaxKind::ConditionalExpr).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::ReplicationExpr).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::ConcatExpr).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::RangeSelect).len(), 1);
}

#[test]
fn casts_and_selects() {
    let (parse, diags, _) = parse_expr_text("int'(a[i]) + sig'(b) + t'(c) + d[7-:4]");
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert!(find_nodes(&root, SyntaxKind::CastExpr).len() >= 2);
    assert_eq!(find_nodes(&root, SyntaxKind::BitSelect).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::RangeSelect).len(), 1);
}

#[test]
fn sized_literal_is_one_literal_node() {
    let (parse, diags, _) = parse_expr_text("8'hFF");
    assert!(!diags.has_errors());
    let literals = find_nodes(&parse.root(), SyntaxKind::Literal);
    assert_eq!(literals.len(), 1);
    assert_eq!(literals[0].text().to_string(), "8'hFF");
}

#[test]
fn inside_expression() {
    let (parse, diags, _) = parse_expr_text("x inside {1, [2:5], y}");
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(find_nodes(&root, SyntaxKind::InsideExpr).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::OpenRange).len(), 1);
}

#[test]
fn hierarchical_and_scoped_names() {
    let (parse, diags, _) = parse_expr_text("pkg::cfg.field[0].x");
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(find_nodes(&root, SyntaxKind::ScopedName).len(), 1);
    assert!(find_nodes(&root, SyntaxKind::MemberExpr).len() >= 2);
}

#[test]
fn statements_in_initial_block() {
    let text = indoc! {"
        module m;
          int i;
          initial begin : main
            if (i > 0) i = i - 1;
            else i <= #5 0;
            for (int j = 0; j < 8; j++) i += j;
            case (i)
              0, 1: i = 2;
              default: i = 3;
            endcase
            forever @(posedge clk) i++;
          end : main
        endmodule
    "};
    let (parse, diags, _) = pipeline(text);
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(parse.root().text().to_string(), text);
    assert_eq!(find_nodes(&root, SyntaxKind::ConditionalStatement).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::ForLoop).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::CaseStatement).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::CaseItem).len(), 2);
    assert_eq!(find_nodes(&root, SyntaxKind::ForeverLoop).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::EventControl).len(), 1);
}

#[test]
fn decl_vs_expression_statement() {
    let text = indoc! {"
        module m;
          function automatic int f(int x);
            my_t y = x;
            y = y + 1;
            return y;
          endfunction
        endmodule
    "};
    let (parse, diags, _) = pipeline(text);
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(find_nodes(&root, SyntaxKind::VariableDeclStatement).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::AssignmentStatement).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::JumpStatement).len(), 1);
}

#[test]
fn ansi_ports_and_param_ports() {
    let text = indoc! {"
        module counter #(parameter WIDTH = 8, localparam MAX = 255) (
          input logic clk,
          input logic rst_n,
          output logic [WIDTH-1:0] count
        );
        endmodule
    "};
    let (parse, diags, _) = pipeline(text);
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(find_nodes(&root, SyntaxKind::AnsiPort).len(), 3);
    assert_eq!(find_nodes(&root, SyntaxKind::ParameterDecl).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::LocalparamDecl).len(), 1);
}

#[test]
fn non_ansi_ports_with_body_decls() {
    let text = indoc! {"
        module m(a, b);
          input a;
          output b;
        endmodule
    "};
    let (parse, diags, _) = pipeline(text);
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(find_nodes(&root, SyntaxKind::NonAnsiPort).len(), 2);
    assert_eq!(find_nodes(&root, SyntaxKind::PortDecl).len(), 2);
}

#[test]
fn port_decl_in_ansi_module_is_diagnosed() {
    let (_, diags, _) = pipeline("module m(input logic a); input b; endmodule\n");
    assert_eq!(
        diags.of_kind(DiagnosticKind::PortDeclInANSIModule).count(),
        1
    );
}

#[test]
fn module_instantiation_forms() {
    let text = indoc! {"
        module top;
          sub #(.W(4)) u0 (.clk(clk), .d(d), .*);
          sub u1 (a, b, c);
        endmodule
    "};
    let (parse, diags, _) = pipeline(text);
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(
        find_nodes(&root, SyntaxKind::HierarchyInstantiation).len(),
        2
    );
    assert_eq!(
        find_nodes(&root, SyntaxKind::HierarchicalInstance).len(),
        2
    );
    assert_eq!(
        find_nodes(&root, SyntaxKind::NamedPortConnection).len(),
        3
    );
    assert_eq!(
        find_nodes(&root, SyntaxKind::WildcardPortConnection).len(),
        1
    );
    assert_eq!(
        find_nodes(&root, SyntaxKind::OrderedPortConnection).len(),
        3
    );
}

#[test]
fn package_import_and_nettype() {
    let text = indoc! {"
        package p;
          nettype logic [3:0] nibble_net;
        endpackage
        module m;
          import p::*;
          nibble_net a = 1;
        endmodule
    "};
    let (parse, diags, _) = pipeline(text);
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(find_nodes(&root, SyntaxKind::NettypeDecl).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::PackageImportDecl).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::DataDecl).len(), 1);
}

#[test]
fn modport_and_clocking() {
    let text = indoc! {"
        interface bus_if(input logic clk);
          logic req, gnt;
          clocking cb @(posedge clk);
            default input #1 output #2;
            input req;
            output gnt;
          endclocking
          modport ctrl (input req, output gnt, import check, clocking cb);
        endinterface
    "};
    let (parse, diags, _) = pipeline(text);
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(parse.root().text().to_string(), text);
    assert_eq!(find_nodes(&root, SyntaxKind::ClockingDecl).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::DefaultSkewItem).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::ClockingItem).len(), 2);
    assert_eq!(find_nodes(&root, SyntaxKind::ModportDecl).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::ModportNamedPort).len(), 2);
    assert_eq!(
        find_nodes(&root, SyntaxKind::ModportSubroutinePortList).len(),
        1
    );
    assert_eq!(find_nodes(&root, SyntaxKind::ModportClockingPort).len(), 1);
}

#[test]
fn udp_non_ansi_with_initial() {
    let text = indoc! {"
        primitive latch (q, clock, data);
          input clock, data;
          output reg q;
          initial q = 1'bx;
          table
            r 0 : ? : 0 ;
            r 1 : ? : 1 ;
          endtable
        endprimitive
    "};
    let (parse, diags, _) = pipeline(text);
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(parse.root().text().to_string(), text);
    assert_eq!(find_nodes(&root, SyntaxKind::UdpDecl).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::UdpPortDecl).len(), 2);
    assert_eq!(find_nodes(&root, SyntaxKind::UdpInitial).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::UdpEntry).len(), 2);
}

#[test]
fn sequence_property_let() {
    let text = indoc! {"
        module m;
          sequence s1 (local input int x, y);
            ##1 x ##[1:2] y;
          endsequence
          property p1 (a, b);
            a |-> ##1 b;
          endproperty
          let max(x, y) = (x > y) ? x : y;
        endmodule
    "};
    let (parse, diags, _) = pipeline(text);
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(find_nodes(&root, SyntaxKind::SequenceDecl).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::PropertyDecl).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::LetDecl).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::AssertionPort).len(), 4);
    assert!(find_nodes(&root, SyntaxKind::SequenceDelayExpr).len() >= 2);
}

#[test]
fn randsequence_statement() {
    let text = indoc! {"
        module m;
          initial begin
            randsequence (main)
              main : first second { done = 1; } ;
              first : add := 3 | sub := 2 ;
              void second (int x) : if (x) add else sub ;
              add : { y = y + 1; } ;
              sub : { y = y - 1; } ;
            endsequence
          end
        endmodule
    "};
    let (parse, diags, _) = pipeline(text);
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(
        find_nodes(&root, SyntaxKind::RandsequenceStatement).len(),
        1
    );
    assert_eq!(find_nodes(&root, SyntaxKind::RsProduction).len(), 5);
    assert_eq!(find_nodes(&root, SyntaxKind::WeightClause).len(), 2);
    assert_eq!(find_nodes(&root, SyntaxKind::RsIfElse).len(), 1);
}

#[test]
fn generate_constructs() {
    let text = indoc! {"
        module m #(parameter N = 4) ();
          genvar i;
          generate
            for (i = 0; i < N; i = i + 1) begin : g
              wire w;
            end
            if (N > 2) begin
              wire big;
            end else begin
              wire small;
            end
          endgenerate
        endmodule
    "};
    let (parse, diags, _) = pipeline(text);
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(find_nodes(&root, SyntaxKind::GenerateRegion).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::LoopGenerate).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::IfGenerate).len(), 1);
    assert_eq!(find_nodes(&root, SyntaxKind::GenvarDecl).len(), 1);
}

#[test]
fn elab_system_tasks() {
    let text = indoc! {"
        module m;
          $info(\"built\");
          $static_assert(1, \"must hold\");
        endmodule
    "};
    let (parse, diags, _) = pipeline(text);
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    assert_eq!(
        find_nodes(&parse.root(), SyntaxKind::ElabSystemTask).len(),
        2
    );
}

#[test]
fn typedef_enum_struct() {
    let text = indoc! {"
        module m;
          typedef enum logic [1:0] { IDLE, RUN = 2 } state_t;
          typedef struct packed { logic a; logic [3:0] b; } fields_t;
          state_t s;
          fields_t f;
        endmodule
    "};
    let (parse, diags, _) = pipeline(text);
    assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    let root = parse.root();
    assert_eq!(find_nodes(&root, SyntaxKind::TypedefDecl).len(), 2);
    assert_eq!(find_nodes(&root, SyntaxKind::EnumMember).len(), 2);
    assert_eq!(find_nodes(&root, SyntaxKind::StructField).len(), 2);
}

#[test]
fn guess_classifies_snippets() {
    let classify = |text: &str| {
        let (tokens, _, sm) = tokenize(text);
        super::parse_guess(&sm, &tokens).expect("within fuel limits").1
    };
    assert_eq!(classify("module m; endmodule"), GuessKind::CompilationUnit);
    assert_eq!(classify("wire w;"), GuessKind::Member);
    assert_eq!(classify("if (a) b = 1;"), GuessKind::Statement);
    assert_eq!(classify("a + b"), GuessKind::Expression);
}

#[test]
fn exec_fuel_exhaustion_is_fatal() {
    let (tokens, _, sm) = tokenize("module m; wire a; wire b; wire c; endmodule\n");

    let mut p = Parser::new(&sm, &tokens).with_exec_fuel(Some(4));
    p.start_node(SyntaxKind::CompilationUnit);
    while !p.at_eof() {
        p.parse_member();
    }
    p.eat_remaining_trivia();
    p.finish_node();

    let err = p.finish().expect_err("fuel ran out");
    assert!(matches!(err, Error::ExecFuelExhausted));
}

#[test]
fn exec_fuel_limit_is_configurable() {
    let (tokens, _, sm) = tokenize("module m; wire w; endmodule\n");

    // Unlimited fuel parses the same input fine.
    let mut p = Parser::new(&sm, &tokens).with_exec_fuel(None);
    p.start_node(SyntaxKind::CompilationUnit);
    while !p.at_eof() {
        p.parse_member();
    }
    p.eat_remaining_trivia();
    p.finish_node();
    assert!(p.finish().is_ok());
}

#[test]
fn deep_nesting_exhausts_recursion_fuel() {
    let depth = 600;
    let text = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    let (tokens, _, sm) = tokenize(&text);
    let err = super::parse_expression(&sm, &tokens).expect_err("nested past the limit");
    assert!(matches!(err, Error::RecursionLimitExceeded));
}

#[test]
fn span_map_points_into_original_file() {
    let text = "module m;\nwire w;\nendmodule\n";
    let (parse, _, sm) = pipeline(text);
    let root = parse.root();
    let wire = root
        .descendants_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == SyntaxKind::KwWire)
        .unwrap();
    let span = parse
        .span_map
        .file_span(wire.text_range().start())
        .unwrap();
    assert_eq!(sm.text_slice(span), "wire");
    let loc = sm.resolve(span);
    assert_eq!(loc.line, 2);
}
