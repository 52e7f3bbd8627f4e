use indoc::indoc;

use svlang_core::diagnostics::DiagnosticKind;
use svlang_core::Severity;
use svlang_syntax::{PreprocessorOptions, SyntaxTree};

use crate::{
    Compilation, ConstValue, LookupFlags, LookupLocation, NetKind, ParamValue, SvInt, SymbolId,
    SymbolKind,
};

fn compile(texts: &[&str]) -> Compilation {
    let mut compilation = Compilation::new();
    let options = PreprocessorOptions::default();
    for (index, text) in texts.iter().enumerate() {
        let name = format!("t{index}.sv");
        let tree = SyntaxTree::from_text(text, &name, compilation.sources_mut(), &options)
            .expect("within fuel limits");
        compilation.add_tree(tree);
    }
    compilation.elaborate();
    compilation
}

fn error_count(compilation: &Compilation) -> usize {
    compilation
        .all_diagnostics()
        .iter()
        .filter(|d| d.severity >= Severity::Error)
        .count()
}

fn has_diag(compilation: &Compilation, kind: DiagnosticKind) -> bool {
    compilation.all_diagnostics().iter().any(|d| d.kind == kind)
}

#[test]
fn net_and_continuous_assigns() {
    let mut comp = compile(&["module m; wire foo; assign foo = 1, foo = 'z; endmodule\n"]);
    assert_eq!(error_count(&comp), 0, "{:?}", comp.all_diagnostics());

    let m = comp.find("m").expect("module body");
    let members = comp.members(m).to_vec();
    let nets = members
        .iter()
        .filter(|&&s| matches!(comp.symbol(s).kind, SymbolKind::Net { .. }))
        .count();
    let assigns = members
        .iter()
        .filter(|&&s| matches!(comp.symbol(s).kind, SymbolKind::ContinuousAssign { .. }))
        .count();
    assert_eq!(nets, 1);
    assert_eq!(assigns, 2);
}

#[test]
fn wildcard_import_resolves_nettype() {
    let mut comp = compile(&[
        "package p; nettype logic [3:0] foo; endpackage\n",
        "module m; import p::*; foo a = 1; endmodule\n",
    ]);
    assert_eq!(error_count(&comp), 0, "{:?}", comp.all_diagnostics());

    let a = comp.find("m.a").expect("net a");
    let nettype = match comp.symbol(a).kind {
        SymbolKind::Net {
            net_kind: NetKind::UserDefined(nettype),
            ..
        } => nettype,
        ref other => panic!("expected user-defined net, got {}", other.tag()),
    };
    assert_eq!(comp.symbol_name(nettype), "foo");

    let ty = comp.type_of(a);
    assert_eq!(
        comp.type_interner().display(ty, comp.name_interner()),
        "logic[3:0]"
    );
}

#[test]
fn macro_default_argument_feeds_initializer() {
    let mut comp = compile(&["`define F(x,y=3) x+y\nmodule m; int i = `F(1); endmodule\n"]);
    assert_eq!(error_count(&comp), 0, "{:?}", comp.all_diagnostics());

    let i = comp.find("m.i").expect("variable i");
    let value = comp.initializer_value(i).expect("constant initializer");
    assert_eq!(value, ConstValue::int(4));
}

#[test]
fn mismatched_time_scales() {
    let comp = compile(&[
        "timeunit 10us;\n",
        "module m; timeunit 20ns; endmodule\n",
    ]);
    assert!(has_diag(&comp, DiagnosticKind::MismatchedTimeScales));
}

#[test]
fn sequential_udp_with_initial() {
    let text = indoc! {"
        primitive latch (q, clock, data);
          input clock, data;
          output reg q;
          initial q = 1'bx;
          table
            r 0 : ? : 0 ;
          endtable
        endprimitive
    "};
    let mut comp = compile(&[text]);
    assert_eq!(error_count(&comp), 0, "{:?}", comp.all_diagnostics());

    let latch = comp.find("latch").expect("primitive");
    match &comp.symbol(latch).kind {
        SymbolKind::Primitive { info } => {
            assert!(info.is_sequential);
            assert_eq!(
                info.initial_value,
                Some(SvInt {
                    value: 0,
                    xz: 1,
                    width: 1,
                    signed: false,
                })
            );
            assert_eq!(info.ports.len(), 3);
        }
        other => panic!("expected primitive, got {}", other.tag()),
    }
}

#[test]
fn udp_misuse_is_diagnosed() {
    // Combinational primitive with an initial row, and a port never
    // declared in the body.
    let text = indoc! {"
        primitive bad (q, a, b);
          input a;
          output q;
          initial q = 0;
          table
            0 0 : 0 ;
          endtable
        endprimitive
    "};
    let comp = compile(&[text]);
    assert!(has_diag(&comp, DiagnosticKind::PrimitivePortMissing));
    assert!(has_diag(
        &comp,
        DiagnosticKind::PrimitiveInitialInCombinational
    ));
}

#[test]
fn port_decl_in_ansi_module() {
    let comp = compile(&["module m(input logic a); input b; endmodule\n"]);
    assert!(has_diag(&comp, DiagnosticKind::PortDeclInANSIModule));
}

#[test]
fn identical_parameter_bindings_share_a_body() {
    let mut comp = compile(&[indoc! {"
        module sub #(parameter W = 4) ();
          localparam int D = W * 2;
        endmodule
        module top;
          sub #(8) u0 ();
          sub #(.W(8)) u1 ();
          sub u2 ();
        endmodule
    "}]);
    assert_eq!(error_count(&comp), 0, "{:?}", comp.all_diagnostics());

    let body_of = |comp: &mut Compilation, path: &str| -> SymbolId {
        let instance = comp.find(path).expect(path);
        match comp.symbol(instance).kind {
            SymbolKind::Instance { body } => body,
            ref other => panic!("expected instance, got {}", other.tag()),
        }
    };
    let u0 = body_of(&mut comp, "top.u0");
    let u1 = body_of(&mut comp, "top.u1");
    let u2 = body_of(&mut comp, "top.u2");
    assert_eq!(u0, u1);
    assert_ne!(u0, u2);

    // The bound parameter flows into dependent values.
    let d = comp.find("top.u0.D").expect("localparam D");
    assert_eq!(
        comp.param_value(d),
        Some(ParamValue::Const(ConstValue::int(16)))
    );
    let d2 = comp.find("top.u2.D").expect("default D");
    assert_eq!(
        comp.param_value(d2),
        Some(ParamValue::Const(ConstValue::int(8)))
    );
}

#[test]
fn lookup_is_monotonic_in_source_order() {
    let mut comp = compile(&["module m; int a; int b; endmodule\n"]);
    let m = comp.find("m").unwrap();
    let a = comp.find("m.a").unwrap();
    let b_name = comp.name_interner().get("b").unwrap();

    // At a's declaration point, b is not yet visible.
    let at_a = LookupLocation(comp.symbol(a).decl_index);
    assert_eq!(comp.lookup(m, b_name, at_a, LookupFlags::default()), None);

    let found = comp.lookup(
        m,
        b_name,
        LookupLocation::ANYWHERE,
        LookupFlags::default(),
    );
    assert_eq!(found, comp.find("m.b"));
}

#[test]
fn subroutines_are_visible_before_declaration() {
    let mut comp = compile(&[indoc! {"
        module m;
          int x;
          function int f(int v);
            return v;
          endfunction
        endmodule
    "}]);
    let m = comp.find("m").unwrap();
    let x = comp.find("m.x").unwrap();
    let f_name = comp.name_interner().get("f").unwrap();
    let at_x = LookupLocation(comp.symbol(x).decl_index);
    // f is declared after x but functions are visible anywhere.
    assert!(comp.lookup(m, f_name, at_x, LookupFlags::default()).is_some());
}

#[test]
fn recursive_typedef_is_reported_once() {
    let mut comp = compile(&["module m; typedef b_t a_t; typedef a_t b_t; endmodule\n"]);
    let a = comp.find("m.a_t").unwrap();
    let ty = comp.type_of(a);
    assert!(matches!(
        comp.type_interner().get(ty),
        crate::Type::Error
    ));
    assert!(has_diag(&comp, DiagnosticKind::RecursiveDefinition));
}

#[test]
fn static_assert_formats_and_passes() {
    let comp = compile(&[
        "module m; localparam W = 4; $static_assert(W == 4); endmodule\n",
    ]);
    assert!(!has_diag(&comp, DiagnosticKind::StaticAssert));

    let comp = compile(&[
        "module m; localparam W = 4; $static_assert(W > 8, \"W=%d too small\", W); endmodule\n",
    ]);
    let found = comp
        .all_diagnostics()
        .iter()
        .find(|d| d.kind == DiagnosticKind::StaticAssert)
        .map(|d| d.message())
        .expect("failed assert");
    assert_eq!(found, "static assertion failed: W=4 too small");
}

#[test]
fn fatal_finish_number_is_checked() {
    let comp = compile(&["module m; $fatal(3, \"boom\"); endmodule\n"]);
    assert!(has_diag(&comp, DiagnosticKind::BadFinishNum));

    let comp = compile(&["module m; $fatal(1, \"boom\"); endmodule\n"]);
    assert!(!has_diag(&comp, DiagnosticKind::BadFinishNum));
    let fatal = comp
        .all_diagnostics()
        .iter()
        .find(|d| d.kind == DiagnosticKind::ElabTaskMessage)
        .map(|d| (d.severity, d.message()));
    assert_eq!(fatal, Some((Severity::Fatal, "boom".to_string())));
}

#[test]
fn lifetime_rules() {
    // `automatic` outside a procedural context demotes with a warning.
    let comp = compile(&["module m; automatic int x; endmodule\n"]);
    assert!(has_diag(&comp, DiagnosticKind::AutomaticNotAllowedHere));

    // A static-by-default initialized variable in a function needs the
    // keyword spelled out.
    let comp = compile(&[indoc! {"
        module m;
          function int f();
            int count = 0;
            return count;
          endfunction
        endmodule
    "}]);
    assert!(has_diag(
        &comp,
        DiagnosticKind::StaticInitializerMustBeExplicit
    ));

    let comp = compile(&["module m; const int k; endmodule\n"]);
    assert!(has_diag(&comp, DiagnosticKind::ConstVarWithoutInitializer));
}

#[test]
fn default_nettype_none_blocks_implicit_nets() {
    let mut comp = compile(&[
        "module m; assign foo = 1; endmodule\n",
    ]);
    assert_eq!(error_count(&comp), 0, "{:?}", comp.all_diagnostics());
    let foo = comp.find("m.foo").expect("implicit net");
    assert!(matches!(
        comp.symbol(foo).kind,
        SymbolKind::Net { implicit: true, .. }
    ));

    let comp = compile(&[
        "`default_nettype none\nmodule m; assign foo = 1; endmodule\n",
    ]);
    assert!(has_diag(&comp, DiagnosticKind::UndeclaredIdentifier));
}

#[test]
fn clocking_blocks_and_skews() {
    let mut comp = compile(&[indoc! {"
        module m(input logic clk);
          logic req, gnt;
          clocking cb @(posedge clk);
            default input #1 output #2;
            input req;
            output gnt;
          endclocking
        endmodule
    "}]);
    assert_eq!(error_count(&comp), 0, "{:?}", comp.all_diagnostics());

    let cb = comp.find("m.cb").expect("clocking block");
    match &comp.symbol(cb).kind {
        SymbolKind::ClockingBlock {
            default_input_skew,
            default_output_skew,
        } => {
            assert_eq!(default_input_skew.unwrap().delay.unwrap().as_i64(), 1);
            assert_eq!(default_output_skew.unwrap().delay.unwrap().as_i64(), 2);
        }
        other => panic!("expected clocking block, got {}", other.tag()),
    }

    // The output var links to the driven signal and registers as a driver.
    let gnt_var = comp.find("m.cb.gnt").expect("clocking var");
    assert!(matches!(
        comp.symbol(gnt_var).kind,
        SymbolKind::ClockingVar { .. }
    ));
    let gnt = comp.find("m.gnt").unwrap();
    assert_eq!(comp.drivers_of(gnt), &[cb]);
}

#[test]
fn duplicate_default_skew_is_diagnosed() {
    let comp = compile(&[indoc! {"
        module m(input logic clk);
          clocking cb @(posedge clk);
            default input #1;
            default input #2;
          endclocking
        endmodule
    "}]);
    assert!(has_diag(&comp, DiagnosticKind::MultipleDefaultInputSkew));
}

#[test]
fn modport_rules() {
    let mut comp = compile(&[indoc! {"
        interface bus;
          logic req, gnt;
          function void check();
          endfunction
          modport ctrl (input req, output gnt, import check);
        endinterface
    "}]);
    assert_eq!(error_count(&comp), 0, "{:?}", comp.all_diagnostics());
    let ctrl = comp.find("bus.ctrl").expect("modport");
    assert_eq!(comp.members(ctrl).len(), 3);

    // A subroutine cannot be a simple (directional) modport port.
    let comp = compile(&[indoc! {"
        interface bus;
          function void check();
          endfunction
          modport ctrl (input check);
        endinterface
    "}]);
    assert!(has_diag(&comp, DiagnosticKind::BadModportPort));
}

#[test]
fn assertion_port_rules() {
    let comp = compile(&[indoc! {"
        module m;
          property p (local output int x = 1);
            x |-> x;
          endproperty
        endmodule
    "}]);
    assert!(has_diag(&comp, DiagnosticKind::AssertionPortDirection));
    assert!(has_diag(&comp, DiagnosticKind::AssertionPortOutputDefault));
}

#[test]
fn enum_members_spill_into_scope() {
    let mut comp = compile(&[indoc! {"
        module m;
          typedef enum { A, B = 5, C } e_t;
          localparam int P = C;
        endmodule
    "}]);
    assert_eq!(error_count(&comp), 0, "{:?}", comp.all_diagnostics());
    let p = comp.find("m.P").unwrap();
    assert_eq!(
        comp.param_value(p),
        Some(ParamValue::Const(ConstValue::int(6)))
    );
}

#[test]
fn generate_loops_bind_indexed_blocks() {
    let mut comp = compile(&[indoc! {"
        module m #(parameter N = 3) ();
          genvar i;
          generate
            for (i = 0; i < N; i = i + 1) begin : g
              wire w;
            end
            if (N > 1) begin : big
              wire wide;
            end
          endgenerate
        endmodule
    "}]);
    assert_eq!(error_count(&comp), 0, "{:?}", comp.all_diagnostics());
    assert!(comp.find("m.g[0].w").is_some());
    assert!(comp.find("m.g[2].w").is_some());
    assert!(comp.find("m.g[3]").is_none());
    assert!(comp.find("m.big.wide").is_some());
}

#[test]
fn randsequence_productions_resolve() {
    let mut comp = compile(&[indoc! {"
        module m;
          int y;
          initial begin
            randsequence (main)
              main : first second ;
              first : { y = y + 1; } ;
              second : missing ;
            endsequence
          end
        endmodule
    "}]);
    assert!(has_diag(&comp, DiagnosticKind::UndeclaredIdentifier));
    let m = comp.find("m").unwrap();
    let members = comp.members(m).to_vec();
    let block = members
        .iter()
        .find(|&&s| matches!(comp.symbol(s).kind, SymbolKind::ProceduralBlock { .. }))
        .copied()
        .expect("procedural block");
    let productions = comp
        .members(block)
        .iter()
        .filter(|&&s| matches!(comp.symbol(s).kind, SymbolKind::RsProduction { .. }))
        .count();
    assert_eq!(productions, 3);
}

#[test]
fn duplicate_names_are_diagnosed() {
    let comp = compile(&["module m; wire w; logic w; endmodule\n"]);
    assert!(has_diag(&comp, DiagnosticKind::DuplicateDefinition));
}

#[test]
fn unknown_module_instantiation() {
    let comp = compile(&["module top; nosuch u0 (); endmodule\n"]);
    assert!(has_diag(&comp, DiagnosticKind::UnknownModule));
}

#[test]
fn bad_port_connections() {
    let comp = compile(&[indoc! {"
        module sub (input logic a);
        endmodule
        module top;
          sub u0 (.a(1), .a(2));
          sub u1 (.nope(1));
        endmodule
    "}]);
    assert!(has_diag(&comp, DiagnosticKind::DuplicatePortConnection));
    assert!(has_diag(&comp, DiagnosticKind::UnknownPort));
}

#[test]
fn package_net_initializer_is_rejected() {
    let comp = compile(&["package p; wire w = 1; endpackage\n"]);
    assert!(has_diag(&comp, DiagnosticKind::NetInitializerInPackage));
}

#[test]
fn add_file_propagates_load_errors() {
    let mut comp = Compilation::new();
    let options = PreprocessorOptions::default();
    let err = comp.add_file("/does/not/exist.sv", &options);
    assert!(matches!(err, Err(crate::Error::Syntax(_))));
}

#[test]
fn net_delay_resolves_lazily() {
    let mut comp = compile(&["module m; wire #5 w; endmodule\n"]);
    assert_eq!(error_count(&comp), 0, "{:?}", comp.all_diagnostics());
    let w = comp.find("m.w").unwrap();
    assert_eq!(comp.net_delay(w).map(|v| v.as_i64()), Some(5));
    // Second query hits the memoized value.
    assert_eq!(comp.net_delay(w).map(|v| v.as_i64()), Some(5));
}
