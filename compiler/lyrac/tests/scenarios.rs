//! End-to-end scenarios: programs built through the AST builder, linked,
//! checked, and interpreted.

use pretty_assertions::assert_eq;

use lyra_diagnostic::ErrorCode;
use lyra_eval::QuantumProcessor;
use lyra_ir::{
    AstBuilder, BinaryOp, Decl, FunctionDecl, InstanceCategory, Program, Shared,
    SharedFunctionDecl, StmtId, TypeInstance, Variable, GLOBAL_NS,
};
use lyra_patterns::Value;
use lyrac::{CompileOptions, Compiler};

fn list_of(builder: &AstBuilder<'_>, element: &str) -> TypeInstance {
    TypeInstance::container(
        builder.ident_token("list"),
        InstanceCategory::List,
        vec![builder.instance(element)],
    )
}

/// `__main__ = (args: [string]) -> <ret>: <body>`
fn main_function(
    builder: &AstBuilder<'_>,
    body: StmtId,
    ret: TypeInstance,
) -> SharedFunctionDecl {
    let mut args = Variable::new(builder.ident_token("args"), GLOBAL_NS, false);
    args.set_instance(list_of(builder, "string"));

    let mut decl = FunctionDecl::new(
        builder.ident_token("__main__"),
        GLOBAL_NS,
        "main.__main__",
        ret,
    );
    decl.add_param("args", Shared::new(args));
    decl.set_body(body);
    Shared::new(decl)
}

#[test]
fn arithmetic_through_a_variable() {
    // var x : int = 1 + 2
    // return x
    let mut compiler = Compiler::new(CompileOptions::default());
    let mut program = Program::new("main.lyra");

    let mut builder = AstBuilder::new(compiler.compilation_mut(), "main.lyra");
    let one = builder.int("1");
    let two = builder.int("2");
    let sum = builder.binary(BinaryOp::Add, one, two);
    let int_inst = builder.instance("int");
    let (decl_stmt, x_var) = builder.var_stmt("x", true, Some(int_inst), Some(sum));
    let x = builder.ident("x");
    let ret = builder.return_stmt(Some(x));
    let body = builder.block(vec![decl_stmt, ret]);
    let main = main_function(&builder, body, builder.instance("int"));

    program.add_decl(GLOBAL_NS, Decl::Function(main));
    compiler.load(program).unwrap();
    assert!(compiler.compile("main"), "{:?}", compiler.sink().diagnostics());

    // the declared instance resolved to int
    assert_eq!(
        x_var.borrow().instance().unwrap().to_string(),
        "int"
    );

    let out = compiler.run("main", &[]).unwrap();
    assert_eq!(out, Value::Int(3));
}

#[test]
fn list_subscripts_yield_maybe() {
    // val xs = [1, 2, 3]
    // return xs[1]
    let mut compiler = Compiler::new(CompileOptions::default());
    let mut program = Program::new("main.lyra");

    let mut builder = AstBuilder::new(compiler.compilation_mut(), "main.lyra");
    let one = builder.int("1");
    let two = builder.int("2");
    let three = builder.int("3");
    let xs_list = builder.list(vec![one, two, three]);
    let (decl_stmt, _) = builder.var_stmt("xs", false, None, Some(xs_list));
    let xs = builder.ident("xs");
    let key = builder.int("1");
    let subscript = builder.binary(BinaryOp::Subscript, xs, key);
    let ret = builder.return_stmt(Some(subscript));
    let body = builder.block(vec![decl_stmt, ret]);
    let maybe_int = builder.instance_with("maybe", vec![builder.instance("int")]);
    let main = main_function(&builder, body, maybe_int);

    program.add_decl(GLOBAL_NS, Decl::Function(main));
    compiler.load(program).unwrap();
    assert!(compiler.compile("main"), "{:?}", compiler.sink().diagnostics());

    assert_eq!(
        compiler
            .compilation()
            .facts
            .instance(subscript)
            .unwrap()
            .to_string(),
        "maybe(int)"
    );

    let out = compiler.run("main", &[]).unwrap();
    assert_eq!(out, Value::just(Value::Int(2)));
}

#[test]
fn out_of_range_subscript_yields_none() {
    // val xs = [1]
    // return xs[9]
    let mut compiler = Compiler::new(CompileOptions::default());
    let mut program = Program::new("main.lyra");

    let mut builder = AstBuilder::new(compiler.compilation_mut(), "main.lyra");
    let one = builder.int("1");
    let xs_list = builder.list(vec![one]);
    let (decl_stmt, _) = builder.var_stmt("xs", false, None, Some(xs_list));
    let xs = builder.ident("xs");
    let key = builder.int("9");
    let subscript = builder.binary(BinaryOp::Subscript, xs, key);
    let ret = builder.return_stmt(Some(subscript));
    let body = builder.block(vec![decl_stmt, ret]);
    let maybe_int = builder.instance_with("maybe", vec![builder.instance("int")]);
    let main = main_function(&builder, body, maybe_int);

    program.add_decl(GLOBAL_NS, Decl::Function(main));
    compiler.load(program).unwrap();
    assert!(compiler.compile("main"));

    let out = compiler.run("main", &[]).unwrap();
    assert_eq!(out, Value::none());
}

#[test]
fn empty_list_subscript_yields_none() {
    // val xs : [int] = []
    // return xs[0]
    let mut compiler = Compiler::new(CompileOptions::default());
    let mut program = Program::new("main.lyra");

    let mut builder = AstBuilder::new(compiler.compilation_mut(), "main.lyra");
    let empty = builder.list(vec![]);
    let (decl_stmt, _) = builder.var_stmt("xs", false, Some(list_of(&builder, "int")), Some(empty));
    let xs = builder.ident("xs");
    let key = builder.int("0");
    let subscript = builder.binary(BinaryOp::Subscript, xs, key);
    let ret = builder.return_stmt(Some(subscript));
    let body = builder.block(vec![decl_stmt, ret]);
    let maybe_int = builder.instance_with("maybe", vec![builder.instance("int")]);
    let main = main_function(&builder, body, maybe_int);

    program.add_decl(GLOBAL_NS, Decl::Function(main));
    compiler.load(program).unwrap();
    assert!(compiler.compile("main"), "{:?}", compiler.sink().diagnostics());

    let out = compiler.run("main", &[]).unwrap();
    assert_eq!(out, Value::none());
}

#[test]
fn generic_identity_specialises_exactly_once() {
    // function id : T = (x: T) -> T: return x
    // __main__: id(false); return id(true)
    let mut compiler = Compiler::new(CompileOptions::default());
    let mut program = Program::new("main.lyra");

    let mut builder = AstBuilder::new(compiler.compilation_mut(), "main.lyra");
    let x_body = builder.ident("x");
    let ret_x = builder.return_stmt(Some(x_body));
    let id_body = builder.block(vec![ret_x]);

    let mut x_param = Variable::new(builder.ident_token("x"), GLOBAL_NS, false);
    x_param.set_instance(builder.instance("T"));
    let mut id_fn = FunctionDecl::new(
        builder.ident_token("id"),
        GLOBAL_NS,
        "main.id",
        builder.instance("T"),
    );
    id_fn.add_constraint(builder.ident_token("T"));
    id_fn.add_param("x", Shared::new(x_param));
    id_fn.set_body(id_body);
    let id_fn = Shared::new(id_fn);

    let f = builder.ident("false");
    let warmup = builder.call("id", vec![f]);
    let warmup_stmt = builder.expr_stmt(warmup);
    let t = builder.ident("true");
    let call = builder.call("id", vec![t]);
    let ret = builder.return_stmt(Some(call));
    let body = builder.block(vec![warmup_stmt, ret]);
    let main = main_function(&builder, body, builder.instance("bool"));

    program.add_decl(GLOBAL_NS, Decl::Function(id_fn.clone()));
    program.add_decl(GLOBAL_NS, Decl::Function(main));
    compiler.load(program).unwrap();
    assert!(compiler.compile("main"), "{:?}", compiler.sink().diagnostics());

    // both calls share the one id(bool) specialisation
    let specialisations: Vec<String> = id_fn
        .borrow()
        .specialisations()
        .map(|(mangled, _)| mangled.clone())
        .collect();
    assert_eq!(specialisations.len(), 1);
    assert!(specialisations[0].starts_with("id(bool)"));

    let out = compiler.run("main", &[]).unwrap();
    assert_eq!(out, Value::bool(true));
}

#[test]
fn match_binds_captures_into_the_enclosing_scope() {
    // if Just(3) === Just(n: int): return n
    // return 0
    let mut compiler = Compiler::new(CompileOptions::default());
    let mut program = Program::new("main.lyra");

    let mut builder = AstBuilder::new(compiler.compilation_mut(), "main.lyra");
    let three = builder.int("3");
    let just_three = builder.call("Just", vec![three]);
    let n_pat = builder.ident("n");
    let n_ann = builder.instance("int");
    builder.annotate(n_pat, n_ann);
    let pattern = builder.call("Just", vec![n_pat]);
    let matched = builder.match_(just_three, pattern, false);

    let n_use = builder.ident("n");
    let ret_n = builder.return_stmt(Some(n_use));
    let then_block = builder.block(vec![ret_n]);
    let if_stmt = builder.if_stmt(vec![(matched, then_block)], None);
    let zero = builder.int("0");
    let ret_zero = builder.return_stmt(Some(zero));
    let body = builder.block(vec![if_stmt, ret_zero]);
    let main = main_function(&builder, body, builder.instance("int"));

    program.add_decl(GLOBAL_NS, Decl::Function(main));
    compiler.load(program).unwrap();
    assert!(compiler.compile("main"), "{:?}", compiler.sink().diagnostics());

    let out = compiler.run("main", &[]).unwrap();
    assert_eq!(out, Value::Int(3));
}

#[test]
fn unmatched_pattern_produces_false_and_no_binding() {
    // if Just(3) === None: return 1
    // return 0
    let mut compiler = Compiler::new(CompileOptions::default());
    let mut program = Program::new("main.lyra");

    let mut builder = AstBuilder::new(compiler.compilation_mut(), "main.lyra");
    let three = builder.int("3");
    let just_three = builder.call("Just", vec![three]);
    let none_pat = builder.ident("None");
    let matched = builder.match_(just_three, none_pat, false);

    let one = builder.int("1");
    let ret_one = builder.return_stmt(Some(one));
    let then_block = builder.block(vec![ret_one]);
    let if_stmt = builder.if_stmt(vec![(matched, then_block)], None);
    let zero = builder.int("0");
    let ret_zero = builder.return_stmt(Some(zero));
    let body = builder.block(vec![if_stmt, ret_zero]);
    let main = main_function(&builder, body, builder.instance("int"));

    program.add_decl(GLOBAL_NS, Decl::Function(main));
    compiler.load(program).unwrap();
    assert!(compiler.compile("main"));

    let out = compiler.run("main", &[]).unwrap();
    assert_eq!(out, Value::Int(0));
}

#[test]
fn loops_honour_break_and_continue() {
    // var i : int = 0
    // while true:
    //     i = i + 1
    //     if i == 3:
    //         break
    //     continue
    // return i
    let mut compiler = Compiler::new(CompileOptions::default());
    let mut program = Program::new("main.lyra");

    let mut builder = AstBuilder::new(compiler.compilation_mut(), "main.lyra");
    let zero = builder.int("0");
    let int_inst = builder.instance("int");
    let (i_stmt, _) = builder.var_stmt("i", true, Some(int_inst), Some(zero));

    let i1 = builder.ident("i");
    let one = builder.int("1");
    let incremented = builder.binary(BinaryOp::Add, i1, one);
    let i2 = builder.ident("i");
    let bump = builder.assign(i2, incremented);
    let bump_stmt = builder.expr_stmt(bump);

    let i3 = builder.ident("i");
    let three = builder.int("3");
    let at_three = builder.binary(BinaryOp::Eq, i3, three);
    let break_stmt = builder.break_stmt();
    let break_block = builder.block(vec![break_stmt]);
    let if_stmt = builder.if_stmt(vec![(at_three, break_block)], None);
    let continue_stmt = builder.continue_stmt();

    let loop_body = builder.block(vec![bump_stmt, if_stmt, continue_stmt]);
    let cond = builder.ident("true");
    let while_stmt = builder.while_stmt(cond, loop_body);

    let i4 = builder.ident("i");
    let ret = builder.return_stmt(Some(i4));
    let body = builder.block(vec![i_stmt, while_stmt, ret]);
    let main = main_function(&builder, body, builder.instance("int"));

    program.add_decl(GLOBAL_NS, Decl::Function(main));
    compiler.load(program).unwrap();
    assert!(compiler.compile("main"), "{:?}", compiler.sink().diagnostics());

    let out = compiler.run("main", &[]).unwrap();
    assert_eq!(out, Value::Int(3));
}

#[test]
fn map_access_is_first_match_wins() {
    // val m = {"a": 1, "a": 2}
    // return m["a"]
    let mut compiler = Compiler::new(CompileOptions::default());
    let mut program = Program::new("main.lyra");

    let mut builder = AstBuilder::new(compiler.compilation_mut(), "main.lyra");
    let key1 = builder.string("a");
    let one = builder.int("1");
    let key2 = builder.string("a");
    let two = builder.int("2");
    let map = builder.map(vec![(key1, one), (key2, two)]);
    let (decl_stmt, _) = builder.var_stmt("m", false, None, Some(map));
    let m = builder.ident("m");
    let probe = builder.string("a");
    let lookup = builder.binary(BinaryOp::Subscript, m, probe);
    let ret = builder.return_stmt(Some(lookup));
    let body = builder.block(vec![decl_stmt, ret]);
    let maybe_int = builder.instance_with("maybe", vec![builder.instance("int")]);
    let main = main_function(&builder, body, maybe_int);

    program.add_decl(GLOBAL_NS, Decl::Function(main));
    compiler.load(program).unwrap();
    assert!(compiler.compile("main"), "{:?}", compiler.sink().diagnostics());

    let out = compiler.run("main", &[]).unwrap();
    assert_eq!(out, Value::just(Value::Int(1)));
}

#[test]
fn writing_through_an_immutable_reference_is_rejected() {
    // val a = 0
    // ref r = a
    // dref r = 1
    let mut compiler = Compiler::new(CompileOptions::default());
    let mut program = Program::new("main.lyra");

    let mut builder = AstBuilder::new(compiler.compilation_mut(), "main.lyra");
    let zero = builder.int("0");
    let (a_stmt, _) = builder.var_stmt("a", false, None, Some(zero));
    let a = builder.ident("a");
    let ref_a = builder.reference(a);
    let (r_stmt, _) = builder.var_stmt("r", false, None, Some(ref_a));
    let r = builder.ident("r");
    let dref_r = builder.dereference(r);
    let one = builder.int("1");
    let write = builder.assign(dref_r, one);
    let write_stmt = builder.expr_stmt(write);
    let body = builder.block(vec![a_stmt, r_stmt, write_stmt]);
    let main = main_function(&builder, body, builder.instance("int"));

    program.add_decl(GLOBAL_NS, Decl::Function(main));
    compiler.load(program).unwrap();

    assert!(!compiler.compile("main"));
    let codes: Vec<ErrorCode> = compiler
        .sink()
        .diagnostics()
        .iter()
        .map(|d| d.code)
        .collect();
    assert!(codes.contains(&ErrorCode::E3001), "{codes:?}");

    // interpretation refuses to start
    assert!(compiler.run("main", &[]).is_err());
}

#[test]
fn imported_public_functions_are_callable() {
    // lib.lyra: public function double = (x: int) -> int: return x + x
    // main.lyra: import lib; return double(21)
    let mut compiler = Compiler::new(CompileOptions::default());

    let mut lib = Program::new("lib.lyra");
    let mut builder = AstBuilder::new(compiler.compilation_mut(), "lib.lyra");
    let x1 = builder.ident("x");
    let x2 = builder.ident("x");
    let sum = builder.binary(BinaryOp::Add, x1, x2);
    let ret = builder.return_stmt(Some(sum));
    let double_body = builder.block(vec![ret]);
    let mut x_param = Variable::new(builder.ident_token("x"), GLOBAL_NS, false);
    x_param.set_instance(builder.instance("int"));
    let mut double_fn = FunctionDecl::new(
        builder.ident_token("double"),
        GLOBAL_NS,
        "lib.double",
        builder.instance("int"),
    );
    double_fn.add_param("x", Shared::new(x_param));
    double_fn.set_body(double_body);
    lib.add_decl(GLOBAL_NS, Decl::Function(Shared::new(double_fn)));
    compiler.load(lib).unwrap();

    let mut main_program = Program::new("main.lyra");
    let mut builder = AstBuilder::new(compiler.compilation_mut(), "main.lyra");
    let arg = builder.int("21");
    let call = builder.call("double", vec![arg]);
    let ret = builder.return_stmt(Some(call));
    let body = builder.block(vec![ret]);
    let main = main_function(&builder, body, builder.instance("int"));
    let import_token = builder.ident_token("lib");
    main_program.add_import(import_token, "lib");
    main_program.add_decl(GLOBAL_NS, Decl::Function(main));
    compiler.load(main_program).unwrap();

    assert!(compiler.compile("main"), "{:?}", compiler.sink().diagnostics());
    let out = compiler.run("main", &[]).unwrap();
    assert_eq!(out, Value::Int(42));
}

#[test]
fn import_cycles_are_rejected() {
    let mut compiler = Compiler::new(CompileOptions::default());

    let mut a = Program::new("a.lyra");
    let token_b = lyra_ir::Token::new(lyra_ir::TokenKind::Identifier, "b", 1, 1, "a.lyra");
    a.add_import(token_b, "b");
    compiler.load(a).unwrap();

    let mut b = Program::new("b.lyra");
    let token_a = lyra_ir::Token::new(lyra_ir::TokenKind::Identifier, "a", 1, 1, "b.lyra");
    b.add_import(token_a, "a");
    compiler.load(b).unwrap();

    assert!(!compiler.compile("a"));
    let codes: Vec<ErrorCode> = compiler
        .sink()
        .diagnostics()
        .iter()
        .map(|d| d.code)
        .collect();
    assert!(codes.contains(&ErrorCode::E1004), "{codes:?}");
}

/// A quantum processor that records into a shared log.
struct LoggingProcessor {
    log: Shared<Vec<(String, String, usize, usize)>>,
    next: usize,
}

impl QuantumProcessor for LoggingProcessor {
    fn add_ket(&mut self, label: &str, bits: &str, length: usize) -> (usize, usize) {
        let start = self.next;
        let end = start + length - 1;
        self.next = end + 1;
        self.log
            .borrow_mut()
            .push((label.to_owned(), bits.to_owned(), start, end));
        (start, end)
    }
}

#[test]
fn quantum_variables_register_their_kets() {
    // var q : qubit2 = 0q01 (the ket lexeme is "01")
    // return 0
    let mut compiler = Compiler::new(CompileOptions::default());
    let mut program = Program::new("main.lyra");

    let mut builder = AstBuilder::new(compiler.compilation_mut(), "main.lyra");
    let ket = builder.qubits("01");
    let qubit2 = builder.instance("qubit2");
    let (q_stmt, _) = builder.var_stmt("q", true, Some(qubit2), Some(ket));
    let zero = builder.int("0");
    let ret = builder.return_stmt(Some(zero));
    let body = builder.block(vec![q_stmt, ret]);
    let main = main_function(&builder, body, builder.instance("int"));

    program.add_decl(GLOBAL_NS, Decl::Function(main));
    compiler.load(program).unwrap();
    assert!(compiler.compile("main"), "{:?}", compiler.sink().diagnostics());

    let log = Shared::new(Vec::new());
    let processor = LoggingProcessor {
        log: log.clone(),
        next: 0,
    };
    let out = compiler
        .run_with_processor("main", &[], Box::new(processor))
        .unwrap();
    assert_eq!(out, Value::Int(0));
    assert_eq!(
        log.borrow().as_slice(),
        &[("q".to_owned(), "01".to_owned(), 0, 1)]
    );
}
