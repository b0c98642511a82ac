//! Semantic analysis for the Lyra compiler.
//!
//! The pipeline stages, in the order a declaration meets them:
//! - `instance_check`: validate and resolve type instances
//! - `infer`: attach a type instance to every expression, resolve
//!   callees, rewrite dot/subscript sugar
//! - `check`: enforce expression and declaration well-formedness
//! - `specialise`: clone generic templates under constraint bindings
//! - `builtins`: the declarations the other stages resolve against
//!
//! Everything operates on a borrowed [`Sema`] view of one compilation;
//! results land in the compilation's side tables, never on AST nodes.

pub mod builtins;
mod check;
mod context;
mod env;
mod error;
mod infer;
mod instance_check;
mod mangle;
mod specialise;

pub use check::{
    check_function_body, check_function_decl, check_global_variable, check_statement,
    check_type_decl, check_variable, CheckCtx, PatternContext,
};
pub use context::Sema;
pub use error::SemaError;
pub use instance_check::complex_check;
pub use mangle::mangle_function;
pub use specialise::{specialise_function, Bindings};

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use lyra_ir::{
        AstBuilder, BinaryOp, CallKind, Compilation, Program, Shared, TokenKind, GLOBAL_NS,
    };

    use super::*;

    fn checked_program() -> (Compilation, Program) {
        let mut comp = Compilation::new();
        let program = Program::new("main.lyra");
        builtins::install(&program.scope).unwrap();
        (comp, program)
    }

    #[test]
    fn literal_inference() {
        let (mut comp, program) = checked_program();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let int_lit = builder.int("42");
        let float_lit = builder.float("1.5");
        let string_lit = builder.string("hello");
        let bits = builder.bits("0110");

        let mut sema = Sema::new(&mut comp);
        assert_eq!(
            sema.infer(int_lit, &program.scope, GLOBAL_NS).unwrap().name(),
            "int"
        );
        assert_eq!(
            sema.infer(float_lit, &program.scope, GLOBAL_NS)
                .unwrap()
                .name(),
            "float"
        );
        assert_eq!(
            sema.infer(string_lit, &program.scope, GLOBAL_NS)
                .unwrap()
                .name(),
            "string"
        );
        assert_eq!(
            sema.infer(bits, &program.scope, GLOBAL_NS).unwrap().name(),
            "bit4"
        );
    }

    #[test]
    fn bad_bit_width_is_rejected() {
        let (mut comp, program) = checked_program();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let bits = builder.bits("011");

        let mut sema = Sema::new(&mut comp);
        let err = sema.infer(bits, &program.scope, GLOBAL_NS).unwrap_err();
        assert!(matches!(err, SemaError::InvalidExpression { .. }));
    }

    #[test]
    fn binary_add_resolves_the_int_builtin() {
        let (mut comp, program) = checked_program();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let one = builder.int("1");
        let two = builder.int("2");
        let sum = builder.binary(BinaryOp::Add, one, two);

        let mut sema = Sema::new(&mut comp);
        let inst = sema.infer(sum, &program.scope, GLOBAL_NS).unwrap();
        assert_eq!(inst.name(), "int");

        let callee = comp.facts.callee(sum).unwrap();
        assert_eq!(callee.mangled, "__add__(int,int)->int");
        assert_eq!(callee.arity, 2);
        assert!(comp.registry.get(callee).is_some());
    }

    #[test]
    fn nullary_constructor_identifier_infers_its_type() {
        let (mut comp, program) = checked_program();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let t = builder.ident("true");
        let none = builder.ident("None");

        let mut sema = Sema::new(&mut comp);
        assert_eq!(sema.infer(t, &program.scope, GLOBAL_NS).unwrap().name(), "bool");

        let maybe = sema.infer(none, &program.scope, GLOBAL_NS).unwrap();
        assert_eq!(maybe.name(), "maybe");
        assert!(maybe.is_parametrized());
    }

    #[test]
    fn just_application_binds_the_standin() {
        let (mut comp, program) = checked_program();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let three = builder.int("3");
        let just = builder.call("Just", vec![three]);

        let mut sema = Sema::new(&mut comp);
        let inst = sema.infer(just, &program.scope, GLOBAL_NS).unwrap();
        assert_eq!(inst.to_string(), "maybe(int)");
        assert!(inst.is_complete());
        assert_eq!(
            comp.facts.call_kind(just),
            Some(CallKind::DefaultConstructor)
        );
    }

    #[test]
    fn list_subscript_synthesises_maybe() {
        let (mut comp, program) = checked_program();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let one = builder.int("1");
        let two = builder.int("2");
        let xs = builder.list(vec![one, two]);
        let key = builder.int("1");
        let subscript = builder.binary(BinaryOp::Subscript, xs, key);

        let mut sema = Sema::new(&mut comp);
        let inst = sema.infer(subscript, &program.scope, GLOBAL_NS).unwrap();
        assert_eq!(inst.to_string(), "maybe(int)");
    }

    #[test]
    fn map_literal_records_hash_and_eq_callees() {
        let (mut comp, program) = checked_program();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let key = builder.string("a");
        let value = builder.int("1");
        let map = builder.map(vec![(key, value)]);

        let mut sema = Sema::new(&mut comp);
        let inst = sema.infer(map, &program.scope, GLOBAL_NS).unwrap();
        assert_eq!(inst.to_string(), "{string:int}");

        let ops = comp.facts.map_ops(map).unwrap();
        assert_eq!(ops.hash.mangled, "__hash__(string)->int");
        assert_eq!(ops.eq.mangled, "__eq__(int,int)->bool");
    }

    #[test]
    fn mixed_list_elements_are_rejected() {
        let (mut comp, program) = checked_program();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let one = builder.int("1");
        let s = builder.string("two");
        let xs = builder.list(vec![one, s]);

        let mut sema = Sema::new(&mut comp);
        let err = sema.infer(xs, &program.scope, GLOBAL_NS).unwrap_err();
        assert!(matches!(err, SemaError::InvalidExpression { .. }));
    }

    #[test]
    fn annotation_must_weakly_match() {
        let (mut comp, program) = checked_program();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let lit = builder.int("42");
        let ann = builder.instance("string");
        builder.annotate(lit, ann);

        let mut sema = Sema::new(&mut comp);
        let err = sema.infer(lit, &program.scope, GLOBAL_NS).unwrap_err();
        assert!(matches!(err, SemaError::InvalidExpression { .. }));
    }

    #[test]
    fn reference_of_reference_is_rejected() {
        let (mut comp, program) = checked_program();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let (_, var) = builder.var_stmt("x", true, None, None);
        var.borrow_mut().set_instance({
            let mut inst = builder.instance("int");
            complex_check(&mut inst, &program.scope, GLOBAL_NS, &[]).unwrap();
            inst
        });
        program
            .scope
            .borrow_mut()
            .add_variable(GLOBAL_NS, var)
            .unwrap();

        let x = builder.ident("x");
        let r1 = builder.reference(x);
        let r2 = builder.reference(r1);

        let mut sema = Sema::new(&mut comp);
        let err = sema.infer(r2, &program.scope, GLOBAL_NS).unwrap_err();
        assert!(matches!(err, SemaError::InvalidExpression { .. }));
    }

    #[test]
    fn checking_is_idempotent() {
        let (mut comp, program) = checked_program();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let one = builder.int("1");
        let two = builder.int("2");
        let sum = builder.binary(BinaryOp::Add, one, two);

        let mut sema = Sema::new(&mut comp);
        let first = sema.check_expression(sum, &program.scope, GLOBAL_NS).unwrap();
        let callee_first = comp.facts.callee(sum).unwrap().clone();

        let mut sema = Sema::new(&mut comp);
        let second = sema.check_expression(sum, &program.scope, GLOBAL_NS).unwrap();
        let callee_second = comp.facts.callee(sum).unwrap().clone();

        assert!(first.strong_eq(&second));
        assert_eq!(callee_first, callee_second);
    }

    #[test]
    fn weak_follows_strong() {
        // strong(A, B) implies weak(A, B)
        let (mut comp, program) = checked_program();
        let builder = AstBuilder::new(&mut comp, "main.lyra");
        let mut a = builder.instance("int");
        let mut b = builder.instance("int");
        complex_check(&mut a, &program.scope, GLOBAL_NS, &[]).unwrap();
        complex_check(&mut b, &program.scope, GLOBAL_NS, &[]).unwrap();

        assert!(a.strong_eq(&b));
        assert!(a.weak_eq(&b));
    }

    #[test]
    fn generic_identity_specialises_once() {
        use lyra_ir::{FunctionDecl, Token, Variable};

        let (mut comp, program) = checked_program();

        // function id : T = (x: T) -> T: return x
        let t_token = Token::synthetic(TokenKind::Identifier, "T");
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let x_ret = builder.ident("x");
        let ret_stmt = builder.return_stmt(Some(x_ret));
        let body = builder.block(vec![ret_stmt]);

        let x_tok = builder.ident_token("x");
        let t_inst = builder.instance("T");
        let mut x_var = Variable::new(x_tok, GLOBAL_NS, false);
        x_var.set_instance(t_inst.clone());
        let x_var = Shared::new(x_var);

        let mut id_fn = FunctionDecl::new(
            builder.ident_token("id"),
            GLOBAL_NS,
            "main.id",
            t_inst,
        );
        id_fn.add_constraint(t_token);
        id_fn.add_param("x", x_var);
        id_fn.set_body(body);
        let id_fn = Shared::new(id_fn);
        program
            .scope
            .borrow_mut()
            .add_function(GLOBAL_NS, id_fn.clone())
            .unwrap();

        let mut sema = Sema::new(&mut comp);
        check_function_decl(&mut sema, &id_fn, &program.scope, GLOBAL_NS).unwrap();

        // id(true) twice: one specialisation, one registry entry
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let arg1 = builder.ident("true");
        let call1 = builder.call("id", vec![arg1]);
        let arg2 = builder.ident("false");
        let call2 = builder.call("id", vec![arg2]);

        let mut sema = Sema::new(&mut comp);
        let inst1 = sema
            .check_expression(call1, &program.scope, GLOBAL_NS)
            .unwrap();
        let inst2 = sema
            .check_expression(call2, &program.scope, GLOBAL_NS)
            .unwrap();

        assert_eq!(inst1.name(), "bool");
        assert!(inst1.strong_eq(&inst2));

        let callee1 = comp.facts.callee(call1).unwrap();
        let callee2 = comp.facts.callee(call2).unwrap();
        assert_eq!(callee1, callee2);
        assert!(callee1.mangled.starts_with("id(bool)"));
        assert_eq!(id_fn.borrow().specialisations().count(), 1);
    }
}
