//! Lyra eval - the tree-walking interpreter.
//!
//! Consumes a checked compilation: every expression carries a type
//! instance in the side tables and every call node a resolved callee
//! triple. Interpretation is strictly single-threaded and synchronous;
//! the first runtime error aborts the walk.
//!
//! Value types and the builtin registry are re-exported from
//! `lyra_patterns` for convenience.

pub mod diagnostics;
mod environment;
mod exec;
mod qprocessor;
mod step;

pub use environment::Environment;
pub use exec::Interpreter;
pub use qprocessor::{KetRecord, QuantumProcessor, RecordingProcessor};
pub use step::Step;

// Re-export value types from lyra_patterns
pub use lyra_patterns::{BuiltinFn, BuiltinRegistry, EvalError, EvalResult, Value, ValueSlot};

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use lyra_ir::{AstBuilder, BinaryOp, Compilation, Program, GLOBAL_NS};
    use lyra_types::{builtins, Sema};

    use super::*;

    fn setup() -> (Compilation, Program) {
        let comp = Compilation::new();
        let program = Program::new("main.lyra");
        builtins::install(&program.scope).unwrap();
        (comp, program)
    }

    #[test]
    fn arithmetic_expression_evaluates() {
        let (mut comp, program) = setup();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let one = builder.int("1");
        let two = builder.int("2");
        let sum = builder.binary(BinaryOp::Add, one, two);

        let mut sema = Sema::new(&mut comp);
        sema.check_expression(sum, &program.scope, GLOBAL_NS).unwrap();

        comp.add_program(program);
        let mut interp = Interpreter::new(&comp, "main");
        let scope = comp.program("main").unwrap().scope.clone();
        let mut env = Environment::new();
        let out = interp.eval_expr(sum, &mut env, &scope, GLOBAL_NS).unwrap();
        assert_eq!(out, Value::Int(3));
    }

    #[test]
    fn list_subscript_wraps_in_maybe() {
        let (mut comp, program) = setup();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let one = builder.int("1");
        let two = builder.int("2");
        let three = builder.int("3");
        let xs = builder.list(vec![one, two, three]);
        let in_range_key = builder.int("1");
        let in_range = builder.binary(BinaryOp::Subscript, xs, in_range_key);

        let xs2_1 = builder.int("1");
        let xs2 = builder.list(vec![xs2_1]);
        let out_key = builder.int("9");
        let out_of_range = builder.binary(BinaryOp::Subscript, xs2, out_key);

        let mut sema = Sema::new(&mut comp);
        sema.check_expression(in_range, &program.scope, GLOBAL_NS)
            .unwrap();
        sema.check_expression(out_of_range, &program.scope, GLOBAL_NS)
            .unwrap();

        comp.add_program(program);
        let mut interp = Interpreter::new(&comp, "main");
        let scope = comp.program("main").unwrap().scope.clone();
        let mut env = Environment::new();
        assert_eq!(
            interp
                .eval_expr(in_range, &mut env, &scope, GLOBAL_NS)
                .unwrap(),
            Value::just(Value::Int(2))
        );
        assert_eq!(
            interp
                .eval_expr(out_of_range, &mut env, &scope, GLOBAL_NS)
                .unwrap(),
            Value::none()
        );
    }

    #[test]
    fn map_lookup_is_first_match_wins() {
        let (mut comp, program) = setup();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let key_a1 = builder.string("a");
        let one = builder.int("1");
        let key_a2 = builder.string("a");
        let two = builder.int("2");
        let map = builder.map(vec![(key_a1, one), (key_a2, two)]);
        let probe = builder.string("a");
        let lookup = builder.binary(BinaryOp::Subscript, map, probe);

        let mut sema = Sema::new(&mut comp);
        sema.check_expression(lookup, &program.scope, GLOBAL_NS)
            .unwrap();

        comp.add_program(program);
        let mut interp = Interpreter::new(&comp, "main");
        let scope = comp.program("main").unwrap().scope.clone();
        let mut env = Environment::new();
        assert_eq!(
            interp
                .eval_expr(lookup, &mut env, &scope, GLOBAL_NS)
                .unwrap(),
            Value::just(Value::Int(1))
        );
    }

    #[test]
    fn match_binds_captures_on_success_only() {
        let (mut comp, program) = setup();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");

        // Just(3) === Just(n: int)
        let three = builder.int("3");
        let just_three = builder.call("Just", vec![three]);
        let n = builder.ident("n");
        let n_ann = builder.instance("int");
        builder.annotate(n, n_ann);
        let pattern = builder.call("Just", vec![n]);
        let matched = builder.match_(just_three, pattern, false);

        // Just(3) === None
        let three2 = builder.int("3");
        let just_three2 = builder.call("Just", vec![three2]);
        let none_pat = builder.ident("None");
        let unmatched = builder.match_(just_three2, none_pat, false);

        let mut sema = Sema::new(&mut comp);
        sema.check_expression(matched, &program.scope, GLOBAL_NS)
            .unwrap();
        sema.check_expression(unmatched, &program.scope, GLOBAL_NS)
            .unwrap();

        comp.add_program(program);
        let mut interp = Interpreter::new(&comp, "main");
        let scope = comp.program("main").unwrap().scope.clone();
        let mut env = Environment::new();

        let hit = interp
            .eval_expr(matched, &mut env, &scope, GLOBAL_NS)
            .unwrap();
        assert_eq!(hit.as_bool(), Some(true));
        assert_eq!(*env.lookup("n").unwrap().borrow(), Value::Int(3));

        let mut fresh_env = Environment::new();
        let miss = interp
            .eval_expr(unmatched, &mut fresh_env, &scope, GLOBAL_NS)
            .unwrap();
        assert_eq!(miss.as_bool(), Some(false));
        assert!(fresh_env.lookup("n").is_none());
    }

    #[test]
    fn references_have_identity_semantics() {
        let (mut comp, program) = setup();
        let mut builder = AstBuilder::new(&mut comp, "main.lyra");
        let init = builder.int("0");
        let (_, var) = builder.var_stmt("a", false, None, Some(init));

        let a1 = builder.ident("a");
        let r1 = builder.reference(a1);
        let a2 = builder.ident("a");
        let r2 = builder.reference(a2);
        let same = builder.binary(BinaryOp::Is, r1, r2);

        let mut sema = Sema::new(&mut comp);
        program
            .scope
            .borrow_mut()
            .add_variable(GLOBAL_NS, var.clone())
            .unwrap();
        lyra_types::check_variable(&mut sema, &var, &program.scope, GLOBAL_NS, &[]).unwrap();
        sema.check_expression(same, &program.scope, GLOBAL_NS).unwrap();

        comp.add_program(program);
        let mut interp = Interpreter::new(&comp, "main");
        let scope = comp.program("main").unwrap().scope.clone();
        let mut env = Environment::new();
        env.define("a", Value::Int(0));

        let out = interp
            .eval_expr(same, &mut env, &scope, GLOBAL_NS)
            .unwrap();
        assert_eq!(out.as_bool(), Some(true));
    }
}
