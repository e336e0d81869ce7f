#![warn(rust_2018_idioms)]
#![warn(clippy::print_stdout)]

//! Tree walking interpreter for type checked MiniJava programs.
//!
//! The interpreter evaluates the expression arena directly. It needs the
//! `TypeSystem` and `TypeAnalysis` of the type checker to resolve names,
//! casts and method calls, so it must only be run on programs that were
//! checked without errors.

mod eval;
pub mod runtime_error;
pub mod state;
pub mod value;

pub use self::{
    eval::{EvalResult, Interpreter, DEFAULT_CALL_DEPTH_LIMIT},
    runtime_error::RuntimeError,
    state::State,
    value::Value,
};

#[cfg(test)]
#[allow(clippy::string_lit_as_bytes)]
mod tests {
    use super::*;
    use asciifile::AsciiFile;
    use compiler_shared::context::Context;
    use lexer::{Lexer, TokenKind};
    use parser::{ast::RelOp, Parser};
    use strtab::StringTable;
    use strum::IntoEnumIterator;

    fn run_with_limit(input: &str, limit: usize) -> Result<String, RuntimeError> {
        let file = AsciiFile::new(input.as_bytes()).unwrap();
        let ctx = Context::dummy(&file);
        let mut strtab = StringTable::new();
        let mut program = {
            let tokens = Lexer::new(&mut strtab, &ctx)
                .map(|r| r.unwrap())
                .filter(|t| match t.data {
                    TokenKind::Whitespace | TokenKind::Comment(_) => false,
                    _ => true,
                });
            Parser::new(tokens).parse().unwrap()
        };
        let (type_system, analysis) = type_checking::check(&mut strtab, &mut program, &ctx);
        assert!(
            !ctx.diagnostics.errored(),
            "{:?}",
            ctx.diagnostics.messages()
        );

        let mut out = Vec::new();
        Interpreter::new(&program, &type_system, &analysis, &mut out)?
            .with_call_depth_limit(limit)
            .run()
            .map_err(|err| err.data)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn run(input: &str) -> Result<String, RuntimeError> {
        run_with_limit(input, DEFAULT_CALL_DEPTH_LIMIT)
    }

    fn run_main(body: &str) -> Result<String, RuntimeError> {
        run(&format!(
            "class Main {{ public static void main(String[] args) {{ {} }} }}",
            body
        ))
    }

    #[test]
    fn char_compared_to_int_is_widened() {
        assert_eq!(
            Ok("true\n".to_string()),
            run_main("System.out.println('a' < 98);")
        );
    }

    #[test]
    fn leading_zeros_in_literals() {
        assert_eq!(
            Ok("8\n-7\n".to_string()),
            run_main("System.out.println(007 + 1); System.out.println(-0007);")
        );
    }

    #[test]
    fn relational_operators_agree_with_compare() {
        let pairs = [(1, 2), (2, 2), (3, 2)];
        let mut body = String::new();
        let mut expected = String::new();
        for op in RelOp::iter() {
            for (lhs, rhs) in &pairs {
                body.push_str(&format!("System.out.println({} {} {});", lhs, op, rhs));
                let result = Value::Int(*lhs).compare(op.compare_op(), &Value::Int(*rhs));
                expected.push_str(&format!("{}\n", result));
            }
        }
        assert_eq!(Ok(expected), run_main(&body));
    }

    #[test]
    fn mixed_width_arithmetic() {
        let output = run_main(
            "int max = 2147483647; \
             System.out.println(max + 1); \
             long wide = max; \
             wide = wide + 1; \
             System.out.println(wide); \
             System.out.println('a' + 1); \
             System.out.println((char) 98); \
             System.out.println((char) 65601); \
             long big = wide * 4; \
             System.out.println((int) big); \
             System.out.println(-2147483648); \
             System.out.println(7 / -2); \
             System.out.println(-7 % 3); \
             System.out.println(6 & 3 | 8 ^ 1);",
        );
        assert_eq!(
            Ok("-2147483648\n2147483648\n98\nb\nA\n0\n-2147483648\n-3\n-1\n11\n".to_string()),
            output
        );
    }

    #[test]
    fn strings_and_booleans() {
        let output = run_main(
            "String s = \"x\" + 1 + 'c' + true; \
             System.out.println(s); \
             System.out.println(s == \"x1ctrue\"); \
             boolean t = true; \
             System.out.println(t & !t | t ^ false); \
             System.out.print(\"no newline\"); \
             System.out.println(null == null);",
        );
        assert_eq!(
            Ok("x1ctrue\ntrue\ntrue\nno newlinetrue\n".to_string()),
            output
        );
    }

    #[test]
    fn short_circuit() {
        let output = run_main(
            "int[] xs = null; \
             System.out.println(xs != null && xs[0] == 1); \
             System.out.println(xs == null || xs[0] == 1);",
        );
        assert_eq!(Ok("false\ntrue\n".to_string()), output);
    }

    #[test]
    fn loops() {
        let output = run_main(
            "int i = 0; int sum = 0; \
             while (i < 5) { i = i + 1; if (i == 3) { } else sum = sum + i; } \
             System.out.println(sum); \
             do { sum = sum - 1; } while (sum > 100); \
             System.out.println(sum);",
        );
        assert_eq!(Ok("12\n11\n".to_string()), output);
    }

    #[test]
    fn arrays() {
        let output = run_main(
            "int[] xs = new int[3]; xs[1] = 5; \
             System.out.println(xs[0] + xs[1]); \
             boolean[][] grid = new boolean[2][]; \
             System.out.println(grid[1] == null); \
             grid[1] = new boolean[1]; \
             System.out.println(grid[1][0]); \
             char[] cs = new char[1]; cs[0] = 'z'; \
             System.out.println(cs[0]);",
        );
        assert_eq!(Ok("5\ntrue\nfalse\nz\n".to_string()), output);

        assert_eq!(
            Err(RuntimeError::IndexOutOfBounds {
                index: 3,
                length: 3
            }),
            run_main("int[] xs = new int[3]; xs[3] = 1;")
        );
        assert_eq!(
            Err(RuntimeError::IndexOutOfBounds {
                index: -1,
                length: 0
            }),
            run_main("int[] xs = new int[0]; int x = xs[-1];")
        );
        assert_eq!(
            Err(RuntimeError::NegativeArraySize { size: -2 }),
            run_main("int[] xs = new int[-2];")
        );
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(
            Err(RuntimeError::DivisionByZero),
            run_main("int zero = 0; System.out.println(1 % zero);")
        );
    }

    const ANIMALS: &str = "
        class Animal {
            public String name() { return \"animal\"; }
            public String greet() { return \"I am \" + name(); }
        }
        class Dog extends Animal {
            public int tricks;
            public String name() { return \"dog\"; }
            public String parentName() { return super.name(); }
            public void learn() { tricks = tricks + 1; }
        }
    ";

    #[test]
    fn dynamic_and_super_dispatch() {
        let output = run(&format!(
            "{} class Main {{ public static void main(String[] args) {{
                Animal a = new Dog();
                System.out.println(a.greet());
                Dog d = (Dog) a;
                System.out.println(d.parentName());
                d.learn(); d.learn();
                System.out.println(d.tricks);
                d.tricks = 10;
                System.out.println(d.tricks);
                System.out.println(new Animal().greet());
                System.out.println(a == d);
            }} }}",
            ANIMALS
        ));
        assert_eq!(
            Ok("I am dog\nanimal\n2\n10\nI am animal\ntrue\n".to_string()),
            output
        );
    }

    #[test]
    fn failing_cast_and_null() {
        let main = |body: &str| {
            run(&format!(
                "{} class Main {{ public static void main(String[] args) {{ {} }} }}",
                ANIMALS, body
            ))
        };
        assert_eq!(
            Err(RuntimeError::InvalidCast {
                class: "Animal".to_string(),
                target: "Dog".to_string(),
            }),
            main("Animal a = new Animal(); Dog d = (Dog) a;")
        );
        assert_eq!(
            Err(RuntimeError::NullPointerDereference),
            main("Dog d = null; d.learn();")
        );
        assert_eq!(
            Err(RuntimeError::NullPointerDereference),
            main("Dog d = null; d.tricks = 1;")
        );
        assert_eq!(Ok(String::new()), main("Dog d = (Dog) null;"));
    }

    #[test]
    fn interfaces_and_recursion() {
        let output = run(
            "interface Shape { int area(); }
             class Square implements Shape {
                 public int side;
                 public int area() { return side * side; }
             }
             class Main {
                 public int fib(int n) {
                     if (n < 2) return n;
                     return fib(n - 1) + fib(n - 2);
                 }
                 public static void main(String[] args) {
                     Square sq = new Square();
                     sq.side = 4;
                     Shape shape = sq;
                     System.out.println(shape.area());
                     System.out.println(new Main().fib(15));
                 }
             }",
        );
        assert_eq!(Ok("16\n610\n".to_string()), output);
    }

    #[test]
    fn call_depth_is_limited() {
        let output = run_with_limit(
            "class Main {
                 public int down(int n) { return down(n + 1); }
                 public static void main(String[] args) { new Main().down(0); }
             }",
            50,
        );
        assert_eq!(Err(RuntimeError::StackOverflow { limit: 50 }), output);
    }

    fn count_down(n: usize) -> String {
        format!(
            "class Main {{
                 public int f(int n) {{ if (n == 0) {{ return 0; }} return 1 + this.f(n - 1); }}
                 public static void main(String[] args) {{ System.out.println(new Main().f({})); }}
             }}",
            n
        )
    }

    #[test]
    fn recursion_up_to_the_default_limit_runs() {
        let depth = DEFAULT_CALL_DEPTH_LIMIT - 10;
        assert_eq!(Ok(format!("{}\n", depth)), run(&count_down(depth)));
    }

    #[test]
    fn recursion_past_the_default_limit_is_an_error() {
        assert_eq!(
            Err(RuntimeError::StackOverflow {
                limit: DEFAULT_CALL_DEPTH_LIMIT
            }),
            run(&count_down(DEFAULT_CALL_DEPTH_LIMIT + 10))
        );
    }

    #[test]
    fn program_without_main_is_rejected() {
        let file = AsciiFile::new(b"").unwrap();
        let ctx = Context::dummy(&file);
        let mut strtab = StringTable::new();
        let mut program = parser::ast::Program::default();
        let (type_system, analysis) = type_checking::check(&mut strtab, &mut program, &ctx);
        let mut out = Vec::new();

        assert_eq!(
            Some(RuntimeError::NoMainMethod),
            Interpreter::new(&program, &type_system, &analysis, &mut out).err()
        );
    }
}
