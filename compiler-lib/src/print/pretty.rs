//! Pretty printer for `--print-ast`.
//!
//! Classes and members are sorted by name, methods before fields. Operands
//! of operators are parenthesized unless they are primary expressions, so
//! printing the parsed output again yields the same text.
use parser::ast::{self, CastKind, ClassMemberKind, Expr, ExprArena, ExprId, Stmt};
use std::{cmp::Ordering, fmt, io};

struct IndentPrinter {
    buffer: String,
    indent: usize,
    indent_on_next_write: bool,
}

impl IndentPrinter {
    fn new() -> IndentPrinter {
        IndentPrinter {
            buffer: String::new(),
            indent: 0,
            indent_on_next_write: false,
        }
    }

    fn print(&mut self, args: fmt::Arguments<'_>) {
        self.indent_if_required();
        fmt::Write::write_fmt(&mut self.buffer, args).expect("writing to a String cannot fail");
    }

    fn print_str(&mut self, s: &str) {
        self.indent_if_required();
        self.buffer.push_str(s);
    }

    fn newline(&mut self) {
        self.buffer.push('\n');
        self.indent_on_next_write = true;
    }

    fn indent_if_required(&mut self) {
        if self.indent_on_next_write {
            self.buffer.push_str(&"\t".repeat(self.indent));
            self.indent_on_next_write = false;
        }
    }

    fn indent(&mut self) {
        self.indent += 1;
    }

    fn outdent(&mut self) {
        self.indent = self
            .indent
            .checked_sub(1)
            .expect("indent and outdent are paired");
    }
}

pub fn print(program: &ast::Program<'_>, out: &mut dyn io::Write) -> io::Result<()> {
    let mut printer = PrettyPrinter {
        arena: &program.arena,
        printer: IndentPrinter::new(),
    };
    printer.print_program(program);
    out.write_all(printer.printer.buffer.as_bytes())
}

struct PrettyPrinter<'a, 'f> {
    arena: &'a ExprArena<'f>,
    printer: IndentPrinter,
}

impl<'a, 'f> PrettyPrinter<'a, 'f> {
    fn print_program(&mut self, program: &ast::Program<'f>) {
        let mut classes = program.classes.iter().collect::<Vec<_>>();
        classes.sort_by_key(|class| class.name.data.as_str());
        for class in classes {
            self.print_class(class);
        }
    }

    fn print_class(&mut self, decl: &ast::ClassDeclaration<'f>) {
        if decl.is_abstract {
            self.printer.print_str("abstract ");
        }
        self.printer.print(format_args!("{} {}", decl.kind, decl.name.data));
        if let Some(parent) = &decl.parent {
            self.printer.print(format_args!(" extends {}", parent.data));
        }
        if !decl.interfaces.is_empty() {
            let keyword = match decl.kind {
                ast::ClassKind::Class => "implements",
                ast::ClassKind::Interface => "extends",
            };
            self.printer.print(format_args!(" {} ", keyword));
            for (i, interface) in decl.interfaces.iter().enumerate() {
                if i > 0 {
                    self.printer.print_str(", ");
                }
                self.printer.print(format_args!("{}", interface.data));
            }
        }
        self.printer.print_str(" {");

        let mut members = decl.members.iter().collect::<Vec<_>>();
        members.sort_by(|a, b| compare_class_member(a, b));
        if members.is_empty() {
            self.printer.print_str(" ");
        } else {
            self.printer.newline();
            self.printer.indent();
            for member in members {
                self.print_member(member);
            }
            self.printer.outdent();
        }
        self.printer.print_str("}");
        self.printer.newline();
    }

    fn print_member(&mut self, member: &ast::ClassMember<'f>) {
        let modifiers = member.modifiers;
        if modifiers.visibility != ast::Visibility::Package {
            self.printer.print(format_args!("{} ", modifiers.visibility));
        }
        if modifiers.is_static {
            self.printer.print_str("static ");
        }
        if modifiers.is_abstract {
            self.printer.print_str("abstract ");
        }

        match &member.kind {
            ClassMemberKind::Field(ty) => {
                self.print_type(&ty.data);
                self.printer.print(format_args!(" {};", member.name));
            }
            ClassMemberKind::Method(ty, params, body) => {
                self.print_type(&ty.data);
                self.printer.print(format_args!(" {}(", member.name));
                for (i, param) in params.data.iter().enumerate() {
                    if i > 0 {
                        self.printer.print_str(", ");
                    }
                    self.print_type(&param.ty.data);
                    self.printer.print(format_args!(" {}", param.name));
                }
                self.printer.print_str(")");
                match body {
                    Some(body) => {
                        self.printer.print_str(" ");
                        self.print_block(&body.data);
                    }
                    None => self.printer.print_str(";"),
                }
            }
        }
        self.printer.newline();
    }

    fn print_type(&mut self, ty: &ast::Type<'f>) {
        self.print_basic_type(ty.basic.data);
        self.printer
            .print_str(&"[]".repeat(ty.array_depth as usize));
    }

    fn print_basic_type(&mut self, basic: ast::BasicType<'f>) {
        use self::ast::BasicType::*;
        match basic {
            Int => self.printer.print_str("int"),
            Long => self.printer.print_str("long"),
            Char => self.printer.print_str("char"),
            Boolean => self.printer.print_str("boolean"),
            Void => self.printer.print_str("void"),
            Custom(name) => self.printer.print(format_args!("{}", name)),
        }
    }

    fn print_block(&mut self, block: &ast::Block<'f>) {
        if is_empty_block(block) {
            self.printer.print_str("{ }");
            return;
        }
        self.printer.print_str("{");
        self.printer.newline();
        self.printer.indent();
        for stmt in &block.statements {
            if stmt.data != Stmt::Empty {
                self.print_stmt(&stmt.data);
                self.printer.newline();
            }
        }
        self.printer.outdent();
        self.printer.print_str("}");
    }

    /// Statements other than blocks go on their own, indented line.
    fn print_body(&mut self, stmt: &Stmt<'f>) {
        if let Stmt::Block(block) = stmt {
            self.printer.print_str(" ");
            self.print_block(&block.data);
        } else {
            self.printer.newline();
            self.printer.indent();
            self.print_stmt(stmt);
            self.printer.outdent();
        }
    }

    fn print_stmt(&mut self, stmt: &Stmt<'f>) {
        match stmt {
            Stmt::Block(block) => self.print_block(&block.data),
            Stmt::Empty => self.printer.print_str(";"),
            Stmt::If(cond, then_arm, else_arm) => {
                self.printer.print_str("if (");
                // no parentheses for conditions
                self.print_expr(*cond);
                self.printer.print_str(")");
                self.print_body(&then_arm.data);

                let else_arm = match else_arm {
                    Some(else_arm) if else_arm.data != Stmt::Empty => else_arm,
                    _ => return,
                };
                match then_arm.data {
                    Stmt::Block(_) => self.printer.print_str(" "),
                    _ => self.printer.newline(),
                }
                match &else_arm.data {
                    Stmt::If(..) => {
                        self.printer.print_str("else ");
                        self.print_stmt(&else_arm.data);
                    }
                    other => {
                        self.printer.print_str("else");
                        self.print_body(other);
                    }
                }
            }
            Stmt::While(cond, body) => {
                self.printer.print_str("while (");
                self.print_expr(*cond);
                self.printer.print_str(")");
                self.print_body(&body.data);
            }
            Stmt::DoWhile(body, cond) => {
                self.printer.print_str("do");
                self.print_body(&body.data);
                match body.data {
                    Stmt::Block(_) => self.printer.print_str(" "),
                    _ => self.printer.newline(),
                }
                self.printer.print_str("while (");
                self.print_expr(*cond);
                self.printer.print_str(");");
            }
            Stmt::Expression(expr) => {
                self.print_expr(*expr);
                self.printer.print_str(";");
            }
            Stmt::Return(expr) => {
                self.printer.print_str("return");
                if let Some(expr) = expr {
                    self.printer.print_str(" ");
                    self.print_expr(*expr);
                }
                self.printer.print_str(";");
            }
            Stmt::LocalVariableDeclaration(ty, name, init) => {
                self.print_type(&ty.data);
                self.printer.print(format_args!(" {}", name.data));
                if let Some(init) = init {
                    self.printer.print_str(" = ");
                    self.print_expr(*init);
                }
                self.printer.print_str(";");
            }
        }
    }

    fn print_args(&mut self, args: &[ExprId]) {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.printer.print_str(", ");
            }
            // no parentheses for arguments
            self.print_expr(*arg);
        }
    }

    fn print_expr_parenthesized(&mut self, id: ExprId) {
        let arena = self.arena;
        let parenthesize = match &arena[id].data {
            Expr::Int(_)
            | Expr::Char(_)
            | Expr::Str(_)
            | Expr::Boolean(_)
            | Expr::Null
            | Expr::This
            | Expr::Super
            | Expr::Var(_) => false,
            Expr::Cast(_, operand, CastKind::Implicit) => {
                return self.print_expr_parenthesized(*operand);
            }
            _ => true,
        };
        if parenthesize {
            self.printer.print_str("(");
        }
        self.print_expr(id);
        if parenthesize {
            self.printer.print_str(")");
        }
    }

    fn print_expr(&mut self, id: ExprId) {
        let arena = self.arena;
        match &arena[id].data {
            Expr::Binary(op, lhs, rhs) => {
                self.print_expr_parenthesized(*lhs);
                self.printer.print(format_args!(" {} ", op));
                self.print_expr_parenthesized(*rhs);
            }
            Expr::Relational(op, lhs, rhs) => {
                self.print_expr_parenthesized(*lhs);
                self.printer.print(format_args!(" {} ", op));
                self.print_expr_parenthesized(*rhs);
            }
            Expr::Unary(op, operand) => {
                self.printer.print(format_args!("{}", op));
                self.print_expr_parenthesized(*operand);
            }
            Expr::Assignment(lhs, rhs) => {
                self.print_expr_parenthesized(*lhs);
                self.printer.print_str(" = ");
                self.print_expr_parenthesized(*rhs);
            }
            Expr::Cast(_, operand, CastKind::Implicit) => self.print_expr(*operand),
            Expr::Cast(ty, operand, CastKind::Explicit) => {
                self.printer.print_str("(");
                self.print_type(&ty.data);
                self.printer.print_str(") ");
                self.print_expr_parenthesized(*operand);
            }
            Expr::MethodInvocation(target, name, args) => {
                self.print_expr_parenthesized(*target);
                self.printer.print(format_args!(".{}(", name.data));
                self.print_args(&args.data);
                self.printer.print_str(")");
            }
            Expr::FieldAccess(target, name) => {
                self.print_expr_parenthesized(*target);
                self.printer.print(format_args!(".{}", name.data));
            }
            Expr::ArrayAccess(array, index) => {
                self.print_expr_parenthesized(*array);
                // no parentheses for indices
                self.printer.print_str("[");
                self.print_expr(*index);
                self.printer.print_str("]");
            }
            Expr::Null => self.printer.print_str("null"),
            Expr::Boolean(b) => self.printer.print(format_args!("{}", b)),
            Expr::Int(lit) => self.printer.print(format_args!("{}", lit.data)),
            Expr::NegInt(lit) => self.printer.print(format_args!("-{}", lit.data)),
            Expr::Char(c) => self.printer.print(format_args!("'{}'", c.escape_default())),
            Expr::Str(s) => self.printer.print(format_args!("\"{}\"", s.escape_default())),
            Expr::Var(name) => self.printer.print(format_args!("{}", name.data)),
            Expr::ThisMethodInvocation(name, args) => {
                self.printer.print(format_args!("{}(", name.data));
                self.print_args(&args.data);
                self.printer.print_str(")");
            }
            Expr::This => self.printer.print_str("this"),
            Expr::Super => self.printer.print_str("super"),
            Expr::NewObject(name) => self.printer.print(format_args!("new {}()", name.data)),
            Expr::NewArray(basic, size, dimensions) => {
                self.printer.print_str("new ");
                self.print_basic_type(basic.data);
                self.printer.print_str("[");
                self.print_expr(*size);
                self.printer.print_str("]");
                self.printer
                    .print_str(&"[]".repeat(*dimensions as usize));
            }
        }
    }
}

fn compare_class_member(a: &ast::ClassMember<'_>, b: &ast::ClassMember<'_>) -> Ordering {
    match (a.kind.is_method(), b.kind.is_method()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.as_str().cmp(b.name.as_str()),
    }
}

fn is_empty_block(block: &ast::Block<'_>) -> bool {
    block
        .statements
        .iter()
        .all(|stmt| stmt.data == Stmt::Empty)
}

#[cfg(test)]
#[allow(clippy::string_lit_as_bytes)]
mod tests {
    use super::*;
    use asciifile::AsciiFile;
    use compiler_shared::context::Context;
    use lexer::{Lexer, TokenKind};
    use parser::Parser;
    use strtab::StringTable;

    fn pretty(input: &str, check: bool) -> String {
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
        if check {
            type_checking::check(&mut strtab, &mut program, &ctx);
            assert!(!ctx.diagnostics.errored(), "{:?}", ctx.diagnostics.messages());
        }
        let mut out = Vec::new();
        print(&program, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[rustfmt::skip]
    #[test]
    fn classes_and_members_are_sorted() {
        let input = "class B { public int x; public void b() {} public static void main(String[] args) { } }
                     interface I { int f(int a, char[][] b); }
                     abstract class A implements I { }";
        let expected = "\
abstract class A implements I { }
class B {
\tpublic void b() { }
\tpublic static void main(String[] args) { }
\tpublic int x;
}
interface I {
\tint f(int a, char[][] b);
}
";
        assert_eq!(expected, pretty(input, false));
    }

    #[rustfmt::skip]
    #[test]
    fn statements_and_parentheses() {
        let input = "class A { public void m() {
                         int x = 1 + 2 * 3;
                         if (x < 3) x = -x; else if (!true) { ; } else { return; }
                         while (x > 0) { x = x - (1); }
                         do x = x + 1; while (x < 5);
                         long[] ys = new long[x][];
                         System.out.println((char) ys[0][x]);
                     } }";
        let expected = "\
class A {
\tvoid m() {
\t\tint x = 1 + (2 * 3);
\t\tif (x < 3)
\t\t\tx = (-x);
\t\telse if (!true) { } else {
\t\t\treturn;
\t\t}
\t\twhile (x > 0) {
\t\t\tx = (x - 1);
\t\t}
\t\tdo
\t\t\tx = (x + 1);
\t\twhile (x < 5);
\t\tlong[] ys = new long[x][];
\t\t(System.out).println((char) ((ys[0])[x]));
\t}
}
";
        assert_eq!(expected, pretty(input, false));
    }

    #[test]
    fn printing_is_idempotent() {
        let input = "class A { public static void main(String[] a) { \
                     boolean b = 1 < 2 && 'c' != 'd' || a == null; \
                     String s = \"x\\n\" + 'y'; new A().f(1, -2147483648); } \
                     public int f(int a, int b) { return a % b; } }";
        let once = pretty(input, false);
        assert_eq!(once, pretty(&once, false));
    }

    #[test]
    fn implicit_casts_are_not_printed() {
        let input = "class A { public static void main(String[] a) { \
                     long x = 'a' + 1; boolean b = x < 'z'; } }";
        assert_eq!(pretty(input, false), pretty(input, true));
    }
}
