//! Runs the compiler phases on one source file.
//!
//! Every phase reports its errors to the diagnostics of the `Context`. The
//! driver stops after the first phase that reported an error and returns
//! `CompilationFailed`, which the caller turns into the exit code.
use crate::print::{lextest, pretty};
use asciifile::{AsciiFile, MaybeSpanned};
use compiler_shared::context::Context;
use diagnostics::MessageLevel;
use failure::{Error, Fail, ResultExt};
use interpreter::{Interpreter, RuntimeError, DEFAULT_CALL_DEPTH_LIMIT};
use lexer::{LexicalError, Lexer, Token, TokenKind};
use parser::{ast, Parser};
use std::{
    fs,
    io::{self, Write},
    path::Path,
    process::exit,
};
use strtab::StringTable;
use termcolor::{ColorChoice, StandardStream, WriteColor};

/// What to do with the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    LexTest,
    PrintAst,
    Check,
    EmitIr,
    Interpret,
}

/// Returned when the diagnostics already explained what went wrong.
#[derive(Debug, Fail)]
#[fail(display = "compilation failed")]
pub struct CompilationFailed;

pub struct Driver {
    /// Diagnostics output. Defaults to stderr.
    writer_err: Box<dyn WriteColor>,
    /// Program output. Defaults to stdout.
    writer_out: Box<dyn WriteColor>,
    action: Action,
    call_depth_limit: usize,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}

impl Driver {
    pub fn new(color: ColorChoice) -> Self {
        Self {
            writer_err: Box::new(StandardStream::stderr(color)),
            writer_out: Box::new(StandardStream::stdout(color)),
            action: Action::Interpret,
            call_depth_limit: DEFAULT_CALL_DEPTH_LIMIT,
        }
    }

    pub fn set_writer_err(mut self, writer: Box<dyn WriteColor>) -> Self {
        self.writer_err = writer;
        self
    }

    pub fn set_writer_out(mut self, writer: Box<dyn WriteColor>) -> Self {
        self.writer_out = writer;
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn call_depth_limit(mut self, limit: usize) -> Self {
        self.call_depth_limit = limit;
        self
    }

    pub fn compile<P: AsRef<Path>>(self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let code = fs::read(path).context(format!("cannot read {}", path.display()))?;
        self.compile_code(&code)
    }

    pub fn compile_code(self, code: &[u8]) -> Result<(), Error> {
        let Driver {
            writer_err,
            mut writer_out,
            action,
            call_depth_limit,
        } = self;

        let file = AsciiFile::new(code)?;
        let ctx = Context::new(&file, writer_err);
        let mut strtab = StringTable::new();

        log::info!("lexing");
        let (tokens, lexical_error) = lex(&mut strtab, &ctx);
        if action == Action::LexTest {
            for token in &tokens {
                writeln!(writer_out, "{}", lextest::Output::new(&token.data))?;
            }
        }
        if let Some(err) = lexical_error {
            ctx.report(MessageLevel::Error, err);
        }
        if ctx.diagnostics.errored() {
            return failed(&ctx);
        }
        if action == Action::LexTest {
            writeln!(writer_out, "EOF")?;
            return Ok(());
        }

        log::info!("parsing {} tokens", tokens.len());
        let mut program = match Parser::new(tokens.into_iter()).parse() {
            Ok(program) => program,
            Err(MaybeSpanned::WithSpan(err)) => {
                ctx.report(MessageLevel::Error, err);
                return failed(&ctx);
            }
            Err(MaybeSpanned::WithoutSpan(err)) => {
                ctx.diagnostics.error(Box::new(err));
                return failed(&ctx);
            }
        };
        if action == Action::PrintAst {
            pretty::print(&program, &mut writer_out)?;
            return Ok(());
        }

        log::info!("type checking {} classes", program.classes.len());
        let (type_system, analysis) = type_checking::check(&mut strtab, &mut program, &ctx);
        if ctx.diagnostics.errored() {
            return failed(&ctx);
        }

        match action {
            Action::Check => ctx.diagnostics.write_statistics(),
            Action::EmitIr => {
                log::info!("lowering");
                lowering::lower(&program, &type_system, &analysis).emit(&mut writer_out)?;
            }
            Action::Interpret => {
                log::info!("interpreting");
                let result = interpret(
                    &program,
                    &type_system,
                    &analysis,
                    &mut writer_out,
                    call_depth_limit,
                );
                writer_out.flush()?;
                match result {
                    Ok(()) => {}
                    Err(MaybeSpanned::WithSpan(err)) => {
                        ctx.report(MessageLevel::Error, err);
                        return failed(&ctx);
                    }
                    Err(MaybeSpanned::WithoutSpan(err)) => {
                        ctx.diagnostics.error(Box::new(err));
                        return failed(&ctx);
                    }
                }
            }
            Action::LexTest | Action::PrintAst => unreachable!("handled above"),
        }

        Ok(())
    }
}

/// Whitespace and comments are dropped, lexing halts at the first error.
fn lex<'f>(
    strtab: &mut StringTable<'f>,
    ctx: &'f Context<'f>,
) -> (Vec<Token<'f>>, Option<LexicalError<'f>>) {
    let mut tokens = Vec::new();
    for result in Lexer::new(strtab, ctx) {
        match result {
            Ok(token) => match token.data {
                TokenKind::Whitespace | TokenKind::Comment(_) => {}
                _ => tokens.push(token),
            },
            Err(err) => return (tokens, Some(err)),
        }
    }
    (tokens, None)
}

fn interpret<'src>(
    program: &ast::Program<'src>,
    type_system: &type_checking::TypeSystem<'src>,
    analysis: &type_checking::TypeAnalysis<'src>,
    out: &mut dyn Write,
    call_depth_limit: usize,
) -> Result<(), MaybeSpanned<'src, RuntimeError>> {
    Interpreter::new(program, type_system, analysis, out)
        .map_err(MaybeSpanned::WithoutSpan)?
        .with_call_depth_limit(call_depth_limit)
        .run()
        .map_err(MaybeSpanned::WithSpan)
}

fn failed(ctx: &Context<'_>) -> Result<(), Error> {
    ctx.diagnostics.write_statistics();
    Err(CompilationFailed.into())
}

/// Print an error in a format intended for end users and terminate
/// the program.
pub fn exit_process_with_error(err: &Error) -> ! {
    if err.downcast_ref::<CompilationFailed>().is_none() {
        let mut stderr = io::stderr();
        print_error(&mut stderr, err).expect("unable to print error");
    }
    exit(1);
}

/// Print error objects in a format intended for end users
pub fn print_error(writer: &mut dyn io::Write, err: &Error) -> Result<(), Error> {
    writeln!(writer, "error: {}", err.as_fail())?;
    for cause in err.iter_causes() {
        writeln!(writer, "caused by: {}", cause)?;
    }
    Ok(())
}
