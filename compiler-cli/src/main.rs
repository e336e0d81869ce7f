#![warn(rust_2018_idioms)]
#![warn(clippy::print_stdout)]

use compiler_lib::{
    driver::{exit_process_with_error, Action},
    Driver,
};
use std::path::PathBuf;
use structopt::{clap::ArgGroup, StructOpt};
use termcolor::ColorChoice;

#[derive(StructOpt, Debug)]
#[structopt(name = "compiler-cli", group = ArgGroup::with_name("action"))]
pub struct Opt {
    /// Print one token per line, followed by `EOF`.
    #[structopt(long, group = "action")]
    lextest: bool,
    /// Pretty-print the parsed program.
    #[structopt(long, group = "action")]
    print_ast: bool,
    /// Type check the program and print diagnostics.
    #[structopt(long, group = "action")]
    check: bool,
    /// Print the lowered program.
    #[structopt(long, group = "action")]
    emit_ir: bool,
    /// Run the main method of the program. This is the default.
    #[structopt(long, group = "action")]
    interpret: bool,
    /// MiniJava source file
    #[structopt(name = "FILE", parse(from_os_str))]
    file: PathBuf,
}

impl Opt {
    /// The flags are mutually exclusive, no flag means `--interpret`.
    fn action(&self) -> Action {
        let flags = [
            (self.lextest, Action::LexTest),
            (self.print_ast, Action::PrintAst),
            (self.check, Action::Check),
            (self.emit_ir, Action::EmitIr),
            (self.interpret, Action::Interpret),
        ];
        flags
            .iter()
            .find(|(set, _)| *set)
            .map_or(Action::Interpret, |(_, action)| *action)
    }
}

fn main() {
    env_logger::init();

    let opt = Opt::from_args();
    log::debug!("{:?}", opt);

    let result = Driver::new(ColorChoice::Auto)
        .action(opt.action())
        .compile(&opt.file);

    if let Err(err) = result {
        exit_process_with_error(&err);
    }
}
