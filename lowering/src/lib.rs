#![warn(rust_2018_idioms)]
#![warn(clippy::print_stdout)]
#![warn(clippy::all)]

//! Lowering of type checked programs to the LIR, a register based
//! intermediate representation with typed virtual registers.
//!
//! Every implemented method becomes one function named `Class.method`.
//! Object creation, printing, string operations and the runtime checks are
//! calls into the runtime library, see `runtime::RuntimeFunction`.

pub mod gen_instr;
pub mod lir;
pub mod runtime;

use self::{
    gen_instr::{ir_type, MethodBodyGenerator},
    lir::{FunctionBuilder, IrType},
};
use parser::ast;
use type_checking::{TypeAnalysis, TypeSystem};

pub fn lower<'src>(
    program: &ast::Program<'src>,
    type_system: &TypeSystem<'src>,
    analysis: &TypeAnalysis<'src>,
) -> lir::Program {
    let mut lir = lir::Program::new();

    for class_decl in &program.classes {
        let class = match type_system.lookup_class(class_decl.name.data) {
            Some((class, _)) => class,
            None => continue,
        };
        for member in &class_decl.members {
            let body = match &member.kind {
                ast::ClassMemberKind::Method(_, _, Some(body)) => body,
                _ => continue,
            };
            let method = class
                .method(member.name)
                .expect("methods of checked classes are registered");

            let mut params = Vec::with_capacity(method.params.len() + 1);
            if !method.is_static {
                params.push(IrType::Ptr);
            }
            params.extend(method.params.iter().map(|param| ir_type(&param.ty)));

            let name = format!("{}.{}", class.name, method.name);
            log::debug!("lowering {}", name);
            let mut builder = FunctionBuilder::new(name, &params, ir_type(&method.return_ty));
            let values = (0..params.len())
                .map(|idx| builder.param(idx))
                .collect::<Vec<_>>();

            MethodBodyGenerator::new(
                &mut builder,
                &program.arena,
                type_system,
                analysis,
                method,
                &values,
            )
            .gen_method(body);

            lir.add_function(builder.finish());
        }
    }

    lir
}
