use crate::lir::IrType;
use strum_macros::{Display, EnumDiscriminants};

/// Functions of the MiniJava runtime library that generated code calls.
///
/// The checks abort the program with a message if they fail.
#[derive(Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(derive(Display))]
pub enum RuntimeFunction {
    SystemOutPrintln(IrType),
    SystemOutPrint(IrType),
    /// Zero initialized instance of the named class
    NewObject(String),
    /// `(element size, length)`, fails for negative lengths
    NewArray,
    NullUsage,
    /// `(array, index)`, also fails for `null` arrays
    ArrayOutOfBounds,
    /// Fails unless the object is `null` or an instance of the named class
    Cast(String),
    DivByZero(IrType),
    StringConcat,
    StringOf(IrType),
    /// Negative, zero or positive like `strcmp`. `null` is only equal to
    /// `null`.
    StringCompare,
}

impl RuntimeFunction {
    pub fn ld_name(&self) -> String {
        use self::RuntimeFunction::*;
        match self {
            SystemOutPrintln(ty) => format!("mjrt_system_out_println_{}", ty),
            SystemOutPrint(ty) => format!("mjrt_system_out_print_{}", ty),
            NewObject(class) => format!("mjrt_new.{}", class),
            NewArray => "mjrt_new_array".to_string(),
            NullUsage => "mjrt_null_usage".to_string(),
            ArrayOutOfBounds => "mjrt_array_out_of_bounds".to_string(),
            Cast(class) => format!("mjrt_cast.{}", class),
            DivByZero(_) => "mjrt_div_by_zero".to_string(),
            StringConcat => "mjrt_string_concat".to_string(),
            StringOf(ty) => format!("mjrt_string_of_{}", ty),
            StringCompare => "mjrt_string_compare".to_string(),
        }
    }

    pub fn return_ty(&self) -> IrType {
        use self::RuntimeFunction::*;
        match self {
            NewObject(_) | NewArray | StringConcat | StringOf(_) => IrType::Ptr,
            StringCompare => IrType::Int,
            SystemOutPrintln(_) | SystemOutPrint(_) | NullUsage | ArrayOutOfBounds | Cast(_)
            | DivByZero(_) => IrType::Void,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_specialized_by_operand() {
        assert_eq!(
            "mjrt_system_out_println_i16",
            RuntimeFunction::SystemOutPrintln(IrType::Char).ld_name()
        );
        assert_eq!("mjrt_new.Dog", RuntimeFunction::NewObject("Dog".to_string()).ld_name());
        assert_eq!("mjrt_div_by_zero", RuntimeFunction::DivByZero(IrType::Long).ld_name());
        assert_eq!(
            "NewArray",
            RuntimeFunctionDiscriminants::from(&RuntimeFunction::NewArray).to_string()
        );
        assert_eq!(IrType::Int, RuntimeFunction::StringCompare.return_ty());
    }
}
