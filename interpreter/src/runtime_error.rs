use failure::Fail;

#[derive(Debug, Fail, PartialEq, Eq, Clone)]
pub enum RuntimeError {
    #[fail(display = "null pointer dereference")]
    NullPointerDereference,

    #[fail(display = "index {} out of bounds for array of length {}", index, length)]
    IndexOutOfBounds { index: i32, length: usize },

    #[fail(display = "cannot create an array of negative size {}", size)]
    NegativeArraySize { size: i32 },

    #[fail(display = "division by zero")]
    DivisionByZero,

    #[fail(display = "object of class '{}' cannot be cast to {}", class, target)]
    InvalidCast { class: String, target: String },

    #[fail(display = "stack overflow: call depth exceeds {}", limit)]
    StackOverflow { limit: usize },

    #[fail(display = "no 'public static void main' method found")]
    NoMainMethod,

    #[fail(display = "cannot write program output: {}", msg)]
    Output { msg: String },
}
