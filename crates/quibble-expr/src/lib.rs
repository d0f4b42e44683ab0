mod derivative;
pub mod expr;
pub mod function;
pub mod lexer;
pub mod parser;
pub mod symbol;

pub use expr::{BinaryOp, Expr, UnaryOp};
pub use function::{ExprError, Function, evaluate};
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use parser::{MAX_DEPTH, ParseError, Parser, Scope};
pub use symbol::Symbol;
