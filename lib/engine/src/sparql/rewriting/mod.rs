mod expression_translator;
mod filter_push_down;

pub use expression_translator::{ExpressionTranslator, FunctionConverter, FunctionConverterRef};
pub use filter_push_down::push_down_filters;
