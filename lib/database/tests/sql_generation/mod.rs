mod select_statements;
mod test_utils;
