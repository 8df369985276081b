mod relation_join;
mod test_utils;
