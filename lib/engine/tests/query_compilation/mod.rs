mod bgp_matching;
mod compilation;
mod test_utils;
