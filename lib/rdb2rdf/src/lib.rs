#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod error;
pub mod mapping;

pub use rdb2rdf_common::CompilerConfig;

pub mod model {
    pub use rdb2rdf_model::*;
}

pub mod database {
    pub use rdb2rdf_database::*;
}

pub mod logical {
    pub use rdb2rdf_logical::*;
}

pub mod engine {
    pub use rdb2rdf_engine::*;
}
