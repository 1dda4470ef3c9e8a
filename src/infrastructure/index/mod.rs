//! On-disk domain indexes: flat inner-product dense index, in-memory BM25,
//! the dense index builder and the startup loader that assembles them per domain.

mod bm25;
mod builder;
mod flat_index;
mod loader;

pub use bm25::{Bm25Index, Bm25Params};
pub use builder::build_dense_index;
pub use flat_index::FlatIpIndex;
pub use loader::{load_domain, load_domain_store, read_documents};
