pub mod analyzers;
pub mod config;
pub mod filter;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod report;

pub use analyzers::aggregate::aggregate;
pub use analyzers::growth::compute_growth;
pub use analyzers::summary::summarize;
pub use normalize::normalize;
