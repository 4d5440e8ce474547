mod pipeline;

pub use archfuse_llm::fusion::FusionSettings;
pub use pipeline::*;
