mod dataset;
mod ensemble;
mod error;
mod fold;
mod metrics;
mod tensor;
mod transforms;
mod utils;

pub use dataset::*;
pub use ensemble::*;
pub use error::*;
pub use fold::*;
pub use metrics::*;
pub use tensor::*;
pub use transforms::*;
pub use utils::*;

pub type Float = f32;
