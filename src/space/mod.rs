mod dim;
mod errors;
mod types;

pub use dim::num_space_dim;
pub use errors::SpaceError;
pub use types::Space;
