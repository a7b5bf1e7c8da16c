pub mod classic;
mod errors;
pub(crate) mod floats;
pub mod registry;
pub mod render;
mod traits;
mod types;
pub mod vec_env;
pub mod wrappers;

pub use errors::EnvError;
pub use registry::{EnvFactory, EnvSpec, Registry, factory_of};
pub use render::{RenderSource, RenderedImages, get_render_images};
pub use traits::{AsAny, Env};
pub use types::{Action, EnvSpaces, Image, KwArgs, Observation, Step};
pub use vec_env::{DummyVecEnv, VecEnv};
pub use wrappers::{NoTimeout, TimeLimit, is_time_limit_env};
