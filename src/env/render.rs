use super::vec_env::VecEnv;
use super::{Env, EnvError, Image};

/// Rendering capabilities an environment-like value may or may not have.
///
/// Each probe returns `None` when the capability is absent.
pub trait RenderSource {
    /// One frame per environment instance.
    fn images(&mut self) -> Option<Result<Vec<Image>, EnvError>> {
        None
    }

    /// A single RGB frame.
    fn frame(&mut self) -> Option<Result<Image, EnvError>> {
        None
    }
}

impl RenderSource for dyn Env {
    fn frame(&mut self) -> Option<Result<Image, EnvError>> {
        self.render()
    }
}

impl RenderSource for dyn VecEnv {
    fn images(&mut self) -> Option<Result<Vec<Image>, EnvError>> {
        self.get_images()
    }
}

impl<R: RenderSource + ?Sized> RenderSource for Box<R> {
    fn images(&mut self) -> Option<Result<Vec<Image>, EnvError>> {
        (**self).images()
    }

    fn frame(&mut self) -> Option<Result<Image, EnvError>> {
        (**self).frame()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedImages {
    Batch(Vec<Image>),
    Single(Image),
}

/// Grabs the current frames from `source`.
///
/// Prefers the per-instance batch, falls back to a single frame, and fails
/// with [`EnvError::RenderingUnsupported`] when neither exists. The returned
/// images are owned copies, detached from any buffer the source keeps.
pub fn get_render_images<R: RenderSource + ?Sized>(
    source: &mut R,
) -> Result<RenderedImages, EnvError> {
    if let Some(images) = source.images() {
        return Ok(RenderedImages::Batch(images?));
    }
    if let Some(frame) = source.frame() {
        return Ok(RenderedImages::Single(frame?));
    }
    Err(EnvError::RenderingUnsupported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::DummyVecEnv;
    use crate::env::classic::{CartPole, Pendulum};

    fn cartpole() -> Result<Box<dyn Env>, EnvError> {
        Ok(Box::new(CartPole::new()))
    }

    #[test]
    fn test_single_env_falls_back_to_frame() {
        let mut env = cartpole().unwrap();
        env.reset().unwrap();
        let rendered = get_render_images(&mut env).unwrap();
        assert!(matches!(rendered, RenderedImages::Single(_)));
    }

    #[test]
    fn test_vec_env_prefers_batch() {
        let mut envs: Box<dyn VecEnv> = Box::new(DummyVecEnv::new([cartpole]).unwrap());
        envs.reset().unwrap();
        match get_render_images(&mut envs).unwrap() {
            RenderedImages::Batch(images) => assert_eq!(images.len(), 1),
            other => panic!("expected a batch, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_capability() {
        let mut env: Box<dyn Env> = Box::new(Pendulum::new(10.0));
        assert!(matches!(
            get_render_images(&mut env),
            Err(EnvError::RenderingUnsupported)
        ));
    }

    #[test]
    fn test_result_is_detached() {
        let mut env: Box<dyn Env> = Box::new(CartPole::new());
        env.reset().unwrap();

        let mut first = get_render_images(&mut env).unwrap();
        if let RenderedImages::Single(image) = &mut first {
            image.data.fill(7);
        }
        let second = get_render_images(&mut env).unwrap();
        assert_ne!(first, second);
        if let RenderedImages::Single(image) = second {
            assert!(image.data.iter().any(|&px| px != 7));
        }
    }
}
