mod cartpole;
mod pendulum;

pub use cartpole::CartPole;
pub use pendulum::Pendulum;
