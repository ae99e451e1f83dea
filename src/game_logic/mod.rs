pub mod constants;
pub mod error;
pub mod profiles;
pub mod config;
pub mod world;
pub mod physics;
pub mod pool;
pub mod scheduler;
pub mod particles;
pub mod traffic;
pub mod city;
pub mod stats;
pub mod collisions;
pub mod session;
pub mod flow;
pub mod components;

pub use constants::*;
pub use error::*;
pub use profiles::*;
pub use config::*;
pub use world::*;
pub use physics::*;
pub use pool::*;
pub use scheduler::*;
pub use particles::*;
pub use traffic::*;
pub use city::*;
pub use stats::*;
pub use collisions::*;
pub use session::*;
pub use flow::*;
pub use components::*;
