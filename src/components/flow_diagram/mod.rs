//! Step-driven diagram engine and its canvas component.

pub mod autoplay;
mod component;
pub mod flow;
pub mod keyboard;
pub mod mount;
pub mod primitives;
mod render;
pub mod resolve;
pub mod reconcile;
pub mod state;
pub mod timeline;
pub mod types;
pub mod viewport;

pub use component::FlowDiagram;
pub use flow::FlowHandle;
pub use timeline::{Scenario, Step};
