// Library crate: the editing core, exposed for the binary and integration tests.
// Rendering and mesh loading are external; the core talks to them through `Scene`.

pub mod command;
pub mod coords;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod palette;
pub mod state;
pub mod sync;
pub mod validation;

/// Picking and the scene graph boundary.
pub mod viewport {
    pub mod picking;
    pub mod scene;
}
