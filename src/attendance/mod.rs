pub mod geo;
pub mod registrar;
pub mod state;
pub mod window;
