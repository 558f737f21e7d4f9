pub mod location;
pub mod role;
pub mod weekday;
