pub mod gravity;

pub use gravity::GravityFilter;
