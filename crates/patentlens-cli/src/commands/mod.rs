//! Command implementations.

pub mod extract;
pub mod route;

pub use self::extract::execute_extract;
pub use self::route::execute_route;
