//! Request handlers.

pub mod auth;
pub mod health;
pub mod results;
pub mod upload;

pub use auth::*;
pub use health::*;
pub use results::*;
pub use upload::*;
