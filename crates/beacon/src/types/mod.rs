pub mod api;
pub mod chain;
pub mod validator;

pub use api::*;
pub use chain::*;
pub use validator::*;
