pub mod credentials;
pub mod environments;
pub mod responder;
pub mod types;
