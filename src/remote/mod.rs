// src/remote/mod.rs

//! Remote platform sessions (shallow I/O collaborators)

pub mod auth;
pub mod ejudge;
pub mod polygon;

pub use auth::Credentials;
pub use ejudge::EjudgeSession;
pub use polygon::PolygonSession;
