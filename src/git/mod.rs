pub mod repo;
pub mod runner;

pub use repo::GitRepo;
pub use runner::{describe, CommandRunner, ProcessRunner, Stage};
