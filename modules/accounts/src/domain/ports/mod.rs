// Domain ports (interfaces) for dependency inversion
pub mod hasher;

pub use hasher::PasswordHasher;
