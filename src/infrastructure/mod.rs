pub mod backends;
pub mod credentials;
