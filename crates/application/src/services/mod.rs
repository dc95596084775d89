pub mod auth_service;
pub mod group_service;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod auth_service_tests;

pub use auth_service::{AuthService, AuthServiceDependencies};
pub use group_service::{GroupService, GroupServiceDependencies};
