pub mod app;
pub mod auth;
pub mod config;
pub mod rdbms;
pub mod state;
pub mod users;

#[cfg(test)]
mod test_support;
