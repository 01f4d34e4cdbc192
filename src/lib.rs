// Book Portal - Library root for testing

pub mod auth;
pub mod books;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gate;
pub mod http_client;
pub mod middleware;
pub mod pages;
pub mod routes;
