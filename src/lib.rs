pub mod audit;
pub mod client;
pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pricing;
pub mod promo;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod submit;
pub mod validation;
