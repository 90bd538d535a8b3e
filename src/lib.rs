pub mod ai;
pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod meal_log;
pub mod meal_plans;
pub mod news;
pub mod pantry;
pub mod state;
pub mod storage;
