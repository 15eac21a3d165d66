pub mod action;
pub mod api;
pub mod character;
pub mod config;
pub mod event;
pub mod game;
pub mod nomination;
pub mod script;
pub mod seat;
pub mod setup;
