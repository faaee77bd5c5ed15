// src/handlers/mod.rs

pub mod auth;
pub mod feed;
pub mod likes;
pub mod pages;
pub mod posts;
