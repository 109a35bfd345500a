pub mod announcement;
pub mod auth;
pub mod contact;
pub mod menu;
pub mod news;
pub mod schedule;
pub mod settings;
