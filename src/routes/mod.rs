pub mod announcements;
pub mod contact;
pub mod health;
pub mod menu;
pub mod news;
pub mod schedule;
pub mod settings;
pub mod upload;
pub mod websocket;
