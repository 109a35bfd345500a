pub mod announcements;
pub mod blob;
pub mod calendar;
pub mod contacts;
pub mod menu;
pub mod menu_view;
pub mod news;
pub mod schedule;
pub mod settings;
