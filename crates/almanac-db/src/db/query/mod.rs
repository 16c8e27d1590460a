pub mod caldav;
pub mod carddav;
