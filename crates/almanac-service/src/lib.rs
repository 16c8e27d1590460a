pub mod caldav;
pub mod carddav;
pub mod error;
pub mod once_value;
