pub mod cache;
pub mod mailer;
pub mod repositories;
