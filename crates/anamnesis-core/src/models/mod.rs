pub mod alert;
pub mod document;
pub mod engagement;
pub mod extraction;
pub mod message;
pub mod profile;
pub mod question;
pub mod session;
pub mod stage;
