//! Domain definitions.

pub mod property;
pub mod reservation;
pub mod review;
pub mod user;

pub use self::{property::Property, reservation::Reservation, review::Review};
