//! [`Command`] definition.

pub mod add_property_image;
pub mod create_property;
pub mod create_reservation;
pub mod delete_property;
pub mod enable_review;
pub mod submit_review;
pub mod update_property;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    add_property_image::AddPropertyImage, create_property::CreateProperty,
    create_reservation::CreateReservation, delete_property::DeleteProperty,
    enable_review::EnableReview, submit_review::SubmitReview,
    update_property::UpdateProperty,
};
