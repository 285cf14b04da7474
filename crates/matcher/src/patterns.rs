//! Patterns for the contact workflow activities.

use crate::pattern::Pattern;

fn add_profile() -> Pattern {
    Pattern::of_type("Add").nested("object", Pattern::of_type("Profile"))
}

/// An offer to add a profile to the recipient's contacts.
pub fn contact_request() -> Pattern {
    Pattern::of_type("Offer").nested("object", add_profile())
}

pub fn accept_contact_request() -> Pattern {
    Pattern::of_type("Accept").nested("object", contact_request())
}

pub fn ignore_contact_request() -> Pattern {
    Pattern::of_type("Ignore").nested("object", contact_request())
}

pub fn reject_contact_request() -> Pattern {
    Pattern::of_type("Reject").nested("object", contact_request())
}

pub fn remove_contact() -> Pattern {
    Pattern::of_type("Remove").nested("object", Pattern::of_type("Person"))
}

/// An offer to delete the sender's actor.
pub fn offer_delete_actor() -> Pattern {
    Pattern::of_type("Offer").nested(
        "object",
        Pattern::of_type("Delete").nested("object", Pattern::of_type("Person")),
    )
}
