//! Registration aggregate, its identity token and the registration store.

mod aggregate;
mod commands;
mod events;
mod service;
mod state;
pub mod token;
mod value_objects;

pub use aggregate::Registration;
pub use commands::*;
pub use events::{
    PaymentStatusUpdatedData, RegistrationCancelledData, RegistrationCompletedData,
    RegistrationCreatedData, RegistrationEvent,
};
pub use service::{ChildQuote, Quote, RegistrationService};
pub use state::{PaymentMethod, PaymentStatus, RegistrationStatus, RegistrationType};
pub use value_objects::{
    Child, ChildDraft, GuardianContact, RegistrationDraft, child_key, registration_number,
};

use chrono::NaiveDate;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::money::Money;
use crate::pricing::PricingError;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Guardian consent is required")]
    ConsentRequired,

    #[error("Registration needs at least one child with at least one selected date")]
    EmptyRegistration,

    #[error("Field {0} must not be empty")]
    MissingField(&'static str),

    #[error("Child {child_name} appears more than once")]
    DuplicateChild { child_name: String },

    #[error("Session type given for {date}, which {child_name} has not selected")]
    SessionTypeForUnselectedDate { child_name: String, date: NaiveDate },

    #[error("Amount paid {amount_paid} must be between 0 and the total {total}")]
    InvalidAmountPaid { amount_paid: Money, total: Money },

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("Registration already created")]
    AlreadyCreated,

    #[error("Registration not found")]
    NotCreated,

    #[error("Cannot {action} a {current} registration")]
    InvalidStateTransition {
        current: RegistrationStatus,
        action: &'static str,
    },
}

impl RegistrationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistrationError::NotCreated => ErrorKind::NotFound,
            RegistrationError::AlreadyCreated
            | RegistrationError::InvalidStateTransition { .. } => ErrorKind::Conflict,
            _ => ErrorKind::Validation,
        }
    }
}
