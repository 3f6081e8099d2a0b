//! Camp booking domain.
//!
//! - [`catalog`]: offerings, dates and half/full-day rates
//! - [`pricing`]: per-child and per-registration pricing
//! - [`registration`]: the Registration aggregate, its identity token and store
//! - [`attendance`]: per-child, per-day check-in records
//!
//! Everything is event-sourced through [`CommandHandler`] on top of an
//! [`event_store::EventStore`].

pub mod aggregate;
pub mod attendance;
pub mod catalog;
pub mod command;
pub mod error;
pub mod money;
pub mod pricing;
pub mod registration;

pub use aggregate::{Aggregate, DomainEvent};
pub use attendance::{
    AttendanceError, AttendanceEvent, AttendanceRecord, AttendanceService, AttendanceState,
    CheckIn, CheckOut,
};
pub use catalog::{CampCatalog, CampType, SessionCatalog, SessionRates, SessionType};
pub use command::{Command, CommandHandler, CommandResult};
pub use error::{DomainError, ErrorKind};
pub use money::Money;
pub use pricing::{PricedLine, PricedSelection, PricingError, price_child, price_registration};
pub use registration::{
    CancelRegistration, Child, ChildDraft, ChildQuote, CompleteRegistration, CreateRegistration,
    GuardianContact, PaymentMethod, PaymentStatus, Quote, Registration, RegistrationDraft,
    RegistrationError, RegistrationEvent, RegistrationService, RegistrationStatus,
    RegistrationType, UpdatePaymentStatus, child_key,
};
