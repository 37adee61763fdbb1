pub mod enums;

mod appointment;
mod association;
mod catalog;
mod doctor;
mod establishment;
mod patient;
mod schedule;
mod summary;
mod user;

pub use appointment::*;
pub use association::*;
pub use catalog::*;
pub use doctor::*;
pub use establishment::*;
pub use patient::*;
pub use schedule::*;
pub use summary::*;
pub use user::*;
