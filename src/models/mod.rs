pub mod clock;
pub mod doctor;
pub mod patient;

pub use clock::*;
pub use doctor::*;
pub use patient::*;
