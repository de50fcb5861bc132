pub mod doctor;
pub mod review;
pub mod saved_doctor;
pub mod user;

pub use doctor::*;
pub use review::*;
pub use saved_doctor::*;
pub use user::*;
