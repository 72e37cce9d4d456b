pub mod booking;
pub mod otp;
pub mod review;
pub mod user;

pub use booking::{Booking, BookingStatus};
pub use otp::OtpChallenge;
pub use review::{Review, ReviewStatus};
pub use user::{Role, UserProfile};
