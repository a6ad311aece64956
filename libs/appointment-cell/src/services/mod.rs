pub mod appointments;
pub mod availability;
pub mod blocks;
pub mod booking;
pub mod interval;
pub mod notify;

pub use appointments::AppointmentService;
pub use availability::AvailabilityService;
pub use blocks::OrthoBlockService;
pub use booking::PublicBookingService;
pub use notify::{HttpNotifier, NotificationKind, Notifier};
