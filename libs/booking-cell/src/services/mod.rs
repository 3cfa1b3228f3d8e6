pub mod availability;
pub mod booking;

pub use availability::free_slots;
pub use booking::BookingService;
