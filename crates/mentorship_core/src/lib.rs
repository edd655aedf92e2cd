pub mod domain;
pub mod memory;
pub mod ports;
pub mod schedule;
pub mod services;

pub use domain::{
    Actor, Availability, DaySlots, Feedback, Initiator, MentorshipRequest, NewRequest, NewSession,
    Notification, RequestStatus, Role, Session, SessionOrigin, SessionStatus, SlotOption, User,
};
pub use memory::InMemoryStore;
pub use ports::{
    Clock, DatabaseService, NotificationService, PortError, PortResult, RequestFilter,
    SessionFilter, SystemClock,
};
pub use schedule::{
    resolve_next_occurrence, SameDayPolicy, ScheduleError, SlotToken, TimeOfDay, TimeRange,
    Weekday,
};
pub use services::MentorshipServices;
