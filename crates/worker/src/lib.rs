//! Runtime primitives for cooperative background parsing: task spawning,
//! clocks, host idle scheduling and external completion triggers.

mod class;
/// Time sources for budgets and deadlines.
pub mod clock;
/// Host idle-time scheduling primitives.
pub mod idle;
mod spawn;
mod token;
/// External completion signals.
pub mod trigger;

pub use class::TaskClass;
pub use clock::{Clock, ManualClock, SystemClock};
pub use idle::{IdleCallback, IdleDeadline, IdleScheduler, ManualIdleScheduler, TokioIdleScheduler};
pub use spawn::spawn;
pub use token::IdleHandle;
pub use trigger::{Trigger, TriggerError, TriggerHandle};
