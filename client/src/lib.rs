pub mod analytics;
pub mod clock;
pub mod config;
pub mod provider;
pub mod request;
pub mod request_factory;
pub mod rpc;
pub mod scheduler;
pub mod subscription;

pub use analytics::{Analytics, AnalyticsError};
pub use request::{Loaded, Request, RequestError, Unloaded};
pub use request_factory::{FactoryError, RequestFactory};
pub use scheduler::{ScheduleCall, Scheduler, SchedulerError};
pub use subscription::Subscription;
