//! Client side of the GymGurus offline cache.
//!
//! This crate provides the live fetch primitive, request routing, the
//! offline cache coordinator, and push notification handling.

pub mod coordinator;
pub mod fetch;
pub mod notify;
pub mod route;

pub use coordinator::{
    ActivateReport, Coordinator, CoordinatorSettings, InstallReport, Intercepted, Lifecycle, OFFLINE_STATUS,
    RefreshHandle, ResponseSource, ServedResponse,
};
pub use fetch::{FetchClient, FetchConfig, FetchRequest, FetchResponse, Fetcher, Method};
pub use notify::{Notification, NotificationDefaults, NotificationPayload, WindowAction, WindowClient};
pub use route::{Router, RoutingDecision};
