pub mod poller;

pub use poller::spawn_pollers;
