mod controller;

pub use controller::IpAccessController;
