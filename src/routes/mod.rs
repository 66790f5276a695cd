//! Route modules for the arkvault server

pub mod manifests;
pub mod uploads;
