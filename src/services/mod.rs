pub mod bookmark_service;
pub mod bookmark_service_impl;
pub mod favicon;
pub mod session_service;
pub mod session_service_impl;
pub mod user_service;
pub mod user_service_impl;
