pub mod filter;

pub mod branch;
pub mod category;
pub mod course;
pub mod enrollment;
pub mod event;
pub mod lead;
pub mod mock_test;
pub mod notification;
pub mod study_abroad;
pub mod user;
