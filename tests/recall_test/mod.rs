pub mod fake_view;
pub mod fixture;
