pub mod customer;
pub mod i18n;
pub mod view;
