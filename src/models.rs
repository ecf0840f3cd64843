pub mod customer;
pub mod department;
pub mod file;
pub mod nullable;
pub mod payment;
pub mod plan;
pub mod validation;
