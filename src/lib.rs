// src/lib.rs

// Núcleo de sincronização do workspace de CRM.
// O binário (main.rs) só monta o AppState e o adaptador HTTP em cima disto.

pub mod common;
pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
