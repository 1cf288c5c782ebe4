//! Relational storage backed by SeaORM

pub mod entities;
pub mod migration;
pub mod seaorm_db;

pub use seaorm_db::SeaOrmStore;
