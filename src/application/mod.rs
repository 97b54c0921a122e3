pub mod account_locks;
pub mod usecases;
