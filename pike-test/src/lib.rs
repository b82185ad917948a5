#![doc = include_str!("../README.md")]

pub mod backend;
pub mod cache_key;
pub mod fsm;
pub mod handler_state;
pub mod mock_backend;
pub mod tracing;
