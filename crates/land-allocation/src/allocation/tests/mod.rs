mod common;
mod equity;
mod service;
