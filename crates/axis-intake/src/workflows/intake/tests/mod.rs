mod common;
mod gateway;
