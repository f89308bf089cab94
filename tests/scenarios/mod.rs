mod common;
mod dry;
mod integration;
#[cfg(unix)]
mod stub_cli;
