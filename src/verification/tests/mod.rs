mod common;

mod poller;
