#![allow(dead_code)]

pub use taskterm_test_utils::{builders, fake_process, fake_terminal, init_tracing, with_timeout};
