//! Leveled console output shared by every generator.
//!
//! `[INFO]`/`[ OK ]` go to stdout, `[WARN]`/`[ERR ]` to stderr. Color is
//! applied only when the stream is a terminal (the `colored` crate detects
//! that). `[DBG ]` lines are gated behind the global verbose flag.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(on: bool) {
    VERBOSE.store(on, Ordering::Relaxed);
}

pub fn verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

pub fn info(msg: impl Display) {
    println!("[INFO] {msg}");
}

pub fn success(msg: impl Display) {
    println!("{}", format!("[ OK ] {msg}").green());
}

pub fn warn(msg: impl Display) {
    eprintln!("{}", format!("[WARN] {msg}").yellow());
}

pub fn error(msg: impl Display) {
    eprintln!("{}", format!("[ERR ] {msg}").red());
}

/// Only printed with `--verbose`.
pub fn debug(msg: impl Display) {
    if verbose() {
        println!("[DBG ] {msg}");
    }
}
