//! Lock the screen for a few seconds, then unlock.
//!
//! Run with: cargo run --example lock -- [seconds] [rrggbbaa] [--debug]
//!
//! IMPORTANT: while locked, no other client receives keyboard or pointer
//! input. The lock releases itself after the given number of seconds
//! (default 5).

use std::time::Duration;
use xlockd::{
    CursorVariant, GrabPolicy, LockOptions, LockSession, XlibConnection, current_layout_group,
};

fn main() {
    let mut options = LockOptions {
        color: "1e1e2eff".into(),
        cursor: CursorVariant::Arrow,
        capture_background: true,
        ..LockOptions::default()
    };
    let mut seconds = 5;
    for arg in std::env::args().skip(1) {
        if arg == "--debug" {
            options.debug = true;
        } else if let Ok(n) = arg.parse() {
            seconds = n;
        } else {
            options.color = arg;
        }
    }

    let level = if options.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let conn = match XlibConnection::open() {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match current_layout_group(&conn) {
        Ok(layout) => println!("Keyboard layout: {}", layout),
        Err(e) if e.is_fatal() => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        Err(e) => eprintln!("Keyboard layout unavailable: {}", e),
    }

    let mut redraws = 0;
    let lock = match LockSession::lock(&conn, &options, &GrabPolicy::default(), &mut || {
        redraws += 1;
    }) {
        Ok(lock) => lock,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Locked window 0x{:x} for {}s ({} redraws while grabbing)",
        lock.window().window,
        seconds,
        redraws
    );
    std::thread::sleep(Duration::from_secs(seconds));

    if let Err(e) = lock.unlock() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    println!("Unlocked");
}
