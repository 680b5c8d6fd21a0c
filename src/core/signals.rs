//! Process signal handling for spy.
//!
//! Handlers only touch atomics (and `kill` for forwarding). All real work happens in the event
//! loop after polling the flags:
//! - SIGINT sent to spy alone goes on to the running child; Ctrl-C from the terminal already
//!   reached it. Without a child, SIGINT requests shutdown.
//! - SIGTERM and SIGHUP request shutdown.
//! - SIGWINCH marks a pending resize.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

static CHILD_PID: AtomicI32 = AtomicI32::new(0);
static SHUTDOWN: AtomicBool = AtomicBool::new(false);
static RESIZE: AtomicBool = AtomicBool::new(false);

/// Whether a SIGINT with origin `si_code` must be passed on to the child.
///
/// A Ctrl-C from the terminal already reaches the child through the foreground process group.
/// Only a signal sent to spy alone, by `kill`, is forwarded.
#[cfg(unix)]
fn needs_forwarding(si_code: libc::c_int) -> bool {
    si_code == libc::SI_USER
}

#[cfg(unix)]
extern "C" fn on_interrupt(sig: libc::c_int, info: *mut libc::siginfo_t, _ctx: *mut libc::c_void) {
    let pid = CHILD_PID.load(Ordering::SeqCst);
    if pid > 0 {
        // SAFETY: the kernel passes a valid siginfo with SA_SIGINFO; kill is async-signal-safe.
        unsafe {
            if !info.is_null() && needs_forwarding((*info).si_code) {
                libc::kill(pid, sig);
            }
        }
    } else {
        SHUTDOWN.store(true, Ordering::SeqCst);
    }
}

#[cfg(unix)]
extern "C" fn on_terminate(_sig: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

#[cfg(unix)]
extern "C" fn on_resize(_sig: libc::c_int) {
    RESIZE.store(true, Ordering::SeqCst);
}

#[cfg(unix)]
fn install_handler(
    sig: libc::c_int,
    handler: libc::sighandler_t,
    flags: libc::c_int,
) -> io::Result<()> {
    // SAFETY: the sigaction struct is zero-initialised and fully set up before use; the handler
    // only performs async-signal-safe operations.
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handler;
        action.sa_flags = libc::SA_RESTART | flags;
        libc::sigemptyset(&mut action.sa_mask);
        if libc::sigaction(sig, &action, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Installs the handlers. Must run before the terminal backend registers its own.
#[cfg(unix)]
pub(crate) fn install() -> io::Result<()> {
    type Plain = extern "C" fn(libc::c_int);
    type WithInfo = extern "C" fn(libc::c_int, *mut libc::siginfo_t, *mut libc::c_void);

    let interrupt = on_interrupt as WithInfo as libc::sighandler_t;
    let terminate = on_terminate as Plain as libc::sighandler_t;
    let resize = on_resize as Plain as libc::sighandler_t;

    install_handler(libc::SIGINT, interrupt, libc::SA_SIGINFO)?;
    install_handler(libc::SIGTERM, terminate, 0)?;
    install_handler(libc::SIGHUP, terminate, 0)?;
    install_handler(libc::SIGWINCH, resize, 0)?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn install() -> io::Result<()> {
    Ok(())
}

/// Records the child that SIGINT should be forwarded to.
pub(crate) fn set_child(pid: u32) {
    CHILD_PID.store(i32::try_from(pid).unwrap_or(0), Ordering::SeqCst);
}

pub(crate) fn clear_child() {
    CHILD_PID.store(0, Ordering::SeqCst);
}

/// Consumes a pending shutdown request.
pub(crate) fn take_shutdown() -> bool {
    SHUTDOWN.swap(false, Ordering::SeqCst)
}

/// Consumes a pending resize.
pub(crate) fn take_resize() -> bool {
    RESIZE.swap(false, Ordering::SeqCst)
}

pub(crate) fn request_resize() {
    RESIZE.store(true, Ordering::SeqCst);
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn only_kill_sent_interrupts_are_forwarded() {
        assert!(needs_forwarding(libc::SI_USER));
        // SI_KERNEL, how Linux tags a Ctrl-C from the terminal.
        #[cfg(target_os = "linux")]
        assert!(!needs_forwarding(0x80));
    }
}
