#![forbid(unsafe_code)]

use std::time::Duration;

/// True once stdin has a line ready, false on timeout. Lets a due
/// auto-advance fire while the learner sits idle at the prompt.
#[cfg(unix)]
pub(crate) fn wait_stdin_readable(timeout: Duration) -> bool {
    use nix::poll::{PollFd, PollFlags, poll};
    use std::os::unix::io::AsFd;

    let stdin = std::io::stdin();
    let timeout_ms: u16 = timeout.as_millis().min(u16::MAX as u128) as u16;
    let mut fds = [PollFd::new(stdin.as_fd(), PollFlags::POLLIN)];
    match poll(&mut fds, timeout_ms) {
        Ok(0) => false,
        Ok(_) => true,
        Err(_) => false,
    }
}

// Without poll the wait degrades to "assume ready"; the advance then fires on
// the next interaction instead of mid-idle.
#[cfg(not(unix))]
pub(crate) fn wait_stdin_readable(_timeout: Duration) -> bool {
    true
}
