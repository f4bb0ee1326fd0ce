// Navigation to the login entry point after an unrecoverable auth failure

/// Sends the user back to sign in
///
/// Invoked after credentials have already been cleared, before the failing
/// call's error is returned to its caller.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self);
}

impl<F> LoginRedirect for F
where
    F: Fn() + Send + Sync,
{
    fn redirect_to_login(&self) {
        self()
    }
}

/// Redirect for the command-line front-end: tell the user how to sign in again
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalRedirect;

impl LoginRedirect for TerminalRedirect {
    fn redirect_to_login(&self) {
        tracing::info!("Session ended, redirecting to login");
        eprintln!("Session expired. Run `midas login` to sign in again.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_closure_redirect() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let redirect: Box<dyn LoginRedirect> = Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        redirect.redirect_to_login();
        redirect.redirect_to_login();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
